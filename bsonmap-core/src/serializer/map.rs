// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! String-keyed maps, encoded as nested documents.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{BsonDefault, Serializer};
use crate::types::ElementType;

fn write_entries<'a, V: Serializer + 'a>(
    context: &mut WriteContext,
    entries: impl Iterator<Item = (&'a String, &'a V)>,
) -> Result<(), Error> {
    let representation = context.take_representation();
    context.writer.write_start_document()?;
    for (key, value) in entries {
        context.writer.write_name(key)?;
        context.set_representation(representation);
        value.bson_write(context)?;
    }
    context.set_representation(None);
    context.writer.write_end_document()
}

fn read_entries<V: Serializer>(
    context: &mut ReadContext,
    mut insert: impl FnMut(String, V),
) -> Result<(), Error> {
    let representation = context.take_representation();
    let actual = context.reader.current_type()?;
    if actual != ElementType::Document {
        return Err(Error::type_mismatch(ElementType::Document, actual));
    }
    context.reader.read_start_document()?;
    while let Some((_, name)) = context.reader.has_next_element()? {
        context.set_representation(representation);
        let value = V::bson_read(context)?;
        insert(name, value);
    }
    context.set_representation(None);
    context.reader.read_end_document()
}

impl<V: Serializer, S: BuildHasher + Default + 'static> Serializer for HashMap<String, V, S> {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_entries(context, self.iter())
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        let mut map: Self = HashMap::default();
        read_entries::<V>(context, |k, v| {
            map.insert(k, v);
        })?;
        Ok(map)
    }

    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        self.is_empty()
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::Document)
    }
}

impl<V, S: BuildHasher + Default> BsonDefault for HashMap<String, V, S> {
    fn bson_default() -> Self {
        HashMap::default()
    }
}

impl<V: Serializer> Serializer for BTreeMap<String, V> {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_entries(context, self.iter())
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        let mut map: Self = BTreeMap::new();
        read_entries::<V>(context, |k, v| {
            map.insert(k, v);
        })?;
        Ok(map)
    }

    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        self.is_empty()
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::Document)
    }
}

impl<V> BsonDefault for BTreeMap<String, V> {
    fn bson_default() -> Self {
        BTreeMap::new()
    }
}
