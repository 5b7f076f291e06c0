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

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{BsonDefault, Serializer};
use crate::types::ElementType;

/// The member representation applies to every item.
impl<T: Serializer> Serializer for Vec<T> {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        let representation = context.take_representation();
        context.writer.write_start_array()?;
        for item in self {
            context.set_representation(representation);
            item.bson_write(context)?;
        }
        context.set_representation(None);
        context.writer.write_end_array()
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        let representation = context.take_representation();
        let actual = context.reader.current_type()?;
        if actual != ElementType::Array {
            return Err(Error::type_mismatch(ElementType::Array, actual));
        }
        context.reader.read_start_array()?;
        let mut items = Vec::new();
        while context.reader.has_next_element()?.is_some() {
            context.set_representation(representation);
            items.push(T::bson_read(context)?);
        }
        context.set_representation(None);
        context.reader.read_end_array()?;
        Ok(items)
    }

    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        self.is_empty()
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::Array)
    }
}

impl<T> BsonDefault for Vec<T> {
    #[inline(always)]
    fn bson_default() -> Self {
        Vec::new()
    }
}
