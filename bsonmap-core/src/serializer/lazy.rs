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

//! Lazy containers keep a copy of their element's bytes and decode on
//! first access.

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{BsonDefault, Serializer};
use crate::types::ElementType;
use crate::value::{Array, Document, LazyArray, LazyDocument};

impl Serializer for LazyDocument {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        context.take_representation();
        self.write_to(context.writer)
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        context.take_representation();
        let bytes = context.reader.read_raw_sub_document()?;
        LazyDocument::from_bytes(bytes.to_vec())
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::Document)
    }
}

impl BsonDefault for LazyDocument {
    fn bson_default() -> Self {
        LazyDocument::from(Document::new())
    }
}

impl Serializer for LazyArray {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        context.take_representation();
        self.write_to(context.writer)
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        context.take_representation();
        let bytes = context.reader.read_raw_sub_array()?;
        LazyArray::from_bytes(bytes.to_vec())
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::Array)
    }
}

impl BsonDefault for LazyArray {
    fn bson_default() -> Self {
        LazyArray::from(Array::new())
    }
}
