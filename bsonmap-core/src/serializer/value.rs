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

//! Serializers for the document model itself.

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{BsonDefault, Serializer};
use crate::types::ElementType;
use crate::value::{codec, Array, Binary, Document, ObjectId, Value};

impl Serializer for Value {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        context.take_representation();
        codec::write_value(context.writer, self)
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        context.take_representation();
        let limit = context.depth_limit();
        codec::read_value(context.reader, limit)
    }

    #[inline(always)]
    fn bson_is_null(&self) -> bool {
        self.is_null()
    }

    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        self.is_null()
    }
}

impl BsonDefault for Value {
    fn bson_default() -> Self {
        Value::Null
    }
}

impl Serializer for Document {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        context.take_representation();
        codec::write_document(context.writer, self)
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        context.take_representation();
        let actual = context.reader.current_type()?;
        if actual != ElementType::Document {
            return Err(Error::type_mismatch(ElementType::Document, actual));
        }
        let limit = context.depth_limit();
        codec::read_document(context.reader, limit)
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

impl BsonDefault for Document {
    fn bson_default() -> Self {
        Document::new()
    }
}

impl Serializer for Array {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        context.take_representation();
        codec::write_array(context.writer, self)
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        context.take_representation();
        let actual = context.reader.current_type()?;
        if actual != ElementType::Array {
            return Err(Error::type_mismatch(ElementType::Array, actual));
        }
        let limit = context.depth_limit();
        codec::read_array(context.reader, limit)
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

impl BsonDefault for Array {
    fn bson_default() -> Self {
        Array::new()
    }
}

impl Serializer for ObjectId {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        match context.take_representation().unwrap_or(ElementType::ObjectId) {
            ElementType::ObjectId => context.writer.write_object_id(self),
            ElementType::String => context.writer.write_string(&self.to_hex()),
            other => Err(Error::encode_error(format!(
                "{other:?} is not a valid representation for an ObjectId"
            ))),
        }
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        context.take_representation();
        let reader = &mut *context.reader;
        match reader.current_type()? {
            ElementType::ObjectId => reader.read_object_id(),
            ElementType::String => ObjectId::parse_str(&reader.read_string()?),
            other => Err(Error::type_mismatch(ElementType::ObjectId, other)),
        }
    }

    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        self.is_empty()
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::ObjectId)
    }
}

impl BsonDefault for ObjectId {
    fn bson_default() -> Self {
        ObjectId::default()
    }
}

impl Serializer for Binary {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        context.take_representation();
        context.writer.write_binary(self.subtype, &self.bytes)
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        context.take_representation();
        let (subtype, bytes) = context.reader.read_binary()?;
        Ok(Binary { subtype, bytes })
    }

    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::Binary)
    }
}

impl BsonDefault for Binary {
    fn bson_default() -> Self {
        Binary::new(Vec::new())
    }
}
