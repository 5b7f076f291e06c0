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

impl Serializer for bool {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        match context.take_representation().unwrap_or(ElementType::Boolean) {
            ElementType::Boolean => context.writer.write_boolean(*self),
            ElementType::Int32 => context.writer.write_int32(*self as i32),
            ElementType::Int64 => context.writer.write_int64(*self as i64),
            ElementType::Double => context.writer.write_double(if *self { 1.0 } else { 0.0 }),
            ElementType::String => context.writer.write_string(if *self { "true" } else { "false" }),
            other => Err(Error::encode_error(format!(
                "{other:?} is not a valid representation for a boolean"
            ))),
        }
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        context.take_representation();
        let reader = &mut *context.reader;
        match reader.current_type()? {
            ElementType::Boolean => reader.read_boolean(),
            ElementType::Int32 => Ok(reader.read_int32()? != 0),
            ElementType::Int64 => Ok(reader.read_int64()? != 0),
            ElementType::Double => Ok(reader.read_double()? != 0.0),
            ElementType::String => match reader.read_string()?.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(Error::invalid_data(format!("'{other}' is not a boolean"))),
            },
            other => Err(Error::type_mismatch(ElementType::Boolean, other)),
        }
    }

    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        !*self
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::Boolean)
    }
}

impl BsonDefault for bool {
    #[inline(always)]
    fn bson_default() -> Self {
        false
    }
}
