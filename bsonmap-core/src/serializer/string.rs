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
use crate::value::ObjectId;

impl Serializer for String {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        match context.take_representation().unwrap_or(ElementType::String) {
            ElementType::String => context.writer.write_string(self),
            // The empty string maps to the empty ObjectId and back.
            ElementType::ObjectId if self.is_empty() => context.writer.write_object_id(&ObjectId::default()),
            ElementType::ObjectId => {
                let id = ObjectId::parse_str(self).map_err(|_| {
                    Error::encode_error(format!("'{self}' cannot be written as an ObjectId"))
                })?;
                context.writer.write_object_id(&id)
            }
            other => Err(Error::encode_error(format!(
                "{other:?} is not a valid representation for a string"
            ))),
        }
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        context.take_representation();
        let reader = &mut *context.reader;
        match reader.current_type()? {
            ElementType::String => reader.read_string(),
            ElementType::ObjectId => {
                let id = reader.read_object_id()?;
                Ok(if id.is_empty() { String::new() } else { id.to_hex() })
            }
            other => Err(Error::type_mismatch(ElementType::String, other)),
        }
    }

    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        self.is_empty()
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::String)
    }
}

impl BsonDefault for String {
    #[inline(always)]
    fn bson_default() -> Self {
        String::new()
    }
}
