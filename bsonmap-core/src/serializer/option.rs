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

/// `None` is a null element; `Some` defers to the inner type, which also
/// consumes the member representation.
impl<T: Serializer> Serializer for Option<T> {
    #[inline(always)]
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        match self {
            Some(value) => value.bson_write(context),
            None => {
                context.take_representation();
                context.writer.write_null()
            }
        }
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        if context.reader.current_type()? == ElementType::Null {
            context.take_representation();
            context.reader.read_null()?;
            return Ok(None);
        }
        T::bson_read(context).map(Some)
    }

    #[inline(always)]
    fn bson_is_null(&self) -> bool {
        self.is_none()
    }

    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        self.is_none()
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        T::bson_element_type()
    }
}

impl<T> BsonDefault for Option<T> {
    #[inline(always)]
    fn bson_default() -> Self {
        None
    }
}
