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

//! Helpers called by `#[derive(BsonObject)]` on unit enums.

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::types::ElementType;

/// Writes a variant as its index or, with a String representation, its name.
pub fn write_variant(
    context: &mut WriteContext,
    default_representation: ElementType,
    index: i32,
    name: &str,
) -> Result<(), Error> {
    match context.take_representation().unwrap_or(default_representation) {
        ElementType::Int32 => context.writer.write_int32(index),
        ElementType::Int64 => context.writer.write_int64(index as i64),
        ElementType::String => context.writer.write_string(name),
        other => Err(Error::encode_error(format!(
            "{other:?} is not a valid representation for an enum"
        ))),
    }
}

/// Returns the index of the variant stored at the reader position.
pub fn read_variant(context: &mut ReadContext, type_name: &str, names: &[&str]) -> Result<usize, Error> {
    context.take_representation();
    let reader = &mut *context.reader;
    let index = match reader.current_type()? {
        ElementType::Int32 => reader.read_int32()? as i64,
        ElementType::Int64 => reader.read_int64()?,
        ElementType::String => {
            let name = reader.read_string()?;
            return names.iter().position(|n| *n == name).ok_or_else(|| {
                Error::invalid_data(format!("'{name}' is not a variant of {type_name}"))
            });
        }
        other => return Err(Error::type_mismatch(ElementType::Int32, other)),
    };
    usize::try_from(index)
        .ok()
        .filter(|i| *i < names.len())
        .ok_or_else(|| Error::invalid_data(format!("{index} is not a variant index of {type_name}")))
}
