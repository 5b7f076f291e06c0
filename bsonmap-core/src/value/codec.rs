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

//! Untyped encoding of [`Value`] trees.

use chrono::{TimeZone, Utc};

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::Error;
use crate::io::{BsonReader, BsonWriter};
use crate::types::ElementType;
use crate::value::{Array, Binary, Document, Value};

pub fn write_value(writer: &mut BsonWriter, value: &Value) -> Result<(), Error> {
    match value {
        Value::Double(v) => writer.write_double(*v),
        Value::String(v) => writer.write_string(v),
        Value::Document(v) => write_document(writer, v),
        Value::Array(v) => write_array(writer, v),
        Value::Binary(v) => writer.write_binary(v.subtype, &v.bytes),
        Value::ObjectId(v) => writer.write_object_id(v),
        Value::Boolean(v) => writer.write_boolean(*v),
        Value::DateTime(v) => writer.write_date_time(v.timestamp_millis()),
        Value::Null => writer.write_null(),
        Value::Int32(v) => writer.write_int32(*v),
        Value::Timestamp(v) => writer.write_timestamp(*v),
        Value::Int64(v) => writer.write_int64(*v),
        Value::LazyDocument(v) => v.write_to(writer),
        Value::LazyArray(v) => v.write_to(writer),
    }
}

pub fn write_document(writer: &mut BsonWriter, document: &Document) -> Result<(), Error> {
    writer.write_start_document()?;
    for element in document {
        writer.write_name(element.name())?;
        write_value(writer, element.value())?;
    }
    writer.write_end_document()
}

pub fn write_array(writer: &mut BsonWriter, array: &Array) -> Result<(), Error> {
    writer.write_start_array()?;
    for value in array {
        write_value(writer, value)?;
    }
    writer.write_end_array()
}

/// Nesting budget for untyped decoding.
///
/// Every document or array opened takes one level; opening one past
/// `max_depth` fails with [`Error::DepthExceed`] before any recursion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthLimit {
    depth: u32,
    max_depth: u32,
}

impl DepthLimit {
    pub fn new(max_depth: u32) -> DepthLimit {
        DepthLimit {
            depth: 0,
            max_depth,
        }
    }

    /// Budget for values read inside `depth` containers that are already open.
    pub fn starting_at(depth: u32, max_depth: u32) -> DepthLimit {
        DepthLimit { depth, max_depth }
    }

    #[inline(always)]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Takes one level for a container about to be opened.
    pub fn enter(self) -> Result<DepthLimit, Error> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(Error::depth_exceed(format!(
                "Maximum document nesting depth ({}) exceeded while decoding",
                self.max_depth
            )));
        }
        Ok(DepthLimit { depth, ..self })
    }
}

impl Default for DepthLimit {
    fn default() -> Self {
        DepthLimit::new(DEFAULT_MAX_DEPTH)
    }
}

/// Reads the value the reader is positioned on, decoding containers eagerly.
pub fn read_value(reader: &mut BsonReader, limit: DepthLimit) -> Result<Value, Error> {
    Ok(match reader.current_type()? {
        ElementType::Double => Value::Double(reader.read_double()?),
        ElementType::String => Value::String(reader.read_string()?),
        ElementType::Document => Value::Document(read_document(reader, limit)?),
        ElementType::Array => Value::Array(read_array(reader, limit)?),
        ElementType::Binary => {
            let (subtype, bytes) = reader.read_binary()?;
            Value::Binary(Binary { subtype, bytes })
        }
        ElementType::ObjectId => Value::ObjectId(reader.read_object_id()?),
        ElementType::Boolean => Value::Boolean(reader.read_boolean()?),
        ElementType::DateTime => {
            let millis = reader.read_date_time()?;
            let date = Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
                Error::invalid_data(format!("date {millis} is out of range"))
            })?;
            Value::DateTime(date)
        }
        ElementType::Null => {
            reader.read_null()?;
            Value::Null
        }
        ElementType::Int32 => Value::Int32(reader.read_int32()?),
        ElementType::Timestamp => Value::Timestamp(reader.read_timestamp()?),
        ElementType::Int64 => Value::Int64(reader.read_int64()?),
        ElementType::EndOfDocument => {
            return Err(Error::invalid_data("unexpected end-of-document marker"))
        }
    })
}

pub fn read_document(reader: &mut BsonReader, limit: DepthLimit) -> Result<Document, Error> {
    let inner = limit.enter()?;
    reader.read_start_document()?;
    let mut document = Document::new();
    while let Some((_, name)) = reader.has_next_element()? {
        let value = read_value(reader, inner)?;
        document.insert(name, value);
    }
    reader.read_end_document()?;
    Ok(document)
}

pub fn read_array(reader: &mut BsonReader, limit: DepthLimit) -> Result<Array, Error> {
    let inner = limit.enter()?;
    reader.read_start_array()?;
    read_elements(reader, inner)
}

/// Reads the elements of an array whose frame is already open, then closes it.
///
/// Raw array slices are framed as documents, so a reader over one opens it
/// with `read_start_document` and finishes here.
pub fn read_array_elements(reader: &mut BsonReader, limit: DepthLimit) -> Result<Array, Error> {
    let mut array = Array::new();
    while reader.has_next_element()?.is_some() {
        array.push(read_value(reader, limit)?);
    }
    reader.read_end_document()?;
    Ok(array)
}

fn read_elements(reader: &mut BsonReader, limit: DepthLimit) -> Result<Array, Error> {
    let mut array = Array::new();
    while reader.has_next_element()?.is_some() {
        array.push(read_value(reader, limit)?);
    }
    reader.read_end_array()?;
    Ok(array)
}
