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

use crate::buffer::Writer;
use crate::error::Error;
use crate::types::ElementType;
use crate::value::ObjectId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ContainerKind {
    Document,
    Array,
}

#[derive(Debug)]
struct Frame {
    kind: ContainerKind,
    start: usize,
    next_index: usize,
}

/// Streaming document writer.
///
/// Values inside a document must be preceded by [`BsonWriter::write_name`];
/// values inside an array are named `"0"`, `"1"`, ... automatically. Sizes are
/// back-patched when a document or array is closed.
pub struct BsonWriter {
    buffer: Writer,
    frames: Vec<Frame>,
    pending_name: Option<String>,
    check_element_names: bool,
    finished: bool,
}

impl Default for BsonWriter {
    fn default() -> Self {
        BsonWriter::new()
    }
}

impl BsonWriter {
    pub fn new() -> BsonWriter {
        BsonWriter {
            buffer: Writer::with_capacity(256),
            frames: Vec::new(),
            pending_name: None,
            check_element_names: false,
            finished: false,
        }
    }

    /// When set, element names starting with `$` or containing `.` are rejected.
    pub fn check_element_names(&self) -> bool {
        self.check_element_names
    }

    pub fn set_check_element_names(&mut self, check: bool) {
        self.check_element_names = check;
    }

    /// Nesting depth of open documents and arrays.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Returns the encoded bytes; fails if a document or array is still open.
    pub fn into_bytes(self) -> Result<Vec<u8>, Error> {
        if !self.frames.is_empty() {
            return Err(Error::encode_error(format!(
                "writer still has {} open container(s)",
                self.frames.len()
            )));
        }
        Ok(self.buffer.into_inner())
    }

    pub fn write_name(&mut self, name: &str) -> Result<(), Error> {
        match self.frames.last() {
            Some(frame) if frame.kind == ContainerKind::Document => {}
            Some(_) => {
                return Err(Error::encode_error(format!(
                    "write_name('{name}') called inside an array"
                )))
            }
            None => {
                return Err(Error::encode_error(format!(
                    "write_name('{name}') called outside of a document"
                )))
            }
        }
        if let Some(pending) = &self.pending_name {
            return Err(Error::encode_error(format!(
                "write_name('{name}') called while '{pending}' has no value"
            )));
        }
        if self.check_element_names {
            if name.starts_with('$') {
                return Err(Error::invalid_element_name(format!(
                    "element name '{name}' is not valid because it starts with a '$'"
                )));
            }
            if name.contains('.') {
                return Err(Error::invalid_element_name(format!(
                    "element name '{name}' is not valid because it contains a '.'"
                )));
            }
        }
        self.pending_name = Some(name.to_string());
        Ok(())
    }

    fn begin_value(&mut self, element_type: ElementType) -> Result<(), Error> {
        match self.frames.last_mut() {
            None => {
                if self.finished || element_type != ElementType::Document {
                    return Err(Error::encode_error(format!(
                        "a top-level value must be a single document, got {element_type:?}"
                    )));
                }
                Ok(())
            }
            Some(frame) => {
                let name = match frame.kind {
                    ContainerKind::Document => self.pending_name.take().ok_or_else(|| {
                        Error::encode_error(format!(
                            "write_name must be called before writing a {element_type:?} value"
                        ))
                    })?,
                    ContainerKind::Array => {
                        let index = frame.next_index;
                        frame.next_index += 1;
                        index.to_string()
                    }
                };
                self.buffer.write_u8(element_type.into());
                self.buffer.write_cstring(&name)
            }
        }
    }

    fn open(&mut self, kind: ContainerKind) {
        let start = self.buffer.len();
        self.buffer.write_i32(0);
        self.frames.push(Frame {
            kind,
            start,
            next_index: 0,
        });
    }

    fn close(&mut self, kind: ContainerKind) -> Result<(), Error> {
        match self.frames.last() {
            Some(frame) if frame.kind == kind => {}
            other => {
                return Err(Error::encode_error(format!(
                    "cannot close {kind:?}, current container is {:?}",
                    other.map(|f| f.kind)
                )))
            }
        }
        if let Some(pending) = self.pending_name.take() {
            return Err(Error::encode_error(format!(
                "element '{pending}' was named but never written"
            )));
        }
        self.buffer.write_u8(0);
        if let Some(frame) = self.frames.pop() {
            let size = i32::try_from(self.buffer.len() - frame.start)
                .map_err(|_| Error::encode_error("document is too large to encode"))?;
            self.buffer.set_i32(frame.start, size)?;
        }
        if self.frames.is_empty() {
            self.finished = true;
        }
        Ok(())
    }

    pub fn write_start_document(&mut self) -> Result<(), Error> {
        self.begin_value(ElementType::Document)?;
        self.open(ContainerKind::Document);
        Ok(())
    }

    pub fn write_end_document(&mut self) -> Result<(), Error> {
        self.close(ContainerKind::Document)
    }

    pub fn write_start_array(&mut self) -> Result<(), Error> {
        self.begin_value(ElementType::Array)?;
        self.open(ContainerKind::Array);
        Ok(())
    }

    pub fn write_end_array(&mut self) -> Result<(), Error> {
        self.close(ContainerKind::Array)
    }

    pub fn write_double(&mut self, value: f64) -> Result<(), Error> {
        self.begin_value(ElementType::Double)?;
        self.buffer.write_f64(value);
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), Error> {
        self.begin_value(ElementType::String)?;
        self.buffer.write_string(value)
    }

    pub fn write_binary(&mut self, subtype: u8, bytes: &[u8]) -> Result<(), Error> {
        self.begin_value(ElementType::Binary)?;
        let len = i32::try_from(bytes.len())
            .map_err(|_| Error::encode_error("binary value is too large to encode"))?;
        self.buffer.write_i32(len);
        self.buffer.write_u8(subtype);
        self.buffer.write_bytes(bytes);
        Ok(())
    }

    pub fn write_object_id(&mut self, value: &ObjectId) -> Result<(), Error> {
        self.begin_value(ElementType::ObjectId)?;
        self.buffer.write_bytes(&value.bytes());
        Ok(())
    }

    pub fn write_boolean(&mut self, value: bool) -> Result<(), Error> {
        self.begin_value(ElementType::Boolean)?;
        self.buffer.write_u8(value as u8);
        Ok(())
    }

    /// Writes a UTC date as milliseconds since the Unix epoch.
    pub fn write_date_time(&mut self, millis: i64) -> Result<(), Error> {
        self.begin_value(ElementType::DateTime)?;
        self.buffer.write_i64(millis);
        Ok(())
    }

    pub fn write_null(&mut self) -> Result<(), Error> {
        self.begin_value(ElementType::Null)
    }

    /// Writes `name: null` in one call.
    pub fn write_null_element(&mut self, name: &str) -> Result<(), Error> {
        self.write_name(name)?;
        self.write_null()
    }

    pub fn write_int32(&mut self, value: i32) -> Result<(), Error> {
        self.begin_value(ElementType::Int32)?;
        self.buffer.write_i32(value);
        Ok(())
    }

    pub fn write_timestamp(&mut self, value: u64) -> Result<(), Error> {
        self.begin_value(ElementType::Timestamp)?;
        self.buffer.write_u64(value);
        Ok(())
    }

    pub fn write_int64(&mut self, value: i64) -> Result<(), Error> {
        self.begin_value(ElementType::Int64)?;
        self.buffer.write_i64(value);
        Ok(())
    }

    /// Copies an already encoded document verbatim.
    pub fn write_raw_document(&mut self, bytes: &[u8]) -> Result<(), Error> {
        check_raw_container(bytes)?;
        self.begin_value(ElementType::Document)?;
        self.buffer.write_bytes(bytes);
        if self.frames.is_empty() {
            self.finished = true;
        }
        Ok(())
    }

    /// Copies an already encoded array verbatim.
    pub fn write_raw_array(&mut self, bytes: &[u8]) -> Result<(), Error> {
        check_raw_container(bytes)?;
        self.begin_value(ElementType::Array)?;
        self.buffer.write_bytes(bytes);
        Ok(())
    }
}

fn check_raw_container(bytes: &[u8]) -> Result<(), Error> {
    if bytes.len() < 5 || bytes[bytes.len() - 1] != 0 {
        return Err(Error::invalid_data("raw container is not a terminated document"));
    }
    let declared = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if declared as usize != bytes.len() {
        return Err(Error::invalid_data(format!(
            "raw container declares {} bytes but holds {}",
            declared,
            bytes.len()
        )));
    }
    Ok(())
}
