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

use std::ops::Range;

use crate::buffer::Reader;
use crate::error::Error;
use crate::types::ElementType;
use crate::value::ObjectId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ContainerKind {
    Document,
    Array,
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    kind: ContainerKind,
    end: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Before the top-level document.
    Initial,
    /// Positioned before the next element header.
    Type,
    /// An element header was read; its value is next.
    Value(ElementType),
    /// The terminator of the current container was consumed.
    EndOfContainer,
    /// The top-level document was closed.
    Done,
}

/// Saved reader position, see [`BsonReader::bookmark`].
#[derive(Clone, Debug)]
pub struct Bookmark {
    cursor: usize,
    frames: Vec<Frame>,
    state: State,
}

/// Pull-style reader over one encoded document.
///
/// The caller drives the token stream: `read_start_document`, then
/// `has_next_element` until it returns `None`, consuming each value with a
/// typed read or `skip_value`, then `read_end_document`.
#[derive(Clone)]
pub struct BsonReader<'a> {
    buffer: Reader<'a>,
    frames: Vec<Frame>,
    state: State,
}

impl<'a> BsonReader<'a> {
    pub fn new(bytes: &'a [u8]) -> BsonReader<'a> {
        BsonReader {
            buffer: Reader::new(bytes),
            frames: Vec::new(),
            state: State::Initial,
        }
    }

    pub fn position(&self) -> usize {
        self.buffer.cursor()
    }

    /// True once the top-level document has been fully read.
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Type of the value the reader is positioned on.
    ///
    /// Before the top-level document this is [`ElementType::Document`].
    pub fn current_type(&self) -> Result<ElementType, Error> {
        match self.state {
            State::Initial => Ok(ElementType::Document),
            State::Value(element_type) => Ok(element_type),
            other => Err(Error::invalid_data(format!(
                "reader is not positioned on a value (state {other:?})"
            ))),
        }
    }

    /// Alias of [`BsonReader::current_type`].
    pub fn peek_type(&self) -> Result<ElementType, Error> {
        self.current_type()
    }

    fn expect_value(&self, expected: ElementType) -> Result<(), Error> {
        match self.state {
            State::Value(actual) if actual == expected => Ok(()),
            State::Initial if expected == ElementType::Document => Ok(()),
            State::Value(actual) => Err(Error::type_mismatch(expected, actual)),
            other => Err(Error::invalid_data(format!(
                "cannot read a {expected:?} value in reader state {other:?}"
            ))),
        }
    }

    #[inline(always)]
    fn value_consumed(&mut self) {
        self.state = if self.frames.is_empty() {
            State::Done
        } else {
            State::Type
        };
    }

    fn open(&mut self, kind: ContainerKind) -> Result<(), Error> {
        let start = self.buffer.cursor();
        let size = self.buffer.read_i32()?;
        let limit = self.frames.last().map_or(self.buffer.len(), |f| f.end);
        if size < 5 || start + size as usize > limit {
            return Err(Error::invalid_data(format!(
                "invalid {kind:?} size {size} at offset {start}"
            )));
        }
        self.frames.push(Frame {
            kind,
            end: start + size as usize,
        });
        self.state = State::Type;
        Ok(())
    }

    fn close(&mut self, kind: ContainerKind) -> Result<(), Error> {
        if self.state != State::EndOfContainer {
            return Err(Error::invalid_data(format!(
                "cannot end {kind:?} before all elements were read (state {:?})",
                self.state
            )));
        }
        match self.frames.pop() {
            Some(frame) if frame.kind == kind => {
                if frame.end != self.buffer.cursor() {
                    return Err(Error::invalid_data(format!(
                        "{kind:?} size mismatch: expected end at {}, reader is at {}",
                        frame.end,
                        self.buffer.cursor()
                    )));
                }
            }
            other => {
                return Err(Error::invalid_data(format!(
                    "cannot end {kind:?}, current container is {:?}",
                    other.map(|f| f.kind)
                )))
            }
        }
        self.value_consumed();
        Ok(())
    }

    pub fn read_start_document(&mut self) -> Result<(), Error> {
        self.expect_value(ElementType::Document)?;
        self.open(ContainerKind::Document)
    }

    pub fn read_end_document(&mut self) -> Result<(), Error> {
        self.close(ContainerKind::Document)
    }

    pub fn read_start_array(&mut self) -> Result<(), Error> {
        self.expect_value(ElementType::Array)?;
        self.open(ContainerKind::Array)
    }

    pub fn read_end_array(&mut self) -> Result<(), Error> {
        self.close(ContainerKind::Array)
    }

    /// Reads the next element header of the current container.
    ///
    /// Returns `None` (and consumes the terminator) at the end of the container.
    pub fn has_next_element(&mut self) -> Result<Option<(ElementType, String)>, Error> {
        if self.state != State::Type {
            return Err(Error::invalid_data(format!(
                "has_next_element called in reader state {:?}",
                self.state
            )));
        }
        let end = self.frames.last().map_or(0, |f| f.end);
        if self.buffer.cursor() >= end {
            return Err(Error::invalid_data("container ended without a terminator"));
        }
        let tag = self.buffer.read_u8()?;
        if tag == 0 {
            self.state = State::EndOfContainer;
            return Ok(None);
        }
        let element_type = ElementType::from_u8(tag)?;
        let name = self.buffer.read_cstring()?.to_string();
        self.state = State::Value(element_type);
        Ok(Some((element_type, name)))
    }

    /// Skips the name of the element the reader is positioned on.
    ///
    /// Names are consumed together with the type tag by
    /// [`BsonReader::has_next_element`], so this only checks the state.
    pub fn skip_name(&mut self) -> Result<(), Error> {
        match self.state {
            State::Value(_) => Ok(()),
            other => Err(Error::invalid_data(format!(
                "skip_name called in reader state {other:?}"
            ))),
        }
    }

    pub fn skip_value(&mut self) -> Result<(), Error> {
        let element_type = self.current_type()?;
        let size = match element_type {
            ElementType::Double
            | ElementType::DateTime
            | ElementType::Timestamp
            | ElementType::Int64 => 8,
            ElementType::Int32 => 4,
            ElementType::Boolean => 1,
            ElementType::Null => 0,
            ElementType::ObjectId => 12,
            ElementType::String => 4 + self.checked_len()?,
            ElementType::Binary => 5 + self.checked_len()?,
            ElementType::Document | ElementType::Array => self.checked_len()?,
            ElementType::EndOfDocument => {
                return Err(Error::invalid_data("cannot skip an end-of-document marker"))
            }
        };
        self.buffer.skip(size)?;
        self.value_consumed();
        Ok(())
    }

    fn checked_len(&self) -> Result<usize, Error> {
        let len = self.buffer.peek_i32()?;
        usize::try_from(len).map_err(|_| Error::invalid_data(format!("negative length {len}")))
    }

    pub fn read_double(&mut self) -> Result<f64, Error> {
        self.expect_value(ElementType::Double)?;
        let value = self.buffer.read_f64()?;
        self.value_consumed();
        Ok(value)
    }

    pub fn read_string(&mut self) -> Result<String, Error> {
        self.expect_value(ElementType::String)?;
        let value = self.buffer.read_string()?;
        self.value_consumed();
        Ok(value)
    }

    /// Returns `(subtype, bytes)`.
    pub fn read_binary(&mut self) -> Result<(u8, Vec<u8>), Error> {
        self.expect_value(ElementType::Binary)?;
        let len = self.checked_len()?;
        self.buffer.skip(4)?;
        let subtype = self.buffer.read_u8()?;
        let bytes = self.buffer.read_bytes(len)?.to_vec();
        self.value_consumed();
        Ok((subtype, bytes))
    }

    pub fn read_object_id(&mut self) -> Result<ObjectId, Error> {
        self.expect_value(ElementType::ObjectId)?;
        let bytes = self.buffer.read_bytes(12)?;
        let mut raw = [0u8; 12];
        raw.copy_from_slice(bytes);
        self.value_consumed();
        Ok(ObjectId::from_bytes(raw))
    }

    pub fn read_boolean(&mut self) -> Result<bool, Error> {
        self.expect_value(ElementType::Boolean)?;
        let value = match self.buffer.read_u8()? {
            0 => false,
            1 => true,
            other => return Err(Error::invalid_data(format!("invalid boolean byte {other}"))),
        };
        self.value_consumed();
        Ok(value)
    }

    /// Milliseconds since the Unix epoch.
    pub fn read_date_time(&mut self) -> Result<i64, Error> {
        self.expect_value(ElementType::DateTime)?;
        let value = self.buffer.read_i64()?;
        self.value_consumed();
        Ok(value)
    }

    pub fn read_null(&mut self) -> Result<(), Error> {
        self.expect_value(ElementType::Null)?;
        self.value_consumed();
        Ok(())
    }

    pub fn read_int32(&mut self) -> Result<i32, Error> {
        self.expect_value(ElementType::Int32)?;
        let value = self.buffer.read_i32()?;
        self.value_consumed();
        Ok(value)
    }

    pub fn read_timestamp(&mut self) -> Result<u64, Error> {
        self.expect_value(ElementType::Timestamp)?;
        let value = self.buffer.read_u64()?;
        self.value_consumed();
        Ok(value)
    }

    pub fn read_int64(&mut self) -> Result<i64, Error> {
        self.expect_value(ElementType::Int64)?;
        let value = self.buffer.read_i64()?;
        self.value_consumed();
        Ok(value)
    }

    fn read_raw_range(&mut self, expected: ElementType) -> Result<Range<usize>, Error> {
        self.expect_value(expected)?;
        let start = self.buffer.cursor();
        let size = self.checked_len()?;
        if size < 5 {
            return Err(Error::invalid_data(format!("invalid {expected:?} size {size}")));
        }
        self.buffer.skip(size)?;
        self.value_consumed();
        Ok(start..start + size)
    }

    /// Byte range of the embedded document the reader is positioned on.
    pub fn read_raw_sub_document_range(&mut self) -> Result<Range<usize>, Error> {
        self.read_raw_range(ElementType::Document)
    }

    /// Byte range of the embedded array the reader is positioned on.
    pub fn read_raw_sub_array_range(&mut self) -> Result<Range<usize>, Error> {
        self.read_raw_range(ElementType::Array)
    }

    /// Returns the embedded document's bytes without decoding them.
    pub fn read_raw_sub_document(&mut self) -> Result<&'a [u8], Error> {
        let range = self.read_raw_sub_document_range()?;
        Ok(&self.buffer.get_slice()[range])
    }

    /// Returns the embedded array's bytes without decoding them.
    pub fn read_raw_sub_array(&mut self) -> Result<&'a [u8], Error> {
        let range = self.read_raw_sub_array_range()?;
        Ok(&self.buffer.get_slice()[range])
    }

    pub fn bookmark(&self) -> Bookmark {
        Bookmark {
            cursor: self.buffer.cursor(),
            frames: self.frames.clone(),
            state: self.state,
        }
    }

    pub fn return_to_bookmark(&mut self, bookmark: Bookmark) {
        self.buffer.set_cursor(bookmark.cursor);
        self.frames = bookmark.frames;
        self.state = bookmark.state;
    }
}
