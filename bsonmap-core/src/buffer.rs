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

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;

/// Growable little-endian byte sink used by [`crate::io::BsonWriter`].
#[derive(Default)]
pub struct Writer {
    pub(crate) bf: Vec<u8>,
}

impl Writer {
    pub fn with_capacity(capacity: usize) -> Writer {
        Writer {
            bf: Vec::with_capacity(capacity),
        }
    }

    pub fn reset(&mut self) {
        // keep capacity and reset len to 0
        self.bf.clear();
    }

    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bf
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> usize {
        self.bf.extend_from_slice(v);
        v.len()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bf.push(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, value);
        self.bf.extend_from_slice(&buf);
    }

    pub fn write_i64(&mut self, value: i64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_i64(&mut buf, value);
        self.bf.extend_from_slice(&buf);
    }

    pub fn write_u64(&mut self, value: u64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, value);
        self.bf.extend_from_slice(&buf);
    }

    pub fn write_f64(&mut self, value: f64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, value);
        self.bf.extend_from_slice(&buf);
    }

    /// Overwrites four bytes at `offset`, used to back-patch document sizes.
    pub fn set_i32(&mut self, offset: usize, value: i32) -> Result<(), Error> {
        let len = self.bf.len();
        let slot = self
            .bf
            .get_mut(offset..offset + 4)
            .ok_or_else(|| Error::buffer_out_of_bound(offset, 4, len))?;
        LittleEndian::write_i32(slot, value);
        Ok(())
    }

    /// Writes `value` followed by a NUL terminator.
    pub fn write_cstring(&mut self, value: &str) -> Result<(), Error> {
        if value.as_bytes().contains(&0) {
            return Err(Error::invalid_element_name(format!(
                "'{}' contains a NUL byte",
                value.escape_debug()
            )));
        }
        self.bf.extend_from_slice(value.as_bytes());
        self.bf.push(0);
        Ok(())
    }

    /// Writes an `i32` byte count (including the terminator), the UTF-8 bytes and a NUL.
    pub fn write_string(&mut self, value: &str) -> Result<(), Error> {
        let len = i32::try_from(value.len() + 1)
            .map_err(|_| Error::encode_error("string is too large to encode"))?;
        self.write_i32(len);
        self.bf.extend_from_slice(value.as_bytes());
        self.bf.push(0);
        Ok(())
    }
}

/// Bounds-checked little-endian cursor over a borrowed byte slice.
#[derive(Clone)]
pub struct Reader<'a> {
    bf: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bf: &'a [u8]) -> Reader<'a> {
        Reader { bf, cursor: 0 }
    }

    #[inline(always)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline(always)]
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor;
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bf.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn get_slice(&self) -> &'a [u8] {
        self.bf
    }

    pub fn slice_after_cursor(&self) -> &'a [u8] {
        self.bf.get(self.cursor..).unwrap_or(&[])
    }

    #[inline(always)]
    fn check_bound(&self, n: usize) -> Result<(), Error> {
        match self.cursor.checked_add(n) {
            Some(end) if end <= self.bf.len() => Ok(()),
            _ => Err(Error::buffer_out_of_bound(self.cursor, n, self.bf.len())),
        }
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.check_bound(n)?;
        self.cursor += n;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.check_bound(1)?;
        let result = self.bf[self.cursor];
        self.cursor += 1;
        Ok(result)
    }

    pub fn peek_i32(&self) -> Result<i32, Error> {
        self.check_bound(4)?;
        Ok(LittleEndian::read_i32(&self.bf[self.cursor..]))
    }

    pub fn read_i32(&mut self) -> Result<i32, Error> {
        let result = self.peek_i32()?;
        self.cursor += 4;
        Ok(result)
    }

    pub fn read_i64(&mut self) -> Result<i64, Error> {
        self.check_bound(8)?;
        let result = LittleEndian::read_i64(&self.bf[self.cursor..]);
        self.cursor += 8;
        Ok(result)
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        self.check_bound(8)?;
        let result = LittleEndian::read_u64(&self.bf[self.cursor..]);
        self.cursor += 8;
        Ok(result)
    }

    pub fn read_f64(&mut self) -> Result<f64, Error> {
        self.check_bound(8)?;
        let result = LittleEndian::read_f64(&self.bf[self.cursor..]);
        self.cursor += 8;
        Ok(result)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.check_bound(len)?;
        let result = &self.bf[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(result)
    }

    /// Reads UTF-8 bytes up to (and consuming) the next NUL.
    pub fn read_cstring(&mut self) -> Result<&'a str, Error> {
        let rest = self.slice_after_cursor();
        let end = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| Error::invalid_data("unterminated element name"))?;
        let s = std::str::from_utf8(&rest[..end])
            .map_err(|e| Error::invalid_data(format!("element name is not valid UTF-8: {e}")))?;
        self.cursor += end + 1;
        Ok(s)
    }

    /// Reads a length-prefixed, NUL-terminated UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, Error> {
        let len = self.read_i32()?;
        if len < 1 {
            return Err(Error::invalid_data(format!("invalid string length {len}")));
        }
        let bytes = self.read_bytes(len as usize)?;
        let (body, terminator) = bytes.split_at(bytes.len() - 1);
        if terminator[0] != 0 {
            return Err(Error::invalid_data("string is missing its NUL terminator"));
        }
        String::from_utf8(body.to_vec())
            .map_err(|e| Error::invalid_data(format!("string is not valid UTF-8: {e}")))
    }
}
