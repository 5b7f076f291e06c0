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

//! Documents and arrays that defer decoding until first structural access.
//!
//! A lazy container starts out owning an undecoded [`RawSlice`]. The first
//! call that needs its structure performs a shallow decode: scalar elements
//! are decoded, nested documents and arrays become new lazy containers over
//! their own sub-slice. The parent's buffer is released at that point; its
//! bytes are moved once into shared read-only storage that every descendant
//! slice points into, so materializing level by level copies nothing more. [`LazyDocument::dispose`] releases whatever the container still
//! owns, children included, after which every access fails with
//! [`Error::UseAfterDispose`].

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::error::Error;
use crate::io::{BsonReader, BsonWriter};
use crate::types::ElementType;
use crate::value::codec::{self, DepthLimit};
use crate::value::{Array, Document, Element, Value};

/// Storage behind a [`RawSlice`].
pub trait ByteBuffer: Send + Sync {
    fn as_bytes(&self) -> &[u8];
}

impl ByteBuffer for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

impl ByteBuffer for Box<[u8]> {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

impl ByteBuffer for Arc<[u8]> {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

enum Storage {
    Owned(Box<dyn ByteBuffer>),
    Shared { bytes: Arc<[u8]>, range: Range<usize> },
}

/// Encoded document or array.
///
/// A slice either owns the caller's buffer or points into storage shared
/// with the rest of a materialized tree. Shared storage is never written.
pub struct RawSlice {
    storage: Storage,
}

impl RawSlice {
    pub fn new<B: ByteBuffer + 'static>(buffer: B) -> RawSlice {
        RawSlice {
            storage: Storage::Owned(Box::new(buffer)),
        }
    }

    fn shared(bytes: Arc<[u8]>, range: Range<usize>) -> RawSlice {
        RawSlice {
            storage: Storage::Shared { bytes, range },
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(buffer) => buffer.as_bytes(),
            Storage::Shared { bytes, range } => &bytes[range.clone()],
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Storage the children of this slice can point into, with the range
    /// this slice covers. Owned bytes are copied into new shared storage.
    fn to_shared(&self) -> (Arc<[u8]>, Range<usize>) {
        match &self.storage {
            Storage::Owned(buffer) => {
                let bytes: Arc<[u8]> = Arc::from(buffer.as_bytes());
                let len = bytes.len();
                (bytes, 0..len)
            }
            Storage::Shared { bytes, range } => (bytes.clone(), range.clone()),
        }
    }

    /// True when this slice points into storage shared with other slices.
    pub fn is_shared(&self) -> bool {
        matches!(self.storage, Storage::Shared { .. })
    }

    fn check_container(&self) -> Result<(), Error> {
        let bytes = self.as_bytes();
        if bytes.len() < 5 {
            return Err(Error::invalid_data(format!(
                "slice of {} bytes is too short for a document",
                bytes.len()
            )));
        }
        let declared = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if declared as usize != bytes.len() || bytes[bytes.len() - 1] != 0 {
            return Err(Error::invalid_data(format!(
                "slice declares {declared} bytes but holds {}",
                bytes.len()
            )));
        }
        Ok(())
    }
}

impl Clone for RawSlice {
    fn clone(&self) -> Self {
        match &self.storage {
            Storage::Owned(buffer) => RawSlice::new(buffer.as_bytes().to_vec()),
            Storage::Shared { bytes, range } => RawSlice::shared(bytes.clone(), range.clone()),
        }
    }
}

impl fmt::Debug for RawSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawSlice({} bytes)", self.len())
    }
}

trait LazyContainer: Clone + Sized {
    const KIND: &'static str;

    fn shallow_decode(source: &SharedSource) -> Result<Self, Error>;

    fn eager_decode(bytes: &[u8]) -> Result<Self, Error>;

    fn to_eager(&self) -> Result<Self, Error>;

    fn dispose_children(&mut self);

    fn write(&self, writer: &mut BsonWriter) -> Result<(), Error>;

    fn write_raw(writer: &mut BsonWriter, bytes: &[u8]) -> Result<(), Error>;
}

/// Shared storage a shallow decode reads from and hands to its children.
struct SharedSource {
    bytes: Arc<[u8]>,
    range: Range<usize>,
}

impl SharedSource {
    fn as_bytes(&self) -> &[u8] {
        &self.bytes[self.range.clone()]
    }

    /// Slice of a child container; `relative` is measured from this source.
    fn child(&self, relative: Range<usize>) -> RawSlice {
        let start = self.range.start + relative.start;
        RawSlice::shared(self.bytes.clone(), start..start + relative.len())
    }
}

/// Reads one element for a shallow decode; containers become lazy children.
fn read_shallow_value(reader: &mut BsonReader, source: &SharedSource) -> Result<Value, Error> {
    match reader.current_type()? {
        ElementType::Document => {
            let range = reader.read_raw_sub_document_range()?;
            Ok(Value::LazyDocument(LazyDocument::new(source.child(range))))
        }
        ElementType::Array => {
            let range = reader.read_raw_sub_array_range()?;
            Ok(Value::LazyArray(LazyArray::new(source.child(range))))
        }
        // Only scalars remain, so no nesting budget is spent.
        _ => codec::read_value(reader, DepthLimit::default()),
    }
}

impl LazyContainer for Document {
    const KIND: &'static str = "document";

    fn shallow_decode(source: &SharedSource) -> Result<Self, Error> {
        let mut reader = BsonReader::new(source.as_bytes());
        reader.read_start_document()?;
        let mut document = Document::new();
        while let Some((_, name)) = reader.has_next_element()? {
            let value = read_shallow_value(&mut reader, source)?;
            document.insert(name, value);
        }
        reader.read_end_document()?;
        Ok(document)
    }

    fn eager_decode(bytes: &[u8]) -> Result<Self, Error> {
        Document::from_bytes(bytes)
    }

    fn to_eager(&self) -> Result<Self, Error> {
        Document::to_eager(self)
    }

    fn dispose_children(&mut self) {
        self.dispose_lazy();
    }

    fn write(&self, writer: &mut BsonWriter) -> Result<(), Error> {
        codec::write_document(writer, self)
    }

    fn write_raw(writer: &mut BsonWriter, bytes: &[u8]) -> Result<(), Error> {
        writer.write_raw_document(bytes)
    }
}

/// Arrays are framed like documents, so a raw array slice is opened with
/// `read_start_document` on a reader of its own.
impl LazyContainer for Array {
    const KIND: &'static str = "array";

    fn shallow_decode(source: &SharedSource) -> Result<Self, Error> {
        let mut reader = BsonReader::new(source.as_bytes());
        reader.read_start_document()?;
        let mut array = Array::new();
        while reader.has_next_element()?.is_some() {
            array.push(read_shallow_value(&mut reader, source)?);
        }
        reader.read_end_document()?;
        Ok(array)
    }

    fn eager_decode(bytes: &[u8]) -> Result<Self, Error> {
        let limit = DepthLimit::default().enter()?;
        let mut reader = BsonReader::new(bytes);
        reader.read_start_document()?;
        codec::read_array_elements(&mut reader, limit)
    }

    fn to_eager(&self) -> Result<Self, Error> {
        Array::to_eager(self)
    }

    fn dispose_children(&mut self) {
        self.dispose_lazy();
    }

    fn write(&self, writer: &mut BsonWriter) -> Result<(), Error> {
        codec::write_array(writer, self)
    }

    fn write_raw(writer: &mut BsonWriter, bytes: &[u8]) -> Result<(), Error> {
        writer.write_raw_array(bytes)
    }
}

#[derive(Clone)]
enum LazyState<C> {
    Undecoded(RawSlice),
    Decoded(C),
    Disposed,
}

#[derive(Clone)]
struct LazyCell<C> {
    state: LazyState<C>,
}

impl<C: LazyContainer> LazyCell<C> {
    fn new(slice: RawSlice) -> Self {
        LazyCell {
            state: LazyState::Undecoded(slice),
        }
    }

    fn decoded(container: C) -> Self {
        LazyCell {
            state: LazyState::Decoded(container),
        }
    }

    fn disposed_error() -> Error {
        Error::use_after_dispose(format!("lazy {} has been disposed", C::KIND))
    }

    fn materialize(&mut self) -> Result<&mut C, Error> {
        if let LazyState::Undecoded(slice) = &self.state {
            let (bytes, range) = slice.to_shared();
            let container = C::shallow_decode(&SharedSource { bytes, range })?;
            tracing::trace!(kind = C::KIND, bytes = slice.len(), "materialized lazy container");
            // Dropping the previous state releases the slice.
            self.state = LazyState::Decoded(container);
        }
        match &mut self.state {
            LazyState::Decoded(container) => Ok(container),
            LazyState::Disposed => Err(Self::disposed_error()),
            LazyState::Undecoded(_) => Err(Error::unknown("lazy container failed to materialize")),
        }
    }

    fn to_eager(&self) -> Result<C, Error> {
        match &self.state {
            LazyState::Undecoded(slice) => C::eager_decode(slice.as_bytes()),
            LazyState::Decoded(container) => container.to_eager(),
            LazyState::Disposed => Err(Self::disposed_error()),
        }
    }

    fn try_clone(&self) -> Result<Self, Error> {
        match &self.state {
            LazyState::Disposed => Err(Self::disposed_error()),
            _ => Ok(self.clone()),
        }
    }

    fn dispose(&mut self) {
        if let LazyState::Decoded(mut container) =
            std::mem::replace(&mut self.state, LazyState::Disposed)
        {
            container.dispose_children();
        }
    }

    fn write_to(&self, writer: &mut BsonWriter) -> Result<(), Error> {
        match &self.state {
            LazyState::Undecoded(slice) => C::write_raw(writer, slice.as_bytes()),
            LazyState::Decoded(container) => container.write(writer),
            LazyState::Disposed => Err(Self::disposed_error()),
        }
    }

    fn raw_bytes(&self) -> Option<&[u8]> {
        match &self.state {
            LazyState::Undecoded(slice) => Some(slice.as_bytes()),
            _ => None,
        }
    }

    fn is_materialized(&self) -> bool {
        matches!(self.state, LazyState::Decoded(_))
    }

    fn is_disposed(&self) -> bool {
        matches!(self.state, LazyState::Disposed)
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            LazyState::Undecoded(_) => "undecoded",
            LazyState::Decoded(_) => "decoded",
            LazyState::Disposed => "disposed",
        }
    }
}

/// Document decoded on first structural access.
///
/// Accessors take `&mut self` because the first of them replaces the
/// undecoded slice with the decoded container.
#[derive(Clone)]
pub struct LazyDocument {
    cell: LazyCell<Document>,
}

impl LazyDocument {
    pub fn new(slice: RawSlice) -> LazyDocument {
        LazyDocument {
            cell: LazyCell::new(slice),
        }
    }

    /// Wraps encoded bytes after checking the size header and terminator.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<LazyDocument, Error> {
        let slice = RawSlice::new(bytes);
        slice.check_container()?;
        Ok(LazyDocument::new(slice))
    }

    pub fn is_materialized(&self) -> bool {
        self.cell.is_materialized()
    }

    pub fn is_disposed(&self) -> bool {
        self.cell.is_disposed()
    }

    /// The undecoded bytes, or `None` once materialized or disposed.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.cell.raw_bytes()
    }

    /// Decodes the top level if that has not happened yet.
    pub fn ensure_materialized(&mut self) -> Result<(), Error> {
        self.cell.materialize().map(|_| ())
    }

    pub fn as_document_mut(&mut self) -> Result<&mut Document, Error> {
        self.cell.materialize()
    }

    pub fn len(&mut self) -> Result<usize, Error> {
        Ok(self.cell.materialize()?.len())
    }

    pub fn is_empty(&mut self) -> Result<bool, Error> {
        Ok(self.cell.materialize()?.is_empty())
    }

    pub fn get(&mut self, name: &str) -> Result<Option<&Value>, Error> {
        Ok(self.cell.materialize()?.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<Option<&mut Value>, Error> {
        Ok(self.cell.materialize()?.get_mut(name))
    }

    pub fn get_index(&mut self, index: usize) -> Result<Option<&Element>, Error> {
        Ok(self.cell.materialize()?.get_index(index))
    }

    pub fn contains_key(&mut self, name: &str) -> Result<bool, Error> {
        Ok(self.cell.materialize()?.contains_key(name))
    }

    pub fn iter(&mut self) -> Result<std::slice::Iter<'_, Element>, Error> {
        Ok(self.cell.materialize()?.iter())
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, Error> {
        Ok(self.cell.materialize()?.insert(name, value))
    }

    pub fn remove(&mut self, name: &str) -> Result<Option<Value>, Error> {
        Ok(self.cell.materialize()?.remove(name))
    }

    /// Eager copy of the full tree; does not change this container's state.
    pub fn to_document(&self) -> Result<Document, Error> {
        self.cell.to_eager()
    }

    /// Copies the slice (undecoded) or the container (decoded).
    pub fn deep_clone(&self) -> Result<LazyDocument, Error> {
        Ok(LazyDocument {
            cell: self.cell.try_clone()?,
        })
    }

    /// Releases the slice or the decoded children. Calling it twice is a no-op.
    pub fn dispose(&mut self) {
        self.cell.dispose();
    }

    pub(crate) fn write_to(&self, writer: &mut BsonWriter) -> Result<(), Error> {
        self.cell.write_to(writer)
    }
}

impl From<Document> for LazyDocument {
    fn from(document: Document) -> Self {
        LazyDocument {
            cell: LazyCell::decoded(document),
        }
    }
}

impl PartialEq for LazyDocument {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_document(), other.to_document()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for LazyDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell.state {
            LazyState::Decoded(document) => f.debug_tuple("LazyDocument").field(document).finish(),
            _ => write!(f, "LazyDocument({})", self.cell.state_name()),
        }
    }
}

/// Array decoded on first structural access.
#[derive(Clone)]
pub struct LazyArray {
    cell: LazyCell<Array>,
}

impl LazyArray {
    pub fn new(slice: RawSlice) -> LazyArray {
        LazyArray {
            cell: LazyCell::new(slice),
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<LazyArray, Error> {
        let slice = RawSlice::new(bytes);
        slice.check_container()?;
        Ok(LazyArray::new(slice))
    }

    pub fn is_materialized(&self) -> bool {
        self.cell.is_materialized()
    }

    pub fn is_disposed(&self) -> bool {
        self.cell.is_disposed()
    }

    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.cell.raw_bytes()
    }

    pub fn ensure_materialized(&mut self) -> Result<(), Error> {
        self.cell.materialize().map(|_| ())
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Array, Error> {
        self.cell.materialize()
    }

    pub fn len(&mut self) -> Result<usize, Error> {
        Ok(self.cell.materialize()?.len())
    }

    pub fn is_empty(&mut self) -> Result<bool, Error> {
        Ok(self.cell.materialize()?.is_empty())
    }

    pub fn get(&mut self, index: usize) -> Result<Option<&Value>, Error> {
        Ok(self.cell.materialize()?.get(index))
    }

    pub fn get_mut(&mut self, index: usize) -> Result<Option<&mut Value>, Error> {
        Ok(self.cell.materialize()?.get_mut(index))
    }

    pub fn iter(&mut self) -> Result<std::slice::Iter<'_, Value>, Error> {
        Ok(self.cell.materialize()?.iter())
    }

    pub fn push(&mut self, value: impl Into<Value>) -> Result<(), Error> {
        self.cell.materialize()?.push(value);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Option<Value>, Error> {
        Ok(self.cell.materialize()?.remove(index))
    }

    pub fn to_array(&self) -> Result<Array, Error> {
        self.cell.to_eager()
    }

    pub fn deep_clone(&self) -> Result<LazyArray, Error> {
        Ok(LazyArray {
            cell: self.cell.try_clone()?,
        })
    }

    pub fn dispose(&mut self) {
        self.cell.dispose();
    }

    pub(crate) fn write_to(&self, writer: &mut BsonWriter) -> Result<(), Error> {
        self.cell.write_to(writer)
    }
}

impl From<Array> for LazyArray {
    fn from(array: Array) -> Self {
        LazyArray {
            cell: LazyCell::decoded(array),
        }
    }
}

impl PartialEq for LazyArray {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_array(), other.to_array()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for LazyArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell.state {
            LazyState::Decoded(array) => f.debug_tuple("LazyArray").field(array).finish(),
            _ => write!(f, "LazyArray({})", self.cell.state_name()),
        }
    }
}
