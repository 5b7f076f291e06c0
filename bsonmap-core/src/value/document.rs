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

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::Error;
use crate::io::{BsonReader, BsonWriter};
use crate::value::codec::{self, DepthLimit};
use crate::value::Value;

/// A named value inside a [`Document`].
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    name: String,
    value: Value,
}

impl Element {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Element {
        Element {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.name, self.value)
    }
}

/// Ordered collection of named values.
///
/// Lookups by name are linear; documents mapped from types are small and
/// keeping insertion order matters more than lookup speed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    pub fn new() -> Document {
        Document::default()
    }

    pub fn with_capacity(capacity: usize) -> Document {
        Document {
            elements: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.elements
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.elements
            .iter_mut()
            .find(|e| e.name == name)
            .map(|e| &mut e.value)
    }

    pub fn get_index(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.elements.iter().any(|e| e.name == name)
    }

    /// Replaces the value of an existing element in place, or appends a new one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.elements.iter_mut().find(|e| e.name == name) {
            Some(element) => Some(std::mem::replace(&mut element.value, value)),
            None => {
                self.elements.push(Element { name, value });
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.elements.iter().position(|e| e.name == name)?;
        Some(self.elements.remove(index).value)
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Element> {
        self.elements.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|e| e.name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.elements.iter().map(|e| &e.value)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut writer = BsonWriter::new();
        codec::write_document(&mut writer, self)?;
        writer.into_bytes()
    }

    /// Decodes a document eagerly, nested containers included.
    ///
    /// Nesting is limited to [`DEFAULT_MAX_DEPTH`] levels.
    pub fn from_bytes(bytes: &[u8]) -> Result<Document, Error> {
        Document::from_bytes_with_max_depth(bytes, DEFAULT_MAX_DEPTH)
    }

    pub fn from_bytes_with_max_depth(bytes: &[u8], max_depth: u32) -> Result<Document, Error> {
        let mut reader = BsonReader::new(bytes);
        let document = codec::read_document(&mut reader, DepthLimit::new(max_depth))?;
        if !reader.is_done() || reader.position() != bytes.len() {
            return Err(Error::invalid_data(format!(
                "{} trailing bytes after document",
                bytes.len() - reader.position()
            )));
        }
        Ok(document)
    }

    pub fn to_eager(&self) -> Result<Document, Error> {
        self.elements
            .iter()
            .map(|e| Ok(Element::new(e.name.clone(), e.value.to_eager()?)))
            .collect::<Result<Vec<_>, Error>>()
            .map(|elements| Document { elements })
    }

    pub(crate) fn dispose_lazy(&mut self) {
        for element in &mut self.elements {
            element.value.dispose_lazy();
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut document = Document::new();
        for (name, value) in iter {
            document.insert(name, value);
        }
        document
    }
}

impl IntoIterator for Document {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
