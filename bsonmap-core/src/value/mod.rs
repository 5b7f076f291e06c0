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

//! In-memory document model.
//!
//! [`Value`] covers every element type of the wire format. Nested containers
//! are either eager ([`Document`], [`Array`]) or lazy ([`LazyDocument`],
//! [`LazyArray`]); equality treats the two forms as interchangeable.

mod array;
pub mod codec;
mod document;
pub mod lazy;
mod object_id;

use chrono::{DateTime, Utc};

pub use array::Array;
pub use document::{Document, Element};
pub use lazy::{ByteBuffer, LazyArray, LazyDocument, RawSlice};
pub use object_id::ObjectId;

use crate::error::Error;
use crate::types::{ElementType, BINARY_SUBTYPE_GENERIC};

/// Binary payload with its subtype byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binary {
    pub subtype: u8,
    pub bytes: Vec<u8>,
}

impl Binary {
    pub fn new(bytes: Vec<u8>) -> Binary {
        Binary {
            subtype: BINARY_SUBTYPE_GENERIC,
            bytes,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    Double(f64),
    String(String),
    Document(Document),
    Array(Array),
    Binary(Binary),
    ObjectId(ObjectId),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Null,
    Int32(i32),
    Timestamp(u64),
    Int64(i64),
    LazyDocument(LazyDocument),
    LazyArray(LazyArray),
}

impl Value {
    pub fn element_type(&self) -> ElementType {
        match self {
            Value::Double(_) => ElementType::Double,
            Value::String(_) => ElementType::String,
            Value::Document(_) | Value::LazyDocument(_) => ElementType::Document,
            Value::Array(_) | Value::LazyArray(_) => ElementType::Array,
            Value::Binary(_) => ElementType::Binary,
            Value::ObjectId(_) => ElementType::ObjectId,
            Value::Boolean(_) => ElementType::Boolean,
            Value::DateTime(_) => ElementType::DateTime,
            Value::Null => ElementType::Null,
            Value::Int32(_) => ElementType::Int32,
            Value::Timestamp(_) => ElementType::Timestamp,
            Value::Int64(_) => ElementType::Int64,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Int32 values widen to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Value::ObjectId(id) => Some(*id),
            _ => None,
        }
    }

    /// Copy with every lazy container replaced by its eager equivalent.
    pub fn to_eager(&self) -> Result<Value, Error> {
        Ok(match self {
            Value::LazyDocument(lazy) => Value::Document(lazy.to_document()?),
            Value::LazyArray(lazy) => Value::Array(lazy.to_array()?),
            Value::Document(doc) => Value::Document(doc.to_eager()?),
            Value::Array(array) => Value::Array(array.to_eager()?),
            other => other.clone(),
        })
    }

    /// Equality that also matches numbers of different widths by value.
    ///
    /// Used when comparing a member against a configured default, where an
    /// `i64` member may carry an Int32 default. Integers compare exactly; an
    /// integer equals a Double only when it converts to it without loss.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (Number::of(self), Number::of(other)) {
            (Some(a), Some(b)) => a.same_value(b),
            _ => self == other,
        }
    }

    /// Releases lazy children held anywhere inside this value.
    pub(crate) fn dispose_lazy(&mut self) {
        match self {
            Value::LazyDocument(lazy) => lazy.dispose(),
            Value::LazyArray(lazy) => lazy.dispose(),
            Value::Document(doc) => doc.dispose_lazy(),
            Value::Array(array) => array.dispose_lazy(),
            _ => {}
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Option<Number> {
        match value {
            Value::Int32(v) => Some(Number::Integer(i64::from(*v))),
            Value::Int64(v) => Some(Number::Integer(*v)),
            Value::Double(v) => Some(Number::Float(*v)),
            _ => None,
        }
    }

    fn same_value(self, other: Number) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b,
            (Number::Integer(i), Number::Float(f)) | (Number::Float(f), Number::Integer(i)) => {
                exact_f64(i) == Some(f)
            }
        }
    }
}

/// 2^63, the smallest `f64` above `i64::MAX`.
const I64_END: f64 = 9_223_372_036_854_775_808.0;

/// `value` as an `f64`, or `None` when the conversion would round.
pub(crate) fn exact_f64(value: i64) -> Option<f64> {
    let float = value as f64;
    (float < I64_END && float as i64 == value).then_some(float)
}

/// `value` as an `i64`, or `None` unless it is a whole number in range.
pub(crate) fn exact_i64(value: f64) -> Option<i64> {
    (value.fract() == 0.0 && value >= -I64_END && value < I64_END).then(|| value as i64)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::ObjectId(a), Value::ObjectId(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::LazyDocument(a), Value::LazyDocument(b)) => a == b,
            (Value::LazyArray(a), Value::LazyArray(b)) => a == b,
            (Value::LazyDocument(lazy), Value::Document(doc))
            | (Value::Document(doc), Value::LazyDocument(lazy)) => {
                lazy.to_document().map_or(false, |d| &d == doc)
            }
            (Value::LazyArray(lazy), Value::Array(array))
            | (Value::Array(array), Value::LazyArray(lazy)) => {
                lazy.to_array().map_or(false, |a| &a == array)
            }
            _ => false,
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_for_value!(
    f64 => Double,
    String => String,
    Document => Document,
    Array => Array,
    Binary => Binary,
    ObjectId => ObjectId,
    bool => Boolean,
    DateTime<Utc> => DateTime,
    i32 => Int32,
    i64 => Int64,
    LazyDocument => LazyDocument,
    LazyArray => LazyArray,
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

/// Builds a [`Document`] from `name => value` pairs, keeping their order.
///
/// ```
/// use bsonmap_core::doc;
///
/// let order = doc! { "Customer" => "John", "Total" => 12 };
/// assert_eq!(order.len(), 2);
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::value::Document::new()
    };
    ( $( $name:expr => $value:expr ),+ $(,)? ) => {{
        let mut document = $crate::value::Document::new();
        $( document.insert($name, $value); )+
        document
    }};
}
