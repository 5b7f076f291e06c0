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

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::Error;

/// Element name used for the document id.
pub const ID_ELEMENT: &str = "_id";

/// Default element name carrying the discriminator.
pub const DEFAULT_DISCRIMINATOR_ELEMENT: &str = "_t";

/// Generic binary subtype.
pub const BINARY_SUBTYPE_GENERIC: u8 = 0x00;

/// Type tag written in front of every element.
///
/// The same enum doubles as the representation option of a member: an `i64`
/// member with representation [`ElementType::String`] is written as a string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ElementType {
    EndOfDocument = 0x00,
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    ObjectId = 0x07,
    Boolean = 0x08,
    DateTime = 0x09,
    Null = 0x0A,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
}

impl ElementType {
    #[inline(always)]
    pub fn from_u8(tag: u8) -> Result<Self, Error> {
        ElementType::try_from(tag)
            .map_err(|_| Error::invalid_data(format!("unknown element type tag 0x{tag:02x}")))
    }

    /// Parses the representation names accepted by the derive attribute.
    pub fn from_representation_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "double" => Some(ElementType::Double),
            "string" => Some(ElementType::String),
            "int32" => Some(ElementType::Int32),
            "int64" => Some(ElementType::Int64),
            "objectid" | "object_id" => Some(ElementType::ObjectId),
            "boolean" | "bool" => Some(ElementType::Boolean),
            "datetime" | "date_time" => Some(ElementType::DateTime),
            "document" => Some(ElementType::Document),
            "array" => Some(ElementType::Array),
            "binary" => Some(ElementType::Binary),
            _ => None,
        }
    }
}

/// Identity of a Rust type inside the registry.
///
/// Works for unsized types too, so `TypeKey::of::<dyn Animal>()` can serve
/// as the nominal type of a polymorphic member.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline(always)]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, also used as the discriminator fallback.
    #[inline(always)]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment without generic arguments, e.g. `Dog` for `zoo::Dog<u8>`.
    pub fn short_name(&self) -> &'static str {
        let name = self.name;
        let base = match name.find('<') {
            Some(idx) => &name[..idx],
            None => name,
        };
        match base.rfind("::") {
            Some(idx) => &base[idx + 2..],
            None => base,
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
