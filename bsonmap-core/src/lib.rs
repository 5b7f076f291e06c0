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

//! # bsonmap core
//!
//! Runtime of the bsonmap object-document mapper. It maps Rust types to a
//! BSON-like binary document format through per-type [`ClassMap`]s.
//!
//! ## Pieces
//!
//! - [`Registry`] owns every class map, the discriminator registry, the
//!   subtype graph and the convention packs. Maps are built on first use.
//! - [`mapping`] holds the class map and property map model plus the
//!   conventions that fill in element names, ids and defaults.
//! - [`serializer`] holds the [`Serializer`] trait, its implementations for
//!   primitives and containers, and the class-map driven object codec.
//! - [`value`] is the in-memory document model, including lazily decoded
//!   documents and arrays.
//! - [`io`] reads and writes the binary format.
//!
//! ## Example
//!
//! ```rust, ignore
//! use bsonmap::{BsonObject, Registry};
//!
//! #[derive(BsonObject, Debug, PartialEq)]
//! struct Customer {
//!     #[bsonmap(id)]
//!     id: i32,
//!     name: String,
//! }
//!
//! let registry = Registry::default();
//! let customer = Customer { id: 1, name: "John".into() };
//! let bytes = registry.serialize(&customer)?;
//! assert_eq!(registry.deserialize::<Customer>(&bytes)?, customer);
//! ```
//!
//! Types are usually mapped with `#[derive(BsonObject)]`. Explicit maps are
//! registered with [`Registry::register_type`]:
//!
//! ```rust, ignore
//! registry.register_type::<Customer, _>(|map| {
//!     map.auto_map();
//!     map.member_mut("name").map(|m| m.set_element_name("Name").set_order(1));
//! })?;
//! ```
//!
//! ## Polymorphism
//!
//! Fields typed as a struct base or a `Box<dyn Trait>` are resolved through
//! the discriminator element (`_t` by default) written when the runtime type
//! differs from the declared one. See [`polymorphic!`].

pub mod buffer;
pub mod config;
pub mod error;
pub mod io;
pub mod mapping;
pub mod resolver;
pub mod serializer;
pub mod types;
pub mod value;

pub use paste;

pub use config::{Config, EncodeOptions};
pub use error::Error;
pub use mapping::{ClassMap, ClassMapBuilder, ClassMapped, ConventionPack, PropertyMap};
pub use resolver::{ReadContext, Registry, WriteContext};
pub use serializer::{AsAny, BsonDefault, DocumentWrapper, Serializer, ValueSerializer};
pub use types::{ElementType, TypeKey};
pub use value::{Array, Binary, Document, LazyArray, LazyDocument, ObjectId, Value};
