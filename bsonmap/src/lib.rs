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

//! # bsonmap
//!
//! Object-document mapping between Rust types and a BSON-like binary
//! document format.
//!
//! Types are described by class maps: which members are encoded, under
//! which element names, in what order, with which defaults, and how
//! polymorphic values are told apart on decode. Maps come from
//! `#[derive(BsonObject)]`, from explicit [`Registry::register_type`] calls,
//! and from convention packs that fill in whatever was not set explicitly.
//!
//! ```rust, ignore
//! use bsonmap::{BsonObject, Registry};
//!
//! #[derive(BsonObject, Debug, PartialEq)]
//! struct OrderDetails {
//!     quantity: i32,
//!     product: String,
//! }
//!
//! #[derive(BsonObject, Debug, PartialEq)]
//! struct Customer {
//!     #[bsonmap(id)]
//!     id: i32,
//!     name: String,
//!     orders: Vec<OrderDetails>,
//! }
//!
//! let registry = Registry::default();
//! let document = registry.to_document(&customer)?;
//! let decoded: Customer = registry.from_document(&document)?;
//! ```
//!
//! The generated code refers to `bsonmap_core`, so depend on both crates.

pub use bsonmap_core::{
    doc, error::Error, mapping, polymorphic, serializer::DocumentWrapper, value, AsAny, ClassMap,
    ClassMapBuilder, ClassMapped, Config, ConventionPack, Document, EncodeOptions, ElementType,
    ObjectId, Registry, Serializer, TypeKey, Value,
};
pub use bsonmap_derive::BsonObject;
