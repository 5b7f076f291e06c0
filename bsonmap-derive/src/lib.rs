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

//! # bsonmap derive macros
//!
//! `#[derive(BsonObject)]` replaces runtime reflection: it declares a
//! type's members to the class-map builder and forwards the `Serializer`
//! impl to the class-map driven codec.
//!
//! ## Structs
//!
//! For a struct with named fields the macro implements `ClassMapped`,
//! `Serializer` and `BsonDefault`. Every field is mapped under its own name
//! unless a convention or an attribute says otherwise.
//!
//! ```rust, ignore
//! use bsonmap::{BsonObject, Document, ObjectId};
//!
//! #[derive(BsonObject, Debug, PartialEq)]
//! #[bsonmap(discriminator = "order", ignore_extra_elements = false)]
//! struct Order {
//!     #[bsonmap(id)]
//!     id: ObjectId,
//!     #[bsonmap(element = "Customer", order = 1)]
//!     customer: String,
//!     #[bsonmap(default = 1, serialize_default = false)]
//!     quantity: i32,
//!     #[bsonmap(representation = "string")]
//!     total: i64,
//!     #[bsonmap(extra_elements)]
//!     extra: Document,
//!     #[bsonmap(ignore)]
//!     cache: Vec<u8>,
//! }
//! ```
//!
//! Struct attributes: `discriminator = "..."`, `discriminator_required`,
//! `ignore_extra_elements = bool`, `anonymous`, `known_types(A, B)`.
//!
//! Field attributes: `element = "..."`, `order = N`, `id`, `extra_elements`,
//! `ignore`, `ignore_if_null`, `required`, `default = expr`,
//! `serialize_default = bool`, `ignore_if_default`, `representation = "..."`,
//! `base`, `read_only`.
//!
//! A field marked `base` embeds the base type: its members are inherited
//! and the derived type can be decoded where the base type is expected.
//!
//! ## Enums
//!
//! Unit enums are written as their variant index (Int32), or as the variant
//! name with `#[bsonmap(representation = "string")]`. The zero value is the
//! variant marked `#[default]` (which needs `#[derive(Default)]` alongside),
//! else the first variant.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod object;

/// Derives `ClassMapped`, `Serializer` and `BsonDefault`.
///
/// See the crate documentation for the supported attributes.
#[proc_macro_derive(BsonObject, attributes(bsonmap))]
pub fn proc_macro_derive_bson_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    object::derive_serializer(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
