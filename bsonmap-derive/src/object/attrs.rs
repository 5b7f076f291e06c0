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

//! Parsing of `#[bsonmap(...)]` attributes.

use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, LitBool, LitInt, LitStr, Path, Token};

/// Attributes on the struct or enum itself.
#[derive(Default)]
pub struct ContainerAttrs {
    pub discriminator: Option<LitStr>,
    pub discriminator_required: bool,
    pub ignore_extra_elements: Option<bool>,
    pub anonymous: bool,
    pub known_types: Vec<Path>,
    /// Enums only.
    pub representation: Option<LitStr>,
}

/// Attributes on one field.
#[derive(Default)]
pub struct FieldAttrs {
    pub element: Option<LitStr>,
    pub order: Option<i32>,
    pub id: bool,
    pub extra_elements: bool,
    pub ignore: bool,
    pub ignore_if_null: bool,
    pub required: bool,
    pub default: Option<Expr>,
    pub serialize_default: Option<bool>,
    pub ignore_if_default: bool,
    pub representation: Option<LitStr>,
    pub base: bool,
    pub read_only: bool,
}

fn bsonmap_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("bsonmap"))
}

/// A standalone flag counts as `true`.
fn parse_bool_or_flag(meta: &ParseNestedMeta) -> syn::Result<bool> {
    if meta.input.is_empty() || meta.input.peek(Token![,]) {
        Ok(true)
    } else {
        let lit: LitBool = meta.value()?.parse()?;
        Ok(lit.value)
    }
}

pub fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut parsed = ContainerAttrs::default();
    for attr in bsonmap_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("discriminator") {
                parsed.discriminator = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("discriminator_required") {
                parsed.discriminator_required = parse_bool_or_flag(&meta)?;
            } else if meta.path.is_ident("ignore_extra_elements") {
                parsed.ignore_extra_elements = Some(parse_bool_or_flag(&meta)?);
            } else if meta.path.is_ident("anonymous") {
                parsed.anonymous = parse_bool_or_flag(&meta)?;
            } else if meta.path.is_ident("known_types") {
                meta.parse_nested_meta(|known| {
                    parsed.known_types.push(known.path);
                    Ok(())
                })?;
            } else if meta.path.is_ident("representation") {
                parsed.representation = Some(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unsupported bsonmap attribute"));
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

pub fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();
    for attr in bsonmap_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("element") {
                parsed.element = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("order") {
                let lit: LitInt = meta.value()?.parse()?;
                parsed.order = Some(lit.base10_parse()?);
            } else if meta.path.is_ident("id") {
                parsed.id = parse_bool_or_flag(&meta)?;
            } else if meta.path.is_ident("extra_elements") {
                parsed.extra_elements = parse_bool_or_flag(&meta)?;
            } else if meta.path.is_ident("ignore") {
                parsed.ignore = parse_bool_or_flag(&meta)?;
            } else if meta.path.is_ident("ignore_if_null") {
                parsed.ignore_if_null = parse_bool_or_flag(&meta)?;
            } else if meta.path.is_ident("required") {
                parsed.required = parse_bool_or_flag(&meta)?;
            } else if meta.path.is_ident("default") {
                parsed.default = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("serialize_default") {
                parsed.serialize_default = Some(parse_bool_or_flag(&meta)?);
            } else if meta.path.is_ident("ignore_if_default") {
                parsed.ignore_if_default = parse_bool_or_flag(&meta)?;
            } else if meta.path.is_ident("representation") {
                parsed.representation = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("base") {
                parsed.base = parse_bool_or_flag(&meta)?;
            } else if meta.path.is_ident("read_only") {
                parsed.read_only = parse_bool_or_flag(&meta)?;
            } else {
                return Err(meta.error("unsupported bsonmap field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}
