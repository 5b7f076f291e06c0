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

use proc_macro2::TokenStream;
use syn::{Data, DeriveInput, Fields};

mod attrs;
mod derive_enum;
mod derive_struct;

pub fn derive_serializer(ast: &DeriveInput) -> syn::Result<TokenStream> {
    let container = attrs::parse_container_attrs(&ast.attrs)?;
    match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => derive_struct::derive(ast, &container, fields),
            Fields::Unit => derive_struct::derive_unit(ast, &container),
            Fields::Unnamed(_) => Err(syn::Error::new_spanned(
                &ast.ident,
                "BsonObject cannot be derived for tuple structs; use named fields",
            )),
        },
        Data::Enum(data) => derive_enum::derive(ast, &container, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast.ident,
            "BsonObject cannot be derived for unions",
        )),
    }
}
