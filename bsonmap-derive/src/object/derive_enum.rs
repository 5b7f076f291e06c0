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
use quote::quote;
use syn::{DataEnum, DeriveInput, Fields};

use super::attrs::ContainerAttrs;

pub fn derive(ast: &DeriveInput, container: &ContainerAttrs, data: &DataEnum) -> syn::Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    if container.discriminator.is_some()
        || container.discriminator_required
        || container.ignore_extra_elements.is_some()
        || container.anonymous
        || !container.known_types.is_empty()
    {
        return Err(syn::Error::new_spanned(
            name,
            "enums only accept the `representation` attribute",
        ));
    }
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "BsonObject enums may only have unit variants",
            ));
        }
    }
    let default_variant = data
        .variants
        .iter()
        .find(|v| v.attrs.iter().any(|a| a.path().is_ident("default")))
        .or_else(|| data.variants.first())
        .map(|v| &v.ident)
        .ok_or_else(|| syn::Error::new_spanned(name, "BsonObject enums need at least one variant"))?;

    let representation = match &container.representation {
        None => quote! { Int32 },
        Some(lit) => match lit.value().to_ascii_lowercase().as_str() {
            "int32" => quote! { Int32 },
            "int64" => quote! { Int64 },
            "string" => quote! { String },
            other => {
                return Err(syn::Error::new_spanned(
                    lit,
                    format!("enums cannot be represented as '{other}'; use int32, int64 or string"),
                ))
            }
        },
    };

    let idents: Vec<_> = data.variants.iter().map(|v| &v.ident).collect();
    let names: Vec<String> = idents.iter().map(|i| i.to_string()).collect();
    let indexes: Vec<i32> = (0..idents.len() as i32).collect();
    let positions: Vec<usize> = (0..idents.len()).collect();
    let type_name = name.to_string();

    Ok(quote! {
        impl #impl_generics ::bsonmap_core::Serializer for #name #ty_generics #where_clause {
            fn bson_write(
                &self,
                context: &mut ::bsonmap_core::WriteContext,
            ) -> Result<(), ::bsonmap_core::Error> {
                let (index, name) = match self {
                    #( Self::#idents => (#indexes, #names), )*
                };
                ::bsonmap_core::serializer::enum_::write_variant(
                    context,
                    ::bsonmap_core::ElementType::#representation,
                    index,
                    name,
                )
            }

            fn bson_read(context: &mut ::bsonmap_core::ReadContext) -> Result<Self, ::bsonmap_core::Error> {
                const NAMES: &[&str] = &[#(#names),*];
                match ::bsonmap_core::serializer::enum_::read_variant(context, #type_name, NAMES)? {
                    #( #positions => Ok(Self::#idents), )*
                    index => Err(::bsonmap_core::Error::invalid_data(format!(
                        "{} is not a variant index of {}",
                        index, #type_name
                    ))),
                }
            }

            #[inline(always)]
            fn bson_is_default(&self) -> bool {
                matches!(self, Self::#default_variant)
            }

            #[inline(always)]
            fn bson_element_type() -> Option<::bsonmap_core::ElementType> {
                Some(::bsonmap_core::ElementType::#representation)
            }
        }

        impl #impl_generics ::bsonmap_core::BsonDefault for #name #ty_generics #where_clause {
            fn bson_default() -> Self {
                Self::#default_variant
            }
        }
    })
}
