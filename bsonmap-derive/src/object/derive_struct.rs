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
use syn::ext::IdentExt;
use syn::{DeriveInput, Field, FieldsNamed};

use super::attrs::{parse_field_attrs, ContainerAttrs, FieldAttrs};

pub fn derive(ast: &DeriveInput, container: &ContainerAttrs, fields: &FieldsNamed) -> syn::Result<TokenStream> {
    let fields: Vec<&Field> = fields.named.iter().collect();
    expand(ast, container, &fields)
}

pub fn derive_unit(ast: &DeriveInput, container: &ContainerAttrs) -> syn::Result<TokenStream> {
    expand(ast, container, &[])
}

fn expand(ast: &DeriveInput, container: &ContainerAttrs, fields: &[&Field]) -> syn::Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    if let Some(representation) = &container.representation {
        return Err(syn::Error::new_spanned(
            representation,
            "`representation` on a struct must be placed on a field",
        ));
    }

    let class_settings = gen_class_settings(container);
    let mut declarations = Vec::with_capacity(fields.len());
    let mut defaults = Vec::with_capacity(fields.len());
    let mut has_base = false;
    for field in fields {
        let Some(ident) = &field.ident else {
            continue;
        };
        let ty = &field.ty;
        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.ignore {
            defaults.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }
        defaults.push(quote! { #ident: <#ty as ::bsonmap_core::BsonDefault>::bson_default() });
        if attrs.base {
            if has_base {
                return Err(syn::Error::new_spanned(ident, "only one field can be marked `base`"));
            }
            has_base = true;
            declarations.push(quote! {
                map.set_base::<#ty>(
                    |value| &value.#ident,
                    |value| &mut value.#ident,
                    |value| value.#ident,
                );
            });
            continue;
        }
        declarations.push(gen_member(ident, ty, &attrs));
    }

    Ok(quote! {
        impl #impl_generics ::bsonmap_core::ClassMapped for #name #ty_generics #where_clause {
            fn declare(
                map: &mut ::bsonmap_core::ClassMapBuilder<Self>,
            ) -> Result<(), ::bsonmap_core::Error> {
                #(#class_settings)*
                #(#declarations)*
                Ok(())
            }

            fn create_instance() -> Option<Self> {
                Some(<Self as ::bsonmap_core::BsonDefault>::bson_default())
            }
        }

        impl #impl_generics ::bsonmap_core::Serializer for #name #ty_generics #where_clause {
            #[inline(always)]
            fn bson_write(
                &self,
                context: &mut ::bsonmap_core::WriteContext,
            ) -> Result<(), ::bsonmap_core::Error> {
                ::bsonmap_core::serializer::object::write::<Self>(self, context)
            }

            #[inline(always)]
            fn bson_read(context: &mut ::bsonmap_core::ReadContext) -> Result<Self, ::bsonmap_core::Error> {
                ::bsonmap_core::serializer::object::read::<Self>(context)
            }

            #[inline(always)]
            fn bson_element_type() -> Option<::bsonmap_core::ElementType> {
                Some(::bsonmap_core::ElementType::Document)
            }
        }

        impl #impl_generics ::bsonmap_core::BsonDefault for #name #ty_generics #where_clause {
            fn bson_default() -> Self {
                Self {
                    #(#defaults),*
                }
            }
        }
    })
}

fn gen_class_settings(container: &ContainerAttrs) -> Vec<TokenStream> {
    let mut settings = Vec::new();
    if let Some(discriminator) = &container.discriminator {
        settings.push(quote! { map.set_discriminator(#discriminator); });
    }
    if container.discriminator_required {
        settings.push(quote! { map.set_discriminator_is_required(true); });
    }
    if let Some(ignore) = container.ignore_extra_elements {
        settings.push(quote! { map.set_ignore_extra_elements(#ignore); });
    }
    if container.anonymous {
        settings.push(quote! { map.set_is_anonymous(true); });
    }
    for known in &container.known_types {
        settings.push(quote! { map.add_known_type::<#known>(); });
    }
    settings
}

fn gen_member(ident: &syn::Ident, ty: &syn::Type, attrs: &FieldAttrs) -> TokenStream {
    let member_name = ident.unraw().to_string();
    let bind = if attrs.read_only {
        quote! { map.map_read_only_member::<#ty>(#member_name, |value| &value.#ident) }
    } else {
        quote! {
            map.map_member::<#ty>(#member_name, |value| &value.#ident, |value| &mut value.#ident)
        }
    };

    let mut setters = Vec::new();
    if let Some(element) = &attrs.element {
        setters.push(quote! { member.set_element_name(#element); });
    }
    if let Some(order) = attrs.order {
        setters.push(quote! { member.set_order(#order); });
    }
    if attrs.id {
        setters.push(quote! { member.set_is_id(true); });
    }
    if attrs.extra_elements {
        setters.push(quote! { member.set_is_extra_elements(true); });
    }
    if attrs.ignore_if_null {
        setters.push(quote! { member.set_ignore_if_null(true); });
    }
    if attrs.required {
        setters.push(quote! { member.set_is_required(true); });
    }
    match (&attrs.default, attrs.ignore_if_default, attrs.serialize_default) {
        (Some(default), ignore_if_default, serialize_default) => {
            let serialize = !ignore_if_default && serialize_default.unwrap_or(true);
            setters.push(quote! { member.set_default_value(#default, #serialize); });
        }
        (None, true, _) => {
            setters.push(quote! { member.set_serialize_default_value(false); });
        }
        (None, false, Some(serialize)) => {
            setters.push(quote! { member.set_serialize_default_value(#serialize); });
        }
        (None, false, None) => {}
    }
    if let Some(representation) = &attrs.representation {
        setters.push(quote! {
            member.set_representation(
                ::bsonmap_core::ElementType::from_representation_name(#representation).ok_or_else(
                    || ::bsonmap_core::Error::mapping(format!(
                        "unknown representation '{}' on member {}",
                        #representation, #member_name
                    )),
                )?,
            );
        });
    }

    quote! {
        {
            #[allow(unused_mut, unused_variables)]
            let mut member = #bind;
            #(#setters)*
        }
    }
}
