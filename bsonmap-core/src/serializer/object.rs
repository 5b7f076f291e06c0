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

//! Class-map driven encoding and decoding.
//!
//! `#[derive(BsonObject)]` forwards `Serializer` to [`write`] and [`read`];
//! `polymorphic!` forwards trait objects to [`write_polymorphic`] and
//! [`read_polymorphic`].

use std::any::Any;
use std::sync::Arc;

use crate::error::Error;
use crate::mapping::class_map::{ClassMap, ClassMapped};
use crate::mapping::property_map::PropertyMap;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::types::{ElementType, TypeKey};
use crate::value::codec;

pub fn write<T: ClassMapped>(value: &T, context: &mut WriteContext) -> Result<(), Error> {
    let map = context.registry().lookup::<T>()?;
    write_class(&map, value, TypeKey::of::<T>(), context)
}

pub fn read<T: ClassMapped>(context: &mut ReadContext) -> Result<T, Error> {
    let nominal = TypeKey::of::<T>();
    let map = context.registry().lookup::<T>()?;
    let value = read_with_nominal(context, nominal, Some(map))?;
    value.downcast::<T>().map(|value| *value).map_err(|_| {
        Error::incompatible_actual_type(format!("decoded value is not a {nominal}"))
    })
}

/// Encodes a value whose concrete type is only known at runtime.
pub fn write_polymorphic(
    context: &mut WriteContext,
    nominal: TypeKey,
    value: &dyn Any,
) -> Result<(), Error> {
    let registry = context.registry();
    let map = registry.lookup_by_type_id(value.type_id()).map_err(|err| match err {
        Error::Mapping(_) => Error::mapping(format!(
            "The runtime type of a {nominal} value has no class map; register it with \
             Registry::register_subtype"
        )),
        other => other,
    })?;
    if !registry.is_assignable(map.type_key(), nominal) {
        return Err(Error::incompatible_actual_type(format!(
            "Actual type {} is not assignable to expected type {nominal}",
            map.type_key()
        )));
    }
    write_class(&map, value, nominal, context)
}

/// Decodes a value of nominal type `nominal`, usually a `dyn Trait`.
///
/// The returned box holds whatever the registered upcast produced for
/// `nominal`, such as a `Box<dyn Trait>`.
pub fn read_polymorphic(context: &mut ReadContext, nominal: TypeKey) -> Result<Box<dyn Any>, Error> {
    if peek_discriminator(context)?.is_none() {
        return Err(Error::unknown_discriminator(format!(
            "Document has no discriminator to select a concrete type for {nominal}"
        )));
    }
    read_with_nominal(context, nominal, None)
}

fn read_with_nominal(
    context: &mut ReadContext,
    nominal: TypeKey,
    nominal_map: Option<Arc<ClassMap>>,
) -> Result<Box<dyn Any>, Error> {
    let registry = context.registry();
    let actual = match peek_discriminator(context)? {
        Some(discriminator) => registry.resolve_discriminator(nominal, &discriminator)?,
        None => nominal,
    };
    let map = match nominal_map {
        Some(map) if map.type_key() == actual => map,
        _ => registry.lookup_by_key(actual)?,
    };
    let value = read_class(&map, context)?;
    if actual == nominal {
        return Ok(value);
    }
    tracing::trace!(actual = actual.name(), nominal = nominal.name(), "converting decoded value");
    registry.upcast(value, actual, nominal)
}

/// Returns the discriminator of the document the reader is positioned on
/// without moving the reader.
pub fn peek_discriminator(context: &mut ReadContext) -> Result<Option<String>, Error> {
    let actual = context.reader.current_type()?;
    if actual != ElementType::Document {
        return Err(Error::type_mismatch(ElementType::Document, actual));
    }
    let element = context.registry().config().discriminator_element();
    let bookmark = context.reader.bookmark();
    let result = scan_for_element(context, element);
    context.reader.return_to_bookmark(bookmark);
    result
}

fn scan_for_element(context: &mut ReadContext, element: &str) -> Result<Option<String>, Error> {
    let reader = &mut *context.reader;
    reader.read_start_document()?;
    while let Some((element_type, name)) = reader.has_next_element()? {
        if name == element {
            if element_type != ElementType::String {
                return Err(Error::invalid_data(format!(
                    "discriminator element '{element}' must be a String, found {element_type:?}"
                )));
            }
            return reader.read_string().map(Some);
        }
        reader.skip_value()?;
    }
    Ok(None)
}

/// Encodes `value` as a document through `map`.
///
/// The discriminator is written when the map requires it or when the
/// runtime type differs from `nominal`.
pub fn write_class(
    map: &ClassMap,
    value: &dyn Any,
    nominal: TypeKey,
    context: &mut WriteContext,
) -> Result<(), Error> {
    context.inc_depth()?;
    context.take_representation();
    let result = write_members(map, value, nominal, context);
    context.dec_depth();
    result
}

fn write_members(
    map: &ClassMap,
    value: &dyn Any,
    nominal: TypeKey,
    context: &mut WriteContext,
) -> Result<(), Error> {
    context.writer.write_start_document()?;
    let id_first = if context.is_id_first() {
        map.id_member_index()
    } else {
        None
    };
    if let Some(index) = id_first {
        write_member(map, &map.all_members()[index], value, context)?;
    }
    if map.discriminator_is_required() || map.type_key() != nominal {
        let element = context.registry().config().discriminator_element();
        context.writer.write_name(element)?;
        context.writer.write_string(map.discriminator())?;
    }
    for (index, member) in map.all_members().iter().enumerate() {
        if Some(index) == id_first {
            continue;
        }
        if member.is_extra_elements() {
            let extra = member.extra_elements(value)?;
            for element in extra.iter() {
                context.writer.write_name(element.name())?;
                codec::write_value(context.writer, element.value())?;
            }
            continue;
        }
        write_member(map, member, value, context)?;
    }
    context.writer.write_end_document()
}

fn write_member(
    map: &ClassMap,
    member: &PropertyMap,
    instance: &dyn Any,
    context: &mut WriteContext,
) -> Result<(), Error> {
    let value = member.get_value(instance)?;
    if member.ignore_if_null() && member.is_null_value(value) {
        return Ok(());
    }
    if !member.serialize_default_value() && member.equals_default(value, context.registry())? {
        return Ok(());
    }
    context.writer.write_name(member.element_name())?;
    member.write_value(value, context).map_err(|err| match err {
        Error::EncodeError(s) => Error::encode_error(format!(
            "An error occurred while serializing the {} member of class {}: {s}",
            member.member_name(),
            map.type_key()
        )),
        other => other,
    })
}

/// Decodes the document the reader is positioned on into a new instance of
/// the map's type.
pub fn read_class(map: &ClassMap, context: &mut ReadContext) -> Result<Box<dyn Any>, Error> {
    map.check_decodable()?;
    context.inc_depth()?;
    context.take_representation();
    let result = read_members(map, context);
    context.dec_depth();
    result
}

fn read_members(map: &ClassMap, context: &mut ReadContext) -> Result<Box<dyn Any>, Error> {
    let actual = context.reader.current_type()?;
    if actual != ElementType::Document {
        return Err(Error::type_mismatch(ElementType::Document, actual));
    }
    let registry = context.registry();
    let discriminator_element = registry.config().discriminator_element();
    let class_name = map.type_key().name();
    let members = map.all_members();
    let mut instance = map.create_instance()?;
    let mut seen = vec![false; members.len()];

    context.reader.read_start_document()?;
    while let Some((_, name)) = context.reader.has_next_element()? {
        if name == discriminator_element {
            context.reader.skip_value()?;
            continue;
        }
        if let Some((index, member)) = map.member_for_element(&name) {
            let value = member
                .read_value(context)
                .map_err(|err| Error::enhance_member_error(err, member.member_name(), class_name))?;
            member.set_value(&mut *instance, value)?;
            seen[index] = true;
        } else if let Some(extra) = map.extra_elements_member() {
            let limit = context.depth_limit();
            let value = codec::read_value(context.reader, limit)?;
            extra.extra_elements_mut(&mut *instance)?.insert(name, value);
        } else if map.ignore_extra_elements() {
            context.reader.skip_value()?;
        } else {
            return Err(Error::unexpected_element(format!(
                "Element '{name}' does not match any field or property of class {class_name}"
            )));
        }
    }
    context.reader.read_end_document()?;

    let missing: Vec<&str> = members
        .iter()
        .zip(&seen)
        .filter(|(member, seen)| !**seen && member.is_required() && !member.is_extra_elements())
        .map(|(member, _)| member.element_name())
        .collect();
    if !missing.is_empty() {
        return Err(Error::required_element_missing(format!(
            "Required element{} {} for class {class_name} {} missing",
            if missing.len() == 1 { "" } else { "s" },
            missing
                .iter()
                .map(|name| format!("'{name}'"))
                .collect::<Vec<_>>()
                .join(", "),
            if missing.len() == 1 { "is" } else { "are" }
        )));
    }
    for (member, seen) in members.iter().zip(&seen) {
        if !*seen && !member.is_extra_elements() {
            member.apply_default_if_missing(&mut *instance, registry)?;
        }
    }
    Ok(instance)
}
