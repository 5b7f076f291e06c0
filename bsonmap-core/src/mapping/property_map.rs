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

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::io::{BsonReader, BsonWriter};
use crate::mapping::class_map::BaseProjection;
use crate::mapping::id_generator::IdGenerator;
use crate::mapping::Slot;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::registry::Registry;
use crate::serializer::{BsonDefault, ErasedSerializer, Serializer, TypedCodec};
use crate::types::{ElementType, TypeKey};
use crate::value::{Document, Value};

/// Value a member takes when its element is missing, and the value it is
/// compared against when defaults are not serialized.
#[derive(Clone, Debug, PartialEq)]
pub enum DefaultValue {
    /// The member type's [`BsonDefault`].
    TypeDefault,
    /// A concrete value, converted to the member type when applied.
    Value(Value),
}

/// Reads and writes one member of an erased instance.
pub(crate) trait MemberAccess: Send + Sync {
    fn get<'a>(&self, target: &'a dyn Any) -> Option<&'a dyn Any>;

    fn get_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Any>;

    /// Assigns a value previously produced by the member's codec.
    fn set(&self, target: &mut dyn Any, value: Box<dyn Any>) -> Result<(), Error>;

    /// Assigns the member type's [`BsonDefault`].
    fn reset(&self, target: &mut dyn Any) -> Result<(), Error>;

    fn is_writable(&self) -> bool;
}

struct FieldAccess<T, F> {
    getter: fn(&T) -> &F,
    setter: Option<fn(&mut T) -> &mut F>,
}

impl<T: 'static, F: BsonDefault + 'static> FieldAccess<T, F> {
    fn slot<'a>(&self, target: &'a mut dyn Any) -> Result<&'a mut F, Error> {
        let setter = self.setter.ok_or_else(|| {
            Error::unsupported_type_for_decode(format!(
                "member of type {} on {} is read-only",
                std::any::type_name::<F>(),
                std::any::type_name::<T>()
            ))
        })?;
        let target = target.downcast_mut::<T>().ok_or_else(|| {
            Error::unknown(format!("instance is not a {}", std::any::type_name::<T>()))
        })?;
        Ok(setter(target))
    }
}

impl<T: 'static, F: BsonDefault + 'static> MemberAccess for FieldAccess<T, F> {
    fn get<'a>(&self, target: &'a dyn Any) -> Option<&'a dyn Any> {
        let target = target.downcast_ref::<T>()?;
        Some((self.getter)(target) as &dyn Any)
    }

    fn get_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let setter = self.setter?;
        let target = target.downcast_mut::<T>()?;
        Some(setter(target) as &mut dyn Any)
    }

    fn set(&self, target: &mut dyn Any, value: Box<dyn Any>) -> Result<(), Error> {
        let value = value.downcast::<F>().map_err(|_| {
            Error::unknown(format!("decoded value is not a {}", std::any::type_name::<F>()))
        })?;
        *self.slot(target)? = *value;
        Ok(())
    }

    fn reset(&self, target: &mut dyn Any) -> Result<(), Error> {
        *self.slot(target)? = F::bson_default();
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.setter.is_some()
    }
}

/// Reaches a base member through the embedded base value of a derived type.
struct ProjectedAccess {
    base: Arc<dyn BaseProjection>,
    inner: Arc<dyn MemberAccess>,
}

impl ProjectedAccess {
    fn base_mut<'a>(&self, target: &'a mut dyn Any) -> Result<&'a mut dyn Any, Error> {
        self.base
            .project_mut(target)
            .ok_or_else(|| Error::unknown("instance does not embed the expected base value"))
    }
}

impl MemberAccess for ProjectedAccess {
    fn get<'a>(&self, target: &'a dyn Any) -> Option<&'a dyn Any> {
        self.inner.get(self.base.project(target)?)
    }

    fn get_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        self.inner.get_mut(self.base.project_mut(target)?)
    }

    fn set(&self, target: &mut dyn Any, value: Box<dyn Any>) -> Result<(), Error> {
        self.inner.set(self.base_mut(target)?, value)
    }

    fn reset(&self, target: &mut dyn Any) -> Result<(), Error> {
        self.inner.reset(self.base_mut(target)?)
    }

    fn is_writable(&self) -> bool {
        self.inner.is_writable()
    }
}

/// Mapping of one member to one element.
///
/// Every setting sits in a slot with an "explicitly set" bit. The `set_*`
/// methods mark the slot explicit; the `fill_*` methods used by conventions
/// leave explicit slots untouched.
#[derive(Clone)]
pub struct PropertyMap {
    member_name: String,
    member_type: TypeKey,
    declaring_type: TypeKey,
    member_element_type: Option<ElementType>,
    element_name: Slot<String>,
    order: Slot<Option<i32>>,
    default_value: Slot<Option<DefaultValue>>,
    serialize_default_value: Slot<bool>,
    ignore_if_null: Slot<bool>,
    is_required: Slot<bool>,
    is_id: Slot<bool>,
    is_extra_elements: Slot<bool>,
    representation: Slot<Option<ElementType>>,
    id_generator: Slot<Option<Arc<dyn IdGenerator>>>,
    serializer: Option<Arc<dyn ErasedSerializer>>,
    codec: Arc<dyn ErasedSerializer>,
    access: Arc<dyn MemberAccess>,
}

impl PropertyMap {
    /// Binds a member through a getter and an optional mutable getter.
    ///
    /// Without `get_mut` the member is read-only: it encodes normally but
    /// decoding the owning type fails with `UnsupportedTypeForDecode`.
    pub fn bind<T, F>(
        name: &str,
        get: fn(&T) -> &F,
        get_mut: Option<fn(&mut T) -> &mut F>,
    ) -> PropertyMap
    where
        T: 'static,
        F: Serializer + BsonDefault,
    {
        PropertyMap {
            member_name: name.to_string(),
            member_type: TypeKey::of::<F>(),
            declaring_type: TypeKey::of::<T>(),
            member_element_type: F::bson_element_type(),
            element_name: Slot::new(String::new()),
            order: Slot::new(None),
            default_value: Slot::new(None),
            serialize_default_value: Slot::new(true),
            ignore_if_null: Slot::new(false),
            is_required: Slot::new(false),
            is_id: Slot::new(false),
            is_extra_elements: Slot::new(false),
            representation: Slot::new(None),
            id_generator: Slot::new(None),
            serializer: None,
            codec: Arc::new(TypedCodec::<F>::new()),
            access: Arc::new(FieldAccess {
                getter: get,
                setter: get_mut,
            }),
        }
    }

    #[inline(always)]
    pub fn member_name(&self) -> &str {
        &self.member_name
    }

    #[inline(always)]
    pub fn member_type(&self) -> TypeKey {
        self.member_type
    }

    #[inline(always)]
    pub fn declaring_type(&self) -> TypeKey {
        self.declaring_type
    }

    /// Element type the member type writes without a representation.
    pub fn member_element_type(&self) -> Option<ElementType> {
        self.member_element_type
    }

    #[inline(always)]
    pub fn element_name(&self) -> &str {
        self.element_name.get()
    }

    pub fn order(&self) -> Option<i32> {
        *self.order.get()
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default_value.get().as_ref()
    }

    pub fn serialize_default_value(&self) -> bool {
        *self.serialize_default_value.get()
    }

    pub fn ignore_if_null(&self) -> bool {
        *self.ignore_if_null.get()
    }

    pub fn is_required(&self) -> bool {
        *self.is_required.get()
    }

    pub fn is_id(&self) -> bool {
        *self.is_id.get()
    }

    pub fn is_extra_elements(&self) -> bool {
        *self.is_extra_elements.get()
    }

    pub fn representation(&self) -> Option<ElementType> {
        *self.representation.get()
    }

    pub fn id_generator(&self) -> Option<&Arc<dyn IdGenerator>> {
        self.id_generator.get().as_ref()
    }

    pub fn has_serializer_override(&self) -> bool {
        self.serializer.is_some()
    }

    pub fn is_read_only(&self) -> bool {
        !self.access.is_writable()
    }

    pub fn is_element_name_explicit(&self) -> bool {
        self.element_name.is_explicit()
    }

    pub fn is_id_explicit(&self) -> bool {
        self.is_id.is_explicit()
    }

    pub fn is_extra_elements_explicit(&self) -> bool {
        self.is_extra_elements.is_explicit()
    }

    pub fn set_element_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.element_name.set(name.into());
        self
    }

    pub fn set_order(&mut self, order: i32) -> &mut Self {
        self.order.set(Some(order));
        self
    }

    /// Sets the default and whether a value equal to it is still written.
    pub fn set_default_value(
        &mut self,
        value: impl Into<Value>,
        serialize_default_value: bool,
    ) -> &mut Self {
        self.default_value.set(Some(DefaultValue::Value(value.into())));
        self.serialize_default_value.set(serialize_default_value);
        self
    }

    /// Uses the member type's zero value as the default.
    pub fn set_type_default_value(&mut self) -> &mut Self {
        self.default_value.set(Some(DefaultValue::TypeDefault));
        self
    }

    pub fn set_serialize_default_value(&mut self, serialize: bool) -> &mut Self {
        self.serialize_default_value.set(serialize);
        self
    }

    pub fn set_ignore_if_null(&mut self, ignore: bool) -> &mut Self {
        self.ignore_if_null.set(ignore);
        self
    }

    pub fn set_is_required(&mut self, required: bool) -> &mut Self {
        self.is_required.set(required);
        self
    }

    pub fn set_is_id(&mut self, is_id: bool) -> &mut Self {
        self.is_id.set(is_id);
        self
    }

    pub fn set_is_extra_elements(&mut self, is_extra: bool) -> &mut Self {
        self.is_extra_elements.set(is_extra);
        self
    }

    pub fn set_representation(&mut self, representation: ElementType) -> &mut Self {
        self.representation.set(Some(representation));
        self
    }

    pub fn set_id_generator(&mut self, generator: impl IdGenerator + 'static) -> &mut Self {
        self.id_generator.set(Some(Arc::new(generator)));
        self
    }

    pub fn fill_element_name(&mut self, name: impl Into<String>) -> bool {
        self.element_name.fill(name.into())
    }

    pub fn fill_default_value(&mut self, value: DefaultValue) -> bool {
        self.default_value.fill(Some(value))
    }

    pub fn fill_serialize_default_value(&mut self, serialize: bool) -> bool {
        self.serialize_default_value.fill(serialize)
    }

    pub fn fill_ignore_if_null(&mut self, ignore: bool) -> bool {
        self.ignore_if_null.fill(ignore)
    }

    pub fn fill_is_id(&mut self, is_id: bool) -> bool {
        self.is_id.fill(is_id)
    }

    pub fn fill_is_extra_elements(&mut self, is_extra: bool) -> bool {
        self.is_extra_elements.fill(is_extra)
    }

    pub fn fill_representation(&mut self, representation: ElementType) -> bool {
        self.representation.fill(Some(representation))
    }

    pub fn fill_id_generator(&mut self, generator: Arc<dyn IdGenerator>) -> bool {
        self.id_generator.fill(Some(generator))
    }

    pub(crate) fn set_serializer_codec(&mut self, codec: Arc<dyn ErasedSerializer>) {
        self.serializer = Some(codec);
    }

    /// Copy of a base member reachable through the derived type's embedded base.
    pub(crate) fn project(&self, base: Arc<dyn BaseProjection>) -> PropertyMap {
        let mut projected = self.clone();
        projected.access = Arc::new(ProjectedAccess {
            base,
            inner: self.access.clone(),
        });
        projected
    }

    #[inline(always)]
    fn active_codec(&self) -> &dyn ErasedSerializer {
        self.serializer.as_deref().unwrap_or(&*self.codec)
    }

    pub(crate) fn get_value<'a>(&self, target: &'a dyn Any) -> Result<&'a dyn Any, Error> {
        self.access.get(target).ok_or_else(|| {
            Error::unknown(format!(
                "instance is not a {} when reading member {}",
                self.declaring_type, self.member_name
            ))
        })
    }

    pub(crate) fn set_value(&self, target: &mut dyn Any, value: Box<dyn Any>) -> Result<(), Error> {
        self.access.set(target, value)
    }

    pub(crate) fn is_null_value(&self, value: &dyn Any) -> bool {
        self.codec.is_null_any(value)
    }

    pub(crate) fn write_value(
        &self,
        value: &dyn Any,
        context: &mut WriteContext,
    ) -> Result<(), Error> {
        context.set_representation(self.representation());
        let result = self.active_codec().write_any(value, context);
        context.set_representation(None);
        result
    }

    pub(crate) fn read_value(&self, context: &mut ReadContext) -> Result<Box<dyn Any>, Error> {
        context.set_representation(self.representation());
        let result = self.active_codec().read_any(context);
        context.set_representation(None);
        result
    }

    /// True when `value` matches the configured default, or the type's zero
    /// value if no default is configured.
    pub(crate) fn equals_default(&self, value: &dyn Any, registry: &Registry) -> Result<bool, Error> {
        match self.default_value() {
            None | Some(DefaultValue::TypeDefault) => Ok(self.codec.is_default_any(value)),
            Some(DefaultValue::Value(default)) => {
                Ok(self.encode_to_value(value, registry)?.loosely_equals(default))
            }
        }
    }

    pub(crate) fn extra_elements<'a>(&self, target: &'a dyn Any) -> Result<&'a Document, Error> {
        self.get_value(target)?
            .downcast_ref::<Document>()
            .ok_or_else(|| self.not_a_document())
    }

    pub(crate) fn extra_elements_mut<'a>(
        &self,
        target: &'a mut dyn Any,
    ) -> Result<&'a mut Document, Error> {
        self.access
            .get_mut(target)
            .and_then(|v| v.downcast_mut::<Document>())
            .ok_or_else(|| self.not_a_document())
    }

    #[cold]
    fn not_a_document(&self) -> Error {
        Error::mapping(format!(
            "extra elements member {} of {} must be a writable Document",
            self.member_name, self.declaring_type
        ))
    }

    /// Writes the configured default into `target`. Returns false when no
    /// default is configured.
    pub fn apply_default_if_missing(
        &self,
        target: &mut dyn Any,
        registry: &Registry,
    ) -> Result<bool, Error> {
        match self.default_value() {
            None => Ok(false),
            Some(DefaultValue::TypeDefault) => {
                self.access.reset(target)?;
                Ok(true)
            }
            Some(DefaultValue::Value(default)) => {
                let value = self.decode_from_value(default, registry)?;
                self.access.set(target, value)?;
                Ok(true)
            }
        }
    }

    /// The member's current value in document form.
    pub fn get_member_value(&self, target: &dyn Any, registry: &Registry) -> Result<Value, Error> {
        self.encode_to_value(self.get_value(target)?, registry)
    }

    /// Assigns a document value to the member through its codec.
    pub fn set_member_value(
        &self,
        target: &mut dyn Any,
        value: &Value,
        registry: &Registry,
    ) -> Result<(), Error> {
        let decoded = self.decode_from_value(value, registry)?;
        self.access.set(target, decoded)
    }

    fn encode_to_value(&self, value: &dyn Any, registry: &Registry) -> Result<Value, Error> {
        let mut writer = BsonWriter::new();
        {
            let mut context = WriteContext::new(registry, &mut writer);
            context.writer.write_start_document()?;
            context.writer.write_name(&self.member_name)?;
            self.write_value(value, &mut context)?;
            context.writer.write_end_document()?;
        }
        let mut document =
            Document::from_bytes_with_max_depth(&writer.into_bytes()?, registry.config().max_depth())?;
        document
            .remove(&self.member_name)
            .ok_or_else(|| Error::unknown("member codec wrote no value"))
    }

    fn decode_from_value(&self, value: &Value, registry: &Registry) -> Result<Box<dyn Any>, Error> {
        let mut document = Document::new();
        document.insert(self.member_name.clone(), value.clone());
        let bytes = document.to_bytes()?;
        let mut reader = BsonReader::new(&bytes);
        reader.read_start_document()?;
        if reader.has_next_element()?.is_none() {
            return Err(Error::unknown("value document is empty"));
        }
        let mut context = ReadContext::new(registry, &mut reader);
        self.read_value(&mut context)
    }
}

impl fmt::Debug for PropertyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMap")
            .field("member_name", &self.member_name)
            .field("member_type", &self.member_type)
            .field("declaring_type", &self.declaring_type)
            .field("element_name", self.element_name.get())
            .field("order", self.order.get())
            .field("default_value", self.default_value.get())
            .field("serialize_default_value", self.serialize_default_value.get())
            .field("ignore_if_null", self.ignore_if_null.get())
            .field("is_required", self.is_required.get())
            .field("is_id", self.is_id.get())
            .field("is_extra_elements", self.is_extra_elements.get())
            .field("representation", self.representation.get())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}
