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
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::error::Error;
use crate::mapping::property_map::PropertyMap;
use crate::mapping::Slot;
use crate::resolver::registry::RegistryState;
use crate::serializer::{BsonDefault, OverrideCodec, Serializer, ValueSerializer};
use crate::types::{TypeKey, ID_ELEMENT};
use crate::value::Document;

/// A type the registry can build a [`ClassMap`] for.
///
/// Usually implemented by `#[derive(BsonObject)]`.
pub trait ClassMapped: Serializer + Sized {
    /// Declares the members of `Self` on a fresh builder.
    fn declare(map: &mut ClassMapBuilder<Self>) -> Result<(), Error>;

    /// Default instance decoding starts from. `None` for types that cannot
    /// be constructed without data.
    fn create_instance() -> Option<Self>;
}

pub(crate) type Creator = Arc<dyn Fn() -> Option<Box<dyn Any>> + Send + Sync>;

/// Builds (or fetches) a class map while the registry lock is held.
pub(crate) type MapResolver = fn(&mut RegistryState) -> Result<Arc<ClassMap>, Error>;

pub(crate) type KnownTypeFn = fn(&mut RegistryState) -> Result<(), Error>;

fn ensure_known<T: ClassMapped>(state: &mut RegistryState) -> Result<(), Error> {
    state.ensure_known::<T>()
}

fn resolve_map<T: ClassMapped>(state: &mut RegistryState) -> Result<Arc<ClassMap>, Error> {
    state.get_or_create::<T>()
}

fn create_erased<T: ClassMapped>() -> Option<Box<dyn Any>> {
    T::create_instance().map(|value| Box::new(value) as Box<dyn Any>)
}

/// Embedded base value of a derived type.
pub(crate) trait BaseProjection: Send + Sync {
    fn project<'a>(&self, target: &'a dyn Any) -> Option<&'a dyn Any>;

    fn project_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Any>;

    /// Slices a boxed derived value down to its base.
    fn into_base(&self, value: Box<dyn Any>) -> Result<Box<dyn Any>, Error>;
}

struct BaseField<D, B> {
    get: fn(&D) -> &B,
    get_mut: fn(&mut D) -> &mut B,
    into_base: fn(D) -> B,
}

impl<D: 'static, B: 'static> BaseProjection for BaseField<D, B> {
    fn project<'a>(&self, target: &'a dyn Any) -> Option<&'a dyn Any> {
        let derived = target.downcast_ref::<D>()?;
        Some((self.get)(derived) as &dyn Any)
    }

    fn project_mut<'a>(&self, target: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        let derived = target.downcast_mut::<D>()?;
        Some((self.get_mut)(derived) as &mut dyn Any)
    }

    fn into_base(&self, value: Box<dyn Any>) -> Result<Box<dyn Any>, Error> {
        let derived = value.downcast::<D>().map_err(|_| {
            Error::unknown(format!("value is not a {}", std::any::type_name::<D>()))
        })?;
        Ok(Box::new((self.into_base)(*derived)))
    }
}

pub(crate) struct BaseLink {
    pub(crate) base_type: TypeKey,
    pub(crate) projection: Arc<dyn BaseProjection>,
    pub(crate) resolve: MapResolver,
}

/// Class-level settings of a draft, visible to conventions.
#[derive(Clone, Debug)]
pub struct ClassSettings {
    type_key: TypeKey,
    discriminator: Slot<String>,
    discriminator_is_required: Slot<bool>,
    ignore_extra_elements: Slot<bool>,
    is_anonymous: Slot<bool>,
}

impl ClassSettings {
    fn new(type_key: TypeKey) -> ClassSettings {
        ClassSettings {
            type_key,
            discriminator: Slot::new(type_key.short_name().to_string()),
            discriminator_is_required: Slot::new(false),
            ignore_extra_elements: Slot::new(true),
            is_anonymous: Slot::new(false),
        }
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn discriminator(&self) -> &str {
        self.discriminator.get()
    }

    pub fn discriminator_is_required(&self) -> bool {
        *self.discriminator_is_required.get()
    }

    pub fn ignore_extra_elements(&self) -> bool {
        *self.ignore_extra_elements.get()
    }

    pub fn is_anonymous(&self) -> bool {
        *self.is_anonymous.get()
    }

    pub fn fill_discriminator(&mut self, discriminator: impl Into<String>) -> bool {
        self.discriminator.fill(discriminator.into())
    }

    pub fn fill_discriminator_is_required(&mut self, required: bool) -> bool {
        self.discriminator_is_required.fill(required)
    }

    pub fn fill_ignore_extra_elements(&mut self, ignore: bool) -> bool {
        self.ignore_extra_elements.fill(ignore)
    }
}

/// Mutable, not yet published configuration of a class map.
pub struct ClassMapDraft {
    pub(crate) settings: ClassSettings,
    pub(crate) members: Vec<PropertyMap>,
    pub(crate) creator: Option<Creator>,
    pub(crate) base: Option<BaseLink>,
    pub(crate) known_types: Vec<KnownTypeFn>,
    pub(crate) errors: Vec<String>,
}

impl ClassMapDraft {
    pub fn settings(&self) -> &ClassSettings {
        &self.settings
    }

    pub fn members(&self) -> &[PropertyMap] {
        &self.members
    }
}

/// Typed handle for configuring the class map of `T`.
pub struct ClassMapBuilder<T> {
    draft: ClassMapDraft,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ClassMapped> ClassMapBuilder<T> {
    pub(crate) fn new() -> ClassMapBuilder<T> {
        ClassMapBuilder {
            draft: ClassMapDraft {
                settings: ClassSettings::new(TypeKey::of::<T>()),
                members: Vec::new(),
                creator: Some(Arc::new(create_erased::<T>)),
                base: None,
                known_types: Vec::new(),
                errors: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    pub(crate) fn into_draft(self) -> ClassMapDraft {
        self.draft
    }

    /// Runs the type's own declaration. A failure is recorded and reported
    /// as a mapping error when the map is first used.
    pub fn auto_map(&mut self) -> &mut Self {
        if let Err(err) = T::declare(self) {
            self.draft.errors.push(err.to_string());
        }
        self
    }

    pub fn type_key(&self) -> TypeKey {
        self.draft.settings.type_key
    }

    pub fn settings(&self) -> &ClassSettings {
        &self.draft.settings
    }

    pub fn members(&self) -> &[PropertyMap] {
        &self.draft.members
    }

    fn bind_member<F>(&mut self, map: PropertyMap) -> MemberBuilder<'_, T, F> {
        let index = match self
            .draft
            .members
            .iter()
            .position(|m| m.member_name() == map.member_name())
        {
            // Re-mapping keeps the accumulated configuration unless the
            // member type changed.
            Some(index) if self.draft.members[index].member_type() == map.member_type() => index,
            Some(index) => {
                self.draft.members[index] = map;
                index
            }
            None => {
                self.draft.members.push(map);
                self.draft.members.len() - 1
            }
        };
        MemberBuilder {
            member: &mut self.draft.members[index],
            _marker: PhantomData,
        }
    }

    pub fn map_member<F: Serializer + BsonDefault>(
        &mut self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> MemberBuilder<'_, T, F> {
        self.bind_member(PropertyMap::bind(name, get, Some(get_mut)))
    }

    /// Maps a member that is encoded but can never be assigned.
    pub fn map_read_only_member<F: Serializer + BsonDefault>(
        &mut self,
        name: &str,
        get: fn(&T) -> &F,
    ) -> MemberBuilder<'_, T, F> {
        self.bind_member(PropertyMap::bind(name, get, None))
    }

    pub fn map_id_member<F: Serializer + BsonDefault>(
        &mut self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> MemberBuilder<'_, T, F> {
        let mut member = self.map_member(name, get, get_mut);
        member.set_is_id(true);
        member
    }

    pub fn map_extra_elements_member(
        &mut self,
        name: &str,
        get: fn(&T) -> &Document,
        get_mut: fn(&mut T) -> &mut Document,
    ) -> MemberBuilder<'_, T, Document> {
        let mut member = self.map_member(name, get, get_mut);
        member.set_is_extra_elements(true);
        member
    }

    pub fn unmap_member(&mut self, name: &str) -> bool {
        let before = self.draft.members.len();
        self.draft.members.retain(|m| m.member_name() != name);
        before != self.draft.members.len()
    }

    pub fn member_mut(&mut self, name: &str) -> Option<&mut PropertyMap> {
        self.draft
            .members
            .iter_mut()
            .find(|m| m.member_name() == name)
    }

    pub fn set_discriminator(&mut self, discriminator: impl Into<String>) -> &mut Self {
        self.draft.settings.discriminator.set(discriminator.into());
        self
    }

    pub fn set_discriminator_is_required(&mut self, required: bool) -> &mut Self {
        self.draft.settings.discriminator_is_required.set(required);
        self
    }

    pub fn set_ignore_extra_elements(&mut self, ignore: bool) -> &mut Self {
        self.draft.settings.ignore_extra_elements.set(ignore);
        self
    }

    /// Anonymous types are encode-only.
    pub fn set_is_anonymous(&mut self, anonymous: bool) -> &mut Self {
        self.draft.settings.is_anonymous.set(anonymous);
        self
    }

    pub fn set_creator(&mut self, creator: impl Fn() -> T + Send + Sync + 'static) -> &mut Self {
        self.draft.creator = Some(Arc::new(move || Some(Box::new(creator()) as Box<dyn Any>)));
        self
    }

    /// Declares `B` as the base of `T`, embedded as a field.
    ///
    /// The base's members are inherited ahead of `T`'s own members, and a
    /// decoded `T` can stand in for a nominal `B` by slicing.
    pub fn set_base<B: ClassMapped>(
        &mut self,
        get: fn(&T) -> &B,
        get_mut: fn(&mut T) -> &mut B,
        into_base: fn(T) -> B,
    ) -> &mut Self {
        self.draft.base = Some(BaseLink {
            base_type: TypeKey::of::<B>(),
            projection: Arc::new(BaseField {
                get,
                get_mut,
                into_base,
            }),
            resolve: resolve_map::<B>,
        });
        self
    }

    /// Builds `K`'s class map whenever this one is built, so `K`'s
    /// discriminator is known before a `T` is decoded.
    pub fn add_known_type<K: ClassMapped>(&mut self) -> &mut Self {
        self.draft.known_types.push(ensure_known::<K>);
        self
    }
}

/// Handle on one member returned by the `map_*` builder methods.
pub struct MemberBuilder<'a, T, F> {
    member: &'a mut PropertyMap,
    _marker: PhantomData<fn(T) -> F>,
}

impl<'a, T, F: Serializer> MemberBuilder<'a, T, F> {
    /// Replaces the member type's serializer for this member only.
    pub fn set_serializer(&mut self, serializer: impl ValueSerializer<F>) -> &mut Self {
        self.member
            .set_serializer_codec(Arc::new(OverrideCodec::new(serializer)));
        self
    }
}

impl<'a, T, F> Deref for MemberBuilder<'a, T, F> {
    type Target = PropertyMap;

    fn deref(&self) -> &PropertyMap {
        self.member
    }
}

impl<'a, T, F> DerefMut for MemberBuilder<'a, T, F> {
    fn deref_mut(&mut self) -> &mut PropertyMap {
        self.member
    }
}

/// Frozen, shared mapping between a type and its document form.
pub struct ClassMap {
    type_key: TypeKey,
    discriminator: String,
    discriminator_is_required: bool,
    ignore_extra_elements: bool,
    is_anonymous: bool,
    base: Option<Arc<ClassMap>>,
    declared_members: usize,
    members: Vec<Arc<PropertyMap>>,
    element_index: HashMap<String, usize>,
    id_member: Option<usize>,
    extra_elements_member: Option<usize>,
    creator: Option<Creator>,
}

impl ClassMap {
    /// Orders, validates and flattens a draft whose conventions have run.
    pub(crate) fn freeze(
        draft: ClassMapDraft,
        base: Option<(Arc<ClassMap>, Arc<dyn BaseProjection>)>,
    ) -> Result<ClassMap, Error> {
        let ClassMapDraft {
            settings,
            mut members,
            creator,
            errors,
            ..
        } = draft;
        let type_key = settings.type_key;
        if !errors.is_empty() {
            return Err(Error::mapping(format!(
                "Class map for {type_key} could not be built: {}",
                errors.join("; ")
            )));
        }

        for member in members.iter_mut() {
            if member.element_name().is_empty() {
                let name = member.member_name().to_string();
                member.fill_element_name(name);
            }
        }
        // Stable: unordered members keep declaration order behind ordered ones.
        members.sort_by_key(|m| match m.order() {
            Some(order) => (0, order),
            None => (1, 0),
        });

        let id_local = Self::choose_id_member(type_key, &mut members, base.as_ref())?;
        let extra_local = Self::choose_extra_elements_member(type_key, &mut members, base.as_ref())?;

        let inherited = base.as_ref().map_or(0, |(b, _)| b.members.len());
        let mut flattened: Vec<Arc<PropertyMap>> = Vec::with_capacity(inherited + members.len());
        if let Some((base_map, projection)) = &base {
            for member in &base_map.members {
                flattened.push(Arc::new(member.project(projection.clone())));
            }
        }
        let declared_members = members.len();
        flattened.extend(members.into_iter().map(Arc::new));

        let mut element_index = HashMap::with_capacity(flattened.len());
        for (index, member) in flattened.iter().enumerate() {
            if member.is_extra_elements() {
                continue;
            }
            if let Some(previous) = element_index.insert(member.element_name().to_string(), index)
            {
                let other = &flattened[previous];
                return Err(Error::mapping(format!(
                    "The member '{}' of type {} cannot use element name '{}' because it is \
                     already being used by member '{}' of type {}.",
                    member.member_name(),
                    member.declaring_type(),
                    member.element_name(),
                    other.member_name(),
                    other.declaring_type()
                )));
            }
        }

        let base_map = base.map(|(b, _)| b);
        let id_member = id_local
            .map(|i| inherited + i)
            .or_else(|| base_map.as_ref().and_then(|b| b.id_member));
        let extra_elements_member = extra_local
            .map(|i| inherited + i)
            .or_else(|| base_map.as_ref().and_then(|b| b.extra_elements_member));
        let mut discriminator_is_required = settings.discriminator_is_required();
        if let Some(b) = &base_map {
            discriminator_is_required |= b.discriminator_is_required;
        }

        Ok(ClassMap {
            type_key,
            discriminator: settings.discriminator().to_string(),
            discriminator_is_required,
            ignore_extra_elements: settings.ignore_extra_elements(),
            is_anonymous: settings.is_anonymous(),
            base: base_map,
            declared_members,
            members: flattened,
            element_index,
            id_member,
            extra_elements_member,
            creator,
        })
    }

    fn choose_id_member(
        type_key: TypeKey,
        members: &mut [PropertyMap],
        base: Option<&(Arc<ClassMap>, Arc<dyn BaseProjection>)>,
    ) -> Result<Option<usize>, Error> {
        let explicit: Vec<usize> = members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_id() && m.is_id_explicit())
            .map(|(i, _)| i)
            .collect();
        if explicit.len() > 1 {
            return Err(Error::mapping(format!(
                "Class {type_key} declares more than one id member"
            )));
        }
        let base_has_id = base.map_or(false, |(b, _)| b.id_member.is_some());
        let chosen = match explicit.first() {
            Some(index) => Some(*index),
            None if base_has_id => None,
            None => members.iter().position(|m| m.is_id()),
        };
        for (index, member) in members.iter_mut().enumerate() {
            if Some(index) == chosen {
                member.fill_element_name(ID_ELEMENT);
            } else {
                member.fill_is_id(false);
            }
        }
        Ok(chosen)
    }

    fn choose_extra_elements_member(
        type_key: TypeKey,
        members: &mut [PropertyMap],
        base: Option<&(Arc<ClassMap>, Arc<dyn BaseProjection>)>,
    ) -> Result<Option<usize>, Error> {
        let explicit = members
            .iter()
            .position(|m| m.is_extra_elements() && m.is_extra_elements_explicit());
        let base_has_extra = base.map_or(false, |(b, _)| b.extra_elements_member.is_some());
        let chosen = match explicit {
            Some(index) => Some(index),
            None if base_has_extra => None,
            None => members.iter().position(|m| m.is_extra_elements()),
        };
        for (index, member) in members.iter_mut().enumerate() {
            if Some(index) != chosen {
                if member.is_extra_elements() && member.is_extra_elements_explicit() {
                    return Err(Error::mapping(format!(
                        "Class {type_key} declares more than one extra elements member"
                    )));
                }
                member.fill_is_extra_elements(false);
            }
        }
        if let Some(index) = chosen {
            let member = &members[index];
            if member.member_type() != TypeKey::of::<Document>() {
                return Err(Error::mapping(format!(
                    "Extra elements member {} of {type_key} must be of type Document, not {}",
                    member.member_name(),
                    member.member_type()
                )));
            }
        }
        Ok(chosen)
    }

    #[inline(always)]
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    #[inline(always)]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    pub fn discriminator_is_required(&self) -> bool {
        self.discriminator_is_required
    }

    pub fn ignore_extra_elements(&self) -> bool {
        self.ignore_extra_elements
    }

    pub fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }

    pub fn base_class_map(&self) -> Option<&Arc<ClassMap>> {
        self.base.as_ref()
    }

    /// Members declared on this type, in serialization order.
    pub fn declared_members(&self) -> &[Arc<PropertyMap>] {
        &self.members[self.members.len() - self.declared_members..]
    }

    /// Inherited members followed by declared members.
    #[inline(always)]
    pub fn all_members(&self) -> &[Arc<PropertyMap>] {
        &self.members
    }

    pub fn member(&self, member_name: &str) -> Option<&Arc<PropertyMap>> {
        self.members.iter().find(|m| m.member_name() == member_name)
    }

    pub(crate) fn member_for_element(&self, element_name: &str) -> Option<(usize, &Arc<PropertyMap>)> {
        let index = *self.element_index.get(element_name)?;
        Some((index, &self.members[index]))
    }

    pub fn id_member(&self) -> Option<&Arc<PropertyMap>> {
        self.id_member.map(|i| &self.members[i])
    }

    pub(crate) fn id_member_index(&self) -> Option<usize> {
        self.id_member
    }

    pub fn extra_elements_member(&self) -> Option<&Arc<PropertyMap>> {
        self.extra_elements_member.map(|i| &self.members[i])
    }

    /// Fails unless instances of this type can be decoded.
    pub fn check_decodable(&self) -> Result<(), Error> {
        if self.is_anonymous {
            return Err(Error::cannot_deserialize_anonymous_type(format!(
                "Deserializing anonymous type {} is not supported",
                self.type_key
            )));
        }
        if let Some(member) = self.members.iter().find(|m| m.is_read_only()) {
            return Err(Error::unsupported_type_for_decode(format!(
                "Type {} cannot be decoded because member {} is read-only",
                self.type_key,
                member.member_name()
            )));
        }
        if self.creator.is_none() {
            return Err(Error::unsupported_type_for_decode(format!(
                "Type {} has no creator",
                self.type_key
            )));
        }
        Ok(())
    }

    pub(crate) fn create_instance(&self) -> Result<Box<dyn Any>, Error> {
        self.creator
            .as_ref()
            .and_then(|create| create())
            .ok_or_else(|| {
                Error::unsupported_type_for_decode(format!(
                    "Type {} cannot be constructed for decoding",
                    self.type_key
                ))
            })
    }
}

impl fmt::Debug for ClassMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMap")
            .field("type_key", &self.type_key)
            .field("discriminator", &self.discriminator)
            .field("discriminator_is_required", &self.discriminator_is_required)
            .field("ignore_extra_elements", &self.ignore_extra_elements)
            .field("is_anonymous", &self.is_anonymous)
            .field("base", &self.base.as_ref().map(|b| b.type_key))
            .field("members", &self.members)
            .finish()
    }
}
