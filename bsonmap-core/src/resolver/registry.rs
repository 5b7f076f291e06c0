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

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::{Config, EncodeOptions};
use crate::error::Error;
use crate::io::{BsonReader, BsonWriter};
use crate::mapping::class_map::{BaseProjection, ClassMap, ClassMapBuilder, ClassMapDraft, ClassMapped};
use crate::mapping::convention::{apply_conventions, ConventionPack};
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::discriminator::DiscriminatorRegistry;
use crate::serializer::Serializer;
use crate::types::TypeKey;
use crate::value::{Document, Value};

type UpcastFn = Arc<dyn Fn(Box<dyn Any>) -> Result<Box<dyn Any>, Error> + Send + Sync>;
type PackPredicate = Box<dyn Fn(&TypeKey) -> bool + Send + Sync>;

pub(crate) enum Entry {
    Pending(Box<ClassMapDraft>),
    Freezing,
    Frozen(Arc<ClassMap>),
    Failed(String),
}

struct UpcastEdge {
    to: TypeKey,
    convert: UpcastFn,
}

struct PackRegistration {
    pack: ConventionPack,
    applies_to: PackPredicate,
}

/// Everything guarded by the registry lock.
pub(crate) struct RegistryState {
    entries: HashMap<TypeId, Entry>,
    names: HashMap<&'static str, TypeKey>,
    discriminators: DiscriminatorRegistry,
    upcasts: HashMap<TypeId, Vec<UpcastEdge>>,
    default_pack: ConventionPack,
    packs: Vec<PackRegistration>,
}

impl RegistryState {
    fn new() -> RegistryState {
        RegistryState {
            entries: HashMap::new(),
            names: HashMap::new(),
            discriminators: DiscriminatorRegistry::default(),
            upcasts: HashMap::new(),
            default_pack: ConventionPack::default_pack(),
            packs: Vec::new(),
        }
    }

    fn insert_pending(&mut self, draft: ClassMapDraft) {
        let key = draft.settings.type_key();
        self.names.insert(key.name(), key);
        self.entries.insert(key.id(), Entry::Pending(Box::new(draft)));
    }

    /// Returns the frozen map of `T`, auto-mapping it when absent.
    pub(crate) fn get_or_create<T: ClassMapped>(&mut self) -> Result<Arc<ClassMap>, Error> {
        let key = TypeKey::of::<T>();
        if !self.entries.contains_key(&key.id()) {
            tracing::debug!(type_name = key.name(), "auto-mapping class");
            let mut builder = ClassMapBuilder::<T>::new();
            builder.auto_map();
            self.insert_pending(builder.into_draft());
        }
        self.freeze(key.id())
    }

    /// Builds a known type unless it is the one currently being built.
    pub(crate) fn ensure_known<T: ClassMapped>(&mut self) -> Result<(), Error> {
        if matches!(self.entries.get(&TypeId::of::<T>()), Some(Entry::Freezing)) {
            return Ok(());
        }
        self.get_or_create::<T>().map(|_| ())
    }

    fn freeze(&mut self, id: TypeId) -> Result<Arc<ClassMap>, Error> {
        match self.entries.get(&id) {
            Some(Entry::Frozen(map)) => return Ok(map.clone()),
            Some(Entry::Failed(message)) => return Err(Error::mapping(message.clone())),
            Some(Entry::Freezing) => {
                return Err(Error::mapping(
                    "Class map depends on itself through its base or known types",
                ))
            }
            Some(Entry::Pending(_)) => {}
            None => return Err(Error::mapping(format!("No class map is registered for {id:?}"))),
        }
        let draft = match self.entries.insert(id, Entry::Freezing) {
            Some(Entry::Pending(draft)) => draft,
            _ => return Err(Error::unknown("class map entry changed while freezing")),
        };
        let key = draft.settings.type_key();
        match self.build(*draft) {
            Ok(map) => Ok(map),
            Err(err) => {
                tracing::debug!(type_name = key.name(), error = %err, "class map failed to build");
                self.entries.insert(id, Entry::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    fn build(&mut self, mut draft: ClassMapDraft) -> Result<Arc<ClassMap>, Error> {
        let key = draft.settings.type_key();
        {
            let packs: Vec<&ConventionPack> = std::iter::once(&self.default_pack)
                .chain(
                    self.packs
                        .iter()
                        .filter(|p| (p.applies_to)(&key))
                        .map(|p| &p.pack),
                )
                .collect();
            apply_conventions(&packs, &mut draft);
        }

        let base = match draft.base.take() {
            Some(link) => {
                let base_map = (link.resolve)(self)?;
                tracing::trace!(type_name = key.name(), base = link.base_type.name(), "resolved base class map");
                Some((base_map, link.projection))
            }
            None => None,
        };
        let upcast = base.as_ref().map(|(base_map, projection)| {
            let projection: Arc<dyn BaseProjection> = projection.clone();
            UpcastEdge {
                to: base_map.type_key(),
                convert: Arc::new(move |value: Box<dyn Any>| projection.into_base(value)) as UpcastFn,
            }
        });
        let known_types = std::mem::take(&mut draft.known_types);

        let map = Arc::new(ClassMap::freeze(draft, base)?);
        self.entries.insert(key.id(), Entry::Frozen(map.clone()));
        self.names.insert(key.name(), key);
        self.discriminators.register(key, map.discriminator());
        if let Some(edge) = upcast {
            self.upcasts.entry(key.id()).or_default().push(edge);
        }
        tracing::debug!(
            type_name = key.name(),
            discriminator = map.discriminator(),
            members = map.all_members().len(),
            "froze class map"
        );
        for ensure in known_types {
            if let Err(err) = ensure(self) {
                tracing::warn!(type_name = key.name(), error = %err, "known type failed to build");
            }
        }
        Ok(map)
    }

    fn has_pending(&self) -> bool {
        self.entries.values().any(|e| matches!(e, Entry::Pending(_)))
    }

    /// Freezes pending registrations so their discriminators are published.
    fn freeze_pending(&mut self, nominal: TypeKey) -> Result<(), Error> {
        if matches!(self.entries.get(&nominal.id()), Some(Entry::Pending(_))) {
            self.freeze(nominal.id())?;
        }
        let pending: Vec<TypeId> = self
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, Entry::Pending(_)))
            .map(|(id, _)| *id)
            .collect();
        for id in pending {
            if let Err(err) = self.freeze(id) {
                tracing::warn!(error = %err, "skipping registration that failed to build");
            }
        }
        Ok(())
    }

    fn add_upcast(&mut self, from: TypeKey, to: TypeKey, convert: UpcastFn) {
        let edges = self.upcasts.entry(from.id()).or_default();
        edges.retain(|e| e.to != to);
        edges.push(UpcastEdge { to, convert });
    }

    /// Conversion steps from `from` to `to`, or `None` when not assignable.
    fn upcast_path(&self, from: TypeKey, to: TypeKey) -> Option<Vec<UpcastFn>> {
        if from == to {
            return Some(Vec::new());
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(from.id());
        queue.push_back((from.id(), Vec::new()));
        while let Some((current, path)) = queue.pop_front() {
            let Some(edges) = self.upcasts.get(&current) else {
                continue;
            };
            for edge in edges {
                if !visited.insert(edge.to.id()) {
                    continue;
                }
                let mut next: Vec<UpcastFn> = path.clone();
                next.push(edge.convert.clone());
                if edge.to == to {
                    return Some(next);
                }
                queue.push_back((edge.to.id(), next));
            }
        }
        None
    }

    fn is_assignable(&self, from: TypeKey, to: TypeKey) -> bool {
        self.upcast_path(from, to).is_some()
    }

    fn resolve(&self, nominal: TypeKey, discriminator: &str) -> Result<TypeKey, Error> {
        let candidates: Vec<TypeKey> = self
            .discriminators
            .candidates(discriminator)
            .iter()
            .copied()
            .filter(|c| self.is_assignable(*c, nominal))
            .collect();
        match candidates.as_slice() {
            [actual] => Ok(*actual),
            [] => match self.names.get(discriminator) {
                Some(key) if self.is_assignable(*key, nominal) => Ok(*key),
                Some(key) => Err(Error::incompatible_actual_type(format!(
                    "Actual type {key} is not assignable to expected type {nominal}"
                ))),
                None => Err(Error::unknown_discriminator(format!(
                    "Unknown discriminator value '{discriminator}' for expected type {nominal}"
                ))),
            },
            many => Err(Error::ambiguous_discriminator(format!(
                "Ambiguous discriminator '{discriminator}' for expected type {nominal}: {}",
                many.iter()
                    .map(|k| k.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// Owner of every class map, the discriminator registry, the subtype graph
/// and the registered convention packs.
///
/// A `Registry` is `Send + Sync`. Maps are built on first use under the
/// write lock; later lookups only take the read lock.
///
/// ```rust, ignore
/// use bsonmap::{BsonObject, Registry};
///
/// #[derive(BsonObject, Debug, PartialEq)]
/// struct Order {
///     customer: String,
///     total: i32,
/// }
///
/// let registry = Registry::default();
/// let order = Order { customer: "John".into(), total: 12 };
/// let bytes = registry.serialize(&order)?;
/// let decoded: Order = registry.deserialize(&bytes)?;
/// assert_eq!(order, decoded);
/// ```
pub struct Registry {
    config: Config,
    state: RwLock<RegistryState>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry::with_config(Config::default())
    }
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn with_config(config: Config) -> Registry {
        Registry {
            config,
            state: RwLock::new(RegistryState::new()),
        }
    }

    /// Writes the id member ahead of the discriminator and other members.
    pub fn id_first(mut self, id_first: bool) -> Self {
        self.config.id_first = id_first;
        self
    }

    pub fn check_element_names(mut self, check: bool) -> Self {
        self.config.check_element_names = check;
        self
    }

    /// Limits how deeply class-mapped documents may nest.
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn discriminator_element(mut self, element: impl Into<String>) -> Self {
        self.config.discriminator_element = element.into();
        self
    }

    #[inline(always)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the class map of `T`, building it through conventions when
    /// no map is registered yet.
    pub fn lookup<T: ClassMapped>(&self) -> Result<Arc<ClassMap>, Error> {
        let id = TypeId::of::<T>();
        if let Some(Entry::Frozen(map)) = self.state.read().entries.get(&id) {
            return Ok(map.clone());
        }
        self.state.write().get_or_create::<T>()
    }

    /// Returns the class map of a registered type by key.
    pub fn lookup_by_key(&self, key: TypeKey) -> Result<Arc<ClassMap>, Error> {
        self.lookup_by_type_id(key.id()).map_err(|err| match err {
            Error::Mapping(_) if !self.is_registered_key(key) => {
                Error::mapping(format!("No class map is registered for {key}"))
            }
            other => other,
        })
    }

    pub(crate) fn lookup_by_type_id(&self, id: TypeId) -> Result<Arc<ClassMap>, Error> {
        if let Some(Entry::Frozen(map)) = self.state.read().entries.get(&id) {
            return Ok(map.clone());
        }
        self.state.write().freeze(id)
    }

    /// Stores an explicitly configured map for `T`.
    ///
    /// The map is frozen on first use; configuration problems surface then
    /// as mapping errors.
    pub fn register_type<T, F>(&self, configure: F) -> Result<(), Error>
    where
        T: ClassMapped,
        F: FnOnce(&mut ClassMapBuilder<T>),
    {
        let key = TypeKey::of::<T>();
        if self.state.read().entries.contains_key(&key.id()) {
            return Err(Error::duplicate_registration(key.name()));
        }
        let mut builder = ClassMapBuilder::<T>::new();
        configure(&mut builder);
        let mut state = self.state.write();
        if state.entries.contains_key(&key.id()) {
            return Err(Error::duplicate_registration(key.name()));
        }
        state.insert_pending(builder.into_draft());
        tracing::debug!(type_name = key.name(), "registered class map");
        Ok(())
    }

    /// Registers `T` with its declared members and the conventions.
    pub fn auto_register<T: ClassMapped>(&self) -> Result<(), Error> {
        self.register_type::<T, _>(|map| {
            map.auto_map();
        })
    }

    /// Declares that `D` may stand in for the nominal type `N`, usually a
    /// trait object such as `dyn Animal`.
    pub fn register_subtype<N, D>(&self, upcast: fn(D) -> Box<N>) -> Result<(), Error>
    where
        N: ?Sized + 'static,
        D: ClassMapped,
    {
        let mut state = self.state.write();
        state.get_or_create::<D>()?;
        state.add_upcast(
            TypeKey::of::<D>(),
            TypeKey::of::<N>(),
            Arc::new(move |value: Box<dyn Any>| {
                let concrete = value.downcast::<D>().map_err(|_| {
                    Error::unknown(format!("value is not a {}", std::any::type_name::<D>()))
                })?;
                Ok(Box::new(upcast(*concrete)) as Box<dyn Any>)
            }),
        );
        tracing::debug!(
            subtype = std::any::type_name::<D>(),
            nominal = std::any::type_name::<N>(),
            "registered subtype"
        );
        Ok(())
    }

    /// Adds a convention pack applied to every type `applies_to` accepts.
    ///
    /// Packs only affect maps built after registration.
    pub fn register_convention_pack(
        &self,
        pack: ConventionPack,
        applies_to: impl Fn(&TypeKey) -> bool + Send + Sync + 'static,
    ) {
        tracing::debug!(pack = pack.name(), "registered convention pack");
        self.state.write().packs.push(PackRegistration {
            pack,
            applies_to: Box::new(applies_to),
        });
    }

    /// Publishes an extra discriminator for a registered type.
    pub fn register_discriminator(&self, key: TypeKey, discriminator: &str) -> bool {
        self.state.write().discriminators.register(key, discriminator)
    }

    pub fn discriminator_candidates(&self, discriminator: &str) -> Vec<TypeKey> {
        self.state.read().discriminators.candidates(discriminator).to_vec()
    }

    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.is_registered_key(TypeKey::of::<T>())
    }

    fn is_registered_key(&self, key: TypeKey) -> bool {
        self.state.read().entries.contains_key(&key.id())
    }

    /// Removes the map of `T` with its discriminators and subtype edges.
    pub fn unregister<T: ?Sized + 'static>(&self) -> bool {
        let key = TypeKey::of::<T>();
        let mut state = self.state.write();
        state.discriminators.remove_type(key);
        state.names.remove(key.name());
        state.upcasts.remove(&key.id());
        state.entries.remove(&key.id()).is_some()
    }

    /// Drops every map, discriminator and subtype edge. Configuration and
    /// convention packs are kept.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.names.clear();
        state.discriminators.clear();
        state.upcasts.clear();
    }

    /// Resolves a discriminator read for a value of nominal type `nominal`.
    pub fn resolve_discriminator(&self, nominal: TypeKey, discriminator: &str) -> Result<TypeKey, Error> {
        if self.state.read().has_pending() {
            self.state.write().freeze_pending(nominal)?;
        }
        self.state.read().resolve(nominal, discriminator)
    }

    /// True when a value of type `from` can stand in for `to`.
    pub fn is_assignable(&self, from: TypeKey, to: TypeKey) -> bool {
        self.state.read().is_assignable(from, to)
    }

    /// Converts a boxed `from` into a boxed `to` along the assignability path.
    pub fn upcast(&self, value: Box<dyn Any>, from: TypeKey, to: TypeKey) -> Result<Box<dyn Any>, Error> {
        let path = self.state.read().upcast_path(from, to).ok_or_else(|| {
            Error::incompatible_actual_type(format!(
                "Actual type {from} is not assignable to expected type {to}"
            ))
        })?;
        path.iter().try_fold(value, |value, convert| convert(value))
    }

    /// Encodes `value` as a document into `writer`.
    pub fn encode<T: Serializer>(&self, writer: &mut BsonWriter, value: &T) -> Result<(), Error> {
        self.encode_with_options(writer, value, &EncodeOptions::default())
    }

    pub fn encode_with_options<T: Serializer>(
        &self,
        writer: &mut BsonWriter,
        value: &T,
        options: &EncodeOptions,
    ) -> Result<(), Error> {
        let check = options
            .check_element_names
            .unwrap_or(self.config.is_check_element_names());
        let previous = writer.check_element_names();
        writer.set_check_element_names(check || previous);
        let result = {
            let mut context = WriteContext::with_options(self, writer, options);
            value.bson_write(&mut context)
        };
        writer.set_check_element_names(previous);
        result
    }

    pub fn serialize<T: Serializer>(&self, value: &T) -> Result<Vec<u8>, Error> {
        let mut writer = BsonWriter::new();
        self.encode(&mut writer, value)?;
        writer.into_bytes()
    }

    pub fn serialize_with_options<T: Serializer>(
        &self,
        value: &T,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, Error> {
        let mut writer = BsonWriter::new();
        self.encode_with_options(&mut writer, value, options)?;
        writer.into_bytes()
    }

    /// Decodes the value the reader is positioned on.
    pub fn decode<T: Serializer>(&self, reader: &mut BsonReader) -> Result<T, Error> {
        let mut context = ReadContext::new(self, reader);
        T::bson_read(&mut context)
    }

    pub fn deserialize<T: Serializer>(&self, bytes: &[u8]) -> Result<T, Error> {
        let mut reader = BsonReader::new(bytes);
        let value = self.decode(&mut reader)?;
        if reader.position() != bytes.len() {
            return Err(Error::invalid_data(format!(
                "{} trailing bytes after document",
                bytes.len() - reader.position()
            )));
        }
        Ok(value)
    }

    pub fn to_document<T: Serializer>(&self, value: &T) -> Result<Document, Error> {
        Document::from_bytes_with_max_depth(&self.serialize(value)?, self.config.max_depth())
    }

    pub fn from_document<T: Serializer>(&self, document: &Document) -> Result<T, Error> {
        self.deserialize(&document.to_bytes()?)
    }

    /// Current value of the id member of `value`, if the type has one.
    pub fn get_document_id<T: ClassMapped>(&self, value: &T) -> Result<Option<Value>, Error> {
        let map = self.lookup::<T>()?;
        match map.id_member() {
            Some(member) => member.get_member_value(value, self).map(Some),
            None => Ok(None),
        }
    }

    pub fn set_document_id<T: ClassMapped>(&self, value: &mut T, id: &Value) -> Result<(), Error> {
        let map = self.lookup::<T>()?;
        let member = map.id_member().ok_or_else(|| {
            Error::mapping(format!("Class {} has no id member", map.type_key()))
        })?;
        member.set_member_value(value, id, self)
    }

    /// Assigns a generated id when the id member holds an empty value.
    ///
    /// Returns the id the value carries afterwards, or `None` when the type
    /// has no id member.
    pub fn ensure_document_id<T: ClassMapped>(&self, value: &mut T) -> Result<Option<Value>, Error> {
        let map = self.lookup::<T>()?;
        let Some(member) = map.id_member() else {
            return Ok(None);
        };
        let current = member.get_member_value(value, self)?;
        if let Some(generator) = member.id_generator() {
            if generator.is_empty(&current) {
                let id = generator.generate();
                member.set_member_value(value, &id, self)?;
                tracing::trace!(type_name = map.type_key().name(), "generated document id");
                return Ok(Some(id));
            }
        }
        Ok(Some(current))
    }
}
