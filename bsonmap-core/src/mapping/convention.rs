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

//! Rules that fill in the unset parts of a class map draft.
//!
//! A rule only fills slots whose explicit bit is clear, so anything set
//! through the builder or a derive attribute survives every convention.
//! Packs run in order: the default pack first, then each registered pack
//! whose predicate accepts the type. Within a pack, class rules run before
//! member rules, and member rules before post-processing rules.

use std::fmt;
use std::sync::Arc;

use crate::mapping::class_map::{ClassMapDraft, ClassSettings};
use crate::mapping::id_generator::{ObjectIdGenerator, StringObjectIdGenerator};
use crate::mapping::property_map::PropertyMap;
use crate::types::{ElementType, TypeKey};
use crate::value::{Document, ObjectId};

pub trait ClassConvention: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, class: &mut ClassSettings);
}

pub trait MemberConvention: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, class: &ClassSettings, member: &mut PropertyMap);
}

pub trait PostProcessingConvention: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, class: &mut ClassSettings, members: &mut [PropertyMap]);
}

#[derive(Clone)]
pub enum Convention {
    Class(Arc<dyn ClassConvention>),
    Member(Arc<dyn MemberConvention>),
    PostProcessing(Arc<dyn PostProcessingConvention>),
}

impl Convention {
    pub fn class(rule: impl ClassConvention + 'static) -> Convention {
        Convention::Class(Arc::new(rule))
    }

    pub fn member(rule: impl MemberConvention + 'static) -> Convention {
        Convention::Member(Arc::new(rule))
    }

    pub fn post_processing(rule: impl PostProcessingConvention + 'static) -> Convention {
        Convention::PostProcessing(Arc::new(rule))
    }

    pub fn name(&self) -> &str {
        match self {
            Convention::Class(rule) => rule.name(),
            Convention::Member(rule) => rule.name(),
            Convention::PostProcessing(rule) => rule.name(),
        }
    }
}

impl fmt::Debug for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named, ordered list of conventions.
#[derive(Clone, Debug, Default)]
pub struct ConventionPack {
    name: String,
    conventions: Vec<Convention>,
}

impl ConventionPack {
    pub fn new(name: impl Into<String>) -> ConventionPack {
        ConventionPack {
            name: name.into(),
            conventions: Vec::new(),
        }
    }

    /// Conventions every type gets before any registered pack.
    pub fn default_pack() -> ConventionPack {
        ConventionPack::new("default")
            .with(Convention::member(MemberNameElementNameConvention))
            .with(Convention::member(NamedIdMemberConvention::default()))
            .with(Convention::member(NamedExtraElementsMemberConvention::default()))
            .with(Convention::post_processing(IdGeneratorConvention))
    }

    pub fn with(mut self, convention: Convention) -> ConventionPack {
        self.conventions.push(convention);
        self
    }

    pub fn push(&mut self, convention: Convention) {
        self.conventions.push(convention);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conventions(&self) -> &[Convention] {
        &self.conventions
    }

    pub fn len(&self) -> usize {
        self.conventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conventions.is_empty()
    }
}

pub(crate) fn apply_conventions(packs: &[&ConventionPack], draft: &mut ClassMapDraft) {
    let ClassMapDraft {
        settings, members, ..
    } = draft;
    let type_name = settings.type_key().name();
    for pack in packs {
        for convention in &pack.conventions {
            if let Convention::Class(rule) = convention {
                tracing::trace!(pack = pack.name(), rule = rule.name(), type_name, "class convention");
                rule.apply(settings);
            }
        }
    }
    for member in members.iter_mut() {
        for pack in packs {
            for convention in &pack.conventions {
                if let Convention::Member(rule) = convention {
                    tracing::trace!(
                        pack = pack.name(),
                        rule = rule.name(),
                        type_name,
                        member = member.member_name(),
                        "member convention"
                    );
                    rule.apply(settings, member);
                }
            }
        }
    }
    for pack in packs {
        for convention in &pack.conventions {
            if let Convention::PostProcessing(rule) = convention {
                tracing::trace!(pack = pack.name(), rule = rule.name(), type_name, "post-processing convention");
                rule.apply(settings, members);
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct IgnoreExtraElementsConvention(pub bool);

impl ClassConvention for IgnoreExtraElementsConvention {
    fn name(&self) -> &str {
        "IgnoreExtraElements"
    }

    fn apply(&self, class: &mut ClassSettings) {
        class.fill_ignore_extra_elements(self.0);
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DiscriminatorIsRequiredConvention(pub bool);

impl ClassConvention for DiscriminatorIsRequiredConvention {
    fn name(&self) -> &str {
        "DiscriminatorIsRequired"
    }

    fn apply(&self, class: &mut ClassSettings) {
        class.fill_discriminator_is_required(self.0);
    }
}

/// Uses the fully qualified type name as the discriminator.
#[derive(Clone, Copy, Debug)]
pub struct TypeNameDiscriminatorConvention;

impl ClassConvention for TypeNameDiscriminatorConvention {
    fn name(&self) -> &str {
        "TypeNameDiscriminator"
    }

    fn apply(&self, class: &mut ClassSettings) {
        let name = class.type_key().name();
        class.fill_discriminator(name);
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MemberNameElementNameConvention;

impl MemberConvention for MemberNameElementNameConvention {
    fn name(&self) -> &str {
        "MemberNameElementName"
    }

    fn apply(&self, _class: &ClassSettings, member: &mut PropertyMap) {
        let name = member.member_name().to_string();
        member.fill_element_name(name);
    }
}

/// `customer_name` becomes `customerName`.
#[derive(Clone, Copy, Debug)]
pub struct CamelCaseElementNameConvention;

impl MemberConvention for CamelCaseElementNameConvention {
    fn name(&self) -> &str {
        "CamelCaseElementName"
    }

    fn apply(&self, _class: &ClassSettings, member: &mut PropertyMap) {
        let name = convert_case(member.member_name(), false);
        member.fill_element_name(name);
    }
}

/// `customer_name` becomes `CustomerName`.
#[derive(Clone, Copy, Debug)]
pub struct PascalCaseElementNameConvention;

impl MemberConvention for PascalCaseElementNameConvention {
    fn name(&self) -> &str {
        "PascalCaseElementName"
    }

    fn apply(&self, _class: &ClassSettings, member: &mut PropertyMap) {
        let name = convert_case(member.member_name(), true);
        member.fill_element_name(name);
    }
}

fn convert_case(member_name: &str, upper_first: bool) -> String {
    let mut out = String::with_capacity(member_name.len());
    let mut upper_next = upper_first;
    for (index, ch) in member_name.chars().enumerate() {
        if ch == '_' {
            // Leading underscores are part of the name, e.g. `_id`.
            if out.is_empty() && index == 0 {
                out.push(ch);
            } else {
                upper_next = !out.is_empty() && !out.ends_with('_');
            }
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else if out.is_empty() || out == "_" {
            if upper_first {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Marks the first member whose name is in the list as the id.
#[derive(Clone, Debug)]
pub struct NamedIdMemberConvention {
    names: Vec<String>,
}

impl NamedIdMemberConvention {
    pub fn new<I, S>(names: I) -> NamedIdMemberConvention
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NamedIdMemberConvention {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for NamedIdMemberConvention {
    fn default() -> Self {
        NamedIdMemberConvention::new(["id", "_id"])
    }
}

impl MemberConvention for NamedIdMemberConvention {
    fn name(&self) -> &str {
        "NamedIdMember"
    }

    fn apply(&self, _class: &ClassSettings, member: &mut PropertyMap) {
        if self.names.iter().any(|n| n == member.member_name()) {
            member.fill_is_id(true);
        }
    }
}

/// Marks a `Document` member whose name is in the list as the extra
/// elements member.
#[derive(Clone, Debug)]
pub struct NamedExtraElementsMemberConvention {
    names: Vec<String>,
}

impl NamedExtraElementsMemberConvention {
    pub fn new<I, S>(names: I) -> NamedExtraElementsMemberConvention
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NamedExtraElementsMemberConvention {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for NamedExtraElementsMemberConvention {
    fn default() -> Self {
        NamedExtraElementsMemberConvention::new(["extra_elements"])
    }
}

impl MemberConvention for NamedExtraElementsMemberConvention {
    fn name(&self) -> &str {
        "NamedExtraElementsMember"
    }

    fn apply(&self, _class: &ClassSettings, member: &mut PropertyMap) {
        if member.member_type() == TypeKey::of::<Document>()
            && self.names.iter().any(|n| n == member.member_name())
        {
            member.fill_is_extra_elements(true);
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct IgnoreIfNullConvention(pub bool);

impl MemberConvention for IgnoreIfNullConvention {
    fn name(&self) -> &str {
        "IgnoreIfNull"
    }

    fn apply(&self, _class: &ClassSettings, member: &mut PropertyMap) {
        member.fill_ignore_if_null(self.0);
    }
}

/// Skips members equal to their default (or their type's zero value).
#[derive(Clone, Copy, Debug)]
pub struct IgnoreIfDefaultConvention(pub bool);

impl MemberConvention for IgnoreIfDefaultConvention {
    fn name(&self) -> &str {
        "IgnoreIfDefault"
    }

    fn apply(&self, _class: &ClassSettings, member: &mut PropertyMap) {
        member.fill_serialize_default_value(!self.0);
    }
}

/// Gives every member of one type the same representation, e.g. all
/// `i64` members as strings.
#[derive(Clone, Copy, Debug)]
pub struct MemberTypeRepresentationConvention {
    member_type: TypeKey,
    representation: ElementType,
}

impl MemberTypeRepresentationConvention {
    pub fn new<F: 'static>(representation: ElementType) -> MemberTypeRepresentationConvention {
        MemberTypeRepresentationConvention {
            member_type: TypeKey::of::<F>(),
            representation,
        }
    }
}

impl MemberConvention for MemberTypeRepresentationConvention {
    fn name(&self) -> &str {
        "MemberTypeRepresentation"
    }

    fn apply(&self, _class: &ClassSettings, member: &mut PropertyMap) {
        if member.member_type() == self.member_type {
            member.fill_representation(self.representation);
        }
    }
}

/// Picks an id generator for id members that have none.
#[derive(Clone, Copy, Debug)]
pub struct IdGeneratorConvention;

impl PostProcessingConvention for IdGeneratorConvention {
    fn name(&self) -> &str {
        "IdGenerator"
    }

    fn apply(&self, _class: &mut ClassSettings, members: &mut [PropertyMap]) {
        for member in members.iter_mut().filter(|m| m.is_id()) {
            if member.id_generator().is_some() {
                continue;
            }
            if member.member_type() == TypeKey::of::<ObjectId>() {
                member.fill_id_generator(Arc::new(ObjectIdGenerator));
            } else if member.member_type() == TypeKey::of::<String>()
                && member.representation() == Some(ElementType::ObjectId)
            {
                member.fill_id_generator(Arc::new(StringObjectIdGenerator));
            }
        }
    }
}
