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

//! Class maps, property maps and the conventions that fill them in.

pub mod class_map;
pub mod convention;
pub mod id_generator;
pub mod property_map;

pub use class_map::{ClassMap, ClassMapBuilder, ClassMapDraft, ClassMapped, ClassSettings, MemberBuilder};
pub use convention::{
    CamelCaseElementNameConvention, ClassConvention, Convention, ConventionPack,
    DiscriminatorIsRequiredConvention, IdGeneratorConvention, IgnoreExtraElementsConvention,
    IgnoreIfDefaultConvention, IgnoreIfNullConvention, MemberConvention,
    MemberNameElementNameConvention, MemberTypeRepresentationConvention,
    NamedExtraElementsMemberConvention, NamedIdMemberConvention, PascalCaseElementNameConvention,
    PostProcessingConvention, TypeNameDiscriminatorConvention,
};
pub use id_generator::{IdGenerator, ObjectIdGenerator, StringObjectIdGenerator};
pub use property_map::{DefaultValue, PropertyMap};

/// A setting plus whether it was set explicitly.
#[derive(Clone, Debug, Default)]
pub(crate) struct Slot<T> {
    value: T,
    explicit: bool,
}

impl<T> Slot<T> {
    pub(crate) fn new(value: T) -> Slot<T> {
        Slot {
            value,
            explicit: false,
        }
    }

    #[inline(always)]
    pub(crate) fn get(&self) -> &T {
        &self.value
    }

    pub(crate) fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub(crate) fn set(&mut self, value: T) {
        self.value = value;
        self.explicit = true;
    }

    /// Stores `value` unless the slot was set explicitly.
    pub(crate) fn fill(&mut self, value: T) -> bool {
        if self.explicit {
            return false;
        }
        self.value = value;
        true
    }
}
