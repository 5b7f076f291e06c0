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

use crate::types::DEFAULT_DISCRIMINATOR_ELEMENT;

/// Nesting limit used when no registry is involved, as in
/// [`Document::from_bytes`](crate::Document::from_bytes).
pub const DEFAULT_MAX_DEPTH: u32 = 100;

/// Registry-wide settings.
///
/// Held by the [`Registry`](crate::Registry) and consulted by the
/// `WriteContext`/`ReadContext` so encode and decode agree on them.
#[derive(Clone, Debug)]
pub struct Config {
    /// Write the id member before every other element.
    pub id_first: bool,
    /// Reject element names starting with `$` or containing `.`.
    pub check_element_names: bool,
    /// Maximum nesting of class-mapped documents, and of documents and
    /// arrays inside untyped values.
    pub max_depth: u32,
    /// Element name that carries the discriminator.
    pub discriminator_element: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            id_first: false,
            check_element_names: false,
            max_depth: DEFAULT_MAX_DEPTH,
            discriminator_element: DEFAULT_DISCRIMINATOR_ELEMENT.to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn is_id_first(&self) -> bool {
        self.id_first
    }

    #[inline(always)]
    pub fn is_check_element_names(&self) -> bool {
        self.check_element_names
    }

    #[inline(always)]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[inline(always)]
    pub fn discriminator_element(&self) -> &str {
        &self.discriminator_element
    }
}

/// Per-call overrides for [`Registry::encode_with_options`](crate::Registry::encode_with_options).
#[derive(Clone, Debug, Default)]
pub struct EncodeOptions {
    /// Overrides [`Config::id_first`] when set.
    pub id_first: Option<bool>,
    /// Overrides [`Config::check_element_names`] when set.
    pub check_element_names: Option<bool>,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id_first(mut self, id_first: bool) -> Self {
        self.id_first = Some(id_first);
        self
    }

    pub fn check_element_names(mut self, check: bool) -> Self {
        self.check_element_names = Some(check);
        self
    }
}
