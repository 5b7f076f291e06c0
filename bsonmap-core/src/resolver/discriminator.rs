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

use std::collections::HashMap;

use crate::types::TypeKey;

/// Discriminator value to the types that publish it.
///
/// Append-only while a type is registered. Candidates keep registration
/// order so error messages are stable.
#[derive(Debug, Default)]
pub struct DiscriminatorRegistry {
    by_value: HashMap<String, Vec<TypeKey>>,
}

impl DiscriminatorRegistry {
    /// Records that `key` answers to `discriminator`. Idempotent.
    pub fn register(&mut self, key: TypeKey, discriminator: &str) -> bool {
        let candidates = self.by_value.entry(discriminator.to_string()).or_default();
        if candidates.contains(&key) {
            return false;
        }
        candidates.push(key);
        true
    }

    pub fn candidates(&self, discriminator: &str) -> &[TypeKey] {
        self.by_value
            .get(discriminator)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn remove_type(&mut self, key: TypeKey) {
        self.by_value.retain(|_, candidates| {
            candidates.retain(|c| *c != key);
            !candidates.is_empty()
        });
    }

    pub(crate) fn clear(&mut self) {
        self.by_value.clear();
    }

    pub fn len(&self) -> usize {
        self.by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }
}
