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

//! Shared helpers for the integration tests.

use std::fmt::Debug;

use bsonmap_core::{Document, Error, Registry, Serializer};

/// Encodes `value`, decodes it back and checks the two are equal.
pub fn roundtrip<T>(registry: &Registry, value: &T) -> Result<T, Error>
where
    T: Serializer + PartialEq + Debug,
{
    let bytes = registry.serialize(value)?;
    let decoded: T = registry.deserialize(&bytes)?;
    assert_eq!(&decoded, value);
    Ok(decoded)
}

/// Element names of a document in encoded order.
pub fn element_names(document: &Document) -> Vec<String> {
    document.names().map(str::to_string).collect()
}

/// Installs a test subscriber once so `RUST_LOG=bsonmap_core=trace` shows
/// the registry's events.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Encodes `{name: {"a": {"a": ... {}}}}` with `levels` documents under
/// `name`, the innermost one empty.
///
/// Built byte by byte so arbitrarily deep inputs can be produced without
/// recursion.
pub fn nested_document_bytes(name: &str, levels: usize) -> Vec<u8> {
    assert!(levels > 0);
    let chain_len = |k: usize| 5 + 8 * (k - 1);
    let total = 4 + 1 + name.len() + 1 + chain_len(levels) + 1;
    let mut bytes = Vec::with_capacity(total);
    bytes.extend_from_slice(&(total as i32).to_le_bytes());
    bytes.push(0x03);
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);
    for k in (2..=levels).rev() {
        bytes.extend_from_slice(&(chain_len(k) as i32).to_le_bytes());
        bytes.extend_from_slice(&[0x03, b'a', 0]);
    }
    bytes.extend_from_slice(&[5, 0, 0, 0, 0]);
    bytes.resize(bytes.len() + levels - 1, 0);
    bytes.push(0);
    debug_assert_eq!(bytes.len(), total);
    bytes
}
