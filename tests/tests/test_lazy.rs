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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bsonmap_core::value::{ByteBuffer, RawSlice};
use bsonmap_core::{doc, Array, Document, Error, LazyArray, LazyDocument, Registry, Value};
use bsonmap_derive::BsonObject;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tests::nested_document_bytes;

#[derive(BsonObject, Debug, PartialEq)]
struct Envelope {
    kind: String,
    payload: LazyDocument,
    items: LazyArray,
}

fn payload() -> Document {
    doc! {
        "user" => "ann",
        "address" => doc! { "city" => "Oslo", "zip" => 150 },
        "scores" => vec![1, 2, 3],
    }
}

fn envelope_document() -> Document {
    doc! {
        "kind" => "event",
        "payload" => payload(),
        "items" => vec![Value::from(doc! { "n" => 1 }), Value::from("two")],
    }
}

#[test]
fn test_lazy_members_stay_undecoded() {
    let registry = Registry::default();
    let bytes = envelope_document().to_bytes().unwrap();
    let mut envelope: Envelope = registry.deserialize(&bytes).unwrap();
    assert_eq!(envelope.kind, "event");
    assert!(!envelope.payload.is_materialized());
    assert!(!envelope.items.is_materialized());

    // Untouched lazy members are copied verbatim.
    assert_eq!(registry.serialize(&envelope).unwrap(), bytes);

    assert_eq!(
        envelope.payload.get("user").unwrap(),
        Some(&Value::from("ann"))
    );
    assert!(envelope.payload.is_materialized());
    match envelope.payload.get("address").unwrap() {
        Some(Value::LazyDocument(address)) => assert!(!address.is_materialized()),
        other => panic!("expected a lazy child, got {other:?}"),
    }
    assert_eq!(envelope.items.len().unwrap(), 2);

    // Materialized members encode to the same bytes.
    assert_eq!(registry.serialize(&envelope).unwrap(), bytes);
}

#[test]
fn test_lazy_member_edits_are_written() {
    let registry = Registry::default();
    let mut envelope: Envelope = registry.from_document(&envelope_document()).unwrap();
    envelope.payload.insert("seen", true).unwrap();
    envelope.payload.remove("scores").unwrap();
    envelope.items.push(3).unwrap();

    let document = registry.to_document(&envelope).unwrap();
    assert_eq!(
        document.get("payload"),
        Some(&Value::from(doc! {
            "user" => "ann",
            "address" => doc! { "city" => "Oslo", "zip" => 150 },
            "seen" => true,
        }))
    );
    assert_eq!(
        document.get("items").and_then(Value::as_array).map(Array::len),
        Some(3)
    );
}

#[test]
fn test_lazy_equals_eager() {
    let lazy = LazyDocument::from_bytes(payload().to_bytes().unwrap()).unwrap();
    assert_eq!(Value::LazyDocument(lazy.clone()), Value::Document(payload()));
    assert_eq!(lazy.to_document().unwrap(), payload());
    assert!(!lazy.is_materialized());

    let copy = lazy.deep_clone().unwrap();
    assert_eq!(copy, lazy);
}

#[test]
fn test_lazy_rejects_bad_slices() {
    assert!(LazyDocument::from_bytes(vec![1, 2, 3]).is_err());
    let mut bytes = payload().to_bytes().unwrap();
    bytes.pop();
    assert!(LazyDocument::from_bytes(bytes).is_err());
}

#[test]
fn test_deep_lazy_documents() {
    let bytes = nested_document_bytes("a", 300);
    let lazy = LazyDocument::from_bytes(bytes.clone()).unwrap();
    let err = lazy.to_document().unwrap_err();
    assert!(matches!(err, Error::DepthExceed(_)), "{err}");

    // Walking down one level at a time has no depth limit.
    let mut current = lazy;
    let mut levels = 0;
    loop {
        match current.get("a").unwrap().cloned() {
            Some(Value::LazyDocument(child)) => {
                current = child;
                levels += 1;
            }
            None => break,
            other => panic!("expected a lazy child, got {other:?}"),
        }
    }
    assert_eq!(levels, 300);
    assert!(current.is_empty().unwrap());
}

struct CountingBuffer {
    bytes: Vec<u8>,
    released: Arc<AtomicUsize>,
}

impl ByteBuffer for CountingBuffer {
    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for CountingBuffer {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_materializing_releases_the_slice() {
    let released = Arc::new(AtomicUsize::new(0));
    let mut lazy = LazyDocument::new(RawSlice::new(CountingBuffer {
        bytes: payload().to_bytes().unwrap(),
        released: released.clone(),
    }));
    assert_eq!(released.load(Ordering::SeqCst), 0);
    lazy.ensure_materialized().unwrap();
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert!(lazy.raw_bytes().is_none());
    assert_eq!(lazy.len().unwrap(), 3);
}

#[test]
fn test_dispose() {
    let released = Arc::new(AtomicUsize::new(0));
    let mut lazy = LazyArray::new(RawSlice::new(CountingBuffer {
        // Arrays are framed as documents keyed "0", "1", ...
        bytes: doc! { "0" => 1, "1" => "x" }.to_bytes().unwrap(),
        released: released.clone(),
    }));
    lazy.dispose();
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert!(lazy.is_disposed());
    assert!(matches!(lazy.len(), Err(Error::UseAfterDispose(_))));
    assert!(matches!(lazy.to_array(), Err(Error::UseAfterDispose(_))));
    assert!(matches!(lazy.deep_clone(), Err(Error::UseAfterDispose(_))));
    lazy.dispose();
    assert_eq!(released.load(Ordering::SeqCst), 1);

    let registry = Registry::default();
    let mut envelope: Envelope = registry.from_document(&envelope_document()).unwrap();
    envelope.payload.ensure_materialized().unwrap();
    envelope.payload.dispose();
    let err = registry.serialize(&envelope).unwrap_err();
    assert!(matches!(err, Error::UseAfterDispose(_)), "{err}");
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::Int32),
        any::<i64>().prop_map(Value::Int64),
        "[a-z]{0,8}".prop_map(Value::String),
        any::<bool>().prop_map(Value::Boolean),
        Just(Value::Null),
    ]
}

fn document_from(entries: Vec<(String, Value)>) -> Document {
    let mut document = Document::new();
    for (name, value) in entries {
        document.insert(name, value);
    }
    document
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(8, 64, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| Value::Array(items.into_iter().collect())),
            proptest::collection::vec(("[a-z]{1,6}", inner), 0..4)
                .prop_map(|entries| Value::Document(document_from(entries))),
        ]
    })
}

fn document() -> impl Strategy<Value = Document> {
    proptest::collection::vec(("[a-z]{1,6}", value()), 0..6).prop_map(document_from)
}

proptest! {
    #[test]
    fn prop_lazy_matches_eager(document in document()) {
        let bytes = document.to_bytes().unwrap();
        let mut lazy = LazyDocument::from_bytes(bytes.clone()).unwrap();
        prop_assert_eq!(lazy.to_document().unwrap(), document.clone());

        let registry = Registry::default();
        prop_assert_eq!(registry.serialize(&lazy).unwrap(), bytes.clone());

        lazy.ensure_materialized().unwrap();
        prop_assert_eq!(lazy.len().unwrap(), document.len());
        prop_assert_eq!(registry.serialize(&lazy).unwrap(), bytes);
        prop_assert!(Value::LazyDocument(lazy) == Value::Document(document));
    }
}
