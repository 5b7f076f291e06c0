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

use std::sync::Arc;
use std::thread;

use bsonmap_core::{doc, Error, ObjectId, Registry, TypeKey, Value};
use bsonmap_derive::BsonObject;
use pretty_assertions::assert_eq;
use tests::{init_tracing, roundtrip};

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct User {
    id: ObjectId,
    name: String,
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct Ticket {
    #[bsonmap(id, representation = "objectid")]
    key: String,
    title: String,
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct Note {
    text: String,
}

#[test]
fn test_ensure_object_id() {
    let registry = Registry::default();
    let mut user = User {
        id: ObjectId::default(),
        name: "ann".to_string(),
    };
    let id = registry.ensure_document_id(&mut user).unwrap().unwrap();
    assert!(!user.id.is_empty());
    assert_eq!(id, Value::ObjectId(user.id));

    // An assigned id is kept.
    let again = registry.ensure_document_id(&mut user).unwrap();
    assert_eq!(again, Some(Value::ObjectId(user.id)));

    let document = registry.to_document(&user).unwrap();
    assert_eq!(document.get("_id"), Some(&Value::ObjectId(user.id)));
    roundtrip(&registry, &user).unwrap();
}

#[test]
fn test_ensure_string_object_id() {
    let registry = Registry::default();
    let mut ticket = Ticket {
        key: String::new(),
        title: "bug".to_string(),
    };
    let id = registry.ensure_document_id(&mut ticket).unwrap().unwrap();
    assert_eq!(ticket.key.len(), 24);
    assert_eq!(id, Value::String(ticket.key.clone()));

    let document = registry.to_document(&ticket).unwrap();
    let stored = document.get("_id").and_then(Value::as_object_id).unwrap();
    assert_eq!(stored.to_hex(), ticket.key);
    roundtrip(&registry, &ticket).unwrap();
}

#[test]
fn test_document_id_accessors() {
    let registry = Registry::default();
    let mut ticket = Ticket {
        key: String::new(),
        title: "bug".to_string(),
    };
    assert_eq!(
        registry.get_document_id(&ticket).unwrap(),
        Some(Value::ObjectId(ObjectId::default()))
    );

    let oid = ObjectId::new();
    registry
        .set_document_id(&mut ticket, &Value::ObjectId(oid))
        .unwrap();
    assert_eq!(ticket.key, oid.to_hex());

    let mut note = Note {
        text: "t".to_string(),
    };
    assert_eq!(registry.get_document_id(&note).unwrap(), None);
    assert_eq!(registry.ensure_document_id(&mut note).unwrap(), None);
    let err = registry
        .set_document_id(&mut note, &Value::Int32(1))
        .unwrap_err();
    assert!(matches!(err, Error::Mapping(_)), "{err}");
}

#[test]
fn test_unregister_and_reset() {
    init_tracing();
    let registry = Registry::default();
    registry.lookup::<User>().unwrap();
    registry.lookup::<Note>().unwrap();
    assert!(registry.is_registered::<User>());
    assert_eq!(
        registry.discriminator_candidates("User"),
        vec![TypeKey::of::<User>()]
    );

    assert!(registry.unregister::<User>());
    assert!(!registry.unregister::<User>());
    assert!(!registry.is_registered::<User>());
    assert!(registry.discriminator_candidates("User").is_empty());
    assert!(registry.is_registered::<Note>());

    // An unregistered type can be registered again explicitly.
    registry
        .register_type::<User, _>(|map| {
            map.auto_map();
            map.set_discriminator("person");
        })
        .unwrap();
    assert_eq!(registry.lookup::<User>().unwrap().discriminator(), "person");

    registry.reset();
    assert!(!registry.is_registered::<User>());
    assert!(!registry.is_registered::<Note>());
    assert!(registry.discriminator_candidates("person").is_empty());

    // Maps are rebuilt on demand after a reset.
    let note = Note {
        text: "again".to_string(),
    };
    roundtrip(&registry, &note).unwrap();
}

#[test]
fn test_concurrent_use() {
    let registry = Arc::new(Registry::default());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            thread::spawn(move || {
                for j in 0..50 {
                    let note = Note {
                        text: format!("{i}-{j}"),
                    };
                    let bytes = registry.serialize(&note).unwrap();
                    let decoded: Note = registry.deserialize(&bytes).unwrap();
                    assert_eq!(decoded, note);

                    let user = User {
                        id: ObjectId::new(),
                        name: format!("user {i}"),
                    };
                    let decoded: User = registry
                        .from_document(&registry.to_document(&user).unwrap())
                        .unwrap();
                    assert_eq!(decoded, user);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(registry.discriminator_candidates("Note").len(), 1);
}

#[test]
fn test_map_is_shared_after_first_use() {
    let registry = Registry::default();
    let first = registry.lookup::<Note>().unwrap();
    let second = registry.lookup::<Note>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let err = registry
        .lookup_by_key(TypeKey::of::<Ticket>())
        .unwrap_err();
    assert!(matches!(err, Error::Mapping(_)), "{err}");
}

#[test]
fn test_from_document_round_trip() {
    let registry = Registry::default();
    let document = doc! { "_id" => ObjectId::new(), "name" => "bo" };
    let user: User = registry.from_document(&document).unwrap();
    assert_eq!(registry.to_document(&user).unwrap(), document);
}
