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

use std::collections::{BTreeMap, HashMap};

use bsonmap_core::{doc, Binary, Document, Error, ObjectId, Registry, Value};
use bsonmap_derive::BsonObject;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tests::{element_names, nested_document_bytes, roundtrip};

#[derive(BsonObject, Debug, PartialEq, Clone, Copy)]
enum Status {
    Active,
    Suspended,
}

#[derive(BsonObject, Debug, Default, PartialEq, Clone, Copy)]
#[bsonmap(representation = "string")]
enum Color {
    Red,
    #[default]
    Green,
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct Everything {
    flag: bool,
    small: i8,
    count: i32,
    big: i64,
    unsigned: u32,
    ratio: f64,
    single: f32,
    name: String,
    maybe: Option<String>,
    none: Option<i32>,
    numbers: Vec<i32>,
    tags: BTreeMap<String, i64>,
    created: DateTime<Utc>,
    day: NaiveDate,
    oid: ObjectId,
    raw: Binary,
    payload: Document,
    any: Value,
    status: Status,
    color: Color,
}

fn everything() -> Everything {
    Everything {
        flag: true,
        small: -3,
        count: 42,
        big: 1 << 40,
        unsigned: u32::MAX,
        ratio: 0.25,
        single: 1.5,
        name: "John".to_string(),
        maybe: Some("here".to_string()),
        none: None,
        numbers: vec![3, 1, 2],
        tags: BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]),
        created: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
        day: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        oid: ObjectId::new(),
        raw: Binary::new(vec![1, 2, 3]),
        payload: doc! { "nested" => doc! { "x" => 1 }, "list" => vec![1, 2] },
        any: Value::Int64(7),
        status: Status::Suspended,
        color: Color::Red,
    }
}

#[test]
fn test_all_member_types() {
    let registry = Registry::default();
    roundtrip(&registry, &everything()).unwrap();
}

#[test]
fn test_member_element_types() {
    let registry = Registry::default();
    let document = registry.to_document(&everything()).unwrap();
    assert_eq!(
        element_names(&document),
        vec![
            "flag", "small", "count", "big", "unsigned", "ratio", "single", "name", "maybe",
            "none", "numbers", "tags", "created", "day", "oid", "raw", "payload", "any",
            "status", "color"
        ]
    );
    assert_eq!(document.get("small"), Some(&Value::Int32(-3)));
    assert_eq!(document.get("big"), Some(&Value::Int64(1 << 40)));
    assert_eq!(document.get("unsigned"), Some(&Value::Int64(u32::MAX as i64)));
    assert_eq!(document.get("none"), Some(&Value::Null));
    assert_eq!(document.get("numbers"), Some(&Value::from(vec![3, 1, 2])));
    assert_eq!(document.get("status"), Some(&Value::Int32(1)));
    assert_eq!(document.get("color"), Some(&Value::from("Red")));
    assert!(matches!(document.get("created"), Some(Value::DateTime(_))));
    assert!(matches!(document.get("day"), Some(Value::DateTime(_))));
}

#[test]
fn test_enum_defaults_and_unknown_variants() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Paint {
        color: Color,
        status: Status,
    }

    let registry = Registry::default();
    let decoded: Paint = registry.from_document(&doc! {}).unwrap();
    assert_eq!(
        decoded,
        Paint {
            color: Color::Green,
            status: Status::Active
        }
    );

    let err = registry
        .from_document::<Paint>(&doc! { "color" => "Purple" })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)), "{err}");
    let err = registry
        .from_document::<Paint>(&doc! { "status" => 9 })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)), "{err}");
}

#[test]
fn test_nested_structs_and_lists() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Address {
        street: String,
        zip: Option<i32>,
    }

    #[derive(BsonObject, Debug, PartialEq)]
    struct Person {
        name: String,
        home: Address,
        previous: Vec<Address>,
        by_label: HashMap<String, Address>,
        nicknames: Option<Vec<String>>,
    }

    let registry = Registry::default();
    let person = Person {
        name: "Ann".to_string(),
        home: Address {
            street: "Main".to_string(),
            zip: Some(1000),
        },
        previous: vec![
            Address {
                street: "Old".to_string(),
                zip: None,
            },
            Address {
                street: "Older".to_string(),
                zip: Some(7),
            },
        ],
        by_label: HashMap::from([(
            "work".to_string(),
            Address {
                street: "Office".to_string(),
                zip: Some(2),
            },
        )]),
        nicknames: Some(vec!["A".to_string(), "Annie".to_string()]),
    };
    roundtrip(&registry, &person).unwrap();

    let document = registry.to_document(&person).unwrap();
    let home = document.get("home").and_then(Value::as_document).unwrap();
    assert_eq!(home, &doc! { "street" => "Main", "zip" => 1000 });
}

#[test]
fn test_numeric_widening_on_decode() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Counters {
        small: i32,
        big: i64,
        ratio: f64,
    }

    let registry = Registry::default();
    let decoded: Counters = registry
        .from_document(&doc! { "small" => Value::Int64(5), "big" => 6, "ratio" => 2 })
        .unwrap();
    assert_eq!(
        decoded,
        Counters {
            small: 5,
            big: 6,
            ratio: 2.0
        }
    );

    let err = registry
        .from_document::<Counters>(&doc! { "small" => Value::Int64(1 << 40) })
        .unwrap_err();
    assert!(err.to_string().contains("small"), "{err}");
}

#[test]
fn test_type_mismatch_names_member() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Named {
        name: String,
    }

    let registry = Registry::default();
    let err = registry
        .from_document::<Named>(&doc! { "name" => true })
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("name"), "{message}");
    assert!(message.contains("Named"), "{message}");
}

#[test]
fn test_trailing_bytes_rejected() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Single {
        value: i32,
    }

    let registry = Registry::default();
    let mut bytes = registry.serialize(&Single { value: 1 }).unwrap();
    bytes.push(0);
    assert!(registry.deserialize::<Single>(&bytes).is_err());
}

#[test]
fn test_max_depth() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Node {
        label: i32,
        children: Vec<Node>,
    }

    fn chain(depth: i32) -> Node {
        let mut node = Node {
            label: depth,
            children: Vec::new(),
        };
        for label in (0..depth).rev() {
            node = Node {
                label,
                children: vec![node],
            };
        }
        node
    }

    let shallow = Registry::default().max_depth(3);
    roundtrip(&shallow, &chain(2)).unwrap();
    let err = shallow.serialize(&chain(5)).unwrap_err();
    assert!(matches!(err, Error::DepthExceed(_)), "{err}");

    let bytes = Registry::default().serialize(&chain(5)).unwrap();
    let err = shallow.deserialize::<Node>(&bytes).unwrap_err();
    assert!(matches!(err, Error::DepthExceed(_)), "{err}");
}

#[test]
fn test_untyped_values_respect_max_depth() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Loose {
        payload: Value,
    }

    let registry = Registry::default();
    let bytes = nested_document_bytes("payload", 20_000);
    let err = registry.deserialize::<Loose>(&bytes).unwrap_err();
    assert!(matches!(err, Error::DepthExceed(_)), "{err}");
    let err = registry.deserialize::<Document>(&bytes).unwrap_err();
    assert!(matches!(err, Error::DepthExceed(_)), "{err}");
    assert!(matches!(Document::from_bytes(&bytes), Err(Error::DepthExceed(_))));

    let roomy = Registry::default().max_depth(200);
    let bytes = nested_document_bytes("payload", 150);
    let loose: Loose = roomy.deserialize(&bytes).unwrap();
    assert!(loose.payload.as_document().is_some());
    assert_eq!(roomy.serialize(&loose).unwrap(), bytes);
    assert!(registry.deserialize::<Loose>(&bytes).is_err());
}

#[test]
fn test_unit_struct() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Marker;

    let registry = Registry::default();
    assert_eq!(registry.to_document(&Marker).unwrap(), doc! {});
    roundtrip(&registry, &Marker).unwrap();
}

#[test]
fn test_ignored_field_keeps_default() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Cached {
        key: String,
        #[bsonmap(ignore)]
        cache: Vec<u8>,
    }

    let registry = Registry::default();
    let value = Cached {
        key: "k".to_string(),
        cache: vec![9, 9],
    };
    let document = registry.to_document(&value).unwrap();
    assert_eq!(document, doc! { "key" => "k" });
    let decoded: Cached = registry.from_document(&document).unwrap();
    assert_eq!(decoded.cache, Vec::<u8>::new());
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct Sample {
    count: i32,
    big: i64,
    name: String,
    numbers: Vec<i32>,
    maybe: Option<u16>,
    flag: bool,
}

proptest! {
    #[test]
    fn prop_struct_roundtrip(
        count in any::<i32>(),
        big in any::<i64>(),
        name in "[a-zA-Z0-9 ]{0,16}",
        numbers in proptest::collection::vec(any::<i32>(), 0..8),
        maybe in proptest::option::of(any::<u16>()),
        flag in any::<bool>(),
    ) {
        let registry = Registry::default();
        let value = Sample { count, big, name, numbers, maybe, flag };
        let bytes = registry.serialize(&value).unwrap();
        prop_assert_eq!(registry.deserialize::<Sample>(&bytes).unwrap(), value);
        prop_assert_eq!(Document::from_bytes(&bytes).unwrap().to_bytes().unwrap(), bytes);
    }
}
