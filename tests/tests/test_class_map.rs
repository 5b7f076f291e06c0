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

use bsonmap_core::mapping::DefaultValue;
use bsonmap_core::{
    doc, Document, DocumentWrapper, EncodeOptions, Error, ReadContext, Registry, Value, ValueSerializer,
    WriteContext,
};
use bsonmap_derive::BsonObject;
use pretty_assertions::assert_eq;
use tests::{element_names, init_tracing, roundtrip};

#[test]
fn test_member_order() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Ordered {
        #[bsonmap(element = "A", order = 2)]
        a: i32,
        #[bsonmap(element = "B", order = 1)]
        b: i32,
        #[bsonmap(element = "C")]
        c: i32,
    }

    let registry = Registry::default();
    let document = registry.to_document(&Ordered { a: 1, b: 2, c: 3 }).unwrap();
    assert_eq!(element_names(&document), vec!["B", "A", "C"]);
    roundtrip(&registry, &Ordered { a: 1, b: 2, c: 3 }).unwrap();

    let map = registry.lookup::<Ordered>().unwrap();
    let members: Vec<&str> = map.all_members().iter().map(|m| m.member_name()).collect();
    assert_eq!(members, vec!["b", "a", "c"]);
}

#[derive(BsonObject, Debug, PartialEq)]
struct Settings {
    #[bsonmap(default = 10, serialize_default = false)]
    retries: i32,
    #[bsonmap(ignore_if_default)]
    label: String,
    #[bsonmap(ignore_if_null)]
    note: Option<String>,
    keep: Option<String>,
}

#[test]
fn test_default_values_are_suppressed() {
    let registry = Registry::default();
    let settings = Settings {
        retries: 10,
        label: String::new(),
        note: None,
        keep: None,
    };
    let document = registry.to_document(&settings).unwrap();
    assert_eq!(document, doc! { "keep" => Value::Null });
    roundtrip(&registry, &settings).unwrap();

    let changed = Settings {
        retries: 3,
        label: "x".to_string(),
        note: Some("n".to_string()),
        keep: Some("k".to_string()),
    };
    let document = registry.to_document(&changed).unwrap();
    assert_eq!(element_names(&document), vec!["retries", "label", "note", "keep"]);
    roundtrip(&registry, &changed).unwrap();
}

#[test]
fn test_default_suppression_is_exact() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Big {
        #[bsonmap(default = 9_007_199_254_740_993i64, serialize_default = false)]
        v: i64,
        #[bsonmap(default = 0.5, serialize_default = false)]
        ratio: f64,
    }

    let registry = Registry::default();
    // 2^53 is one below the default, which an f64 cannot tell apart.
    let near = Big {
        v: 9_007_199_254_740_992,
        ratio: 0.5,
    };
    let document = registry.to_document(&near).unwrap();
    assert_eq!(document, doc! { "v" => Value::Int64(9_007_199_254_740_992) });
    roundtrip(&registry, &near).unwrap();

    let at_default = Big {
        v: 9_007_199_254_740_993,
        ratio: 0.5,
    };
    assert_eq!(registry.to_document(&at_default).unwrap(), doc! {});
    roundtrip(&registry, &at_default).unwrap();

    let extremes = Big {
        v: i64::MAX,
        ratio: 0.5000000000000001,
    };
    assert_eq!(
        element_names(&registry.to_document(&extremes).unwrap()),
        vec!["v", "ratio"]
    );
    roundtrip(&registry, &extremes).unwrap();
}

#[test]
fn test_missing_elements_take_defaults() {
    let registry = Registry::default();
    let decoded: Settings = registry.from_document(&doc! {}).unwrap();
    assert_eq!(
        decoded,
        Settings {
            retries: 10,
            label: String::new(),
            note: None,
            keep: None,
        }
    );

    let map = registry.lookup::<Settings>().unwrap();
    let retries = map.member("retries").unwrap();
    assert!(matches!(
        retries.default_value(),
        Some(DefaultValue::Value(Value::Int32(10)))
    ));
    assert!(!retries.serialize_default_value());
}

#[test]
fn test_required_elements() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Login {
        #[bsonmap(required)]
        user: String,
        #[bsonmap(required, element = "pwd")]
        password: String,
        remember: bool,
    }

    let registry = Registry::default();
    let err = registry
        .from_document::<Login>(&doc! { "remember" => true })
        .unwrap_err();
    assert!(matches!(err, Error::RequiredElementMissing(_)), "{err}");
    let message = err.to_string();
    assert!(message.contains("'user'"), "{message}");
    assert!(message.contains("'pwd'"), "{message}");
    assert!(message.contains("Login"), "{message}");

    let err = registry
        .from_document::<Login>(&doc! { "user" => "ann" })
        .unwrap_err();
    assert!(err.to_string().contains("'pwd'"));
    assert!(!err.to_string().contains("'user'"));

    let decoded: Login = registry
        .from_document(&doc! { "user" => "ann", "pwd" => "secret" })
        .unwrap();
    assert!(!decoded.remember);
}

#[test]
fn test_read_only_member_is_encode_only() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Invoice {
        net: i32,
        #[bsonmap(read_only)]
        gross: i32,
    }

    let registry = Registry::default();
    let document = registry.to_document(&Invoice { net: 10, gross: 12 }).unwrap();
    assert_eq!(document, doc! { "net" => 10, "gross" => 12 });
    let err = registry.from_document::<Invoice>(&document).unwrap_err();
    assert!(matches!(err, Error::UnsupportedTypeForDecode(_)), "{err}");
    assert!(err.is_mapping_error());
}

#[test]
fn test_anonymous_type_is_encode_only() {
    #[derive(BsonObject, Debug, PartialEq)]
    #[bsonmap(anonymous)]
    struct Projection {
        total: i64,
    }

    let registry = Registry::default();
    let document = registry.to_document(&Projection { total: 5 }).unwrap();
    assert_eq!(document, doc! { "total" => Value::Int64(5) });
    let err = registry.from_document::<Projection>(&document).unwrap_err();
    assert!(matches!(err, Error::CannotDeserializeAnonymousType(_)), "{err}");
}

#[test]
fn test_duplicate_registration() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Once {
        value: i32,
    }

    let registry = Registry::default();
    registry.auto_register::<Once>().unwrap();
    let err = registry.auto_register::<Once>().unwrap_err();
    assert!(matches!(err, Error::DuplicateRegistration(_)), "{err}");

    #[derive(BsonObject, Debug, PartialEq)]
    struct UsedFirst {
        value: i32,
    }

    registry.lookup::<UsedFirst>().unwrap();
    let err = registry
        .register_type::<UsedFirst, _>(|map| {
            map.auto_map();
        })
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateRegistration(_)), "{err}");
}

#[test]
fn test_representation_override() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Account {
        #[bsonmap(representation = "string")]
        balance: i64,
        #[bsonmap(representation = "int32")]
        ratio: f64,
        #[bsonmap(representation = "int64")]
        small: i32,
    }

    let registry = Registry::default();
    let account = Account {
        balance: 9_007_199_254_740_993,
        ratio: 4.0,
        small: 2,
    };
    let document = registry.to_document(&account).unwrap();
    assert_eq!(
        document,
        doc! {
            "balance" => "9007199254740993",
            "ratio" => 4,
            "small" => Value::Int64(2),
        }
    );
    roundtrip(&registry, &account).unwrap();

    let lossy = Account {
        balance: 0,
        ratio: 4.5,
        small: 0,
    };
    let err = registry.serialize(&lossy).unwrap_err();
    assert!(matches!(err, Error::EncodeError(_)), "{err}");
    assert!(err.to_string().contains("ratio"), "{err}");
}

struct UpperCase;

impl ValueSerializer<String> for UpperCase {
    fn serialize(&self, value: &String, context: &mut WriteContext) -> Result<(), Error> {
        context.writer.write_string(&value.to_uppercase())
    }

    fn deserialize(&self, context: &mut ReadContext) -> Result<String, Error> {
        Ok(context.reader.read_string()?.to_lowercase())
    }
}

#[test]
fn test_explicit_registration() {
    init_tracing();

    #[derive(BsonObject, Debug, PartialEq)]
    struct Person {
        name: String,
        age: i32,
        nickname: Option<String>,
    }

    let registry = Registry::default();
    registry
        .register_type::<Person, _>(|map| {
            map.auto_map();
            if let Some(age) = map.member_mut("age") {
                age.set_element_name("years").set_order(1);
            }
            map.map_member::<String>("name", |p| &p.name, |p| &mut p.name)
                .set_serializer(UpperCase);
            map.unmap_member("nickname");
            map.set_discriminator("person");
        })
        .unwrap();

    let person = Person {
        name: "ann".to_string(),
        age: 30,
        nickname: Some("a".to_string()),
    };
    let document = registry.to_document(&person).unwrap();
    assert_eq!(document, doc! { "years" => 30, "name" => "ANN" });

    let decoded: Person = registry.from_document(&document).unwrap();
    assert_eq!(
        decoded,
        Person {
            name: "ann".to_string(),
            age: 30,
            nickname: None,
        }
    );
    let map = registry.lookup::<Person>().unwrap();
    assert_eq!(map.discriminator(), "person");
    assert!(map.member("name").unwrap().has_serializer_override());
}

#[test]
fn test_mapping_errors_surface_on_first_use() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Clash {
        #[bsonmap(element = "x")]
        a: i32,
        #[bsonmap(element = "x")]
        b: i32,
    }

    #[derive(BsonObject, Debug, PartialEq)]
    struct BadExtra {
        #[bsonmap(extra_elements)]
        extra: i32,
    }

    #[derive(BsonObject, Debug, PartialEq)]
    struct BadRepresentation {
        #[bsonmap(representation = "decimal")]
        value: i32,
    }

    #[derive(BsonObject, Debug, PartialEq)]
    struct TwoIds {
        #[bsonmap(id)]
        first: i32,
        #[bsonmap(id)]
        second: i32,
    }

    let registry = Registry::default();
    let err = registry.serialize(&Clash { a: 1, b: 2 }).unwrap_err();
    assert!(matches!(err, Error::Mapping(_)), "{err}");
    assert!(err.to_string().contains("'x'"), "{err}");
    // The failure is remembered.
    let again = registry.serialize(&Clash { a: 1, b: 2 }).unwrap_err();
    assert_eq!(again.to_string(), err.to_string());

    let err = registry.serialize(&BadExtra { extra: 1 }).unwrap_err();
    assert!(matches!(err, Error::Mapping(_)), "{err}");
    let err = registry
        .serialize(&BadRepresentation { value: 1 })
        .unwrap_err();
    assert!(matches!(err, Error::Mapping(_)), "{err}");
    let err = registry
        .serialize(&TwoIds {
            first: 1,
            second: 2,
        })
        .unwrap_err();
    assert!(matches!(err, Error::Mapping(_)), "{err}");
}

#[test]
fn test_id_first() {
    #[derive(BsonObject, Debug, PartialEq)]
    #[bsonmap(discriminator = "entity", discriminator_required)]
    struct Entity {
        name: String,
        #[bsonmap(id)]
        key: i32,
    }

    let entity = Entity {
        name: "e".to_string(),
        key: 7,
    };
    let registry = Registry::default();
    let document = registry.to_document(&entity).unwrap();
    assert_eq!(element_names(&document), vec!["_t", "name", "_id"]);
    assert_eq!(document.get("_t"), Some(&Value::from("entity")));

    let bytes = registry
        .serialize_with_options(&entity, &EncodeOptions::new().id_first(true))
        .unwrap();
    let document = Document::from_bytes(&bytes).unwrap();
    assert_eq!(element_names(&document), vec!["_id", "_t", "name"]);

    let id_first = Registry::default().id_first(true);
    let document = id_first.to_document(&entity).unwrap();
    assert_eq!(element_names(&document), vec!["_id", "_t", "name"]);
    roundtrip(&id_first, &entity).unwrap();
}

#[test]
fn test_element_name_checks() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Query {
        #[bsonmap(element = "$set")]
        set: i32,
    }

    let registry = Registry::default();
    registry.serialize(&Query { set: 1 }).unwrap();

    let err = registry
        .serialize_with_options(&Query { set: 1 }, &EncodeOptions::new().check_element_names(true))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidElementName(_)), "{err}");

    let strict = Registry::default().check_element_names(true);
    assert!(strict.serialize(&Query { set: 1 }).is_err());

    // Update documents carry operators, so their names are never checked.
    let update = DocumentWrapper::update(Query { set: 2 });
    assert!(update.is_update_document());
    assert_eq!(strict.to_document(&update).unwrap(), doc! { "$set" => 2 });

    let batch = DocumentWrapper::create_multiple(vec![Query { set: 3 }, Query { set: 4 }]);
    assert_eq!(batch.len(), 2);
    assert!(batch.iter().all(|w| !w.is_update_document()));
    assert_eq!(registry.to_document(&batch[1]).unwrap(), doc! { "$set" => 4 });
    assert!(strict.serialize(&batch[0]).is_err());
}
