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

use bsonmap_core::mapping::{
    CamelCaseElementNameConvention, ClassSettings, Convention, DiscriminatorIsRequiredConvention,
    IgnoreExtraElementsConvention, IgnoreIfDefaultConvention, IgnoreIfNullConvention,
    MemberConvention, MemberTypeRepresentationConvention, NamedIdMemberConvention,
    PascalCaseElementNameConvention, PostProcessingConvention, TypeNameDiscriminatorConvention,
};
use bsonmap_core::{doc, ConventionPack, ElementType, Error, PropertyMap, Registry, Value};
use bsonmap_derive::BsonObject;
use pretty_assertions::assert_eq;
use tests::{element_names, roundtrip};

#[derive(BsonObject, Debug, PartialEq)]
struct Customer {
    first_name: String,
    last_name: String,
    #[bsonmap(element = "Explicit")]
    explicit_name: String,
}

#[derive(BsonObject, Debug, PartialEq)]
struct Supplier {
    company_name: String,
}

fn customer() -> Customer {
    Customer {
        first_name: "John".to_string(),
        last_name: "Smith".to_string(),
        explicit_name: "x".to_string(),
    }
}

#[test]
fn test_camel_case_pack_with_predicate() {
    let registry = Registry::default();
    registry.register_convention_pack(
        ConventionPack::new("camel").with(Convention::member(CamelCaseElementNameConvention)),
        |key| key.short_name() == "Customer",
    );

    let document = registry.to_document(&customer()).unwrap();
    assert_eq!(
        element_names(&document),
        vec!["firstName", "lastName", "Explicit"]
    );
    roundtrip(&registry, &customer()).unwrap();

    let supplier = Supplier {
        company_name: "Acme".to_string(),
    };
    let document = registry.to_document(&supplier).unwrap();
    assert_eq!(element_names(&document), vec!["company_name"]);
}

#[test]
fn test_later_pack_wins() {
    let registry = Registry::default();
    registry.register_convention_pack(
        ConventionPack::new("camel").with(Convention::member(CamelCaseElementNameConvention)),
        |_| true,
    );
    registry.register_convention_pack(
        ConventionPack::new("pascal").with(Convention::member(PascalCaseElementNameConvention)),
        |_| true,
    );
    let document = registry.to_document(&customer()).unwrap();
    assert_eq!(
        element_names(&document),
        vec!["FirstName", "LastName", "Explicit"]
    );
}

#[test]
fn test_packs_only_affect_maps_built_later() {
    let registry = Registry::default();
    registry.lookup::<Supplier>().unwrap();
    registry.register_convention_pack(
        ConventionPack::new("camel").with(Convention::member(CamelCaseElementNameConvention)),
        |_| true,
    );
    let supplier = Supplier {
        company_name: "Acme".to_string(),
    };
    let document = registry.to_document(&supplier).unwrap();
    assert_eq!(element_names(&document), vec!["company_name"]);
    assert_eq!(
        element_names(&registry.to_document(&customer()).unwrap()),
        vec!["firstName", "lastName", "Explicit"]
    );
}

#[test]
fn test_ignore_if_null_and_default() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Sparse {
        name: Option<String>,
        count: i32,
        tags: Vec<String>,
        #[bsonmap(serialize_default = true)]
        always: i32,
    }

    let registry = Registry::default();
    registry.register_convention_pack(
        ConventionPack::new("sparse")
            .with(Convention::member(IgnoreIfNullConvention(true)))
            .with(Convention::member(IgnoreIfDefaultConvention(true))),
        |_| true,
    );

    let empty = Sparse {
        name: None,
        count: 0,
        tags: Vec::new(),
        always: 0,
    };
    let document = registry.to_document(&empty).unwrap();
    assert_eq!(document, doc! { "always" => 0 });
    roundtrip(&registry, &empty).unwrap();

    let full = Sparse {
        name: Some("n".to_string()),
        count: 2,
        tags: vec!["t".to_string()],
        always: 1,
    };
    let document = registry.to_document(&full).unwrap();
    assert_eq!(element_names(&document), vec!["name", "count", "tags", "always"]);
}

#[test]
fn test_type_name_discriminator() {
    let registry = Registry::default();
    registry.register_convention_pack(
        ConventionPack::new("type names")
            .with(Convention::class(TypeNameDiscriminatorConvention))
            .with(Convention::class(DiscriminatorIsRequiredConvention(true))),
        |key| key.short_name() == "Supplier",
    );
    let supplier = Supplier {
        company_name: "Acme".to_string(),
    };
    let document = registry.to_document(&supplier).unwrap();
    assert_eq!(
        document.get("_t"),
        Some(&Value::from(std::any::type_name::<Supplier>()))
    );
    roundtrip(&registry, &supplier).unwrap();
}

#[test]
fn test_member_type_representation() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Ledger {
        credit: i64,
        debit: i64,
        #[bsonmap(representation = "int64")]
        pinned: i64,
        entries: i32,
    }

    let registry = Registry::default();
    registry.register_convention_pack(
        ConventionPack::new("i64 as string").with(Convention::member(
            MemberTypeRepresentationConvention::new::<i64>(ElementType::String),
        )),
        |_| true,
    );
    let ledger = Ledger {
        credit: 10,
        debit: -3,
        pinned: 4,
        entries: 2,
    };
    let document = registry.to_document(&ledger).unwrap();
    assert_eq!(
        document,
        doc! {
            "credit" => "10",
            "debit" => "-3",
            "pinned" => Value::Int64(4),
            "entries" => 2,
        }
    );
    roundtrip(&registry, &ledger).unwrap();
}

#[test]
fn test_strict_pack() {
    let registry = Registry::default();
    registry.register_convention_pack(
        ConventionPack::new("strict").with(Convention::class(IgnoreExtraElementsConvention(false))),
        |_| true,
    );
    let err = registry
        .from_document::<Supplier>(&doc! { "company_name" => "Acme", "stale" => 1 })
        .unwrap_err();
    assert!(matches!(err, Error::UnexpectedElement(_)), "{err}");
}

#[test]
fn test_named_id_member() {
    #[derive(BsonObject, Debug, PartialEq)]
    struct Keyed {
        key: i32,
        id: i32,
    }

    let registry = Registry::default();
    let document = registry.to_document(&Keyed { key: 1, id: 2 }).unwrap();
    assert_eq!(element_names(&document), vec!["key", "_id"]);

    let renamed = Registry::default();
    renamed.register_convention_pack(
        ConventionPack::new("key ids")
            .with(Convention::member(NamedIdMemberConvention::new(["key"]))),
        |_| true,
    );
    let document = renamed.to_document(&Keyed { key: 1, id: 2 }).unwrap();
    // Both members are marked; the first one declared becomes the id.
    assert_eq!(element_names(&document), vec!["_id", "id"]);
    let map = renamed.lookup::<Keyed>().unwrap();
    assert_eq!(map.id_member().map(|m| m.member_name()), Some("key"));
}

struct UpperSnake;

impl MemberConvention for UpperSnake {
    fn name(&self) -> &str {
        "UpperSnake"
    }

    fn apply(&self, _class: &ClassSettings, member: &mut PropertyMap) {
        let name = member.member_name().to_uppercase();
        member.fill_element_name(name);
    }
}

struct RequireAll;

impl PostProcessingConvention for RequireAll {
    fn name(&self) -> &str {
        "RequireAll"
    }

    fn apply(&self, _class: &mut ClassSettings, members: &mut [PropertyMap]) {
        for member in members.iter_mut() {
            member.set_is_required(true);
        }
    }
}

#[test]
fn test_custom_conventions() {
    let registry = Registry::default();
    registry.register_convention_pack(
        ConventionPack::new("custom")
            .with(Convention::member(UpperSnake))
            .with(Convention::post_processing(RequireAll)),
        |key| key.short_name() == "Supplier",
    );
    let supplier = Supplier {
        company_name: "Acme".to_string(),
    };
    assert_eq!(
        registry.to_document(&supplier).unwrap(),
        doc! { "COMPANY_NAME" => "Acme" }
    );
    let err = registry.from_document::<Supplier>(&doc! {}).unwrap_err();
    assert!(matches!(err, Error::RequiredElementMissing(_)), "{err}");

    let pack = ConventionPack::default_pack();
    assert!(!pack.is_empty());
    assert!(pack.conventions().iter().any(|c| c.name() == "NamedIdMember"));
}
