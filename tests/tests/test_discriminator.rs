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

use std::fmt::Debug;

use bsonmap_core::{doc, polymorphic, AsAny, DocumentWrapper, Error, Registry, TypeKey, Value};
use bsonmap_derive::BsonObject;
use pretty_assertions::assert_eq;
use tests::{element_names, init_tracing, roundtrip};

#[derive(BsonObject, Debug, PartialEq, Clone)]
#[bsonmap(discriminator_required, known_types(Dog))]
struct Animal {
    name: String,
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct Dog {
    #[bsonmap(base)]
    animal: Animal,
    breed: String,
}

fn rex() -> Dog {
    Dog {
        animal: Animal {
            name: "Rex".to_string(),
        },
        breed: "Lab".to_string(),
    }
}

#[test]
fn test_base_members_are_inherited() {
    let registry = Registry::default();
    let document = registry.to_document(&rex()).unwrap();
    assert_eq!(
        document,
        doc! { "_t" => "Dog", "name" => "Rex", "breed" => "Lab" }
    );
    roundtrip(&registry, &rex()).unwrap();

    let map = registry.lookup::<Dog>().unwrap();
    assert_eq!(map.declared_members().len(), 1);
    assert_eq!(map.all_members().len(), 2);
    assert_eq!(
        map.base_class_map().map(|b| b.type_key()),
        Some(TypeKey::of::<Animal>())
    );
}

#[test]
fn test_required_discriminator_on_base() {
    let registry = Registry::default();
    let animal = Animal {
        name: "Tom".to_string(),
    };
    let document = registry.to_document(&animal).unwrap();
    assert_eq!(element_names(&document), vec!["_t", "name"]);
    assert_eq!(document.get("_t"), Some(&Value::from("Animal")));
}

#[test]
fn test_known_types_allow_decoding_subtype_as_base() {
    init_tracing();
    let bytes = Registry::default().serialize(&rex()).unwrap();

    // A fresh registry has never seen Dog; Animal's known types bring it in.
    let registry = Registry::default();
    let decoded: Animal = registry.deserialize(&bytes).unwrap();
    assert_eq!(
        decoded,
        Animal {
            name: "Rex".to_string()
        }
    );
    assert!(registry.is_registered::<Dog>());
    assert!(registry.is_assignable(TypeKey::of::<Dog>(), TypeKey::of::<Animal>()));
    assert!(!registry.is_assignable(TypeKey::of::<Animal>(), TypeKey::of::<Dog>()));
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct Vehicle {
    wheels: i32,
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct Car {
    #[bsonmap(base)]
    vehicle: Vehicle,
    seats: i32,
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct SportsCar {
    #[bsonmap(base)]
    car: Car,
    top_speed: i32,
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
#[bsonmap(discriminator = "Car")]
struct Truck {
    #[bsonmap(base)]
    vehicle: Vehicle,
    load: i32,
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
#[bsonmap(discriminator = "Car")]
struct Toy {
    size: i32,
}

fn sedan() -> Car {
    Car {
        vehicle: Vehicle { wheels: 4 },
        seats: 5,
    }
}

#[test]
fn test_unknown_subtype_needs_registration() {
    let bytes = DocumentWrapper::with_nominal_type::<Vehicle, Car>(sedan())
        .to_document(&Registry::default())
        .unwrap()
        .to_bytes()
        .unwrap();

    let registry = Registry::default();
    let err = registry.deserialize::<Vehicle>(&bytes).unwrap_err();
    assert!(matches!(err, Error::UnknownDiscriminator(_)), "{err}");

    registry.lookup::<Car>().unwrap();
    let decoded: Vehicle = registry.deserialize(&bytes).unwrap();
    assert_eq!(decoded, Vehicle { wheels: 4 });
}

#[test]
fn test_discriminator_written_only_when_types_differ() {
    let registry = Registry::default();
    let document = registry.to_document(&sedan()).unwrap();
    assert_eq!(document, doc! { "wheels" => 4, "seats" => 5 });

    let wrapped = DocumentWrapper::with_nominal_type::<Vehicle, Car>(sedan());
    assert_eq!(wrapped.nominal_type(), TypeKey::of::<Vehicle>());
    assert_eq!(wrapped.value_type(), TypeKey::of::<Car>());
    let document = wrapped.to_document(&registry).unwrap();
    assert_eq!(
        document,
        doc! { "_t" => "Car", "wheels" => 4, "seats" => 5 }
    );
    let decoded: Car = registry.from_document(&document).unwrap();
    assert_eq!(decoded, sedan());
}

#[test]
fn test_multi_level_inheritance() {
    let registry = Registry::default();
    let fast = SportsCar {
        car: sedan(),
        top_speed: 300,
    };
    let document = DocumentWrapper::with_nominal_type::<Vehicle, SportsCar>(fast.clone())
        .to_document(&registry)
        .unwrap();
    assert_eq!(
        element_names(&document),
        vec!["_t", "wheels", "seats", "top_speed"]
    );

    assert!(registry.is_assignable(TypeKey::of::<SportsCar>(), TypeKey::of::<Vehicle>()));
    let as_vehicle: Vehicle = registry.from_document(&document).unwrap();
    assert_eq!(as_vehicle, Vehicle { wheels: 4 });
    let as_car: Car = registry.from_document(&document).unwrap();
    assert_eq!(as_car, sedan());
    let as_itself: SportsCar = registry.from_document(&document).unwrap();
    assert_eq!(as_itself, fast);
}

#[test]
fn test_ambiguous_discriminator() {
    let registry = Registry::default();
    registry.lookup::<Car>().unwrap();
    registry.lookup::<Truck>().unwrap();
    assert_eq!(registry.discriminator_candidates("Car").len(), 2);

    let err = registry
        .from_document::<Vehicle>(&doc! { "_t" => "Car", "wheels" => 4 })
        .unwrap_err();
    assert!(matches!(err, Error::AmbiguousDiscriminator(_)), "{err}");
}

#[test]
fn test_single_assignable_candidate_wins() {
    let registry = Registry::default();
    registry.lookup::<Car>().unwrap();
    registry.lookup::<Toy>().unwrap();

    let decoded: Vehicle = registry
        .from_document(&doc! { "_t" => "Car", "wheels" => 3, "seats" => 2 })
        .unwrap();
    assert_eq!(decoded, Vehicle { wheels: 3 });

    let toy: Toy = registry
        .from_document(&doc! { "_t" => "Car", "size" => 1 })
        .unwrap();
    assert_eq!(toy, Toy { size: 1 });
    assert_eq!(
        registry
            .resolve_discriminator(TypeKey::of::<Vehicle>(), "Car")
            .unwrap(),
        TypeKey::of::<Car>()
    );
}

#[test]
fn test_unknown_and_incompatible_discriminators() {
    let registry = Registry::default();
    registry.lookup::<Toy>().unwrap();

    let err = registry
        .from_document::<Vehicle>(&doc! { "_t" => "Spaceship", "wheels" => 0 })
        .unwrap_err();
    assert!(matches!(err, Error::UnknownDiscriminator(_)), "{err}");

    let toy_name = std::any::type_name::<Toy>();
    let err = registry
        .from_document::<Vehicle>(&doc! { "_t" => toy_name, "wheels" => 0 })
        .unwrap_err();
    assert!(matches!(err, Error::IncompatibleActualType(_)), "{err}");

    let err = registry
        .from_document::<Vehicle>(&doc! { "_t" => 5, "wheels" => 0 })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)), "{err}");
}

#[test]
fn test_custom_discriminator_element() {
    let registry = Registry::default().discriminator_element("kind");
    let document = registry.to_document(&rex()).unwrap();
    assert_eq!(element_names(&document), vec!["kind", "name", "breed"]);
    let decoded: Animal = registry.from_document(&document).unwrap();
    assert_eq!(decoded.name, "Rex");
}

trait Shape: AsAny + Debug {
    fn area(&self) -> f64;
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct Circle {
    radius: f64,
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct Square {
    side: f64,
}

#[derive(Debug)]
struct Triangle;

impl Shape for Circle {
    fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

impl Shape for Square {
    fn area(&self) -> f64 {
        self.side * self.side
    }
}

impl Shape for Triangle {
    fn area(&self) -> f64 {
        0.0
    }
}

polymorphic!(Shape; Circle, Square);

#[derive(BsonObject, Debug)]
struct Drawing {
    title: String,
    shapes: Vec<Box<dyn Shape>>,
    main: Box<dyn Shape>,
}

fn as_circle(shape: &dyn Shape) -> Option<&Circle> {
    shape.as_any().downcast_ref::<Circle>()
}

#[test]
fn test_trait_object_members() {
    let registry = Registry::default();
    register_shape(&registry).unwrap();

    let drawing = Drawing {
        title: "plan".to_string(),
        shapes: vec![Box::new(Circle { radius: 1.0 }), Box::new(Square { side: 2.0 })],
        main: Box::new(Square { side: 3.0 }),
    };
    let document = registry.to_document(&drawing).unwrap();
    assert_eq!(
        document,
        doc! {
            "title" => "plan",
            "shapes" => vec![
                Value::from(doc! { "_t" => "Circle", "radius" => 1.0 }),
                Value::from(doc! { "_t" => "Square", "side" => 2.0 }),
            ],
            "main" => doc! { "_t" => "Square", "side" => 3.0 },
        }
    );

    let decoded: Drawing = registry.from_document(&document).unwrap();
    assert_eq!(decoded.title, "plan");
    assert_eq!(decoded.shapes.len(), 2);
    assert_eq!(as_circle(&*decoded.shapes[0]), Some(&Circle { radius: 1.0 }));
    assert_eq!(decoded.shapes[1].area(), 4.0);
    assert_eq!(decoded.main.area(), 9.0);
    assert!(as_circle(&*decoded.main).is_none());
}

#[test]
fn test_trait_object_errors() {
    let registry = Registry::default();
    register_shape(&registry).unwrap();

    let err = registry
        .from_document::<Box<dyn Shape>>(&doc! { "radius" => 1.0 })
        .unwrap_err();
    assert!(matches!(err, Error::UnknownDiscriminator(_)), "{err}");

    let err = registry
        .from_document::<Box<dyn Shape>>(&doc! { "_t" => "Hexagon" })
        .unwrap_err();
    assert!(matches!(err, Error::UnknownDiscriminator(_)), "{err}");

    let unregistered: Box<dyn Shape> = Box::new(Triangle);
    let err = registry.serialize(&unregistered).unwrap_err();
    assert!(matches!(err, Error::Mapping(_)), "{err}");

    let unregistered_registry = Registry::default();
    let circle: Box<dyn Shape> = Box::new(Circle { radius: 2.0 });
    let bytes = registry.serialize(&circle).unwrap();
    let err = unregistered_registry
        .deserialize::<Box<dyn Shape>>(&bytes)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownDiscriminator(_)), "{err}");
}

#[test]
fn test_extra_discriminator_alias() {
    let registry = Registry::default();
    register_shape(&registry).unwrap();
    assert!(registry.register_discriminator(TypeKey::of::<Circle>(), "round"));

    let shape: Box<dyn Shape> = registry
        .from_document(&doc! { "_t" => "round", "radius" => 2.0 })
        .unwrap();
    assert_eq!(as_circle(&*shape), Some(&Circle { radius: 2.0 }));
}
