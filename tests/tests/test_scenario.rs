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

use bsonmap_core::mapping::{Convention, PascalCaseElementNameConvention};
use bsonmap_core::{doc, ConventionPack, Document, Registry, Value};
use bsonmap_derive::BsonObject;
use pretty_assertions::assert_eq;
use tests::roundtrip;

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct OrderDetail {
    #[bsonmap(element = "Product")]
    product: String,
    #[bsonmap(element = "Quantity")]
    quantity: i32,
}

#[derive(BsonObject, Debug, PartialEq, Clone)]
struct Order {
    #[bsonmap(element = "Customer")]
    customer: String,
    #[bsonmap(element = "OrderDetails")]
    order_details: Vec<OrderDetail>,
}

fn order() -> Order {
    Order {
        customer: "John".to_string(),
        order_details: vec![
            OrderDetail {
                product: "Pen".to_string(),
                quantity: 1,
            },
            OrderDetail {
                product: "Ruler".to_string(),
                quantity: 2,
            },
        ],
    }
}

fn expected() -> Document {
    doc! {
        "Customer" => "John",
        "OrderDetails" => vec![
            Value::from(doc! { "Product" => "Pen", "Quantity" => 1 }),
            Value::from(doc! { "Product" => "Ruler", "Quantity" => 2 }),
        ],
    }
}

#[test]
fn test_order_encodes_to_exact_document() {
    let registry = Registry::default();
    let bytes = registry.serialize(&order()).unwrap();
    assert_eq!(bytes, expected().to_bytes().unwrap());
    assert_eq!(Document::from_bytes(&bytes).unwrap(), expected());
}

#[test]
fn test_order_decodes_to_equal_graph() {
    let registry = Registry::default();
    let decoded: Order = registry.from_document(&expected()).unwrap();
    assert_eq!(decoded, order());
    roundtrip(&registry, &order()).unwrap();
}

#[test]
fn test_order_through_naming_convention() {
    #[derive(BsonObject, Debug, PartialEq, Clone)]
    struct Line {
        product: String,
        quantity: i32,
    }

    #[derive(BsonObject, Debug, PartialEq, Clone)]
    struct Purchase {
        customer: String,
        order_details: Vec<Line>,
    }

    let registry = Registry::default();
    registry.register_convention_pack(
        ConventionPack::new("pascal").with(Convention::member(PascalCaseElementNameConvention)),
        |_| true,
    );
    let decoded: Purchase = registry.from_document(&expected()).unwrap();
    assert_eq!(decoded.customer, "John");
    assert_eq!(
        decoded.order_details,
        vec![
            Line {
                product: "Pen".to_string(),
                quantity: 1
            },
            Line {
                product: "Ruler".to_string(),
                quantity: 2
            },
        ]
    );
    assert_eq!(registry.to_document(&decoded).unwrap(), expected());
}
