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

//! Id generators used by [`Registry::ensure_document_id`](crate::Registry::ensure_document_id).

use std::fmt;

use crate::value::{ObjectId, Value};

/// Produces fresh ids for an id member and recognizes unassigned ones.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn generate(&self) -> Value;

    /// True when `id` is the unassigned value of the member.
    fn is_empty(&self, id: &Value) -> bool;
}

/// Generates [`ObjectId`]s for members of type `ObjectId`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectIdGenerator;

impl IdGenerator for ObjectIdGenerator {
    fn generate(&self) -> Value {
        Value::ObjectId(ObjectId::new())
    }

    fn is_empty(&self, id: &Value) -> bool {
        match id {
            Value::Null => true,
            Value::ObjectId(oid) => oid.is_empty(),
            _ => false,
        }
    }
}

/// Generates hex strings for `String` id members, typically stored with
/// the `ObjectId` representation.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringObjectIdGenerator;

impl IdGenerator for StringObjectIdGenerator {
    fn generate(&self) -> Value {
        Value::String(ObjectId::new().to_hex())
    }

    fn is_empty(&self, id: &Value) -> bool {
        match id {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::ObjectId(oid) => oid.is_empty(),
            _ => false,
        }
    }
}
