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

//! Streaming reader and writer for the binary document format.
//!
//! A document is an `i32` byte count, a sequence of elements and a `0x00`
//! terminator. Each element is a type tag, a NUL-terminated name and a value.
//! Arrays share the document layout with the keys `"0"`, `"1"`, ...

mod reader;
mod writer;

pub use reader::{Bookmark, BsonReader};
pub use writer::BsonWriter;
