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

use std::fmt;

use crate::error::Error;
use crate::mapping::class_map::ClassMapped;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::resolver::registry::Registry;
use crate::serializer::{object, Serializer};
use crate::types::{ElementType, TypeKey};
use crate::value::Document;

/// Value held by a [`DocumentWrapper`].
trait WrappedValue {
    fn value_type(&self) -> TypeKey;

    fn write(&self, context: &mut WriteContext) -> Result<(), Error>;
}

struct Plain<T>(T);

impl<T: Serializer> WrappedValue for Plain<T> {
    fn value_type(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn write(&self, context: &mut WriteContext) -> Result<(), Error> {
        self.0.bson_write(context)
    }
}

struct AsNominal<T> {
    value: T,
    nominal: TypeKey,
}

impl<T: ClassMapped> WrappedValue for AsNominal<T> {
    fn value_type(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn write(&self, context: &mut WriteContext) -> Result<(), Error> {
        let map = context.registry().lookup::<T>()?;
        object::write_class(&map, &self.value, self.nominal, context)
    }
}

/// Defers encoding of a value until the wrapper itself is encoded.
///
/// Wrappers let a typed value be embedded where a document is expected.
/// They can only be encoded.
pub struct DocumentWrapper {
    nominal_type: TypeKey,
    value: Box<dyn WrappedValue>,
    is_update_document: bool,
}

impl DocumentWrapper {
    pub fn new<T: Serializer>(value: T) -> DocumentWrapper {
        DocumentWrapper {
            nominal_type: TypeKey::of::<T>(),
            value: Box::new(Plain(value)),
            is_update_document: false,
        }
    }

    /// Wraps `value` to be encoded as a `N`, writing the discriminator of
    /// `T` when the two differ.
    pub fn with_nominal_type<N: ?Sized + 'static, T: ClassMapped>(value: T) -> DocumentWrapper {
        let nominal = TypeKey::of::<N>();
        DocumentWrapper {
            nominal_type: nominal,
            value: Box::new(AsNominal { value, nominal }),
            is_update_document: false,
        }
    }

    /// Wraps an update document. Element names are not checked while it is
    /// encoded, so operators such as `$set` are accepted.
    pub fn update<T: Serializer>(value: T) -> DocumentWrapper {
        DocumentWrapper {
            is_update_document: true,
            ..DocumentWrapper::new(value)
        }
    }

    pub fn create_multiple<T: Serializer>(values: impl IntoIterator<Item = T>) -> Vec<DocumentWrapper> {
        values.into_iter().map(DocumentWrapper::new).collect()
    }

    pub fn nominal_type(&self) -> TypeKey {
        self.nominal_type
    }

    pub fn value_type(&self) -> TypeKey {
        self.value.value_type()
    }

    pub fn is_update_document(&self) -> bool {
        self.is_update_document
    }

    pub fn to_document(&self, registry: &Registry) -> Result<Document, Error> {
        registry.to_document(self)
    }
}

impl Serializer for DocumentWrapper {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        if !self.is_update_document {
            return self.value.write(context);
        }
        let previous = context.writer.check_element_names();
        context.writer.set_check_element_names(false);
        let result = self.value.write(context);
        context.writer.set_check_element_names(previous);
        result
    }

    fn bson_read(_context: &mut ReadContext) -> Result<Self, Error> {
        Err(Error::unsupported("DocumentWrapper can only be encoded"))
    }

    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::Document)
    }
}

impl fmt::Debug for DocumentWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentWrapper")
            .field("nominal_type", &self.nominal_type)
            .field("value_type", &self.value.value_type())
            .field("is_update_document", &self.is_update_document)
            .finish()
    }
}
