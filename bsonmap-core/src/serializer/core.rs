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

use std::any::Any;
use std::marker::PhantomData;

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::types::ElementType;

/// Zero value used when a member is reset or a document omits it.
pub trait BsonDefault: Sized {
    fn bson_default() -> Self;
}

// A blanket impl for all `T: Default` would conflict with the impls for
// `Box<dyn Trait>` generated by `polymorphic!`.

pub trait Serializer: 'static {
    /// Writes the value the writer's pending element name refers to.
    ///
    /// The caller has already written the element name; arrays assign their
    /// own index names.
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error>;

    /// Reads the value the reader is positioned on.
    fn bson_read(context: &mut ReadContext) -> Result<Self, Error>
    where
        Self: Sized;

    /// True when the value encodes as a null element.
    #[inline(always)]
    fn bson_is_null(&self) -> bool {
        false
    }

    /// True when the value equals the zero value of its type.
    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        false
    }

    /// Element type written without a representation override, when fixed.
    #[inline(always)]
    fn bson_element_type() -> Option<ElementType>
    where
        Self: Sized,
    {
        None
    }
}

/// Custom codec for a single member, installed with
/// [`MemberBuilder::set_serializer`](crate::mapping::MemberBuilder::set_serializer).
pub trait ValueSerializer<F>: Send + Sync + 'static {
    fn serialize(&self, value: &F, context: &mut WriteContext) -> Result<(), Error>;

    fn deserialize(&self, context: &mut ReadContext) -> Result<F, Error>;
}

/// Type-erased codec stored on a property map.
pub(crate) trait ErasedSerializer: Send + Sync {
    fn write_any(&self, value: &dyn Any, context: &mut WriteContext) -> Result<(), Error>;

    fn read_any(&self, context: &mut ReadContext) -> Result<Box<dyn Any>, Error>;

    fn is_null_any(&self, value: &dyn Any) -> bool;

    fn is_default_any(&self, value: &dyn Any) -> bool;
}

#[cold]
fn wrong_member_type<F>() -> Error {
    Error::unknown(format!(
        "member value is not a {}",
        std::any::type_name::<F>()
    ))
}

pub(crate) struct TypedCodec<F>(PhantomData<fn() -> F>);

impl<F> TypedCodec<F> {
    pub(crate) fn new() -> Self {
        TypedCodec(PhantomData)
    }
}

impl<F: Serializer> ErasedSerializer for TypedCodec<F> {
    fn write_any(&self, value: &dyn Any, context: &mut WriteContext) -> Result<(), Error> {
        value
            .downcast_ref::<F>()
            .ok_or_else(wrong_member_type::<F>)?
            .bson_write(context)
    }

    fn read_any(&self, context: &mut ReadContext) -> Result<Box<dyn Any>, Error> {
        Ok(Box::new(F::bson_read(context)?))
    }

    fn is_null_any(&self, value: &dyn Any) -> bool {
        value.downcast_ref::<F>().map_or(false, F::bson_is_null)
    }

    fn is_default_any(&self, value: &dyn Any) -> bool {
        value.downcast_ref::<F>().map_or(false, F::bson_is_default)
    }
}

/// Wraps a user [`ValueSerializer`]; null and default checks still use `F`.
pub(crate) struct OverrideCodec<F, S> {
    inner: S,
    _marker: PhantomData<fn() -> F>,
}

impl<F, S> OverrideCodec<F, S> {
    pub(crate) fn new(inner: S) -> Self {
        OverrideCodec {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<F: Serializer, S: ValueSerializer<F>> ErasedSerializer for OverrideCodec<F, S> {
    fn write_any(&self, value: &dyn Any, context: &mut WriteContext) -> Result<(), Error> {
        let value = value
            .downcast_ref::<F>()
            .ok_or_else(wrong_member_type::<F>)?;
        self.inner.serialize(value, context)
    }

    fn read_any(&self, context: &mut ReadContext) -> Result<Box<dyn Any>, Error> {
        Ok(Box::new(self.inner.deserialize(context)?))
    }

    fn is_null_any(&self, value: &dyn Any) -> bool {
        value.downcast_ref::<F>().map_or(false, F::bson_is_null)
    }

    fn is_default_any(&self, value: &dyn Any) -> bool {
        value.downcast_ref::<F>().map_or(false, F::bson_is_default)
    }
}
