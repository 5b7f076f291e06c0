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

//! Trait-object members.
//!
//! A member typed `Box<dyn Shape>` is encoded through the class map of its
//! runtime type, with the discriminator always written, and decoded by
//! resolving that discriminator against the types registered as `Shape`s.

use std::any::Any;

/// Upcast to [`Any`] for trait objects.
///
/// Add it as a supertrait of any trait used with [`polymorphic!`](crate::polymorphic).
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    #[inline(always)]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline(always)]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Implements `Serializer` and `BsonDefault` for `Box<dyn Trait>` and
/// generates a `register_<trait>` function that registers every listed
/// implementation as a subtype of the trait.
///
/// The first implementation supplies the default value.
///
/// ```rust, ignore
/// pub trait Shape: AsAny {
///     fn area(&self) -> f64;
/// }
///
/// polymorphic!(Shape; Circle, Square);
///
/// let registry = Registry::default();
/// register_shape(&registry)?;
/// ```
#[macro_export]
macro_rules! polymorphic {
    ($trait_:ident; $first:ty $(, $rest:ty)* $(,)?) => {
        impl $crate::Serializer for Box<dyn $trait_> {
            fn bson_write(
                &self,
                context: &mut $crate::WriteContext,
            ) -> Result<(), $crate::Error> {
                $crate::serializer::object::write_polymorphic(
                    context,
                    $crate::TypeKey::of::<dyn $trait_>(),
                    <dyn $trait_ as $crate::AsAny>::as_any(&**self),
                )
            }

            fn bson_read(context: &mut $crate::ReadContext) -> Result<Self, $crate::Error> {
                let nominal = $crate::TypeKey::of::<dyn $trait_>();
                let value = $crate::serializer::object::read_polymorphic(context, nominal)?;
                value
                    .downcast::<Box<dyn $trait_>>()
                    .map(|value| *value)
                    .map_err(|_| {
                        $crate::Error::incompatible_actual_type(format!(
                            "decoded value is not a {}",
                            nominal
                        ))
                    })
            }

            #[inline(always)]
            fn bson_element_type() -> Option<$crate::ElementType> {
                Some($crate::ElementType::Document)
            }
        }

        impl $crate::BsonDefault for Box<dyn $trait_> {
            fn bson_default() -> Self {
                Box::new(<$first as $crate::BsonDefault>::bson_default())
            }
        }

        $crate::paste::paste! {
            #[allow(dead_code)]
            pub fn [<register_ $trait_:snake>](
                registry: &$crate::Registry,
            ) -> Result<(), $crate::Error> {
                registry.register_subtype::<dyn $trait_, $first>(
                    |value: $first| -> Box<dyn $trait_> { Box::new(value) },
                )?;
                $(
                    registry.register_subtype::<dyn $trait_, $rest>(
                        |value: $rest| -> Box<dyn $trait_> { Box::new(value) },
                    )?;
                )*
                Ok(())
            }
        }
    };
}
