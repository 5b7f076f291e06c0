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

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{BsonDefault, Serializer};
use crate::types::ElementType;
use crate::value::{exact_f64, exact_i64};

#[cold]
fn overflow(value: impl std::fmt::Display, target: &str) -> Error {
    Error::encode_error(format!("{value} cannot be represented as {target} without loss"))
}

fn write_integer(context: &mut WriteContext, value: i128, natural: ElementType) -> Result<(), Error> {
    match context.take_representation().unwrap_or(natural) {
        ElementType::Int32 => {
            let value = i32::try_from(value).map_err(|_| overflow(value, "Int32"))?;
            context.writer.write_int32(value)
        }
        ElementType::Int64 => {
            let value = i64::try_from(value).map_err(|_| overflow(value, "Int64"))?;
            context.writer.write_int64(value)
        }
        ElementType::Double => {
            let double = value as f64;
            if double as i128 != value {
                return Err(overflow(value, "Double"));
            }
            context.writer.write_double(double)
        }
        ElementType::String => context.writer.write_string(&value.to_string()),
        other => Err(Error::encode_error(format!(
            "{other:?} is not a valid representation for an integer"
        ))),
    }
}

/// Reads any numeric element, or a decimal string, as an integer. Doubles
/// are accepted only when they hold a whole number.
fn read_integer(context: &mut ReadContext) -> Result<i128, Error> {
    context.take_representation();
    let reader = &mut *context.reader;
    match reader.current_type()? {
        ElementType::Int32 => Ok(reader.read_int32()? as i128),
        ElementType::Int64 => Ok(reader.read_int64()? as i128),
        ElementType::Double => {
            let double = reader.read_double()?;
            if !double.is_finite() || double.fract() != 0.0 || double.abs() >= 1.8e19 {
                return Err(Error::invalid_data(format!(
                    "Double {double} cannot be converted to an integer without loss"
                )));
            }
            Ok(double as i128)
        }
        ElementType::String => {
            let text = reader.read_string()?;
            text.trim()
                .parse::<i128>()
                .map_err(|_| Error::invalid_data(format!("'{text}' is not an integer")))
        }
        other => Err(Error::type_mismatch(ElementType::Int32, other)),
    }
}

fn write_float(context: &mut WriteContext, value: f64) -> Result<(), Error> {
    match context.take_representation().unwrap_or(ElementType::Double) {
        ElementType::Double => context.writer.write_double(value),
        ElementType::Int32 => {
            if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
                return Err(overflow(value, "Int32"));
            }
            context.writer.write_int32(value as i32)
        }
        ElementType::Int64 => {
            let value = exact_i64(value).ok_or_else(|| overflow(value, "Int64"))?;
            context.writer.write_int64(value)
        }
        ElementType::String => context.writer.write_string(&value.to_string()),
        other => Err(Error::encode_error(format!(
            "{other:?} is not a valid representation for a floating point number"
        ))),
    }
}

fn read_float(context: &mut ReadContext) -> Result<f64, Error> {
    context.take_representation();
    let reader = &mut *context.reader;
    match reader.current_type()? {
        ElementType::Double => reader.read_double(),
        ElementType::Int32 => Ok(reader.read_int32()? as f64),
        ElementType::Int64 => {
            let value = reader.read_int64()?;
            exact_f64(value).ok_or_else(|| {
                Error::invalid_data(format!(
                    "Int64 {value} cannot be converted to Double without loss"
                ))
            })
        }
        ElementType::String => {
            let text = reader.read_string()?;
            text.trim()
                .parse::<f64>()
                .map_err(|_| Error::invalid_data(format!("'{text}' is not a number")))
        }
        other => Err(Error::type_mismatch(ElementType::Double, other)),
    }
}

macro_rules! impl_integer_serializer {
    ($ty:ty, $natural:expr) => {
        impl Serializer for $ty {
            #[inline(always)]
            fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
                write_integer(context, *self as i128, $natural)
            }

            #[inline(always)]
            fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
                let value = read_integer(context)?;
                <$ty>::try_from(value).map_err(|_| {
                    Error::invalid_data(format!("{} does not fit in {}", value, stringify!($ty)))
                })
            }

            #[inline(always)]
            fn bson_is_default(&self) -> bool {
                *self == 0
            }

            #[inline(always)]
            fn bson_element_type() -> Option<ElementType> {
                Some($natural)
            }
        }

        impl BsonDefault for $ty {
            #[inline(always)]
            fn bson_default() -> Self {
                0
            }
        }
    };
}

impl_integer_serializer!(i8, ElementType::Int32);
impl_integer_serializer!(i16, ElementType::Int32);
impl_integer_serializer!(i32, ElementType::Int32);
impl_integer_serializer!(i64, ElementType::Int64);
impl_integer_serializer!(u8, ElementType::Int32);
impl_integer_serializer!(u16, ElementType::Int32);
impl_integer_serializer!(u32, ElementType::Int64);
impl_integer_serializer!(u64, ElementType::Int64);
impl_integer_serializer!(isize, ElementType::Int64);
impl_integer_serializer!(usize, ElementType::Int64);

impl Serializer for f64 {
    #[inline(always)]
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_float(context, *self)
    }

    #[inline(always)]
    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        read_float(context)
    }

    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        *self == 0.0
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::Double)
    }
}

impl BsonDefault for f64 {
    #[inline(always)]
    fn bson_default() -> Self {
        0.0
    }
}

impl Serializer for f32 {
    #[inline(always)]
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_float(context, *self as f64)
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        let double = read_float(context)?;
        let single = double as f32;
        if double.is_finite() && single as f64 != double {
            return Err(Error::invalid_data(format!(
                "Double {double} cannot be converted to f32 without loss"
            )));
        }
        Ok(single)
    }

    #[inline(always)]
    fn bson_is_default(&self) -> bool {
        *self == 0.0
    }

    #[inline(always)]
    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::Double)
    }
}

impl BsonDefault for f32 {
    #[inline(always)]
    fn bson_default() -> Self {
        0.0
    }
}
