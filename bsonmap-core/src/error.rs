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

//! Error type shared by the mapping engine and the binary reader/writer.
//!
//! Every variant has a static constructor. Construct errors through those
//! functions rather than the enum syntax so that `BSONMAP_PANIC_ON_ERROR`
//! can turn any error into a panic at its creation site.

use std::borrow::Cow;

use thiserror::Error;

use crate::types::ElementType;

/// Set `BSONMAP_PANIC_ON_ERROR=1` at compile time to panic where an error is created.
pub const PANIC_ON_ERROR: bool = option_env!("BSONMAP_PANIC_ON_ERROR").is_some();

#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Error type for mapping, encoding and decoding.
///
/// ## Debug mode
///
/// ```bash
/// RUST_BACKTRACE=1 BSONMAP_PANIC_ON_ERROR=1 cargo test
/// ```
///
/// With the variable set, every constructor panics with the error message so
/// the backtrace points at the exact failure site.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A class map was registered twice for the same type.
    #[error("A class map for type {0} is already registered")]
    DuplicateRegistration(Cow<'static, str>),

    /// A class map could not be built or is misconfigured.
    #[error("{0}")]
    Mapping(Cow<'static, str>),

    /// The actual type has members that cannot be assigned, or no creator.
    #[error("{0}")]
    UnsupportedTypeForDecode(Cow<'static, str>),

    /// The actual type is marked anonymous and can only be encoded.
    #[error("{0}")]
    CannotDeserializeAnonymousType(Cow<'static, str>),

    /// More than one registered type answers to a discriminator.
    #[error("{0}")]
    AmbiguousDiscriminator(Cow<'static, str>),

    /// No registered type answers to a discriminator.
    #[error("{0}")]
    UnknownDiscriminator(Cow<'static, str>),

    /// The resolved type cannot stand in for the nominal type.
    #[error("{0}")]
    IncompatibleActualType(Cow<'static, str>),

    /// A document carries an element with no matching member.
    #[error("{0}")]
    UnexpectedElement(Cow<'static, str>),

    /// A document lacks one or more required elements.
    #[error("{0}")]
    RequiredElementMissing(Cow<'static, str>),

    /// A lazy document or array was accessed after `dispose`.
    #[error("{0}")]
    UseAfterDispose(Cow<'static, str>),

    #[error("Buffer out of bound: {0} + {1} > {2}")]
    BufferOutOfBound(usize, usize, usize),

    /// Invalid or corrupted binary data.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// The reader holds a value of a different element type than requested.
    #[error("Element type mismatch: expected {expected:?}, found {actual:?}")]
    TypeMismatch {
        expected: ElementType,
        actual: ElementType,
    },

    #[error("{0}")]
    InvalidElementName(Cow<'static, str>),

    /// Writer misuse or a value that cannot be represented.
    #[error("{0}")]
    EncodeError(Cow<'static, str>),

    #[error("{0}")]
    DepthExceed(Cow<'static, str>),

    #[error("{0}")]
    Unsupported(Cow<'static, str>),

    #[error("{0}")]
    Unknown(Cow<'static, str>),
}

macro_rules! panic_or_return {
    ($err:expr) => {{
        let err = $err;
        if PANIC_ON_ERROR {
            panic!("BSONMAP_PANIC_ON_ERROR: {}", err);
        }
        err
    }};
}

impl Error {
    /// Creates a new [`Error::DuplicateRegistration`] naming the type.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn duplicate_registration<S: Into<Cow<'static, str>>>(type_name: S) -> Self {
        panic_or_return!(Error::DuplicateRegistration(type_name.into()))
    }

    /// Creates a new [`Error::Mapping`].
    ///
    /// ```
    /// use bsonmap_core::error::Error;
    ///
    /// let err = Error::mapping(format!("type {} has no members", "Foo"));
    /// assert!(err.is_mapping_error());
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn mapping<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::Mapping(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unsupported_type_for_decode<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::UnsupportedTypeForDecode(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn cannot_deserialize_anonymous_type<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::CannotDeserializeAnonymousType(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn ambiguous_discriminator<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::AmbiguousDiscriminator(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown_discriminator<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::UnknownDiscriminator(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn incompatible_actual_type<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::IncompatibleActualType(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unexpected_element<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::UnexpectedElement(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn required_element_missing<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::RequiredElementMissing(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn use_after_dispose<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::UseAfterDispose(s.into()))
    }

    /// Creates a new [`Error::BufferOutOfBound`] with the given bounds.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn buffer_out_of_bound(offset: usize, length: usize, capacity: usize) -> Self {
        panic_or_return!(Error::BufferOutOfBound(offset, length, capacity))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_data<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::InvalidData(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn type_mismatch(expected: ElementType, actual: ElementType) -> Self {
        panic_or_return!(Error::TypeMismatch { expected, actual })
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn invalid_element_name<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::InvalidElementName(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn encode_error<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::EncodeError(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn depth_exceed<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::DepthExceed(s.into()))
    }

    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unsupported<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::Unsupported(s.into()))
    }

    /// Creates a new [`Error::Unknown`] from a string or static message.
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn unknown<S: Into<Cow<'static, str>>>(s: S) -> Self {
        panic_or_return!(Error::Unknown(s.into()))
    }

    /// Returns true for the configuration failures grouped as mapping errors.
    pub fn is_mapping_error(&self) -> bool {
        matches!(
            self,
            Error::Mapping(_)
                | Error::UnsupportedTypeForDecode(_)
                | Error::CannotDeserializeAnonymousType(_)
        )
    }

    /// Prefixes decode failures of a single member with the member and class names.
    ///
    /// Only data errors are rewritten; structural errors such as
    /// [`Error::RequiredElementMissing`] keep their kind and message.
    #[inline(never)]
    pub fn enhance_member_error(err: Error, member: &str, class: &str) -> Error {
        match err {
            Error::InvalidData(s) => Error::invalid_data(format!(
                "An error occurred while deserializing the {member} member of class {class}: {s}"
            )),
            Error::TypeMismatch { expected, actual } => Error::invalid_data(format!(
                "An error occurred while deserializing the {member} member of class {class}: \
                 expected element type {expected:?}, found {actual:?}"
            )),
            other => other,
        }
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// ```
/// use bsonmap_core::ensure;
/// use bsonmap_core::error::Error;
///
/// fn check_size(n: i32) -> Result<(), Error> {
///     ensure!(n >= 5, Error::invalid_data(format!("document size {} too small", n)));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::unknown($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::unknown(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with an [`Error::Unknown`].
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::error::Error::unknown($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::unknown(format!($fmt, $($arg)*)))
    };
}
