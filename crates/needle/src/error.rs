// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

use crate::ShapeKind;

/// Any error reported while inferring a dependency shape, validating a dependencies object
/// against it, or looking up declared descriptors.
///
/// Mistakes the type system already rules out, such as unboxing something that is not a box,
/// have no variant here.
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A field that expects exactly one value was not provided.
    #[error("field `{field}` is missing")]
    MissingField {
        /// The name of the field.
        field: String,
    },

    /// A field was provided with the wrong number of values, e.g. a bare value where a
    /// sequence is expected.
    #[error("field `{field}` expects {expected} but was given {found}")]
    CardinalityMismatch {
        /// The name of the field.
        field: String,
        /// The shape the field was declared with.
        expected: ShapeKind,
        /// The shape of what was provided.
        found: ShapeKind,
    },

    /// A provided value is not of the type the field resolves to.
    #[error("field `{field}` expects values of type `{expected}` but was given `{found}`")]
    TypeMismatch {
        /// The name of the field, with an element index for sequences.
        field: String,
        /// The type the field resolves to.
        expected: &'static str,
        /// The type of the provided value.
        found: &'static str,
    },

    /// A dependencies object carries a field no descriptor declares.
    #[error("field `{field}` is not declared")]
    UnexpectedField {
        /// The name of the field.
        field: String,
    },

    /// A descriptor is marked both `multi` and `optional` while the conflict policy rejects
    /// that combination.
    #[error("field `{field}` is marked both multi and optional")]
    ConflictingCardinality {
        /// The name of the field.
        field: String,
    },

    /// A type was looked up that never declared its dependencies.
    #[error("type `{type_name}` has no declared dependencies")]
    MissingAnnotation {
        /// The name of the type.
        type_name: &'static str,
    },
}

/// A specialized `Result` for dependency bookkeeping operations.
pub type Result<T> = std::result::Result<T, Error>;
