// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt::Display;

use crate::{Dependencies, Result};

/// How many values a field expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    /// Exactly one value.
    Single,
    /// One value, or none.
    Optional,
    /// An ordered sequence of values, possibly empty.
    Multi,
}

impl ShapeKind {
    /// Derives the shape from decoration flags.
    ///
    /// `multi` takes precedence over `optional`.
    #[must_use]
    pub const fn from_flags(multi: bool, optional: bool) -> Self {
        if multi {
            Self::Multi
        } else if optional {
            Self::Optional
        } else {
            Self::Single
        }
    }
}

impl Display for ShapeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Self::Single => "a single value",
            Self::Optional => "an optional value",
            Self::Multi => "a sequence of values",
        };

        f.write_str(text)
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Single {}
    impl Sealed for super::Optional {}
    impl Sealed for super::Multi {}
}

/// Type-level counterpart of [`ShapeKind`].
///
/// Metadata records carry their cardinality in their type, so the field type a descriptor
/// demands is known at compile time through [`Dependency`](crate::Dependency). Decorating moves
/// between cardinalities: `multi` always leads to [`Multi`], `optional` leads from [`Single`] to
/// [`Optional`] and leaves [`Multi`] alone.
pub trait Cardinality: sealed::Sealed + Send + Sync + 'static {
    /// The field type for a resolved value of type `T`.
    type Wrap<T>;

    /// The cardinality after applying `multi`.
    type WithMulti: Cardinality;

    /// The cardinality after applying `optional`.
    type WithOptional: Cardinality;

    /// The runtime shape.
    const KIND: ShapeKind;

    #[doc(hidden)]
    fn extract<T: Clone + 'static>(dependencies: &Dependencies, field: &str) -> Result<Self::Wrap<T>>;
}

/// Exactly one value: the field type is `T`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Single;

/// One value or none: the field type is `Option<T>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Optional;

/// A sequence of values: the field type is `Vec<T>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Multi;

impl Cardinality for Single {
    type Wrap<T> = T;
    type WithMulti = Multi;
    type WithOptional = Optional;

    const KIND: ShapeKind = ShapeKind::Single;

    fn extract<T: Clone + 'static>(dependencies: &Dependencies, field: &str) -> Result<Self::Wrap<T>> {
        dependencies.one(field)
    }
}

impl Cardinality for Optional {
    type Wrap<T> = Option<T>;
    type WithMulti = Multi;
    type WithOptional = Self;

    const KIND: ShapeKind = ShapeKind::Optional;

    fn extract<T: Clone + 'static>(dependencies: &Dependencies, field: &str) -> Result<Self::Wrap<T>> {
        dependencies.optional(field)
    }
}

impl Cardinality for Multi {
    type Wrap<T> = Vec<T>;
    type WithMulti = Self;
    type WithOptional = Self;

    const KIND: ShapeKind = ShapeKind::Multi;

    fn extract<T: Clone + 'static>(dependencies: &Dependencies, field: &str) -> Result<Self::Wrap<T>> {
        dependencies.many(field)
    }
}
