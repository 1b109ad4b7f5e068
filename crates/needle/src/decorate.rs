// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde_json::Value;

use crate::{Cardinality, Describe, Metadata};

/// A decoration whose parameters are fixed but whose target is not chosen yet.
///
/// Returned by [`tagged`] and [`named`]; apply it to a descriptor with [`Decoration::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Decoration {
    /// Sets one tag.
    Tag {
        /// The tag name.
        key: String,
        /// The tag value.
        value: Value,
    },
    /// Sets the display name.
    Name(String),
}

impl Decoration {
    /// Applies the decoration to `descriptor`, lifting a bare token into a fresh record first.
    #[must_use]
    pub fn apply<D: Describe>(&self, descriptor: D) -> Metadata<D::Value, D::Cardinality> {
        let metadata = descriptor.into_metadata();

        match self {
            Self::Tag { key, value } => metadata.tagged(key.clone(), value.clone()),
            Self::Name(name) => metadata.named(name.clone()),
        }
    }
}

/// Prepares a decoration that sets the tag `key` to `value`.
///
/// Tags merge by key: a later value under the same key replaces the earlier one.
///
/// # Examples
///
/// ```
/// use needle::{Token, tagged};
///
/// let buffer = Token::<Vec<u8>>::opaque(Some("ArrayBuffer"));
/// let metadata = tagged("x", 1).apply(buffer);
///
/// assert_eq!(metadata.tag("x"), Some(&1.into()));
/// ```
#[must_use]
pub fn tagged(key: impl Into<String>, value: impl Into<Value>) -> Decoration {
    Decoration::Tag {
        key: key.into(),
        value: value.into(),
    }
}

/// Prepares a decoration that sets the display name; the last name applied wins.
#[must_use]
pub fn named(name: impl Into<String>) -> Decoration {
    Decoration::Name(name.into())
}

/// Marks `descriptor` as a sequence of values.
///
/// Idempotent. When combined with [`optional`], `multi` wins.
#[must_use]
pub fn multi<D: Describe>(descriptor: D) -> Metadata<D::Value, <D::Cardinality as Cardinality>::WithMulti> {
    descriptor.into_metadata().multi()
}

/// Marks `descriptor` as possibly absent.
///
/// Idempotent. Has no effect on the shape of a descriptor that is already `multi`.
#[must_use]
pub fn optional<D: Describe>(descriptor: D) -> Metadata<D::Value, <D::Cardinality as Cardinality>::WithOptional> {
    descriptor.into_metadata().optional()
}
