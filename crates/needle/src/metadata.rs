// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt::Debug;
use core::marker::PhantomData;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::{Cardinality, Kind, Kinded, RefBox, ShapeKind, Single, Token, TokenRef};

/// Free-form tags attached to a descriptor, keyed by tag name.
pub type Tags = BTreeMap<String, Value>;

/// A token together with its decorations.
///
/// A record is created the first time a bare token is decorated (see [`tagged`](crate::tagged),
/// [`named`](crate::named), [`multi`](crate::multi) and [`optional`](crate::optional)).
/// Decorations consume the record and hand it back updated, so a record is never shared
/// between two descriptors by accident. The token never changes once the record exists.
///
/// The cardinality parameter `C` mirrors the `multi` and `optional` flags at the type level.
///
/// # Examples
///
/// ```
/// use needle::{Metadata, ShapeKind, Token};
///
/// let logger = Token::<String>::opaque(Some("Logger"));
/// let metadata = Metadata::new(logger).named("audit").tagged("level", "info").optional();
///
/// assert_eq!(metadata.name(), Some("audit"));
/// assert_eq!(metadata.tag("level"), Some(&"info".into()));
/// assert_eq!(metadata.shape_kind(), ShapeKind::Optional);
/// ```
pub struct Metadata<T, C = Single> {
    token: TokenRef<T>,
    tags: Tags,
    name: Option<String>,
    multi: bool,
    optional: bool,
    cardinality: PhantomData<C>,
}

impl<T> Metadata<T> {
    /// Wraps `token` in an undecorated record with no tags.
    #[must_use]
    pub fn new(token: impl Into<TokenRef<T>>) -> Self {
        Self {
            token: token.into(),
            tags: Tags::new(),
            name: None,
            multi: false,
            optional: false,
            cardinality: PhantomData,
        }
    }
}

impl<T, C: Cardinality> Metadata<T, C> {
    /// Sets the tag `key` to `value`, replacing any previous value under the same key.
    #[must_use]
    pub fn tagged(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        _ = self.tags.insert(key.into(), value.into());
        self
    }

    /// Sets the display name, replacing any previous one.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the dependency as a sequence of values.
    #[must_use]
    pub fn multi(self) -> Metadata<T, C::WithMulti> {
        let mut metadata = self.recast();
        metadata.multi = true;
        metadata
    }

    /// Marks the dependency as possibly absent.
    #[must_use]
    pub fn optional(self) -> Metadata<T, C::WithOptional> {
        let mut metadata = self.recast();
        metadata.optional = true;
        metadata
    }

    fn recast<D: Cardinality>(self) -> Metadata<T, D> {
        Metadata {
            token: self.token,
            tags: self.tags,
            name: self.name,
            multi: self.multi,
            optional: self.optional,
            cardinality: PhantomData,
        }
    }
}

impl<T, C> Metadata<T, C> {
    /// Returns the decorated token, which may still be deferred.
    #[must_use]
    pub const fn token(&self) -> &TokenRef<T> {
        &self.token
    }

    /// Returns all tags.
    #[must_use]
    pub const fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Returns the value of the tag `key`, if set.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&Value> {
        self.tags.get(key)
    }

    /// Returns the display name, if set.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` if the dependency was marked as a sequence.
    #[must_use]
    pub const fn is_multi(&self) -> bool {
        self.multi
    }

    /// Returns `true` if the dependency was marked as optional.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns the runtime shape implied by the flags; `multi` wins over `optional`.
    #[must_use]
    pub const fn shape_kind(&self) -> ShapeKind {
        ShapeKind::from_flags(self.multi, self.optional)
    }
}

impl<T, C> Clone for Metadata<T, C> {
    fn clone(&self) -> Self {
        Self {
            token: self.token.clone(),
            tags: self.tags.clone(),
            name: self.name.clone(),
            multi: self.multi,
            optional: self.optional,
            cardinality: PhantomData,
        }
    }
}

impl<T, C> PartialEq for Metadata<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
            && self.tags == other.tags
            && self.name == other.name
            && self.multi == other.multi
            && self.optional == other.optional
    }
}

impl<T, C> Debug for Metadata<T, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Metadata")
            .field("token", &self.token)
            .field("tags", &self.tags)
            .field("name", &self.name)
            .field("multi", &self.multi)
            .field("optional", &self.optional)
            .finish()
    }
}

impl<T, C> Kinded for Metadata<T, C> {
    fn kind(&self) -> Kind {
        Kind::Metadata
    }
}

impl<T> From<Token<T>> for Metadata<T> {
    fn from(value: Token<T>) -> Self {
        Self::new(value)
    }
}

impl<T> From<TokenRef<T>> for Metadata<T> {
    fn from(value: TokenRef<T>) -> Self {
        Self::new(value)
    }
}

impl<T> From<RefBox<Token<T>>> for Metadata<T> {
    fn from(value: RefBox<Token<T>>) -> Self {
        Self::new(value)
    }
}

/// Anything that can describe a dependency: a token, a deferred token, or a metadata record.
///
/// This is what decorations accept and what a [`DescriptorMap`](crate::DescriptorMap) stores.
pub trait Describe: Kinded {
    /// The type the dependency resolves to.
    type Value: 'static;

    /// The type-level cardinality of the dependency.
    type Cardinality: Cardinality;

    /// Lifts `self` into a metadata record, creating an undecorated one for bare tokens.
    fn into_metadata(self) -> Metadata<Self::Value, Self::Cardinality>;
}

impl<T: 'static> Describe for Token<T> {
    type Value = T;
    type Cardinality = Single;

    fn into_metadata(self) -> Metadata<T> {
        Metadata::new(self)
    }
}

impl<T: 'static> Describe for TokenRef<T> {
    type Value = T;
    type Cardinality = Single;

    fn into_metadata(self) -> Metadata<T> {
        Metadata::new(self)
    }
}

impl<T: 'static> Describe for RefBox<Token<T>> {
    type Value = T;
    type Cardinality = Single;

    fn into_metadata(self) -> Metadata<T> {
        Metadata::new(self)
    }
}

impl<T: 'static, C: Cardinality> Describe for Metadata<T, C> {
    type Value = T;
    type Cardinality = C;

    fn into_metadata(self) -> Self {
        self
    }
}

/// The field type a dependencies object must hold for the descriptor type `D`.
///
/// `T` for plain descriptors, `Option<T>` for optional ones and `Vec<T>` for multi ones, where
/// `T` is the value type the token resolves to.
///
/// ```
/// use needle::{Dependency, Metadata, Multi, Optional, Token};
/// use static_assertions::assert_type_eq_all;
///
/// assert_type_eq_all!(Dependency<Token<u8>>, u8);
/// assert_type_eq_all!(Dependency<Metadata<u8, Optional>>, Option<u8>);
/// assert_type_eq_all!(Dependency<Metadata<u8, Multi>>, Vec<u8>);
/// ```
pub type Dependency<D> = <<D as Describe>::Cardinality as Cardinality>::Wrap<<D as Describe>::Value>;
