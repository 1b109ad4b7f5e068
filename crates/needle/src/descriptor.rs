// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt::Debug;
use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::{Cardinality, Describe, Kind, Kinded, Metadata, ShapeKind, Tags, TokenKey, TypeTag};

trait ErasedMetadata: Send + Sync + Debug {
    fn token_key(&self) -> TokenKey;
    fn resolved_type(&self) -> TypeTag;
    fn tags(&self) -> &Tags;
    fn name(&self) -> Option<&str>;
    fn is_multi(&self) -> bool;
    fn is_optional(&self) -> bool;
    fn clone_box(&self) -> Box<dyn ErasedMetadata>;
}

impl<T: 'static, C: Cardinality> ErasedMetadata for Metadata<T, C> {
    fn token_key(&self) -> TokenKey {
        self.token().resolve().key().clone()
    }

    fn resolved_type(&self) -> TypeTag {
        TypeTag::of::<T>()
    }

    fn tags(&self) -> &Tags {
        Self::tags(self)
    }

    fn name(&self) -> Option<&str> {
        Self::name(self)
    }

    fn is_multi(&self) -> bool {
        Self::is_multi(self)
    }

    fn is_optional(&self) -> bool {
        Self::is_optional(self)
    }

    fn clone_box(&self) -> Box<dyn ErasedMetadata> {
        Box::new(self.clone())
    }
}

/// One entry of a [`DescriptorMap`], with its value type erased.
///
/// Remembers the [`Kind`] of the descriptor it was created from, so a bare token, a deferred
/// token and a decorated record can still be told apart.
#[derive(Debug)]
pub struct FieldDescriptor {
    kind: Kind,
    metadata: Box<dyn ErasedMetadata>,
}

impl FieldDescriptor {
    /// Erases `descriptor`.
    #[must_use]
    pub fn new<D: Describe>(descriptor: D) -> Self {
        let kind = descriptor.kind();

        Self {
            kind,
            metadata: Box::new(descriptor.into_metadata()),
        }
    }

    /// The key of the token, resolving deferred tokens on every call.
    #[must_use]
    pub fn token_key(&self) -> TokenKey {
        self.metadata.token_key()
    }

    /// The type the dependency resolves to.
    #[must_use]
    pub fn resolved_type(&self) -> TypeTag {
        self.metadata.resolved_type()
    }

    /// The tags; empty for bare tokens.
    #[must_use]
    pub fn tags(&self) -> &Tags {
        self.metadata.tags()
    }

    /// The display name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.metadata.name()
    }

    /// Whether the descriptor was marked `multi`.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        self.metadata.is_multi()
    }

    /// Whether the descriptor was marked `optional`.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.metadata.is_optional()
    }

    /// The shape implied by the flags.
    #[must_use]
    pub fn shape_kind(&self) -> ShapeKind {
        ShapeKind::from_flags(self.is_multi(), self.is_optional())
    }
}

impl Kinded for FieldDescriptor {
    fn kind(&self) -> Kind {
        self.kind
    }
}

impl Clone for FieldDescriptor {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            metadata: self.metadata.clone_box(),
        }
    }
}

/// A plain snapshot of what a descriptor says about one field.
///
/// This is what an external container needs to register the field: the token it should look
/// up, and how many values it should hand over.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct FieldMetadata {
    /// The field name.
    pub field: String,
    /// The resolved token key.
    pub token: TokenKey,
    /// The type the token resolves to.
    pub resolved: TypeTag,
    /// The display name, if any.
    pub name: Option<String>,
    /// The tags.
    pub tags: Tags,
    /// The expected shape.
    pub shape: ShapeKind,
}

/// The descriptors a type declares for its dependencies, keyed and ordered by field name.
///
/// # Examples
///
/// ```
/// use needle::{DescriptorMap, Token, multi, optional};
///
/// #[derive(Clone)]
/// struct Logger;
///
/// let logger = Token::<Logger>::opaque(Some("Logger"));
/// let descriptors = DescriptorMap::new()
///     .with("logger", optional(logger.clone()))
///     .with("loggers", multi(logger));
///
/// assert_eq!(descriptors.len(), 2);
/// assert_eq!(descriptors.fields().collect::<Vec<_>>(), ["logger", "loggers"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DescriptorMap {
    fields: BTreeMap<String, FieldDescriptor>,
}

impl DescriptorMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `descriptor` under `field`, replacing any previous entry.
    #[must_use]
    pub fn with<D: Describe>(mut self, field: impl Into<String>, descriptor: D) -> Self {
        _ = self.insert(field, descriptor);
        self
    }

    /// Adds `descriptor` under `field`, returning the entry it replaced.
    pub fn insert<D: Describe>(&mut self, field: impl Into<String>, descriptor: D) -> Option<FieldDescriptor> {
        self.fields.insert(field.into(), FieldDescriptor::new(descriptor))
    }

    /// Returns the descriptor of `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldDescriptor> {
        self.fields.get(field)
    }

    /// Iterates over all entries in field-name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldDescriptor> {
        self.fields.iter()
    }

    /// Iterates over the field names in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Exports a snapshot of every field, resolving deferred tokens.
    #[must_use]
    pub fn field_metadata(&self) -> Vec<FieldMetadata> {
        self.fields
            .iter()
            .map(|(field, descriptor)| FieldMetadata {
                field: field.clone(),
                token: descriptor.token_key(),
                resolved: descriptor.resolved_type(),
                name: descriptor.name().map(str::to_owned),
                tags: descriptor.tags().clone(),
                shape: descriptor.shape_kind(),
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a DescriptorMap {
    type Item = (&'a String, &'a FieldDescriptor);
    type IntoIter = btree_map::Iter<'a, String, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
