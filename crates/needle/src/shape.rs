// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Dependency shapes: what a constructor expects, field by field.
//!
//! The compile-time half is [`Dependency<D>`](crate::Dependency), which names the field type a
//! descriptor demands. The runtime half is [`DependencyShape`], inferred from a
//! [`DescriptorMap`] and used to validate a [`Dependencies`] object before values are read out
//! of it.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::dependencies::{element, mismatch};
use crate::{Dependencies, DescriptorMap, Error, Provided, Result, ShapeKind, TokenKey, TypeTag};

/// What to do with a descriptor that is marked both `multi` and `optional`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ConflictPolicy {
    /// The field is a sequence; a warning is logged.
    #[default]
    MultiWins,
    /// Inference fails with [`Error::ConflictingCardinality`].
    Reject,
}

/// Options for shape inference and validation.
///
/// # Examples
///
/// ```
/// use needle::{ConflictPolicy, ShapeOptions};
///
/// let options = ShapeOptions::default()
///     .conflict_policy(ConflictPolicy::Reject)
///     .allow_unexpected_fields(true);
///
/// assert_eq!(options.policy(), ConflictPolicy::Reject);
/// assert!(options.allows_unexpected_fields());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShapeOptions {
    conflict_policy: ConflictPolicy,
    allow_unexpected_fields: bool,
}

impl ShapeOptions {
    /// Sets how `multi` combined with `optional` is handled. Defaults to
    /// [`ConflictPolicy::MultiWins`].
    #[must_use]
    pub const fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Sets whether validation accepts fields no descriptor declares. Defaults to `false`.
    #[must_use]
    pub const fn allow_unexpected_fields(mut self, allow: bool) -> Self {
        self.allow_unexpected_fields = allow;
        self
    }

    /// The configured conflict policy.
    #[must_use]
    pub const fn policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    /// Whether undeclared fields pass validation.
    #[must_use]
    pub const fn allows_unexpected_fields(&self) -> bool {
        self.allow_unexpected_fields
    }
}

/// The expected shape of a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    kind: ShapeKind,
    resolved: TypeTag,
    token: TokenKey,
}

impl FieldShape {
    /// How many values the field takes.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// The type of each value.
    #[must_use]
    pub const fn resolved(&self) -> TypeTag {
        self.resolved
    }

    /// The key of the token the field was declared with, after resolving deferred tokens.
    #[must_use]
    pub const fn token(&self) -> &TokenKey {
        &self.token
    }

    fn check(&self, field: &str, provided: Option<&Provided>) -> Result<()> {
        match (self.kind, provided) {
            (ShapeKind::Optional, None) => Ok(()),
            (ShapeKind::Single | ShapeKind::Multi, None) => Err(Error::MissingField { field: field.to_owned() }),
            (ShapeKind::Single | ShapeKind::Optional, Some(Provided::One(value))) => value.check(field, self.resolved),
            (ShapeKind::Multi, Some(Provided::Many(values))) => values
                .iter()
                .enumerate()
                .try_for_each(|(index, value)| value.check(&element(field, index), self.resolved)),
            (expected, Some(provided)) => Err(mismatch(field, expected, provided.shape_kind())),
        }
    }
}

/// The structure of the dependencies object a constructor expects, keyed by field name.
///
/// # Examples
///
/// ```
/// use needle::{Dependencies, DependencyShape, DescriptorMap, ShapeKind, Token, multi, optional};
///
/// #[derive(Clone)]
/// struct Logger;
///
/// let logger = Token::<Logger>::opaque(Some("Logger"));
/// let descriptors = DescriptorMap::new()
///     .with("logger", optional(logger.clone()))
///     .with("loggers", multi(logger));
///
/// let shape = DependencyShape::infer(&descriptors).unwrap();
/// assert_eq!(shape.get("loggers").map(|f| f.kind()), Some(ShapeKind::Multi));
///
/// let dependencies = Dependencies::new().with_many("loggers", [Logger, Logger]);
/// assert!(shape.validate(&dependencies).is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyShape {
    fields: BTreeMap<String, FieldShape>,
}

impl DependencyShape {
    /// Infers the shape of `descriptors` with the default options.
    ///
    /// # Errors
    ///
    /// Never fails with the default [`ConflictPolicy::MultiWins`]; see [`Self::infer_with`].
    pub fn infer(descriptors: &DescriptorMap) -> Result<Self> {
        Self::infer_with(descriptors, &ShapeOptions::default())
    }

    /// Infers the shape of `descriptors`.
    ///
    /// Metadata is unwrapped to its token and deferred tokens are resolved. A field is a
    /// sequence if marked `multi`, otherwise optional if marked `optional`, otherwise single.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConflictingCardinality`] if a descriptor is marked both `multi` and
    /// `optional` and the policy is [`ConflictPolicy::Reject`].
    pub fn infer_with(descriptors: &DescriptorMap, options: &ShapeOptions) -> Result<Self> {
        let mut fields = BTreeMap::new();

        for (field, descriptor) in descriptors {
            if descriptor.is_multi() && descriptor.is_optional() {
                match options.conflict_policy {
                    ConflictPolicy::MultiWins => {
                        tracing::event!(
                            name: "needle.shape.multi_overrides_optional",
                            tracing::Level::WARN,
                            shape.field = %field,
                            "multi overrides optional"
                        );
                    }
                    ConflictPolicy::Reject => {
                        return Err(Error::ConflictingCardinality { field: field.clone() });
                    }
                }
            }

            let shape = FieldShape {
                kind: descriptor.shape_kind(),
                resolved: descriptor.resolved_type(),
                token: descriptor.token_key(),
            };

            _ = fields.insert(field.clone(), shape);
        }

        tracing::event!(
            name: "needle.shape.inferred",
            tracing::Level::DEBUG,
            shape.fields = fields.len(),
            "shape inferred"
        );

        Ok(Self { fields })
    }

    /// Checks `dependencies` against this shape with the default options.
    ///
    /// # Errors
    ///
    /// See [`Self::validate_with`].
    pub fn validate(&self, dependencies: &Dependencies) -> Result<()> {
        self.validate_with(dependencies, &ShapeOptions::default())
    }

    /// Checks `dependencies` against this shape.
    ///
    /// Single fields must hold one value, optional fields one value or nothing, and multi fields
    /// a sequence, possibly empty. Every value must be of the field's resolved type.
    ///
    /// # Errors
    ///
    /// Returns the first violation in field-name order: [`Error::MissingField`],
    /// [`Error::CardinalityMismatch`], [`Error::TypeMismatch`], or, unless allowed by `options`,
    /// [`Error::UnexpectedField`].
    pub fn validate_with(&self, dependencies: &Dependencies, options: &ShapeOptions) -> Result<()> {
        let result = self.check(dependencies, options);

        if let Err(error) = &result {
            tracing::event!(
                name: "needle.dependencies.rejected",
                tracing::Level::DEBUG,
                error = %error,
                "dependencies rejected"
            );
        }

        result
    }

    fn check(&self, dependencies: &Dependencies, options: &ShapeOptions) -> Result<()> {
        for (field, shape) in &self.fields {
            shape.check(field, dependencies.get(field))?;
        }

        if !options.allow_unexpected_fields
            && let Some(field) = dependencies.fields().find(|field| !self.fields.contains_key(*field))
        {
            return Err(Error::UnexpectedField { field: field.to_owned() });
        }

        Ok(())
    }

    /// The shape of `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldShape> {
        self.fields.get(field)
    }

    /// Iterates over all field shapes in field-name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldShape> {
        self.fields.iter()
    }

    /// The number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the constructor expects nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Infers the shape of `descriptors` with the default options.
///
/// # Errors
///
/// See [`DependencyShape::infer`].
pub fn infer_shape(descriptors: &DescriptorMap) -> Result<DependencyShape> {
    DependencyShape::infer(descriptors)
}
