// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::any::{Any, type_name};
use core::fmt::Debug;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{Cardinality, Dependency, Describe, Error, Result, ShapeKind, TypeTag};

/// A type-erased value handed to a constructor.
#[derive(Clone)]
pub struct ProvidedValue {
    value: Arc<dyn Any + Send + Sync>,
    type_tag: TypeTag,
}

impl ProvidedValue {
    /// Erases `value`.
    #[must_use]
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_tag: TypeTag::of::<T>(),
        }
    }

    /// The type of the value.
    #[must_use]
    pub const fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    /// Returns the value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    pub(crate) fn check(&self, field: &str, expected: TypeTag) -> Result<()> {
        if self.type_tag == expected {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                field: field.to_owned(),
                expected: expected.name(),
                found: self.type_tag.name(),
            })
        }
    }

    fn cloned<T: Clone + 'static>(&self, field: &str) -> Result<T> {
        self.downcast_ref::<T>().cloned().ok_or_else(|| Error::TypeMismatch {
            field: field.to_owned(),
            expected: type_name::<T>(),
            found: self.type_tag.name(),
        })
    }
}

impl Debug for ProvidedValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ProvidedValue").field(&self.type_tag.name()).finish()
    }
}

/// What a dependencies object holds for one field.
///
/// An absent optional value is represented by the absence of the field.
#[derive(Debug, Clone)]
pub enum Provided {
    /// A bare value.
    One(ProvidedValue),
    /// A sequence of values.
    Many(Vec<ProvidedValue>),
}

impl Provided {
    /// The shape of what is provided: [`ShapeKind::Single`] or [`ShapeKind::Multi`].
    #[must_use]
    pub const fn shape_kind(&self) -> ShapeKind {
        match self {
            Self::One(_) => ShapeKind::Single,
            Self::Many(_) => ShapeKind::Multi,
        }
    }
}

/// The runtime form of a dependencies object: field name to provided value.
///
/// Build one with the `with_*` methods, check it against a
/// [`DependencyShape`](crate::DependencyShape), then read typed values back out.
///
/// # Examples
///
/// ```
/// use needle::Dependencies;
///
/// let dependencies = Dependencies::new()
///     .with_one("name", String::from("svc"))
///     .with_many("ports", [80_u16, 443])
///     .with_optional::<u32>("timeout", None);
///
/// assert_eq!(dependencies.one::<String>("name").unwrap(), "svc");
/// assert_eq!(dependencies.many::<u16>("ports").unwrap(), [80, 443]);
/// assert_eq!(dependencies.optional::<u32>("timeout").unwrap(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    fields: BTreeMap<String, Provided>,
}

impl Dependencies {
    /// Creates an empty dependencies object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provides a bare value for `field`.
    #[must_use]
    pub fn with_one<T: Send + Sync + 'static>(mut self, field: impl Into<String>, value: T) -> Self {
        _ = self.insert(field, Provided::One(ProvidedValue::new(value)));
        self
    }

    /// Provides a sequence of values for `field`.
    #[must_use]
    pub fn with_many<T: Send + Sync + 'static>(mut self, field: impl Into<String>, values: impl IntoIterator<Item = T>) -> Self {
        let values = values.into_iter().map(ProvidedValue::new).collect();
        _ = self.insert(field, Provided::Many(values));
        self
    }

    /// Provides `value` for `field` if there is one; leaves the field absent otherwise.
    #[must_use]
    pub fn with_optional<T: Send + Sync + 'static>(mut self, field: impl Into<String>, value: Option<T>) -> Self {
        let field = field.into();

        match value {
            Some(value) => {
                _ = self.insert(field, Provided::One(ProvidedValue::new(value)));
            }
            None => {
                _ = self.fields.remove(&field);
            }
        }

        self
    }

    /// Sets `field`, returning what it held before.
    pub fn insert(&mut self, field: impl Into<String>, provided: Provided) -> Option<Provided> {
        self.fields.insert(field.into(), provided)
    }

    /// Returns what is provided for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Provided> {
        self.fields.get(field)
    }

    /// Iterates over the provided field names in order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterates over all entries in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Provided)> {
        self.fields.iter().map(|(field, provided)| (field.as_str(), provided))
    }

    /// The number of provided fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is provided.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reads the bare value of `field`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the field is absent, [`Error::CardinalityMismatch`] if
    /// it holds a sequence, and [`Error::TypeMismatch`] if the value is not a `T`.
    pub fn one<T: Clone + 'static>(&self, field: &str) -> Result<T> {
        match self.fields.get(field) {
            None => Err(Error::MissingField { field: field.to_owned() }),
            Some(Provided::One(value)) => value.cloned(field),
            Some(Provided::Many(_)) => Err(mismatch(field, ShapeKind::Single, ShapeKind::Multi)),
        }
    }

    /// Reads the bare value of `field`, or `None` if the field is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CardinalityMismatch`] if the field holds a sequence, and
    /// [`Error::TypeMismatch`] if the value is not a `T`.
    pub fn optional<T: Clone + 'static>(&self, field: &str) -> Result<Option<T>> {
        match self.fields.get(field) {
            None => Ok(None),
            Some(Provided::One(value)) => value.cloned(field).map(Some),
            Some(Provided::Many(_)) => Err(mismatch(field, ShapeKind::Optional, ShapeKind::Multi)),
        }
    }

    /// Reads the sequence held by `field`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the field is absent, [`Error::CardinalityMismatch`] if
    /// it holds a bare value, and [`Error::TypeMismatch`] naming the offending element if any
    /// element is not a `T`.
    pub fn many<T: Clone + 'static>(&self, field: &str) -> Result<Vec<T>> {
        match self.fields.get(field) {
            None => Err(Error::MissingField { field: field.to_owned() }),
            Some(Provided::One(_)) => Err(mismatch(field, ShapeKind::Multi, ShapeKind::Single)),
            Some(Provided::Many(values)) => values
                .iter()
                .enumerate()
                .map(|(index, value)| value.cloned(&element(field, index)))
                .collect(),
        }
    }
}

pub(crate) fn mismatch(field: &str, expected: ShapeKind, found: ShapeKind) -> Error {
    Error::CardinalityMismatch {
        field: field.to_owned(),
        expected,
        found,
    }
}

pub(crate) fn element(field: &str, index: usize) -> String {
    format!("{field}[{index}]")
}

/// Reads `field` from `dependencies` in the shape the descriptor type `D` declares.
///
/// # Errors
///
/// Returns the errors of [`Dependencies::one`], [`Dependencies::optional`] or
/// [`Dependencies::many`], whichever matches the cardinality of `D`.
///
/// # Examples
///
/// ```
/// use needle::{Dependencies, Metadata, Multi, Token, extract};
///
/// let dependencies = Dependencies::new().with_many("ports", [80_u16]);
/// let ports = extract::<Metadata<u16, Multi>>(&dependencies, "ports").unwrap();
///
/// assert_eq!(ports, [80]);
/// ```
pub fn extract<D>(dependencies: &Dependencies, field: &str) -> Result<Dependency<D>>
where
    D: Describe,
    D::Value: Clone,
{
    <D::Cardinality as Cardinality>::extract::<D::Value>(dependencies, field)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{Metadata, Optional, Single, Token};

    assert_impl_all!(Dependencies: Send, Sync, Clone);

    #[test]
    fn one_reads_bare_values() {
        let dependencies = Dependencies::new().with_one("port", 8080_u16);

        assert_eq!(dependencies.one::<u16>("port"), Ok(8080));
        assert_eq!(
            dependencies.one::<u16>("host"),
            Err(Error::MissingField { field: "host".into() })
        );
        assert!(matches!(
            dependencies.one::<String>("port"),
            Err(Error::TypeMismatch { expected, found: "u16", .. }) if expected == type_name::<String>()
        ));
    }

    #[test]
    fn optional_tolerates_absence() {
        let dependencies = Dependencies::new().with_optional("port", Some(1_u16)).with_optional::<u16>("other", None);

        assert_eq!(dependencies.optional::<u16>("port"), Ok(Some(1)));
        assert_eq!(dependencies.optional::<u16>("other"), Ok(None));
        assert_eq!(dependencies.len(), 1);
    }

    #[test]
    fn with_optional_none_clears_the_field() {
        let dependencies = Dependencies::new().with_one("port", 1_u16).with_optional::<u16>("port", None);
        assert!(dependencies.is_empty());
    }

    #[test]
    fn many_reads_sequences() {
        let dependencies = Dependencies::new().with_many("ports", [1_u16, 2, 3]).with_many::<u16>("none", []);

        assert_eq!(dependencies.many::<u16>("ports"), Ok(vec![1, 2, 3]));
        assert_eq!(dependencies.many::<u16>("none"), Ok(Vec::new()));
    }

    #[test]
    fn many_names_the_bad_element() {
        let mut dependencies = Dependencies::new();
        _ = dependencies.insert(
            "ports",
            Provided::Many(vec![ProvidedValue::new(1_u16), ProvidedValue::new("two")]),
        );

        let Err(Error::TypeMismatch { field, .. }) = dependencies.many::<u16>("ports") else {
            panic!("expected a type mismatch");
        };
        assert_eq!(field, "ports[1]");
    }

    #[rstest]
    #[case::bare_for_sequence(Dependencies::new().with_one("x", 1_u8), ShapeKind::Multi, ShapeKind::Single)]
    #[case::sequence_for_bare(Dependencies::new().with_many("x", [1_u8]), ShapeKind::Single, ShapeKind::Multi)]
    fn cardinality_mismatches(#[case] dependencies: Dependencies, #[case] expected: ShapeKind, #[case] found: ShapeKind) {
        let result = match expected {
            ShapeKind::Multi => dependencies.many::<u8>("x").map(drop),
            _ => dependencies.one::<u8>("x").map(drop),
        };

        assert_eq!(result, Err(mismatch("x", expected, found)));
    }

    #[test]
    fn extract_follows_the_descriptor_cardinality() {
        let dependencies = Dependencies::new().with_one("a", 1_u8);

        let single: u8 = extract::<Token<u8>>(&dependencies, "a").expect("provided");
        let optional: Option<u8> = extract::<Metadata<u8, Optional>>(&dependencies, "b").expect("absent is fine");
        let also_single: u8 = extract::<Metadata<u8, Single>>(&dependencies, "a").expect("provided");

        assert_eq!(single, 1);
        assert_eq!(optional, None);
        assert_eq!(also_single, 1);
    }

    #[test]
    fn provided_values_are_shared_on_clone() {
        let dependencies = Dependencies::new().with_one("name", String::from("svc"));
        let copy = dependencies.clone();

        let Some(Provided::One(left)) = dependencies.get("name") else {
            panic!("expected a bare value");
        };
        let Some(Provided::One(right)) = copy.get("name") else {
            panic!("expected a bare value");
        };

        assert!(core::ptr::eq(
            left.downcast_ref::<String>().expect("is a string"),
            right.downcast_ref::<String>().expect("is a string"),
        ));
        assert_eq!(format!("{left:?}"), format!("ProvidedValue({:?})", type_name::<String>()));
    }
}
