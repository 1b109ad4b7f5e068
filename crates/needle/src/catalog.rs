// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::any::{TypeId, type_name};
use std::collections::HashMap;

use crate::{DependencyShape, DescriptorMap, Error, Result, infer_shape};

/// Implemented by types that declare the dependencies their constructor expects.
///
/// Usually implemented through the [`dependencies!`](crate::dependencies) macro.
pub trait Injectable: 'static {
    /// The descriptors of every dependency, keyed by field name.
    fn descriptors() -> DescriptorMap;

    /// The inferred shape of the dependencies object.
    ///
    /// # Errors
    ///
    /// See [`infer_shape`].
    fn shape() -> Result<DependencyShape> {
        infer_shape(&Self::descriptors())
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    type_name: &'static str,
    descriptors: fn() -> DescriptorMap,
}

/// A lookup from types to the dependencies they declared.
///
/// Only bookkeeping: nothing is constructed or resolved.
///
/// # Examples
///
/// ```
/// use needle::{Catalog, DescriptorMap, Injectable, Token};
///
/// struct Service;
///
/// impl Injectable for Service {
///     fn descriptors() -> DescriptorMap {
///         DescriptorMap::new().with("port", Token::<u16>::of_type())
///     }
/// }
///
/// let catalog = Catalog::new().register::<Service>();
/// assert_eq!(catalog.descriptors_of::<Service>().unwrap().len(), 1);
/// assert!(catalog.descriptors_of::<String>().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<TypeId, Entry>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `C`.
    #[must_use]
    pub fn register<C: Injectable>(mut self) -> Self {
        self.insert::<C>();
        self
    }

    /// Registers `C`, replacing any earlier registration.
    pub fn insert<C: Injectable>(&mut self) {
        tracing::event!(
            name: "needle.catalog.registered",
            tracing::Level::DEBUG,
            catalog.type_name = type_name::<C>(),
            "type registered"
        );

        _ = self.entries.insert(
            TypeId::of::<C>(),
            Entry {
                type_name: type_name::<C>(),
                descriptors: C::descriptors,
            },
        );
    }

    /// Returns `true` if `C` is registered.
    #[must_use]
    pub fn contains<C: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<C>())
    }

    /// Returns the descriptors `C` declared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAnnotation`] if `C` was never registered.
    pub fn descriptors_of<C: 'static>(&self) -> Result<DescriptorMap> {
        self.entry::<C>().map(|entry| (entry.descriptors)())
    }

    /// Returns the shape of the dependencies `C` declared.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingAnnotation`] if `C` was never registered, or any error of
    /// [`infer_shape`].
    pub fn shape_of<C: 'static>(&self) -> Result<DependencyShape> {
        infer_shape(&self.descriptors_of::<C>()?)
    }

    /// The names of all registered types, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.values().map(|entry| entry.type_name).collect();
        names.sort_unstable();
        names
    }

    fn entry<C: 'static>(&self) -> Result<&Entry> {
        self.entries
            .get(&TypeId::of::<C>())
            .ok_or_else(|| Error::MissingAnnotation { type_name: type_name::<C>() })
    }
}
