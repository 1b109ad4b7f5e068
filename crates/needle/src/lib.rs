// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Typed dependency-injection tokens, boxes and descriptor metadata.
//!
//! This crate lets a type declare the dependencies its constructor expects, attach metadata to
//! each of them, and compute the shape of the dependencies object it should receive. It does
//! not construct anything: there is no container, no provider registry and no lifecycle
//! management. An external container reads what is declared here and does the wiring.
//!
//! # Building Blocks
//!
//! - [`ValueBox`] wraps a value so that its boxed-ness can be detected, and [`RefBox`] wraps a
//!   producer whose result is computed on every unbox. The [`value_box`] and [`ref_box`] modules
//!   hold the free `boxed`, `unbox`, `is_box` and `unpack` functions.
//! - [`Token`] identifies a dependency whose resolved value has a known type. Tokens are opaque
//!   markers, strings with a random suffix, or a type standing in for itself. A [`TokenRef`]
//!   can defer a token that does not exist yet at declaration time.
//! - [`Metadata`] attaches tags, a name and the `multi` or `optional` flags to a token. Use the
//!   decorations [`tagged`], [`named`], [`multi`] and [`optional`], or the builder methods on
//!   [`Metadata`] itself.
//! - [`DescriptorMap`] collects the descriptors of a type, keyed by field name.
//! - [`DependencyShape`] is inferred from a descriptor map, and validates a runtime
//!   [`Dependencies`] object. At compile time, [`Dependency<D>`] names the field type a
//!   descriptor demands.
//! - [`Catalog`] looks up the descriptors of types implementing [`Injectable`].
//!
//! # Example
//!
//! ```
//! use needle::{Dependencies, DescriptorMap, Error, ShapeKind, Token, infer_shape, multi, named, optional};
//!
//! #[derive(Debug, Clone)]
//! struct Logger;
//!
//! let logger = Token::<Logger>::opaque(Some("Logger"));
//! let descriptors = DescriptorMap::new()
//!     .with("logger", optional(logger.clone()))
//!     .with("loggers", multi(named("sinks").apply(logger)))
//!     .with("port", Token::<u16>::of_type());
//!
//! let shape = infer_shape(&descriptors)?;
//! assert_eq!(shape.get("loggers").map(|field| field.kind()), Some(ShapeKind::Multi));
//!
//! let valid = Dependencies::new().with_many("loggers", [Logger]).with_one("port", 80_u16);
//! shape.validate(&valid)?;
//!
//! let invalid = Dependencies::new().with_one("loggers", Logger).with_one("port", 80_u16);
//! assert!(matches!(shape.validate(&invalid), Err(Error::CardinalityMismatch { .. })));
//! # Ok::<(), Error>(())
//! ```
//!
//! # Logging
//!
//! The crate emits [`tracing`] events but never installs a subscriber. Event names start with
//! `needle.`: token creation and deferred resolution at `DEBUG` and `TRACE`, shape inference and
//! rejected dependencies at `DEBUG`, and a `WARN` when `multi` overrides `optional`.

mod cardinality;
mod catalog;
mod decorate;
mod dependencies;
mod descriptor;
mod error;
mod kind;
mod macros;
mod metadata;
mod shape;
mod type_tag;

pub mod ref_box;
pub mod token;
pub mod value_box;

#[cfg(test)]
mod testing;

pub use cardinality::{Cardinality, Multi, Optional, ShapeKind, Single};
pub use catalog::{Catalog, Injectable};
pub use decorate::{Decoration, multi, named, optional, tagged};
pub use dependencies::{Dependencies, Provided, ProvidedValue, extract};
pub use descriptor::{DescriptorMap, FieldDescriptor, FieldMetadata};
pub use error::{Error, Result};
pub use kind::{Kind, Kinded};
pub use metadata::{Dependency, Describe, Metadata, Tags};
pub use ref_box::RefBox;
pub use shape::{ConflictPolicy, DependencyShape, FieldShape, ShapeOptions, infer_shape};
pub use token::{Token, TokenKey, TokenRef};
pub use type_tag::TypeTag;
pub use value_box::ValueBox;
