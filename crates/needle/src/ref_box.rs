// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Deferred references built on top of [`ValueBox`].

use core::fmt::Debug;
use std::sync::Arc;

use crate::value_box::{self, ValueBox};
use crate::{Kind, Kinded};

type Producer<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// A box whose payload is a zero-argument producer.
///
/// Unboxing a `RefBox<T>` yields the producer's result, not the producer. The producer runs on
/// every [`unbox`](RefBox::unbox) call; results are never cached, so a producer with side effects
/// is observed once per call. Clones share the same producer.
///
/// This is what lets a descriptor name a token that does not exist yet at declaration time.
///
/// # Examples
///
/// ```
/// use needle::RefBox;
///
/// let reference = RefBox::new(|| "resolved later");
/// assert_eq!(reference.unbox(), "resolved later");
/// ```
pub struct RefBox<T> {
    inner: ValueBox<Producer<T>>,
}

impl<T> RefBox<T> {
    /// Boxes `producer` without invoking it.
    #[must_use]
    pub fn new(producer: impl Fn() -> T + Send + Sync + 'static) -> Self {
        let producer: Producer<T> = Arc::new(producer);

        Self {
            inner: value_box::boxed(producer),
        }
    }

    /// Invokes the producer and returns its result.
    #[must_use]
    pub fn unbox(&self) -> T {
        (self.inner.get())()
    }

    /// Returns `true` if both boxes share the same producer.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self.inner.get(), other.inner.get())
    }
}

impl<T> Clone for RefBox<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for RefBox<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for RefBox<T> {}

impl<T> Debug for RefBox<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RefBox")
            .field("produces", &core::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T> Kinded for RefBox<T> {
    fn kind(&self) -> Kind {
        Kind::ReferenceBox
    }
}

/// Either a reference box or a plain value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaybeRef<T> {
    /// A deferred value.
    Ref(RefBox<T>),
    /// A value that is already available.
    Plain(T),
}

impl<T> MaybeRef<T> {
    /// Returns `true` if this is a reference box.
    #[must_use]
    pub const fn is_ref_box(&self) -> bool {
        matches!(self, Self::Ref(_))
    }

    /// Returns the value, invoking the producer first if this is a reference box.
    #[must_use]
    pub fn unpack(self) -> T {
        match self {
            Self::Ref(reference) => reference.unbox(),
            Self::Plain(value) => value,
        }
    }
}

impl<T> From<RefBox<T>> for MaybeRef<T> {
    fn from(value: RefBox<T>) -> Self {
        Self::Ref(value)
    }
}

/// Boxes `producer` as a [`RefBox`].
#[must_use]
pub fn boxed<T>(producer: impl Fn() -> T + Send + Sync + 'static) -> RefBox<T> {
    RefBox::new(producer)
}

/// Invokes the producer held by `reference` and returns its result.
#[must_use]
pub fn unbox<T>(reference: &RefBox<T>) -> T {
    reference.unbox()
}

/// Returns `true` only if `value` is a reference box.
///
/// Plain value boxes are boxes, but not reference boxes.
#[must_use]
pub fn is_ref_box(value: &(impl Kinded + ?Sized)) -> bool {
    value.kind() == Kind::ReferenceBox
}

/// Resolves `value` through its reference box if it has one, otherwise returns it unchanged.
#[must_use]
pub fn unpack<T>(value: MaybeRef<T>) -> T {
    value.unpack()
}
