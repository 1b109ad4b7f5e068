// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A container that makes "boxed-ness" of a value detectable.

use crate::{Kind, Kinded};

/// Holds exactly one value and reports [`Kind::ValueBox`].
///
/// A `ValueBox<T>` is distinguishable from a plain `T` even when both carry the same data, which
/// lets APIs accept either form through [`MaybeBoxed`] and [`unpack`]. Boxes are immutable; the
/// only way to get the value back out is to [`unbox`](ValueBox::unbox) or borrow it with
/// [`get`](ValueBox::get).
///
/// # Examples
///
/// ```
/// use needle::value_box::{self, MaybeBoxed};
///
/// let boxed = value_box::boxed(42);
/// assert_eq!(*boxed.get(), 42);
///
/// assert_eq!(value_box::unpack(MaybeBoxed::from(boxed)), 42);
/// assert_eq!(value_box::unpack(MaybeBoxed::Plain(7)), 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValueBox<T> {
    value: T,
}

impl<T> ValueBox<T> {
    /// Wraps `value` in a box.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Borrows the held value.
    #[must_use]
    pub const fn get(&self) -> &T {
        &self.value
    }

    /// Consumes the box and returns the held value.
    #[must_use]
    pub fn unbox(self) -> T {
        self.value
    }
}

impl<T> Kinded for ValueBox<T> {
    fn kind(&self) -> Kind {
        Kind::ValueBox
    }
}

/// Either a boxed value or a plain one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaybeBoxed<T> {
    /// The value arrived inside a [`ValueBox`].
    Boxed(ValueBox<T>),
    /// The value arrived as-is.
    Plain(T),
}

impl<T> MaybeBoxed<T> {
    /// Returns `true` if the value arrived inside a box.
    #[must_use]
    pub const fn is_box(&self) -> bool {
        matches!(self, Self::Boxed(_))
    }

    /// Returns the value, unboxing it first if needed.
    #[must_use]
    pub fn unpack(self) -> T {
        match self {
            Self::Boxed(boxed) => boxed.unbox(),
            Self::Plain(value) => value,
        }
    }
}

impl<T> From<ValueBox<T>> for MaybeBoxed<T> {
    fn from(value: ValueBox<T>) -> Self {
        Self::Boxed(value)
    }
}

/// Wraps `value` in a [`ValueBox`]. Always succeeds.
#[must_use]
pub const fn boxed<T>(value: T) -> ValueBox<T> {
    ValueBox::new(value)
}

/// Returns the value held by `value_box`.
#[must_use]
pub fn unbox<T>(value_box: ValueBox<T>) -> T {
    value_box.unbox()
}

/// Returns `true` if `value` is a box.
///
/// Reference boxes are built on value boxes, so they count as boxes too.
#[must_use]
pub fn is_box(value: &(impl Kinded + ?Sized)) -> bool {
    matches!(value.kind(), Kind::ValueBox | Kind::ReferenceBox)
}

/// Unboxes `value` if it is boxed, otherwise returns it unchanged.
#[must_use]
pub fn unpack<T>(value: MaybeBoxed<T>) -> T {
    value.unpack()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{RefBox, Token};

    fn forty_two() -> i32 {
        42
    }

    #[test]
    fn unbox_returns_the_same_value() {
        let shared = Arc::new(String::from("shared"));
        let round_tripped = unbox(boxed(Arc::clone(&shared)));
        assert!(Arc::ptr_eq(&shared, &round_tripped));

        let function: fn() -> i32 = forty_two;
        let returned = unbox(boxed(function));
        assert!(core::ptr::fn_addr_eq(function, returned));
        assert_eq!(returned(), 42);
    }

    #[test]
    fn get_borrows_without_consuming() {
        let boxed = boxed(vec![1, 2, 3]);
        assert_eq!(boxed.get().len(), 3);
        assert_eq!(boxed.unbox(), vec![1, 2, 3]);
    }

    #[test]
    fn box_discrimination() {
        assert!(is_box(&boxed(1)));
        assert!(is_box(&boxed(Token::<u8>::opaque(None))));
        assert!(is_box(&RefBox::new(|| 1)));
        assert!(!is_box(&Token::<u8>::opaque(None)));

        assert!(MaybeBoxed::from(boxed("x")).is_box());
        assert!(!MaybeBoxed::Plain("x").is_box());
    }

    #[test]
    fn unpack_accepts_either_form() {
        assert_eq!(unpack(MaybeBoxed::from(boxed(5))), 5);
        assert_eq!(unpack(MaybeBoxed::Plain(5)), 5);
    }

    #[test]
    fn unpack_is_idempotent_for_single_level_boxing() {
        let once = unpack(MaybeBoxed::from(boxed("value")));
        let twice = unpack(MaybeBoxed::Plain(once));
        assert_eq!(once, twice);
    }

    #[test]
    fn boxes_are_values() {
        assert_eq!(boxed(3), ValueBox::new(3));
        assert_eq!(ValueBox::<u32>::default().unbox(), 0);
    }
}
