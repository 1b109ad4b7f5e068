// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt::Display;

/// The runtime discriminator of every value this crate hands out.
///
/// Boxes, reference boxes, tokens and metadata records all report their [`Kind`], so code that
/// accepts "either a box or a plain value" can match on it exhaustively instead of probing the
/// value's structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    /// A [`ValueBox`](crate::ValueBox).
    ValueBox,
    /// A [`RefBox`](crate::RefBox), which is also a box.
    ReferenceBox,
    /// A [`Metadata`](crate::Metadata) record.
    Metadata,
    /// A plain [`Token`](crate::Token).
    PlainToken,
}

impl Display for Kind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::ValueBox => "value box",
            Self::ReferenceBox => "reference box",
            Self::Metadata => "metadata",
            Self::PlainToken => "plain token",
        };

        f.write_str(name)
    }
}

/// Implemented by every type that carries a [`Kind`].
pub trait Kinded {
    /// Returns the runtime discriminator of `self`.
    fn kind(&self) -> Kind;
}

impl<K: Kinded + ?Sized> Kinded for &K {
    fn kind(&self) -> Kind {
        (**self).kind()
    }
}
