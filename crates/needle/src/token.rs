// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tokens identify dependencies.
//!
//! A [`Token<T>`] stands in for "a dependency whose resolved value is a `T`". Three flavors
//! exist, distinguished by their [`TokenKey`]:
//!
//! - **opaque** tokens get a fresh process-unique id on every call to [`Token::opaque`];
//! - **string** tokens are a human-readable name followed by a large random number, see
//!   [`Token::string`];
//! - **type** tokens are the type itself, see [`Token::of_type`].
//!
//! A token may also be referenced lazily through a [`TokenRef::Deferred`], which wraps a
//! [`RefBox`] that produces the token on demand.

use core::any::{TypeId, type_name};
use core::fmt::{Debug, Display};
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Kind, Kinded, RefBox, TypeTag};

/// The largest integer a string token suffix can take: `2^53 - 1`.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

static NEXT_OPAQUE_ID: AtomicU64 = AtomicU64::new(1);

/// The identity of a token.
///
/// Keys of different flavors never compare equal.
#[derive(Debug, Clone)]
pub enum TokenKey {
    /// A process-unique marker. Compared by `id` only, the name is advisory.
    Opaque {
        /// The unique id.
        id: u64,
        /// An optional debug name.
        name: Option<Arc<str>>,
    },
    /// A name followed by a random decimal suffix. Compared by value.
    String(Arc<str>),
    /// A type standing in as its own token. Compared by [`TypeId`].
    Type {
        /// The type's id.
        id: TypeId,
        /// The type's name.
        name: &'static str,
    },
}

impl TokenKey {
    /// Returns the flavor of the key as a short lowercase word.
    #[must_use]
    pub const fn flavor(&self) -> &'static str {
        match self {
            Self::Opaque { .. } => "opaque",
            Self::String(_) => "string",
            Self::Type { .. } => "type",
        }
    }
}

impl PartialEq for TokenKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Opaque { id: left, .. }, Self::Opaque { id: right, .. }) => left == right,
            (Self::String(left), Self::String(right)) => left == right,
            (Self::Type { id: left, .. }, Self::Type { id: right, .. }) => left == right,
            _ => false,
        }
    }
}

impl Eq for TokenKey {}

impl Hash for TokenKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);

        match self {
            Self::Opaque { id, .. } => id.hash(state),
            Self::String(value) => value.hash(state),
            Self::Type { id, .. } => id.hash(state),
        }
    }
}

impl Display for TokenKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Opaque { id, name: Some(name) } => write!(f, "{name}#{id}"),
            Self::Opaque { id, name: None } => write!(f, "#{id}"),
            Self::String(value) => f.write_str(value),
            Self::Type { name, .. } => f.write_str(name),
        }
    }
}

/// A typed dependency identifier whose resolved value is a `T`.
///
/// Tokens are cheap to clone and compare by their [`TokenKey`].
///
/// # Examples
///
/// ```
/// use needle::Token;
///
/// #[derive(Clone)]
/// struct Config;
///
/// let first = Token::<String>::opaque(Some("greeting"));
/// let second = Token::<String>::opaque(Some("greeting"));
/// assert_ne!(first, second);
///
/// let named = Token::<String>::string(Some("Greeting"));
/// assert!(named.key().to_string().starts_with("Greeting"));
///
/// assert_eq!(Token::<Config>::of_type(), Token::<Config>::of_type());
/// ```
pub struct Token<T> {
    key: TokenKey,
    resolves_to: PhantomData<fn() -> T>,
}

impl<T: 'static> Token<T> {
    /// Creates a fresh opaque token.
    ///
    /// Every call returns a token distinct from every other token, regardless of `name`.
    #[must_use]
    pub fn opaque(name: Option<&str>) -> Self {
        let id = NEXT_OPAQUE_ID.fetch_add(1, Ordering::Relaxed);

        Self::from_key(TokenKey::Opaque {
            id,
            name: name.map(Arc::from),
        })
    }

    /// Creates a string token made of `name` (or nothing) followed by a random number in
    /// `1..=`[`MAX_SAFE_INTEGER`].
    ///
    /// String tokens are readable and serializable, at the price of a tiny but non-zero
    /// collision probability. Use [`Token::opaque`] when uniqueness must be guaranteed.
    #[must_use]
    pub fn string(name: Option<&str>) -> Self {
        let suffix = fastrand::u64(1..=MAX_SAFE_INTEGER);
        let value = format!("{}{suffix}", name.unwrap_or_default());

        Self::from_key(TokenKey::String(Arc::from(value)))
    }

    /// Returns the token of the type `T` itself.
    ///
    /// All type tokens of the same type are equal.
    #[must_use]
    pub fn of_type() -> Self {
        Self::from_key(TokenKey::Type {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        })
    }

    /// Creates a deferred reference to a token that is produced on demand.
    #[must_use]
    pub fn deferred(producer: impl Fn() -> Self + Send + Sync + 'static) -> TokenRef<T> {
        TokenRef::deferred(producer)
    }

    /// Returns the tag of the value type this token resolves to.
    #[must_use]
    pub fn resolved_type(&self) -> TypeTag {
        TypeTag::of::<T>()
    }

    fn from_key(key: TokenKey) -> Self {
        tracing::event!(
            name: "needle.token.created",
            tracing::Level::DEBUG,
            token.flavor = key.flavor(),
            token.key = %key,
            token.resolves_to = type_name::<T>(),
            "token created"
        );

        Self {
            key,
            resolves_to: PhantomData,
        }
    }
}

impl<T> Token<T> {
    /// Returns the identity of this token.
    #[must_use]
    pub const fn key(&self) -> &TokenKey {
        &self.key
    }
}

impl<T> Clone for Token<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            resolves_to: PhantomData,
        }
    }
}

impl<T> PartialEq for Token<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Token<T> {}

impl<T> Hash for Token<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> Debug for Token<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Token").field(&self.key).finish()
    }
}

impl<T> Display for Token<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Display::fmt(&self.key, f)
    }
}

impl<T> Kinded for Token<T> {
    fn kind(&self) -> Kind {
        Kind::PlainToken
    }
}

/// A token, either available now or produced later through a [`RefBox`].
pub enum TokenRef<T> {
    /// A plain token.
    Plain(Token<T>),
    /// A forward reference to a token.
    Deferred(RefBox<Token<T>>),
}

impl<T: 'static> TokenRef<T> {
    /// Creates a deferred reference from `producer`.
    #[must_use]
    pub fn deferred(producer: impl Fn() -> Token<T> + Send + Sync + 'static) -> Self {
        Self::Deferred(RefBox::new(producer))
    }

    /// Returns the plain token, invoking the producer if the token is deferred.
    ///
    /// The producer runs on every call.
    #[must_use]
    pub fn resolve(&self) -> Token<T> {
        match self {
            Self::Plain(token) => token.clone(),
            Self::Deferred(reference) => {
                let token = reference.unbox();

                tracing::event!(
                    name: "needle.token.deferred_resolved",
                    tracing::Level::TRACE,
                    token.key = %token.key,
                    "deferred token resolved"
                );

                token
            }
        }
    }
}

impl<T> TokenRef<T> {
    /// Returns `true` if the token is produced on demand.
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

impl<T> Clone for TokenRef<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Plain(token) => Self::Plain(token.clone()),
            Self::Deferred(reference) => Self::Deferred(reference.clone()),
        }
    }
}

impl<T> PartialEq for TokenRef<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Plain(left), Self::Plain(right)) => left == right,
            (Self::Deferred(left), Self::Deferred(right)) => left == right,
            _ => false,
        }
    }
}

impl<T> Eq for TokenRef<T> {}

impl<T> Debug for TokenRef<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Plain(token) => f.debug_tuple("Plain").field(token).finish(),
            Self::Deferred(reference) => f.debug_tuple("Deferred").field(reference).finish(),
        }
    }
}

impl<T> Kinded for TokenRef<T> {
    fn kind(&self) -> Kind {
        match self {
            Self::Plain(_) => Kind::PlainToken,
            Self::Deferred(_) => Kind::ReferenceBox,
        }
    }
}

impl<T> From<Token<T>> for TokenRef<T> {
    fn from(value: Token<T>) -> Self {
        Self::Plain(value)
    }
}

impl<T> From<RefBox<Token<T>>> for TokenRef<T> {
    fn from(value: RefBox<Token<T>>) -> Self {
        Self::Deferred(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;

    use rstest::rstest;
    use static_assertions::assert_impl_all;
    use tracing_subscriber::util::SubscriberInitExt;

    use super::*;
    use crate::testing::LogCapture;

    trait Logger {}

    #[derive(Debug, Clone)]
    struct Store;

    assert_impl_all!(Token<Arc<dyn Logger>>: Send, Sync, Clone);
    assert_impl_all!(TokenRef<Store>: Send, Sync, Clone);
    assert_impl_all!(TokenKey: Send, Sync);

    #[rstest]
    #[case::named(Some("Logger"))]
    #[case::anonymous(None)]
    fn opaque_tokens_are_pairwise_distinct(#[case] name: Option<&str>) {
        let tokens: Vec<Token<u32>> = (0..256).map(|_| Token::opaque(name)).collect();
        let unique: HashSet<_> = tokens.iter().collect();

        assert_eq!(unique.len(), tokens.len());
    }

    #[test]
    fn opaque_name_does_not_affect_identity() {
        let token = Token::<u32>::opaque(Some("a"));
        let TokenKey::Opaque { id, .. } = token.key().clone() else {
            panic!("expected an opaque key");
        };
        let renamed = TokenKey::Opaque {
            id,
            name: Some(Arc::from("b")),
        };

        assert_eq!(token.key(), &renamed);
    }

    #[test]
    fn string_token_layout() {
        let token = Token::<u32>::string(Some("Logger"));
        let TokenKey::String(value) = token.key() else {
            panic!("expected a string key");
        };

        let suffix = value.strip_prefix("Logger").expect("name must prefix the token");
        let number: u64 = suffix.parse().expect("suffix must be a decimal number");
        assert!((1..=MAX_SAFE_INTEGER).contains(&number));
    }

    #[test]
    fn string_token_without_name_is_just_digits() {
        let token = Token::<u32>::string(None);
        let rendered = token.to_string();

        assert!(!rendered.is_empty());
        assert!(rendered.chars().all(|c| c.is_ascii_digit()), "unexpected token {rendered}");
    }

    #[test]
    fn string_tokens_compare_by_value() {
        let token = Token::<u32>::string(Some("x"));
        let same = Token::<u32> {
            key: token.key().clone(),
            resolves_to: PhantomData,
        };

        assert_eq!(token, same);
    }

    #[test]
    fn type_tokens_compare_by_type() {
        assert_eq!(Token::<Store>::of_type(), Token::<Store>::of_type());
        assert_ne!(Token::<Store>::of_type().key(), Token::<String>::of_type().key());
        assert_eq!(Token::<Store>::of_type().resolved_type(), TypeTag::of::<Store>());
    }

    #[test]
    fn flavors_never_collide() {
        let opaque = Token::<u32>::opaque(Some("1"));
        let string = Token::<u32>::string(Some("1"));
        let typed = Token::<u32>::of_type();

        assert_ne!(opaque.key(), string.key());
        assert_ne!(string.key(), typed.key());
        assert_ne!(opaque.key(), typed.key());
        assert_eq!(opaque.key().flavor(), "opaque");
        assert_eq!(string.key().flavor(), "string");
        assert_eq!(typed.key().flavor(), "type");
    }

    #[test]
    fn deferred_tokens_resolve_on_every_call() {
        let token = Token::<Store>::opaque(Some("Store"));
        let produced = token.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let deferred = Token::deferred(move || {
            _ = counter.fetch_add(1, Ordering::SeqCst);
            produced.clone()
        });

        assert!(deferred.is_deferred());
        assert_eq!(deferred.kind(), Kind::ReferenceBox);
        assert_eq!(deferred.resolve(), token);
        assert_eq!(deferred.resolve(), token);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn plain_token_refs() {
        let token = Token::<Store>::of_type();
        let plain = TokenRef::from(token.clone());

        assert!(!plain.is_deferred());
        assert_eq!(plain.kind(), Kind::PlainToken);
        assert_eq!(plain.resolve(), token);
        assert_ne!(plain, TokenRef::deferred(Token::of_type));
    }

    #[test]
    fn creation_is_logged() {
        let capture = LogCapture::new();
        let _guard = capture.subscriber().set_default();

        let token = Token::<u32>::opaque(Some("Audited"));

        capture.assert_contains("token created");
        capture.assert_contains(&token.key().to_string());
    }

    #[test]
    fn display() {
        let token = Token::<u32>::opaque(Some("Cache"));
        assert!(token.to_string().starts_with("Cache#"));
        assert_eq!(Token::<u32>::of_type().to_string(), "u32");
    }
}
