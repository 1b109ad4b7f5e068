// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Declares a dependencies struct from its descriptors.
///
/// Each field is written as `name: DescriptorType = descriptor_expression`. The generated field
/// has the type [`Dependency<DescriptorType>`](crate::Dependency): the resolved value for plain
/// descriptors, an `Option` for optional ones and a `Vec` for multi ones.
///
/// The struct implements [`Injectable`](crate::Injectable) with the declared descriptors, and
/// `TryFrom<&Dependencies>`, which validates the dependencies object against the inferred shape
/// before reading each field.
///
/// # Examples
///
/// ```
/// use needle::{Dependencies, Metadata, Multi, Optional, Token, multi, optional};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Logger(&'static str);
///
/// needle::dependencies! {
///     #[derive(Debug)]
///     pub struct ServiceDependencies {
///         pub logger: Metadata<Logger, Optional> = optional(Token::<Logger>::of_type()),
///         pub sinks: Metadata<Logger, Multi> = multi(Token::<Logger>::of_type()),
///         pub port: Token<u16> = Token::of_type(),
///     }
/// }
///
/// let provided = Dependencies::new()
///     .with_many("sinks", [Logger("file"), Logger("console")])
///     .with_one("port", 8080_u16);
///
/// let dependencies = ServiceDependencies::try_from(&provided).unwrap();
/// assert_eq!(dependencies.logger, None);
/// assert_eq!(dependencies.sinks.len(), 2);
/// assert_eq!(dependencies.port, 8080);
/// ```
#[macro_export]
macro_rules! dependencies {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $descriptor:ty = $expr:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $crate::Dependency<$descriptor>,
            )*
        }

        impl $crate::Injectable for $name {
            fn descriptors() -> $crate::DescriptorMap {
                $crate::DescriptorMap::new()
                    $(.with::<$descriptor>(::core::stringify!($field), $expr))*
            }
        }

        impl ::core::convert::TryFrom<&$crate::Dependencies> for $name {
            type Error = $crate::Error;

            fn try_from(dependencies: &$crate::Dependencies) -> $crate::Result<Self> {
                <Self as $crate::Injectable>::shape()?.validate(dependencies)?;

                ::core::result::Result::Ok(Self {
                    $(
                        $field: $crate::extract::<$descriptor>(dependencies, ::core::stringify!($field))?,
                    )*
                })
            }
        }
    };
}
