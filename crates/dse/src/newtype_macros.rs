//! Newtype generation macros

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

macro_rules! u8_newtype {
    ($name:ident, $error:ident, $min: expr, $max:expr) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize)]
        #[serde(try_from = "u8")]
        pub struct $name(u8);

        #[allow(dead_code)]
        impl $name {
            pub const MIN: u8 = $min;
            pub const MAX: u8 = $max;

            pub const fn as_u8(&self) -> u8 {
                self.0
            }

            /// Masks `value` into the valid range (no range check)
            pub const fn from_masked(value: u8) -> Self {
                Self(value & Self::MAX)
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ValueError;

            #[allow(unused_comparisons, clippy::manual_range_contains)]
            fn try_from(value: u8) -> Result<Self, Self::Error> {
                if value >= Self::MIN && value <= Self::MAX {
                    Ok(Self(value))
                } else {
                    Err(ValueError::$error(value.into()))
                }
            }
        }

        impl TryFrom<u32> for $name {
            type Error = ValueError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match u8::try_from(value) {
                    Ok(v) => Self::try_from(v).map_err(|_| ValueError::$error(value)),
                    Err(_) => Err(ValueError::$error(value)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub(crate) use u8_newtype;
