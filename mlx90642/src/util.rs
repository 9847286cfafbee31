// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross

/// The word size of the sensor in terms of 8-bit bytes.
pub(crate) const WORD_SIZE: usize = (u16::BITS / u8::BITS) as usize;

/// Define subtraction for address enumerations, giving the distance between them in address
/// units.
#[doc(hidden)]
#[macro_export]
macro_rules! address_enum_ops {
    ($typ:ident) => {
        impl ::core::ops::Sub<$typ> for $typ {
            type Output = u16;
            fn sub(self, other: $typ) -> Self::Output {
                self as u16 - other as u16
            }
        }
        impl ::core::ops::Sub<&$typ> for $typ {
            type Output = u16;
            fn sub(self, other: &$typ) -> Self::Output {
                self as u16 - *other as u16
            }
        }
        impl ::core::ops::Sub<$typ> for &$typ {
            type Output = u16;
            fn sub(self, other: $typ) -> Self::Output {
                *self as u16 - other as u16
            }
        }
    };
}

/// Pack two bytes, most significant first, into a word.
pub(crate) fn word_from_be(bytes: [u8; WORD_SIZE]) -> u16 {
    u16::from_be_bytes(bytes)
}
