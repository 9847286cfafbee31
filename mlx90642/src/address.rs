// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! The MLX90642 memory map.
//!
//! All memory on the sensor is organized in 16-bit words, and words can only be addressed on even
//! addresses. The pixels live in RAM in row-major order, one word each, starting at
//! [`RamAddress::FrameBase`].
use core::convert::TryFrom;
use core::fmt;
use core::iter::FusedIterator;

use num_enum::{IntoPrimitive, TryFromPrimitive, TryFromPrimitiveError};

use crate::address_enum_ops;
use crate::util::WORD_SIZE;

/// The I²C address the MLX90642 responds to out of the factory.
pub const DEFAULT_ADDRESS: u8 = 0x66;

/// The height of the image captured by the sensor in pixels.
pub const HEIGHT: usize = 24;

/// The width of the image captured by the sensor in pixels.
pub const WIDTH: usize = 32;

/// The total number of pixels an MLX90642 has.
pub const NUM_PIXELS: usize = HEIGHT * WIDTH;

/// Marker newtype for addresses accessible over I<sup>2</sup>C.
#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Address(u16);

impl Address {
    /// Wrap the given address in an `Address`.
    ///
    /// This function is intended to be used in const contexts, in other cases the
    /// [`From`][core::convert::From] implementations are probably easier to use.
    pub const fn new(address: u16) -> Self {
        Self(address)
    }

    pub(crate) fn as_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:#X})", self.0)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Address {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Address({=u16:#x})", self.0)
    }
}

impl From<u16> for Address {
    fn from(raw_address: u16) -> Self {
        Self::new(raw_address)
    }
}

impl From<Address> for u16 {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// Addresses in RAM.
// NOTE: To make it easier to compare against the datasheet, discriminant values should *always* be
// explicitly written out.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum RamAddress {
    /// The first pixel. The rest of the pixels follow in row-major order, one word each.
    FrameBase = 0x342C,

    /// The last pixel.
    FrameEnd = 0x3A2A,

    /// The temperature of the sensor die itself, in hundredths of a degree Celsius.
    ///
    /// This is labelled T<sub>sensor</sub> in the datasheet. In open air it typically runs 8-10℃
    /// above the ambient temperature.
    SensorTemperature = 0x3A2C,

    /// How far the sensor has gotten writing the current frame into RAM. It counts up while a
    /// frame is written and starts over low for the next one.
    FrameProgress = 0x3C10,
}

address_enum_ops!(RamAddress);

/// Addresses in EEPROM.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum EepromAddress {
    /// Bits 0 through 2 hold the refresh rate, the rest must be left alone.
    Configuration = 0x11F0,
}

impl TryFrom<Address> for RamAddress {
    type Error = TryFromPrimitiveError<RamAddress>;

    fn try_from(value: Address) -> Result<Self, Self::Error> {
        let raw_address: u16 = value.into();
        Self::try_from(raw_address)
    }
}

impl From<RamAddress> for Address {
    fn from(ram_address: RamAddress) -> Self {
        let raw_address: u16 = ram_address.into();
        raw_address.into()
    }
}

impl TryFrom<Address> for EepromAddress {
    type Error = TryFromPrimitiveError<EepromAddress>;

    fn try_from(value: Address) -> Result<Self, Self::Error> {
        let raw_address: u16 = value.into();
        Self::try_from(raw_address)
    }
}

impl From<EepromAddress> for Address {
    fn from(eeprom_address: EepromAddress) -> Self {
        let raw_address: u16 = eeprom_address.into();
        raw_address.into()
    }
}

/// The address of the pixel at the given index, or `None` if the index is past the end of the
/// frame.
///
/// Indices count in row-major order, so the pixel in row `r` and column `c` is at index
/// `r * WIDTH + c`.
pub fn pixel_address(index: usize) -> Option<Address> {
    if index < NUM_PIXELS {
        let offset = (index * WIDTH_OF_PIXEL) as u16;
        Some(Address::new(RamAddress::FrameBase as u16 + offset))
    } else {
        None
    }
}

// Each pixel takes up one word.
const WIDTH_OF_PIXEL: usize = WORD_SIZE;

/// An iterator over the address of every pixel, in index order.
pub fn pixel_addresses() -> PixelAddresses {
    PixelAddresses { index: 0 }
}

/// Iterator over pixel addresses, created by [`pixel_addresses`].
#[derive(Clone, Debug)]
pub struct PixelAddresses {
    index: usize,
}

impl Iterator for PixelAddresses {
    type Item = Address;

    fn next(&mut self) -> Option<Self::Item> {
        let address = pixel_address(self.index)?;
        self.index += 1;
        Some(address)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = NUM_PIXELS.saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PixelAddresses {}

impl FusedIterator for PixelAddresses {}
