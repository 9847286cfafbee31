// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Configuration words and their fields.
use core::convert::TryFrom;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::address::{Address, EepromAddress};
use crate::error::LibraryError;

/// Trait for common register functionality.
pub trait Register: Copy + From<u16> + Into<u16> {
    /// A bit mask of which bits can be modified by the controller.
    ///
    /// When changing register values on the sensor, the current value should be read, then
    /// bitwise-ANDed with the complement of this mask, then bitwise-ORd with the new value. This
    /// preserves the values of any reserved bits in the registers.
    fn write_mask() -> u16;

    /// The address of this register in the sensor's memory map.
    fn address() -> Address;

    /// Combine the writable bits of this register with the reserved bits of `current`.
    fn merge_into(self, current: u16) -> u16 {
        let mask = Self::write_mask();
        (current & !mask) | (self.into() & mask)
    }
}

/// The configuration word in EEPROM (0x11F0).
///
/// Only the refresh rate (bits 0 through 2) is documented. Everything else is kept exactly as it
/// was read, so writing a `ConfigurationRegister` back never disturbs the other bits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigurationRegister {
    raw: u16,
}

impl ConfigurationRegister {
    const REFRESH_RATE_MASK: u16 = 0x0007;

    /// The raw 3-bit refresh rate field.
    ///
    /// This may hold a value that isn't a valid [`RefreshRate`], for example if the word was
    /// never programmed.
    pub fn refresh_rate_code(&self) -> u8 {
        (self.raw & Self::REFRESH_RATE_MASK) as u8
    }

    /// The refresh rate this configuration selects.
    pub fn refresh_rate(&self) -> Result<RefreshRate, LibraryError> {
        RefreshRate::from_raw(self.refresh_rate_code().into())
    }

    /// Select a new refresh rate, leaving every other bit untouched.
    pub fn set_refresh_rate(&mut self, refresh_rate: RefreshRate) {
        self.raw = (self.raw & !Self::REFRESH_RATE_MASK) | u16::from(refresh_rate.as_raw());
    }

    /// The entire word, including the undocumented bits.
    pub fn raw(&self) -> u16 {
        self.raw
    }
}

impl Register for ConfigurationRegister {
    fn write_mask() -> u16 {
        Self::REFRESH_RATE_MASK
    }

    fn address() -> Address {
        EepromAddress::Configuration.into()
    }
}

impl From<u16> for ConfigurationRegister {
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<ConfigurationRegister> for u16 {
    fn from(register: ConfigurationRegister) -> Self {
        register.raw
    }
}

/// The possible refresh rates supported by the MLX90642.
///
/// The discriminant is the code stored in the configuration word. Before using the faster rates,
/// make sure the I²C bus is fast enough to read a full frame before the next one starts (the
/// sensor is normally run with a 400kHz bus).
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RefreshRate {
    /// 2Hz.
    Two = 2,

    /// 4Hz.
    Four = 3,

    /// 8Hz, which is also the factory default.
    Eight = 4,

    /// 16Hz.
    Sixteen = 5,
}

impl RefreshRate {
    /// Attempt to create a `RefreshRate` from a raw value from the sensor.
    pub(crate) fn from_raw(raw_value: u16) -> Result<Self, LibraryError> {
        match raw_value {
            2 => Ok(Self::Two),
            3 => Ok(Self::Four),
            4 => Ok(Self::Eight),
            5 => Ok(Self::Sixteen),
            _ => Err(LibraryError::InvalidData("Invalid refresh rate code")),
        }
    }

    /// Map a refresh rate variant into the representation used by the sensor.
    pub fn as_raw(&self) -> u8 {
        (*self).into()
    }

    /// Validate a raw refresh rate code given by a user.
    pub fn from_code(code: u8) -> Result<Self, LibraryError> {
        Self::try_from(code).map_err(|_| LibraryError::InvalidRefreshRate(code))
    }

    /// The time between frames, in milliseconds.
    pub fn frame_period_ms(&self) -> u16 {
        match self {
            Self::Two => 500,
            Self::Four => 250,
            Self::Eight => 125,
            // Really 62.5ms
            Self::Sixteen => 63,
        }
    }
}

impl Default for RefreshRate {
    fn default() -> Self {
        Self::Eight
    }
}

impl TryFrom<f32> for RefreshRate {
    type Error = LibraryError;

    /// Attempt to create a `RefreshRate` from a frequency in Hz.
    ///
    /// This will only work if the source number *exactly* matches one of the values named as a
    /// variant.
    /// ```
    /// # use core::convert::TryFrom;
    /// # use mlx90642::RefreshRate;
    /// assert_eq!(RefreshRate::try_from(4.0f32), Ok(RefreshRate::Four));
    /// assert!(RefreshRate::try_from(4.5f32).is_err());
    /// ```
    fn try_from(value: f32) -> Result<Self, Self::Error> {
        if value == 2.0 {
            Ok(Self::Two)
        } else if value == 4.0 {
            Ok(Self::Four)
        } else if value == 8.0 {
            Ok(Self::Eight)
        } else if value == 16.0 {
            Ok(Self::Sixteen)
        } else {
            Err(LibraryError::InvalidData(
                "The given number does not match a valid refresh rate",
            ))
        }
    }
}

impl From<RefreshRate> for f32 {
    fn from(refresh_rate: RefreshRate) -> Self {
        match refresh_rate {
            RefreshRate::Two => 2f32,
            RefreshRate::Four => 4f32,
            RefreshRate::Eight => 8f32,
            RefreshRate::Sixteen => 16f32,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn configuration_refresh_rate() {
        assert_eq!(
            ConfigurationRegister::from(0x0002).refresh_rate(),
            Ok(RefreshRate::Two)
        );
        assert_eq!(
            ConfigurationRegister::from(0x0003).refresh_rate(),
            Ok(RefreshRate::Four)
        );
        assert_eq!(
            ConfigurationRegister::from(0x0004).refresh_rate(),
            Ok(RefreshRate::Eight)
        );
        assert_eq!(
            ConfigurationRegister::from(0x0005).refresh_rate(),
            Ok(RefreshRate::Sixteen)
        );
        // Upper bits don't matter
        assert_eq!(
            ConfigurationRegister::from(0xFFF5).refresh_rate(),
            Ok(RefreshRate::Sixteen)
        );
        assert!(ConfigurationRegister::from(0x0000).refresh_rate().is_err());
        assert!(ConfigurationRegister::from(0x0007).refresh_rate().is_err());
    }

    #[test]
    fn configuration_set_preserves_reserved() {
        let mut register = ConfigurationRegister::from(0xAB05);
        register.set_refresh_rate(RefreshRate::Eight);
        assert_eq!(register.raw(), 0xAB04);
        assert_eq!(register.refresh_rate_code(), 4);
        let mut register = ConfigurationRegister::from(0xFFFF);
        register.set_refresh_rate(RefreshRate::Two);
        assert_eq!(u16::from(register), 0xFFFA);
    }

    #[test]
    fn configuration_merge() {
        let mut register = ConfigurationRegister::from(0x0000);
        register.set_refresh_rate(RefreshRate::Sixteen);
        assert_eq!(register.merge_into(0x1230), 0x1235);
        assert_eq!(register.merge_into(0x1237), 0x1235);
        assert_eq!(ConfigurationRegister::write_mask(), 0x0007);
        assert_eq!(ConfigurationRegister::address(), Address::new(0x11F0));
    }

    #[test]
    fn refresh_rate_codes() {
        assert_eq!(RefreshRate::Two.as_raw(), 2);
        assert_eq!(RefreshRate::Four.as_raw(), 3);
        assert_eq!(RefreshRate::Eight.as_raw(), 4);
        assert_eq!(RefreshRate::Sixteen.as_raw(), 5);
        for code in 2..=5u8 {
            assert_eq!(RefreshRate::from_code(code).unwrap().as_raw(), code);
        }
    }

    #[test]
    fn refresh_rate_invalid_codes() {
        for code in (0..2u8).chain(6..=u8::MAX) {
            assert_eq!(
                RefreshRate::from_code(code),
                Err(LibraryError::InvalidRefreshRate(code))
            );
        }
        assert!(RefreshRate::from_raw(6).is_err());
    }

    #[test]
    fn refresh_rate_from_f32() {
        assert_eq!(RefreshRate::try_from(2f32).unwrap(), RefreshRate::Two);
        assert_eq!(RefreshRate::try_from(4f32).unwrap(), RefreshRate::Four);
        assert_eq!(RefreshRate::try_from(8f32).unwrap(), RefreshRate::Eight);
        assert_eq!(RefreshRate::try_from(16f32).unwrap(), RefreshRate::Sixteen);
        assert!(RefreshRate::try_from(0.5f32).is_err());
        assert!(RefreshRate::try_from(32f32).is_err());
    }

    #[test]
    fn refresh_rate_to_f32() {
        assert_eq!(f32::from(RefreshRate::Two), 2f32);
        assert_eq!(f32::from(RefreshRate::Four), 4f32);
        assert_eq!(f32::from(RefreshRate::Eight), 8f32);
        assert_eq!(f32::from(RefreshRate::Sixteen), 16f32);
    }

    #[test]
    fn default_refresh_rate() {
        assert_eq!(RefreshRate::default(), RefreshRate::Eight)
    }
}
