// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
#[cfg(feature = "std")]
extern crate std;

use core::fmt;

use embedded_hal::blocking::i2c;

/// Errors that don't involve I²C.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LibraryError {
    /// When a value from the sensor is malformed in some way.
    InvalidData(&'static str),

    /// The given refresh rate code is not one the sensor supports (2 through 5).
    InvalidRefreshRate(u8),

    /// The given pixel index is past the end of the frame.
    InvalidPixel(usize),

    /// The destination buffer can't hold a full frame.
    BufferTooSmall { required: usize, actual: usize },

    /// A configuration write was accepted, but reading it back gave a different value.
    ///
    /// Both values are whole words. Only the writable bits of the register are compared.
    VerificationFailed { expected: u16, actual: u16 },
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::InvalidData(msg) => write!(f, "{}", msg),
            LibraryError::InvalidRefreshRate(code) => {
                write!(f, "{} is not a valid refresh rate code", code)
            }
            LibraryError::InvalidPixel(index) => write!(f, "pixel {} is out of range", index),
            LibraryError::BufferTooSmall { required, actual } => write!(
                f,
                "buffer holds {} values, but {} are required",
                actual, required
            ),
            LibraryError::VerificationFailed { expected, actual } => write!(
                f,
                "wrote {:#06X}, but read back {:#06X}",
                expected, actual
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LibraryError {}

/// Errors from the driver, either from the I²C bus or from a check inside this library.
pub enum Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    /// Errors originating from the I²C implementation during a write-read (register read).
    I2cWriteReadError(<I2C as i2c::WriteRead>::Error),

    /// Errors originating from the I²C implementation during a write (EEPROM write).
    I2cWriteError(<I2C as i2c::Write>::Error),

    /// Errors originating from within this library.
    LibraryError(LibraryError),
}

// Custom Debug implementation so that I2C doesn't need to implement Debug (like the one from
// linux-embedded-hal).
impl<I2C> fmt::Debug for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: fmt::Debug,
    <I2C as i2c::Write>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2cWriteReadError(i2c_error) => f
                .debug_tuple("Error::I2cWriteReadError")
                .field(i2c_error)
                .finish(),
            Error::I2cWriteError(i2c_error) => f
                .debug_tuple("Error::I2cWriteError")
                .field(i2c_error)
                .finish(),
            Error::LibraryError(err) => f.debug_tuple("Error::LibraryError").field(err).finish(),
        }
    }
}

// Same as Debug, only the error types need to be cloneable, not the bus.
impl<I2C> Clone for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: Clone,
    <I2C as i2c::Write>::Error: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Error::I2cWriteReadError(i2c_error) => Error::I2cWriteReadError(i2c_error.clone()),
            Error::I2cWriteError(i2c_error) => Error::I2cWriteError(i2c_error.clone()),
            Error::LibraryError(err) => Error::LibraryError(err.clone()),
        }
    }
}

// Same as Debug, only the error types need to be comparable, not the bus.
impl<I2C> PartialEq for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: PartialEq,
    <I2C as i2c::Write>::Error: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::I2cWriteReadError(lhs), Error::I2cWriteReadError(rhs)) => lhs == rhs,
            (Error::I2cWriteError(lhs), Error::I2cWriteError(rhs)) => lhs == rhs,
            (Error::LibraryError(lhs), Error::LibraryError(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl<I2C> fmt::Display for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: fmt::Debug,
    <I2C as i2c::Write>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2cWriteReadError(i2c_error) => write!(f, "I2C read error: {:?}", i2c_error),
            Error::I2cWriteError(i2c_error) => write!(f, "I2C write error: {:?}", i2c_error),
            Error::LibraryError(err) => write!(f, "Library Error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<I2C> std::error::Error for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: std::error::Error + 'static,
    <I2C as i2c::Write>::Error: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::I2cWriteReadError(i2c_error) => Some(i2c_error),
            Error::I2cWriteError(i2c_error) => Some(i2c_error),
            Error::LibraryError(lib_err) => Some(lib_err),
        }
    }
}

impl<I2C> From<LibraryError> for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    fn from(lib_err: LibraryError) -> Self {
        Self::LibraryError(lib_err)
    }
}

impl<I2C> Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    /// Whether this error came from the bus rather than from a check inside this library.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::I2cWriteReadError(_) | Error::I2cWriteError(_))
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use std::string::ToString;

    use mlx90642_test_data::{MockError, MockSensorBus};

    use super::{Error, LibraryError};

    #[test]
    fn library_error_display() {
        assert_eq!(
            LibraryError::InvalidRefreshRate(7).to_string(),
            "7 is not a valid refresh rate code"
        );
        assert_eq!(
            LibraryError::VerificationFailed {
                expected: 0xAB04,
                actual: 0xAB05
            }
            .to_string(),
            "wrote 0xAB04, but read back 0xAB05"
        );
        assert_eq!(
            LibraryError::BufferTooSmall {
                required: 768,
                actual: 10
            }
            .to_string(),
            "buffer holds 10 values, but 768 are required"
        );
    }

    #[test]
    fn transport_classification() {
        let read: Error<MockSensorBus> = Error::I2cWriteReadError(MockError::Nack(0x3C10));
        let write: Error<MockSensorBus> = Error::I2cWriteError(MockError::WriteRejected(0x11F0));
        let library: Error<MockSensorBus> = LibraryError::InvalidPixel(768).into();
        assert!(read.is_transport());
        assert!(write.is_transport());
        assert!(!library.is_transport());
    }

    #[test]
    fn compare_without_comparable_bus() {
        let err: Error<MockSensorBus> = Error::I2cWriteReadError(MockError::Nack(0x3C10));
        assert_eq!(err, Error::I2cWriteReadError(MockError::Nack(0x3C10)));
        assert_ne!(err, Error::I2cWriteError(MockError::Nack(0x3C10)));
        assert_ne!(err, Error::LibraryError(LibraryError::InvalidPixel(768)));
    }

    #[test]
    fn clone_without_cloneable_bus() {
        // Only the error types are cloned
        let err: Error<MockSensorBus> = Error::I2cWriteError(MockError::WriteRejected(0x11F0));
        assert_eq!(err.clone(), err);
        let library: Error<MockSensorBus> = LibraryError::InvalidRefreshRate(9).into();
        assert_eq!(library.clone(), library);
    }

    #[test]
    fn debug_names_variant() {
        let err: Error<MockSensorBus> = Error::I2cWriteReadError(MockError::Nack(0x3C10));
        let formatted = std::format!("{:?}", err);
        assert!(formatted.starts_with("Error::I2cWriteReadError"));
    }
}
