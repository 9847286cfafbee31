// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Sensor access with failures folded into the returned values.
//!
//! Every operation here does the same bus traffic as its counterpart on
//! [`Mlx90642`][crate::Mlx90642], but instead of a [`Result`] it returns a plain value, with a
//! fixed sentinel standing in for a failure:
//!
//! | Operation                 | On failure                  |
//! |---------------------------|-----------------------------|
//! | `read_unsigned`           | `0xFFFF`                    |
//! | `read_signed`             | `-1`                        |
//! | `write_eeprom`            | `false`                     |
//! | `pixel_address`           | `0` (index out of range)    |
//! | `sensor_temperature`      | `-0.01`                     |
//! | `read_frame`              | `-0.02` for each bad pixel  |
//! | `is_new_frame_available`  | see below                   |
//! | `set_refresh_rate`        | `false`                     |
//!
//! The sentinels are also perfectly good readings, so there is no way to tell a failure from a
//! word that really is `0xFFFF`. New code should use the `Result` API instead.
//!
//! A failed progress read is treated as a reading of `0xFFFF`. That becomes the baseline for the
//! next check, so the next successful read will almost certainly look like a new frame.
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;

use crate::address::{self, pixel_addresses, RamAddress};
use crate::calculations::{raw_to_pixel_temperature, raw_to_sensor_temperature};
use crate::driver::{Mlx90642, READ_FAILURE_SENTINEL};

/// Borrowed access to a [`Mlx90642`] using sentinel values instead of errors.
///
/// Created by [`Mlx90642::sentinel`]. The frame detection state is shared with the driver, so
/// mixing calls between the two APIs behaves the same as sticking to one.
pub struct SentinelAccess<'a, I2C, D> {
    driver: &'a mut Mlx90642<I2C, D>,
}

impl<'a, I2C, D> SentinelAccess<'a, I2C, D>
where
    I2C: i2c::WriteRead + i2c::Write,
    D: DelayMs<u16>,
{
    pub(crate) fn new(driver: &'a mut Mlx90642<I2C, D>) -> Self {
        Self { driver }
    }

    /// Read an unsigned word, or `0xFFFF` if the read failed.
    pub fn read_unsigned(&mut self, address: u16) -> u16 {
        self.driver.read_unsigned(address).unwrap_or_else(|_| {
            warn!("read of {=u16:#x} failed", address);
            READ_FAILURE_SENTINEL
        })
    }

    /// Read a signed word, or `-1` if the read failed.
    pub fn read_signed(&mut self, address: u16) -> i16 {
        // 0xFFFF is -1 in two's complement
        self.read_unsigned(address) as i16
    }

    /// Write a word to EEPROM, returning whether the bus accepted it.
    pub fn write_eeprom(&mut self, address: u16, value: u16) -> bool {
        self.driver.write_eeprom(address, value).is_ok()
    }

    /// The address of a pixel, or 0 if the index is 768 or more.
    pub fn pixel_address(&self, index: usize) -> u16 {
        address::pixel_address(index).map(u16::from).unwrap_or(0)
    }

    /// The sensor temperature in degrees Celsius, or `-0.01` if the read failed.
    pub fn sensor_temperature(&mut self) -> f32 {
        raw_to_sensor_temperature(self.read_signed(RamAddress::SensorTemperature as u16))
    }

    /// Fill `destination` with pixel temperatures.
    ///
    /// Only the first `min(destination.len(), 768)` pixels are read. A pixel that fails to read
    /// comes out as `-0.02`, and the rest of the frame is still read.
    pub fn read_frame(&mut self, destination: &mut [f32]) {
        for (address, temperature) in pixel_addresses().zip(destination.iter_mut()) {
            *temperature = raw_to_pixel_temperature(self.read_signed(address.into()));
        }
    }

    /// Check for a new frame. A failed read counts as a progress reading of `0xFFFF`.
    pub fn is_new_frame_available(&mut self) -> bool {
        let progress = self.read_unsigned(RamAddress::FrameProgress as u16);
        self.driver.frame_sync.observe(progress)
    }

    /// Change the refresh rate code, returning whether the change was confirmed by reading it
    /// back.
    ///
    /// Invalid codes (anything but 2 through 5) return `false` without touching the bus.
    pub fn set_refresh_rate(&mut self, code: u8) -> bool {
        self.driver.set_refresh_rate_code(code).is_ok()
    }
}
