// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Turning raw register values into temperatures.
//!
//! The MLX90642 does its own compensation, so unlike the MLX90640 and MLX90641 there are no
//! calibration constants involved here. Each value is a signed word with a fixed scale.

/// The number of raw units per degree Celsius for the sensor temperature.
pub const SENSOR_TEMPERATURE_SCALE: f32 = 100.0;

/// The number of raw units per degree Celsius for each pixel.
pub const PIXEL_TEMPERATURE_SCALE: f32 = 50.0;

/// Convert the raw sensor temperature register into degrees Celsius.
///
/// This is the temperature of the sensor itself, *not* the ambient temperature.
pub fn raw_to_sensor_temperature(raw: i16) -> f32 {
    f32::from(raw) / SENSOR_TEMPERATURE_SCALE
}

/// Convert a raw pixel value into degrees Celsius.
pub fn raw_to_pixel_temperature(raw: i16) -> f32 {
    f32::from(raw) / PIXEL_TEMPERATURE_SCALE
}
