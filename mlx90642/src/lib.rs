// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! A pure-Rust, register-level driver for the Melexis MLX90642 thermal camera over I²C.
//!
//! Unlike its MLX90640 and MLX90641 siblings, the MLX90642 does the heavy lifting on the sensor
//! itself: every pixel in RAM is already a temperature, scaled by a fixed factor. The job of this
//! crate is mostly getting the protocol right. Words are 16 bits wide and only live at even
//! addresses, the caller has to know whether a word is signed, new frames are only signalled by a
//! progress counter wrapping around, and configuration changes go through an EEPROM write that
//! should always be read back.
//!
//! This library uses the [`embedded-hal`][embedded-hal] I²C and delay traits, so it should work on
//! any platform with an `embedded-hal` implementation. It is `no_std` and does not allocate.
//!
//! [embedded-hal]: https://docs.rs/embedded-hal/0.2/embedded_hal/blocking/i2c/index.html
//!
//! # Example
//! ```no_run
//! use linux_embedded_hal::{Delay, I2cdev};
//! use mlx90642::{Mlx90642, RefreshRate, NUM_PIXELS};
//!
//! let bus = I2cdev::new("/dev/i2c-1").expect("/dev/i2c-1 needs to be an I2C controller");
//! let mut camera = Mlx90642::new(bus, Delay);
//! camera.set_refresh_rate(RefreshRate::Four)?;
//! let mut temperatures = [0f32; NUM_PIXELS];
//! loop {
//!     if camera.is_new_frame_available()? {
//!         camera.read_frame(&mut temperatures)?;
//!         break;
//!     }
//! }
//! println!("Sensor: {}℃", camera.sensor_temperature()?);
//! # Ok::<(), mlx90642::Error<I2cdev>>(())
//! ```
//!
//! # Two APIs
//! Everything on [`Mlx90642`] returns a [`Result`], with bus failures kept separate from the
//! values read. Simpler drivers for this sensor fold failures into the data
//! instead: a failed read comes back as `0xFFFF` (or `-1` when signed), which can't be told apart
//! from a real reading of that value. Code that depends on that behaviour can use
//! [`Mlx90642::sentinel`], which exposes the same operations with the sentinel encoding intact.

#![no_std]
#![allow(clippy::float_cmp)]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("Either the 'std' or 'libm' feature must be enabled.");

#[macro_use]
mod log;

pub mod address;
pub mod calculations;
pub mod driver;
#[doc(hidden)]
pub mod error;
pub mod format;
pub mod register;
pub mod sentinel;
pub mod sync;
mod util;

pub use address::{pixel_address, Address, DEFAULT_ADDRESS, HEIGHT, NUM_PIXELS, WIDTH};
#[doc(inline)]
pub use driver::Mlx90642;
#[doc(inline)]
pub use error::{Error, LibraryError};
pub use format::FrameBuffer;
pub use register::{ConfigurationRegister, RefreshRate, Register};
pub use sentinel::SentinelAccess;
pub use sync::FrameSync;
