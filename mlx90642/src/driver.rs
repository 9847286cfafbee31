// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! The MLX90642 driver.
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;

use crate::address::{pixel_address, pixel_addresses, Address, RamAddress, DEFAULT_ADDRESS};
use crate::address::{HEIGHT, NUM_PIXELS, WIDTH};
use crate::calculations::{raw_to_pixel_temperature, raw_to_sensor_temperature};
use crate::error::{Error, LibraryError};
use crate::format::FrameBuffer;
use crate::register::{ConfigurationRegister, RefreshRate, Register};
use crate::sentinel::SentinelAccess;
use crate::sync::FrameSync;
use crate::util::{word_from_be, WORD_SIZE};

/// The two bytes that start every EEPROM write command.
pub(crate) const EEPROM_WRITE_HEADER: [u8; 2] = [0x3A, 0x2E];

/// How long the sensor needs after an EEPROM write before it is addressed again.
pub const EEPROM_WRITE_DELAY_MS: u16 = 10;

/// How long to wait after changing the configuration before reading it back.
pub const CONFIGURATION_SETTLE_MS: u16 = 20;

/// The value a word reads as when the read failed, or when the EEPROM word was never programmed.
pub(crate) const READ_FAILURE_SENTINEL: u16 = 0xFFFF;

/// A driver for the MLX90642 thermal camera.
///
/// The driver owns the I²C bus and a delay provider for as long as it exists. Use
/// [`release`][Mlx90642::release] to get them back.
///
/// There are no locks anywhere in here; every method takes `&mut self`, so sharing a driver
/// between threads (or between an interrupt and the main loop) means wrapping the whole thing in
/// whatever mutex your platform has.
#[derive(Clone, Debug)]
pub struct Mlx90642<I2C, D> {
    /// The I²C bus this camera is accessible on.
    bus: I2C,

    /// The I²C address this camera is accessible at.
    address: u8,

    /// Used for the pauses around EEPROM writes.
    delay: D,

    /// Progress counter state for new frame detection.
    pub(crate) frame_sync: FrameSync,

    /// Scratch space for rendering frames as text.
    frame_buffer: FrameBuffer,
}

impl<I2C, D> Mlx90642<I2C, D>
where
    I2C: i2c::WriteRead + i2c::Write,
    D: DelayMs<u16>,
{
    /// Create a driver for a camera at the default address (0x66).
    ///
    /// Nothing is sent over the bus until the first read.
    pub fn new(bus: I2C, delay: D) -> Self {
        Self::new_at_address(bus, delay, DEFAULT_ADDRESS)
    }

    /// Create a driver for a camera at the given I²C address.
    pub fn new_at_address(bus: I2C, delay: D, address: u8) -> Self {
        Self {
            bus,
            address,
            delay,
            frame_sync: FrameSync::new(),
            frame_buffer: FrameBuffer::new(),
        }
    }

    /// Consume the driver, giving back the bus and delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.bus, self.delay)
    }

    /// The I²C address this driver talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The height of the thermal image, in pixels.
    pub fn height(&self) -> usize {
        HEIGHT
    }

    /// The width of the thermal image, in pixels.
    pub fn width(&self) -> usize {
        WIDTH
    }

    /// Access the sensor with failures folded into the returned values.
    ///
    /// See [`SentinelAccess`] for what each operation returns when the bus fails.
    pub fn sentinel(&mut self) -> SentinelAccess<'_, I2C, D> {
        SentinelAccess::new(self)
    }

    /// Read the word at `address` as an unsigned value.
    ///
    /// This is a single transaction: the two address bytes are written, then (without a stop) two
    /// bytes are read back, most significant first.
    pub fn read_unsigned<A: Into<Address>>(&mut self, address: A) -> Result<u16, Error<I2C>> {
        read_word(&mut self.bus, self.address, address.into()).map_err(Error::I2cWriteReadError)
    }

    /// Read the word at `address` as a two's complement signed value.
    ///
    /// The bus transaction is exactly the same as [`read_unsigned`][Mlx90642::read_unsigned], the
    /// only difference is how the bits are interpreted. The sensor doesn't say which words are
    /// signed, so it is up to the caller to pick the right one.
    pub fn read_signed<A: Into<Address>>(&mut self, address: A) -> Result<i16, Error<I2C>> {
        Ok(self.read_unsigned(address)? as i16)
    }

    /// Write a word into the sensor's EEPROM.
    ///
    /// After a successful write the driver waits [`EEPROM_WRITE_DELAY_MS`] so the sensor can
    /// finish programming before anything else is sent. Nothing checks that the value actually
    /// took; read it back if that matters (like [`set_refresh_rate`][Mlx90642::set_refresh_rate]
    /// does).
    pub fn write_eeprom<A: Into<Address>>(
        &mut self,
        address: A,
        value: u16,
    ) -> Result<(), Error<I2C>> {
        let address = address.into();
        write_eeprom_word(&mut self.bus, self.address, address, value)
            .map_err(Error::I2cWriteError)?;
        debug!("EEPROM {} set to {=u16:#x}", address, value);
        self.delay.delay_ms(EEPROM_WRITE_DELAY_MS);
        Ok(())
    }

    /// The temperature of the sensor die in degrees Celsius.
    ///
    /// This is *not* the ambient temperature, but it is usually close enough to it once the sensor
    /// has warmed up.
    pub fn sensor_temperature(&mut self) -> Result<f32, Error<I2C>> {
        let raw = self.read_signed(RamAddress::SensorTemperature)?;
        Ok(raw_to_sensor_temperature(raw))
    }

    /// The temperature of a single pixel in degrees Celsius.
    ///
    /// Pixels are indexed in row-major order, from 0 through 767.
    pub fn read_pixel(&mut self, index: usize) -> Result<f32, Error<I2C>> {
        let address = pixel_address(index).ok_or(LibraryError::InvalidPixel(index))?;
        let raw = self.read_signed(address)?;
        Ok(raw_to_pixel_temperature(raw))
    }

    /// Read every pixel into `destination`, in degrees Celsius.
    ///
    /// `destination` must have room for at least [`NUM_PIXELS`] values, anything past that is left
    /// alone. Each pixel is a separate read, so at 400kHz a whole frame takes around 70ms.
    ///
    /// This does *not* check for a new frame first; if the sensor is partway through writing a
    /// frame the result mixes the old and new frames. Wait for
    /// [`is_new_frame_available`][Mlx90642::is_new_frame_available] to avoid that.
    ///
    /// If a read fails partway through, the error is returned straight away and the pixels up to
    /// that point have already been overwritten.
    pub fn read_frame(&mut self, destination: &mut [f32]) -> Result<(), Error<I2C>> {
        if destination.len() < NUM_PIXELS {
            return Err(LibraryError::BufferTooSmall {
                required: NUM_PIXELS,
                actual: destination.len(),
            }
            .into());
        }
        for (address, temperature) in pixel_addresses().zip(destination.iter_mut()) {
            let raw = self.read_signed(address)?;
            *temperature = raw_to_pixel_temperature(raw);
        }
        Ok(())
    }

    /// Read the frame progress counter without touching the frame detection state.
    pub fn frame_progress(&mut self) -> Result<u16, Error<I2C>> {
        self.read_unsigned(RamAddress::FrameProgress)
    }

    /// Check whether the sensor has started a new frame since the last check.
    ///
    /// This reads the progress counter and compares it to the previous reading. The counter only
    /// goes down when the sensor moves on to the next frame, so a lower reading than last time
    /// means a new frame. The very first call (and the first call after
    /// [`reset_frame_sync`][Mlx90642::reset_frame_sync]) always returns `false`.
    ///
    /// If the read fails, the error is returned and the previous reading is kept for the next
    /// comparison.
    pub fn is_new_frame_available(&mut self) -> Result<bool, Error<I2C>> {
        let progress = self.frame_progress()?;
        Ok(self.frame_sync.observe(progress))
    }

    /// Forget the previous progress reading.
    pub fn reset_frame_sync(&mut self) {
        self.frame_sync.reset();
    }

    /// Read the configuration word.
    ///
    /// A word of `0xFFFF` is rejected, as that is what a failed read looks like on a bus that
    /// doesn't report errors (and what unprogrammed EEPROM holds).
    pub fn configuration(&mut self) -> Result<ConfigurationRegister, Error<I2C>> {
        self.read_register()
    }

    /// The refresh rate stored in the configuration word.
    pub fn refresh_rate(&mut self) -> Result<RefreshRate, Error<I2C>> {
        Ok(self.configuration()?.refresh_rate()?)
    }

    /// Change the refresh rate stored in EEPROM.
    ///
    /// The other bits in the configuration word are kept as they are. Once written, the driver
    /// waits for the sensor to settle and reads the word back; this only returns `Ok` if the
    /// refresh rate read back matches. The write itself may well have happened even when an error
    /// is returned.
    pub fn set_refresh_rate(&mut self, refresh_rate: RefreshRate) -> Result<(), Error<I2C>> {
        self.update_register(|configuration: &mut ConfigurationRegister| {
            configuration.set_refresh_rate(refresh_rate)
        })
    }

    /// Change the refresh rate using the raw code from the configuration word.
    ///
    /// Only codes 2 through 5 are valid. Anything else is rejected before the bus is touched.
    pub fn set_refresh_rate_code(&mut self, code: u8) -> Result<(), Error<I2C>> {
        let refresh_rate = RefreshRate::from_code(code)?;
        self.set_refresh_rate(refresh_rate)
    }

    /// Render a frame as a line of text, reusing the driver's buffer.
    ///
    /// See [`FrameBuffer`] for the format.
    pub fn render_frame(&mut self, frame: &[f32]) -> &[u8] {
        self.frame_buffer.render(frame)
    }

    fn read_register<R: Register>(&mut self) -> Result<R, Error<I2C>> {
        let raw = self.read_unsigned(R::address())?;
        if raw == READ_FAILURE_SENTINEL {
            warn!("register {} read as {=u16:#x}", R::address(), raw);
            return Err(LibraryError::InvalidData("register read back as 0xFFFF").into());
        }
        Ok(R::from(raw))
    }

    /// Read-modify-write a register, then read it back to confirm the change.
    fn update_register<R, F>(&mut self, modify: F) -> Result<(), Error<I2C>>
    where
        R: Register,
        F: FnOnce(&mut R),
    {
        let current: R = self.read_register()?;
        let mut updated = current;
        modify(&mut updated);
        let intended = updated.merge_into(current.into());
        self.write_eeprom(R::address(), intended)?;
        self.delay.delay_ms(CONFIGURATION_SETTLE_MS);
        let written: u16 = self.read_register::<R>()?.into();
        let mask = R::write_mask();
        if written & mask == intended & mask {
            Ok(())
        } else {
            warn!(
                "register {} wrote {=u16:#x}, read back {=u16:#x}",
                R::address(),
                intended,
                written
            );
            Err(LibraryError::VerificationFailed {
                expected: intended,
                actual: written,
            }
            .into())
        }
    }
}

fn read_word<I2C: i2c::WriteRead>(
    bus: &mut I2C,
    i2c_address: u8,
    register_address: Address,
) -> Result<u16, I2C::Error> {
    let mut word_bytes = [0u8; WORD_SIZE];
    bus.write_read(i2c_address, &register_address.as_bytes(), &mut word_bytes)?;
    Ok(word_from_be(word_bytes))
}

fn write_eeprom_word<I2C: i2c::Write>(
    bus: &mut I2C,
    i2c_address: u8,
    register_address: Address,
    value: u16,
) -> Result<(), I2C::Error> {
    let address_bytes = register_address.as_bytes();
    let value_bytes = value.to_be_bytes();
    let command: [u8; 6] = [
        EEPROM_WRITE_HEADER[0],
        EEPROM_WRITE_HEADER[1],
        address_bytes[0],
        address_bytes[1],
        value_bytes[0],
        value_bytes[1],
    ];
    bus.write(i2c_address, &command)
}

#[cfg(test)]
mod test {
    extern crate std;

    use std::vec;

    use float_cmp::assert_approx_eq;
    use mlx90642_test_data::*;

    use crate::{Address, Error, LibraryError, Mlx90642, RefreshRate, NUM_PIXELS};

    // Specifically using a non-default address to make sure assumptions aren't being made about
    // the address.
    const TEST_ADDRESS: u8 = 0x42;

    fn create_mlx90642() -> (Mlx90642<MockSensorBus, MockDelay>, MockSensorBus, MockDelay) {
        let bus = example_mlx90642_at_address(TEST_ADDRESS);
        let delay = MockDelay::new();
        let camera = Mlx90642::new_at_address(bus.clone(), delay.clone(), TEST_ADDRESS);
        (camera, bus, delay)
    }

    #[test]
    fn default_address() {
        let bus = MockSensorBus::new(SENSOR_ADDRESS);
        let mut camera = Mlx90642::new(bus, MockDelay::new());
        assert_eq!(camera.address(), 0x66);
        assert!(camera.frame_progress().is_ok());
    }

    #[test]
    fn wrong_address() {
        let bus = example_mlx90642_at_address(0x10);
        let mut camera = Mlx90642::new(bus, MockDelay::new());
        assert_eq!(
            camera.sensor_temperature(),
            Err(Error::I2cWriteReadError(MockError::UnknownI2cAddress(0x66)))
        );
    }

    #[test]
    fn read_unsigned_single_transaction() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.set_word(0x1234, 0xBEEF);
        bus.clear_operations();
        assert_eq!(camera.read_unsigned(Address::new(0x1234)), Ok(0xBEEF));
        assert_eq!(
            *bus.operations(),
            vec![I2cOperation::Read {
                address: 0x1234,
                length: 2
            }]
        );
    }

    #[test]
    fn read_signed() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.set_word(SENSOR_TEMPERATURE_ADDRESS, 0xFFCE);
        assert_eq!(camera.read_signed(SENSOR_TEMPERATURE_ADDRESS), Ok(-50));
        assert_eq!(camera.read_unsigned(SENSOR_TEMPERATURE_ADDRESS), Ok(0xFFCE));
        bus.set_word(SENSOR_TEMPERATURE_ADDRESS, 0x7FFF);
        assert_eq!(camera.read_signed(SENSOR_TEMPERATURE_ADDRESS), Ok(i16::MAX));
    }

    #[test]
    fn read_failure() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.fail_reads_at(PROGRESS_ADDRESS);
        let result = camera.read_unsigned(PROGRESS_ADDRESS);
        assert_eq!(
            result,
            Err(Error::I2cWriteReadError(MockError::Nack(PROGRESS_ADDRESS)))
        );
        assert!(result.unwrap_err().is_transport());
    }

    #[test]
    fn read_short_read() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.queue_responses(SENSOR_TEMPERATURE_ADDRESS, [Response::ShortRead]);
        assert_eq!(
            camera.read_unsigned(SENSOR_TEMPERATURE_ADDRESS),
            Err(Error::I2cWriteReadError(MockError::ShortRead(
                SENSOR_TEMPERATURE_ADDRESS
            )))
        );
        bus.queue_responses(SENSOR_TEMPERATURE_ADDRESS, [Response::ShortRead]);
        assert!(camera.sensor_temperature().unwrap_err().is_transport());
        // Only the scripted reads fail
        assert_eq!(
            camera.read_signed(SENSOR_TEMPERATURE_ADDRESS),
            Ok(EXAMPLE_SENSOR_TEMPERATURE)
        );
    }

    #[test]
    fn write_eeprom() {
        let (mut camera, bus, delay) = create_mlx90642();
        bus.clear_operations();
        camera.write_eeprom(Address::new(0x11F2), 0x1234).unwrap();
        assert_eq!(
            *bus.operations(),
            vec![I2cOperation::EepromWrite {
                address: 0x11F2,
                value: 0x1234
            }]
        );
        assert_eq!(bus.word(0x11F2), Some(0x1234));
        assert_eq!(*delay.delays(), vec![10]);
    }

    #[test]
    fn write_eeprom_rejected_skips_delay() {
        let (mut camera, bus, delay) = create_mlx90642();
        bus.reject_writes(true);
        assert_eq!(
            camera.write_eeprom(Address::new(0x11F2), 0x1234),
            Err(Error::I2cWriteError(MockError::WriteRejected(0x11F2)))
        );
        assert!(delay.delays().is_empty());
    }

    #[test]
    fn sensor_temperature() {
        let (mut camera, _, _) = create_mlx90642();
        assert_approx_eq!(
            f32,
            camera.sensor_temperature().unwrap(),
            33.57,
            epsilon = 0.0001
        );
    }

    #[test]
    fn read_pixel() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.set_pixel(767, -262);
        assert_eq!(camera.read_pixel(0), Ok(5.0));
        assert_eq!(camera.read_pixel(767), Ok(-5.24));
        bus.clear_operations();
        assert_eq!(
            camera.read_pixel(768),
            Err(Error::LibraryError(LibraryError::InvalidPixel(768)))
        );
        assert!(bus.operations().is_empty());
    }

    #[test]
    fn read_frame() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.clear_operations();
        let mut temperatures = [f32::NAN; NUM_PIXELS];
        camera.read_frame(&mut temperatures).unwrap();
        for temperature in temperatures.iter() {
            assert_eq!(*temperature, 5.0);
        }
        let ops = bus.operations();
        assert_eq!(ops.len(), NUM_PIXELS);
        assert_eq!(
            ops[0],
            I2cOperation::Read {
                address: 0x342C,
                length: 2
            }
        );
        assert_eq!(
            ops[NUM_PIXELS - 1],
            I2cOperation::Read {
                address: 0x3A2A,
                length: 2
            }
        );
    }

    #[test]
    fn read_frame_larger_destination() {
        let (mut camera, _, _) = create_mlx90642();
        let mut temperatures = [f32::NAN; NUM_PIXELS + 4];
        camera.read_frame(&mut temperatures).unwrap();
        assert_eq!(temperatures[NUM_PIXELS - 1], 5.0);
        assert!(temperatures[NUM_PIXELS..].iter().all(|t| t.is_nan()));
    }

    #[test]
    fn read_frame_too_small() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.clear_operations();
        let mut temperatures = [0f32; 10];
        assert_eq!(
            camera.read_frame(&mut temperatures),
            Err(Error::LibraryError(LibraryError::BufferTooSmall {
                required: NUM_PIXELS,
                actual: 10
            }))
        );
        assert!(bus.operations().is_empty());
    }

    #[test]
    fn read_frame_stops_on_failure() {
        let (mut camera, bus, _) = create_mlx90642();
        // Pixel 3
        bus.fail_reads_at(0x3432);
        bus.clear_operations();
        let mut temperatures = [f32::NAN; NUM_PIXELS];
        assert_eq!(
            camera.read_frame(&mut temperatures),
            Err(Error::I2cWriteReadError(MockError::Nack(0x3432)))
        );
        assert_eq!(bus.operations().len(), 4);
        assert_eq!(temperatures[2], 5.0);
        assert!(temperatures[3].is_nan());
    }

    #[test]
    fn new_frame_detection() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.queue_words(PROGRESS_ADDRESS, [10, 50, 90, 5, 40]);
        let mut results = vec![];
        for _ in 0..5 {
            results.push(camera.is_new_frame_available().unwrap());
        }
        assert_eq!(results, vec![false, false, false, true, false]);
    }

    #[test]
    fn new_frame_read_failure_keeps_baseline() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.queue_responses(
            PROGRESS_ADDRESS,
            [Response::Word(90), Response::Nack, Response::Word(5)],
        );
        assert_eq!(camera.is_new_frame_available(), Ok(false));
        assert!(camera.is_new_frame_available().is_err());
        // Still comparing against 90
        assert_eq!(camera.is_new_frame_available(), Ok(true));
    }

    #[test]
    fn frame_progress_does_not_update_sync() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.queue_words(PROGRESS_ADDRESS, [90, 5, 4]);
        assert_eq!(camera.frame_progress(), Ok(90));
        assert_eq!(camera.is_new_frame_available(), Ok(false));
        assert_eq!(camera.is_new_frame_available(), Ok(true));
    }

    #[test]
    fn reset_frame_sync() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.queue_words(PROGRESS_ADDRESS, [90, 5]);
        assert_eq!(camera.is_new_frame_available(), Ok(false));
        camera.reset_frame_sync();
        assert_eq!(camera.is_new_frame_available(), Ok(false));
    }

    #[test]
    fn refresh_rate() {
        let (mut camera, bus, _) = create_mlx90642();
        assert_eq!(camera.refresh_rate(), Ok(RefreshRate::Eight));
        bus.set_word(CONFIGURATION_ADDRESS, 0x0003);
        assert_eq!(camera.refresh_rate(), Ok(RefreshRate::Four));
        bus.set_word(CONFIGURATION_ADDRESS, 0x0007);
        assert!(matches!(
            camera.refresh_rate(),
            Err(Error::LibraryError(LibraryError::InvalidData(_)))
        ));
    }

    #[test]
    fn configuration_sentinel_rejected() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.set_word(CONFIGURATION_ADDRESS, 0xFFFF);
        assert!(matches!(
            camera.configuration(),
            Err(Error::LibraryError(LibraryError::InvalidData(_)))
        ));
    }

    #[test]
    fn set_refresh_rate_preserves_other_bits() {
        let (mut camera, bus, delay) = create_mlx90642();
        bus.set_word(CONFIGURATION_ADDRESS, 0xAB05);
        bus.clear_operations();
        camera.set_refresh_rate(RefreshRate::Eight).unwrap();
        assert_eq!(bus.word(CONFIGURATION_ADDRESS), Some(0xAB04));
        assert_eq!(
            *bus.operations(),
            vec![
                I2cOperation::Read {
                    address: CONFIGURATION_ADDRESS,
                    length: 2
                },
                I2cOperation::EepromWrite {
                    address: CONFIGURATION_ADDRESS,
                    value: 0xAB04
                },
                I2cOperation::Read {
                    address: CONFIGURATION_ADDRESS,
                    length: 2
                },
            ]
        );
        assert_eq!(*delay.delays(), vec![10, 20]);
        assert_eq!(delay.total_ms(), 30);
    }

    #[test]
    fn set_refresh_rate_code() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.set_word(CONFIGURATION_ADDRESS, 0x0005);
        camera.set_refresh_rate_code(2).unwrap();
        assert_eq!(bus.word(CONFIGURATION_ADDRESS), Some(0x0002));
        assert_eq!(camera.refresh_rate(), Ok(RefreshRate::Two));
    }

    #[test]
    fn set_refresh_rate_invalid_code() {
        let (mut camera, bus, delay) = create_mlx90642();
        bus.clear_operations();
        for code in [0u8, 1, 6, 7, 0xFF] {
            assert_eq!(
                camera.set_refresh_rate_code(code),
                Err(Error::LibraryError(LibraryError::InvalidRefreshRate(code)))
            );
        }
        assert!(bus.operations().is_empty());
        assert!(delay.delays().is_empty());
    }

    #[test]
    fn set_refresh_rate_initial_read_failure() {
        let (mut camera, bus, delay) = create_mlx90642();
        bus.queue_responses(CONFIGURATION_ADDRESS, [Response::Nack]);
        bus.clear_operations();
        assert_eq!(
            camera.set_refresh_rate(RefreshRate::Four),
            Err(Error::I2cWriteReadError(MockError::Nack(
                CONFIGURATION_ADDRESS
            )))
        );
        assert_eq!(bus.operations().len(), 1);
        assert!(delay.delays().is_empty());
    }

    #[test]
    fn set_refresh_rate_initial_sentinel() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.queue_words(CONFIGURATION_ADDRESS, [0xFFFF]);
        bus.clear_operations();
        assert!(matches!(
            camera.set_refresh_rate(RefreshRate::Four),
            Err(Error::LibraryError(LibraryError::InvalidData(_)))
        ));
        // Nothing was written
        assert_eq!(bus.operations().len(), 1);
        assert_eq!(bus.word(CONFIGURATION_ADDRESS), Some(EXAMPLE_CONFIGURATION));
    }

    #[test]
    fn set_refresh_rate_write_rejected() {
        let (mut camera, bus, delay) = create_mlx90642();
        bus.reject_writes(true);
        bus.clear_operations();
        assert_eq!(
            camera.set_refresh_rate(RefreshRate::Four),
            Err(Error::I2cWriteError(MockError::WriteRejected(
                CONFIGURATION_ADDRESS
            )))
        );
        // No verification read
        assert_eq!(bus.operations().len(), 2);
        assert!(delay.delays().is_empty());
    }

    #[test]
    fn set_refresh_rate_verify_read_failure() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.queue_responses(
            CONFIGURATION_ADDRESS,
            [Response::Word(0x0005), Response::Nack],
        );
        let result = camera.set_refresh_rate(RefreshRate::Eight);
        assert_eq!(
            result,
            Err(Error::I2cWriteReadError(MockError::Nack(
                CONFIGURATION_ADDRESS
            )))
        );
        // The write itself went through
        assert_eq!(bus.word(CONFIGURATION_ADDRESS), Some(0x0004));
    }

    #[test]
    fn set_refresh_rate_verify_sentinel() {
        let (mut camera, bus, _) = create_mlx90642();
        bus.queue_words(CONFIGURATION_ADDRESS, [0x0005, 0xFFFF]);
        assert!(matches!(
            camera.set_refresh_rate(RefreshRate::Eight),
            Err(Error::LibraryError(LibraryError::InvalidData(_)))
        ));
    }

    #[test]
    fn set_refresh_rate_verify_mismatch() {
        let (mut camera, bus, _) = create_mlx90642();
        // The sensor ignores the write
        bus.queue_words(CONFIGURATION_ADDRESS, [0x0005, 0x0005]);
        assert_eq!(
            camera.set_refresh_rate(RefreshRate::Eight),
            Err(Error::LibraryError(LibraryError::VerificationFailed {
                expected: 0x0004,
                actual: 0x0005
            }))
        );
    }

    #[test]
    fn set_refresh_rate_ignores_other_bits_on_verify() {
        let (mut camera, bus, _) = create_mlx90642();
        // Only the refresh rate bits are compared
        bus.queue_words(CONFIGURATION_ADDRESS, [0x0005, 0xF004]);
        assert_eq!(camera.set_refresh_rate(RefreshRate::Eight), Ok(()));
    }

    #[test]
    fn render_frame() {
        let (mut camera, _, _) = create_mlx90642();
        let mut temperatures = [0f32; NUM_PIXELS];
        camera.read_frame(&mut temperatures).unwrap();
        let line = camera.render_frame(&temperatures);
        assert!(line.starts_with(b",5.0,5.0,"));
        assert_eq!(line.len(), NUM_PIXELS * 4 + 1);
        assert_eq!(line.last(), Some(&b'\n'));
    }

    #[test]
    fn release() {
        let (camera, _, delay) = create_mlx90642();
        let (bus, mut released_delay) = camera.release();
        embedded_hal::blocking::delay::DelayMs::<u16>::delay_ms(&mut released_delay, 5);
        assert_eq!(*delay.delays(), vec![5]);
        bus.set_word(0x1234, 1);
        assert_eq!(bus.word(0x1234), Some(1));
    }
}
