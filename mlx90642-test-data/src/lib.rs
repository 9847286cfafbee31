// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Mock hardware for testing `mlx90642` without a sensor attached.
//!
//! [`MockSensorBus`] models the MLX90642 as a word-addressed memory reachable over I²C. Reads are
//! combined write-read transactions carrying a two byte address, writes are the six byte EEPROM
//! write command. Responses for individual addresses can be scripted ahead of time, which is how
//! progress counter sequences and failed reads are simulated.
//!
//! The state is shared between clones, so a test can move one clone into a driver and keep the
//! other around to inspect what happened on the bus.
use std::cell::{Ref, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c;

/// The default I²C address of the MLX90642.
pub const SENSOR_ADDRESS: u8 = 0x66;

/// The address of the first pixel in RAM.
pub const FRAME_BASE_ADDRESS: u16 = 0x342C;

/// The number of pixels in a frame.
pub const NUM_PIXELS: usize = 768;

/// The frame progress counter.
pub const PROGRESS_ADDRESS: u16 = 0x3C10;

/// The internal sensor (die) temperature.
pub const SENSOR_TEMPERATURE_ADDRESS: u16 = 0x3A2C;

/// The EEPROM word holding the refresh rate in its lowest three bits.
pub const CONFIGURATION_ADDRESS: u16 = 0x11F0;

/// The two bytes preceding every EEPROM write.
pub const EEPROM_WRITE_HEADER: [u8; 2] = [0x3A, 0x2E];

/// Raw value for a sensor temperature of 33.57℃, the worked example in the datasheet.
pub const EXAMPLE_SENSOR_TEMPERATURE: i16 = 3357;

/// Raw value for a pixel temperature of 5.0℃.
pub const EXAMPLE_PIXEL: i16 = 250;

/// Factory default configuration word, 8Hz refresh rate.
pub const EXAMPLE_CONFIGURATION: u16 = 0x0004;

/// Errors returned by the mock bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MockError {
    /// An unknown I2C address was given.
    UnknownI2cAddress(u8),

    /// The sensor did not acknowledge a transaction for the given address.
    Nack(u16),

    /// Fewer bytes were returned than were requested.
    ShortRead(u16),

    /// An EEPROM write was refused.
    WriteRejected(u16),

    /// The requested operation is not something the sensor understands.
    ///
    /// This covers:
    /// * write-read transactions with something other than a two byte address;
    /// * zero length or odd length reads (each word is two bytes);
    /// * odd (non word aligned) addresses;
    /// * plain writes that are not a complete EEPROM write command.
    IllegalOperation,
}

/// A single transaction observed by the mock bus.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum I2cOperation {
    /// A write-read starting at `address`, reading `length` bytes.
    Read { address: u16, length: usize },

    /// A complete EEPROM write command.
    EepromWrite { address: u16, value: u16 },
}

/// A scripted response for a word read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Read back this value.
    Word(u16),

    /// Fail with [`MockError::Nack`].
    Nack,

    /// Fail with [`MockError::ShortRead`], as if fewer than two bytes came back.
    ShortRead,
}

#[derive(Clone, Debug, Default)]
struct MockState {
    memory: HashMap<u16, u16>,
    scripted: HashMap<u16, VecDeque<Response>>,
    failing_reads: HashSet<u16>,
    reject_writes: bool,
    operations: Vec<I2cOperation>,
}

/// A mock MLX90642 on an I²C bus. Clones share the same state.
#[derive(Clone, Debug)]
pub struct MockSensorBus {
    i2c_address: u8,
    state: Rc<RefCell<MockState>>,
}

impl MockSensorBus {
    /// An empty sensor at the given address. Every word reads as zero until set.
    pub fn new(i2c_address: u8) -> Self {
        Self {
            i2c_address,
            state: Rc::new(RefCell::new(MockState::default())),
        }
    }

    /// Set the stored value of a word.
    pub fn set_word(&self, address: u16, value: u16) {
        self.state.borrow_mut().memory.insert(address, value);
    }

    /// The stored value of a word, if it has been set or written.
    pub fn word(&self, address: u16) -> Option<u16> {
        self.state.borrow().memory.get(&address).copied()
    }

    /// Set a single raw pixel value.
    pub fn set_pixel(&self, index: usize, raw: i16) {
        let address = FRAME_BASE_ADDRESS + (index as u16) * 2;
        self.set_word(address, raw as u16);
    }

    /// Set every pixel to the same raw value.
    pub fn fill_frame(&self, raw: i16) {
        for index in 0..NUM_PIXELS {
            self.set_pixel(index, raw);
        }
    }

    /// Queue responses for the given address.
    ///
    /// Each read of the address consumes one response. Once the queue is empty reads fall back to
    /// the stored memory.
    pub fn queue_responses<I>(&self, address: u16, responses: I)
    where
        I: IntoIterator<Item = Response>,
    {
        self.state
            .borrow_mut()
            .scripted
            .entry(address)
            .or_default()
            .extend(responses);
    }

    /// Queue plain word values for the given address.
    pub fn queue_words<I>(&self, address: u16, words: I)
    where
        I: IntoIterator<Item = u16>,
    {
        self.queue_responses(address, words.into_iter().map(Response::Word));
    }

    /// Make every read of the given address fail with a NACK.
    pub fn fail_reads_at(&self, address: u16) {
        self.state.borrow_mut().failing_reads.insert(address);
    }

    /// Refuse (or accept again) EEPROM writes.
    pub fn reject_writes(&self, reject: bool) {
        self.state.borrow_mut().reject_writes = reject;
    }

    /// Every transaction seen so far, oldest first.
    pub fn operations(&self) -> Ref<'_, Vec<I2cOperation>> {
        Ref::map(self.state.borrow(), |state| &state.operations)
    }

    /// Forget every transaction seen so far.
    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear()
    }

    fn add_operation(&self, operation: I2cOperation) {
        self.state.borrow_mut().operations.push(operation);
    }

    fn next_response(&self, address: u16) -> Response {
        let mut state = self.state.borrow_mut();
        if state.failing_reads.contains(&address) {
            return Response::Nack;
        }
        let scripted = state
            .scripted
            .get_mut(&address)
            .and_then(|queue| queue.pop_front());
        match scripted {
            Some(response) => response,
            None => Response::Word(state.memory.get(&address).copied().unwrap_or(0)),
        }
    }
}

impl i2c::WriteRead for MockSensorBus {
    type Error = MockError;

    fn write_read(
        &mut self,
        i2c_address: u8,
        write_buffer: &[u8],
        out_buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        if i2c_address != self.i2c_address {
            return Err(MockError::UnknownI2cAddress(i2c_address));
        }
        if write_buffer.len() != 2 || out_buffer.is_empty() || out_buffer.len() % 2 != 0 {
            return Err(MockError::IllegalOperation);
        }
        let start = u16::from_be_bytes([write_buffer[0], write_buffer[1]]);
        if start % 2 != 0 {
            return Err(MockError::IllegalOperation);
        }
        self.add_operation(I2cOperation::Read {
            address: start,
            length: out_buffer.len(),
        });
        for (offset, chunk) in out_buffer.chunks_exact_mut(2).enumerate() {
            let address = start.wrapping_add(offset as u16 * 2);
            match self.next_response(address) {
                Response::Word(value) => chunk.copy_from_slice(&value.to_be_bytes()),
                Response::Nack => return Err(MockError::Nack(address)),
                Response::ShortRead => return Err(MockError::ShortRead(address)),
            }
        }
        Ok(())
    }
}

impl i2c::Write for MockSensorBus {
    type Error = MockError;

    fn write(&mut self, i2c_address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        if i2c_address != self.i2c_address {
            return Err(MockError::UnknownI2cAddress(i2c_address));
        }
        // The only plain write the sensor takes is the EEPROM write command.
        if bytes.len() != 6 || bytes[..2] != EEPROM_WRITE_HEADER {
            return Err(MockError::IllegalOperation);
        }
        let address = u16::from_be_bytes([bytes[2], bytes[3]]);
        let value = u16::from_be_bytes([bytes[4], bytes[5]]);
        self.add_operation(I2cOperation::EepromWrite { address, value });
        if self.state.borrow().reject_writes {
            return Err(MockError::WriteRejected(address));
        }
        self.set_word(address, value);
        Ok(())
    }
}

/// A delay that returns immediately, recording how long it was asked to wait.
#[derive(Clone, Debug, Default)]
pub struct MockDelay {
    delays: Rc<RefCell<Vec<u32>>>,
}

impl MockDelay {
    /// A delay with nothing recorded yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Each requested delay in milliseconds, oldest first.
    pub fn delays(&self) -> Ref<'_, Vec<u32>> {
        self.delays.borrow()
    }

    /// The sum of every requested delay, in milliseconds.
    pub fn total_ms(&self) -> u32 {
        self.delays.borrow().iter().sum()
    }
}

impl DelayMs<u8> for MockDelay {
    fn delay_ms(&mut self, ms: u8) {
        self.delays.borrow_mut().push(u32::from(ms));
    }
}

impl DelayMs<u16> for MockDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.delays.borrow_mut().push(u32::from(ms));
    }
}

impl DelayMs<u32> for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.delays.borrow_mut().push(ms);
    }
}

/// A sensor at the given address loaded with the example values.
///
/// Every pixel reads as [`EXAMPLE_PIXEL`], the sensor temperature is
/// [`EXAMPLE_SENSOR_TEMPERATURE`] and the configuration word is [`EXAMPLE_CONFIGURATION`].
pub fn example_mlx90642_at_address(i2c_address: u8) -> MockSensorBus {
    let bus = MockSensorBus::new(i2c_address);
    bus.fill_frame(EXAMPLE_PIXEL);
    bus.set_word(SENSOR_TEMPERATURE_ADDRESS, EXAMPLE_SENSOR_TEMPERATURE as u16);
    bus.set_word(CONFIGURATION_ADDRESS, EXAMPLE_CONFIGURATION);
    bus
}

#[cfg(test)]
mod test {
    use embedded_hal::blocking::i2c::{Write, WriteRead};

    use super::*;

    #[test]
    fn scripted_then_memory() {
        let mut bus = MockSensorBus::new(SENSOR_ADDRESS);
        bus.set_word(PROGRESS_ADDRESS, 7);
        bus.queue_words(PROGRESS_ADDRESS, [1, 2]);
        let mut buf = [0u8; 2];
        let address = PROGRESS_ADDRESS.to_be_bytes();
        for expected in [1u16, 2, 7, 7] {
            bus.write_read(SENSOR_ADDRESS, &address, &mut buf).unwrap();
            assert_eq!(u16::from_be_bytes(buf), expected);
        }
        assert_eq!(bus.operations().len(), 4);
    }

    #[test]
    fn eeprom_write_stored() {
        let mut bus = MockSensorBus::new(SENSOR_ADDRESS);
        bus.write(SENSOR_ADDRESS, &[0x3A, 0x2E, 0x11, 0xF0, 0x12, 0x34])
            .unwrap();
        assert_eq!(bus.word(CONFIGURATION_ADDRESS), Some(0x1234));
        assert!(bus.write(SENSOR_ADDRESS, &[0x11, 0xF0, 0x12, 0x34]).is_err());
    }

    #[test]
    fn wrong_i2c_address() {
        let mut bus = MockSensorBus::new(SENSOR_ADDRESS);
        let mut buf = [0u8; 2];
        assert_eq!(
            bus.write_read(0x33, &[0x34, 0x2C], &mut buf),
            Err(MockError::UnknownI2cAddress(0x33))
        );
    }
}
