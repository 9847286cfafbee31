// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Rendering a frame as a line of text.
//!
//! Each temperature is written as a comma followed by the value with one decimal place, and the
//! line ends with a newline:
//! ```text
//! ,20.0,-5.3,100.1
//! ```
//! This format is easy to stream over a serial port and to split apart on the receiving side. It
//! has nothing to do with the sensor protocol itself.
#[cfg(feature = "std")]
extern crate std;

use core::fmt::{self, Write};

use arrayvec::{ArrayString, ArrayVec};
// Rounding is not implemented in core, so we use num_traits (backed by libm) when std is not
// available.
#[allow(unused_imports)]
use num_traits::Float;

/// The default capacity of a [`FrameBuffer`], in bytes.
pub const FRAME_BUFFER_SIZE: usize = 6000;

/// Rendering stops once a value would take the buffer closer than this many bytes to full.
pub const SAFETY_MARGIN: usize = 10;

// Large enough for any finite f32 with one decimal place, a sign and the leading comma.
const FIELD_CAPACITY: usize = 48;

// Beyond this an i64 can't hold the value in tenths exactly.
const MAX_EXACT_TENTHS: f64 = 1e15;

/// A fixed capacity buffer for rendering frames as text.
///
/// The buffer is reused for every frame, and never grows. If a frame has more values than fit,
/// the line is cut short (after the last value that fits) but still ends with a newline.
#[derive(Clone, Debug)]
pub struct FrameBuffer<const N: usize = FRAME_BUFFER_SIZE> {
    buffer: ArrayVec<u8, N>,

    /// How many values made it into the last rendered line.
    rendered: usize,
}

impl<const N: usize> FrameBuffer<N> {
    /// An empty buffer, nothing rendered yet.
    pub fn new() -> Self {
        Self {
            buffer: ArrayVec::new(),
            rendered: 0,
        }
    }

    /// Render a frame, returning the bytes of the line.
    pub fn render(&mut self, frame: &[f32]) -> &[u8] {
        self.buffer.clear();
        self.rendered = 0;
        let limit = N.saturating_sub(SAFETY_MARGIN);
        for value in frame.iter() {
            let mut field = ArrayString::<FIELD_CAPACITY>::new();
            if write_field(&mut field, *value).is_err() {
                break;
            }
            if self.buffer.len() + field.len() > limit {
                break;
            }
            if self
                .buffer
                .try_extend_from_slice(field.as_bytes())
                .is_err()
            {
                break;
            }
            self.rendered += 1;
        }
        if self.rendered < frame.len() {
            debug!("frame truncated after {} values", self.rendered);
        }
        // There is always room, unless N is smaller than the safety margin.
        let _ = self.buffer.try_push(b'\n');
        &self.buffer
    }

    /// Render a frame, then write the line out.
    #[cfg(feature = "std")]
    pub fn write_frame<W: std::io::Write>(
        &mut self,
        frame: &[f32],
        mut writer: W,
    ) -> std::io::Result<()> {
        let line = self.render(frame);
        writer.write_all(line)
    }

    /// The most recently rendered line.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// The number of values in the most recently rendered line.
    pub fn rendered(&self) -> usize {
        self.rendered
    }

    /// The total capacity in bytes, including the safety margin.
    pub fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for FrameBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `,` and the value rounded to one decimal place, rounding halves away from zero.
fn write_field<W: Write>(out: &mut W, value: f32) -> fmt::Result {
    out.write_char(',')?;
    // Widening first keeps the multiplication exact.
    let tenths = (f64::from(value) * 10.0).round();
    if !tenths.is_finite() || tenths.abs() >= MAX_EXACT_TENTHS {
        return write!(out, "{:.1}", value);
    }
    let magnitude = (tenths as i64).unsigned_abs();
    // Negative values that round to zero keep their sign, same as printf.
    let sign = if value.is_sign_negative() { "-" } else { "" };
    write!(out, "{}{}.{}", sign, magnitude / 10, magnitude % 10)
}
