// SPDX-License-Identifier: Apache-2.0
// Copyright © 2021 Will Ross
//! Detecting new frames from the progress counter.
//!
//! The MLX90642 has no "new data" flag like the MLX90640 and MLX90641 do. Instead there's a
//! counter ([`RamAddress::FrameProgress`][crate::address::RamAddress::FrameProgress]) that climbs
//! while the sensor writes a frame into RAM, then drops back to a low value when it starts the next
//! one. Seeing the counter go *down* between two reads is the only signal that a frame boundary
//! was crossed.
//!
//! If the counter wraps twice between two reads (slow polling at a fast refresh rate), only one new
//! frame is detected. Poll at least twice per frame period to avoid missing frames.

/// Tracks the progress counter between reads.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameSync {
    /// The progress counter value from the previous observation.
    last_progress: u16,
}

impl FrameSync {
    /// Start tracking with a baseline of zero.
    ///
    /// As no reading is ever less than zero, the first observation never reports a new frame.
    pub const fn new() -> Self {
        Self { last_progress: 0 }
    }

    /// Record a new progress reading, returning `true` if the counter wrapped around since the
    /// previous one.
    ///
    /// The reading is always stored, whatever the result.
    pub fn observe(&mut self, progress: u16) -> bool {
        let wrapped = progress < self.last_progress;
        if wrapped {
            trace!("progress wrapped from {} to {}", self.last_progress, progress);
        }
        self.last_progress = progress;
        wrapped
    }

    /// The most recently observed progress value.
    pub fn last_progress(&self) -> u16 {
        self.last_progress
    }

    /// Go back to the zero baseline.
    pub fn reset(&mut self) {
        self.last_progress = 0;
    }
}
