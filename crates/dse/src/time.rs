//! Tick counter and tempo conversion

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

pub const MICROSECONDS_PER_MINUTE: u32 = 60_000_000;

// MIDI tempo meta events store a 24 bit value
pub const MAX_MICROSECONDS_PER_QUARTER_NOTE: u32 = 0x00ff_ffff;

// TickCounter can only be incremented
#[derive(Copy, Clone, Eq, PartialEq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct TickCounter {
    value: u32,
}

impl TickCounter {
    pub const fn new(value: u32) -> TickCounter {
        Self { value }
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

impl std::ops::Add for TickCounter {
    type Output = Self;

    fn add(self, b: Self) -> Self {
        TickCounter {
            value: self.value.saturating_add(b.value),
        }
    }
}

impl std::ops::AddAssign for TickCounter {
    fn add_assign(&mut self, b: Self) {
        self.value = self.value.saturating_add(b.value);
    }
}

impl std::fmt::Display for TickCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}t", self.value)
    }
}

/// Converts a DSE tempo (in beats per minute) to a MIDI tempo.
///
/// Returns `None` if `bpm` is 0.
pub fn bpm_to_microseconds_per_quarter_note(bpm: u8) -> Option<u32> {
    match bpm {
        0 => None,
        bpm => Some((MICROSECONDS_PER_MINUTE / u32::from(bpm)).min(MAX_MICROSECONDS_PER_QUARTER_NOTE)),
    }
}
