//! Per-track conversion state

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::conversion_info::PresetOverride;
use crate::time::TickCounter;

use std::collections::VecDeque;

/// The highest octave a DSE track can play.
pub const MAX_OCTAVE: u8 = 9;

/// Bank/program messages required to change the preset of a channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PresetChange {
    pub bank: Option<u8>,
    pub program: Option<u8>,
}

impl PresetChange {
    pub fn is_empty(&self) -> bool {
        self.bank.is_none() && self.program.is_none()
    }
}

/// Tracks a per-note preset override that is active on a channel.
///
/// Messages are only emitted when the channel's bank or program changes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PresetLatch {
    #[default]
    Inactive,
    Overridden {
        bank: u8,
        program: u8,
    },
}

impl PresetLatch {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Overridden { .. })
    }

    /// Applies a note's preset override.
    ///
    /// `base_bank` and `base_program` are the track's active (non-overridden) preset.
    pub fn apply(&mut self, o: PresetOverride, base_bank: u8, base_program: u8) -> PresetChange {
        let (latched_bank, latched_program) = match *self {
            Self::Inactive => (None, None),
            Self::Overridden { bank, program } => (Some(bank), Some(program)),
        };

        match o {
            PresetOverride::Restore => match *self {
                Self::Inactive => PresetChange::default(),
                Self::Overridden { .. } => {
                    *self = Self::Inactive;
                    PresetChange {
                        bank: Some(base_bank),
                        program: Some(base_program),
                    }
                }
            },
            PresetOverride::Override { bank, program } => {
                // A missing half of the override restores that half to the base value
                fn changed(new: Option<u8>, latched: Option<u8>, base: u8) -> Option<u8> {
                    match (new, latched) {
                        (Some(v), l) if l != Some(v) => Some(v),
                        (None, Some(l)) if l != base => Some(base),
                        _ => None,
                    }
                }

                let change = PresetChange {
                    bank: changed(bank, latched_bank, base_bank),
                    program: changed(program, latched_program, base_program),
                };

                *self = Self::Overridden {
                    bank: bank.unwrap_or(base_bank),
                    program: program.unwrap_or(base_program),
                };

                change
            }
        }
    }
}

/// A note-on/note-off pair that has been emitted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HeldNote {
    pub note: u8,
    pub note_on: TickCounter,
    pub note_off: TickCounter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackState {
    pub ticks: TickCounter,
    // Index of the event being processed (used in error messages and logs)
    pub event_index: usize,

    // Duration of the last pause event, including fixed duration pauses
    pub last_pause: u32,
    pub last_hold_duration: u32,

    pub octave: u8,
    // Octave set by the last set-octave event, used by the octave reset flag
    pub last_set_octave: u8,

    // MIDI preset
    pub program: u8,
    pub bank: u8,
    // The un-remapped DSE preset
    pub dse_program: u8,

    // Number of octaves to transpose the notes
    pub transpose: i8,
    pub max_polyphony: Option<u8>,
    pub priority: u8,

    // Set when the preset was not found in the conversion table
    pub invalid_bank: bool,

    pub preset_latch: PresetLatch,

    // Index of the event after the loop point, 0 if there is no loop point
    pub loop_point_event_index: usize,

    pub held_notes: VecDeque<HeldNote>,
}

impl Default for TrackState {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackState {
    pub fn new() -> Self {
        Self {
            ticks: TickCounter::new(0),
            event_index: 0,
            last_pause: 0,
            last_hold_duration: 0,
            octave: 0,
            last_set_octave: 0,
            program: 0,
            bank: 0,
            dse_program: 0,
            transpose: 0,
            max_polyphony: None,
            priority: 0,
            invalid_bank: false,
            preset_latch: PresetLatch::Inactive,
            loop_point_event_index: 0,
            held_notes: VecDeque::new(),
        }
    }

    pub fn advance(&mut self, ticks: u32) {
        self.ticks += TickCounter::new(ticks);
    }

    /// Records a note and returns the number of notes that are still held.
    pub fn push_held_note(&mut self, note: HeldNote) -> usize {
        let now = self.ticks;
        self.held_notes.retain(|n| n.note_off > now);
        self.held_notes.push_back(note);

        self.held_notes.len()
    }

    /// Resets the state to `snapshot`, keeping the tick counter.
    pub fn restore(&mut self, snapshot: &TrackState) {
        let ticks = self.ticks;
        *self = snapshot.clone();
        self.ticks = ticks;
    }
}

/// A track's live state and the snapshot taken at its loop point.
#[derive(Debug, Clone, Default)]
pub struct TrackPlayback {
    pub state: TrackState,
    loop_snapshot: Option<TrackState>,
}

impl TrackPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_loop_point(&self) -> bool {
        self.loop_snapshot.is_some()
    }

    pub fn loop_snapshot(&self) -> Option<&TrackState> {
        self.loop_snapshot.as_ref()
    }

    pub fn take_loop_snapshot(&mut self) {
        self.loop_snapshot = Some(self.state.clone());
    }

    /// Resets the live state for another loop and returns the index of the first event to replay.
    ///
    /// Tracks without a loop point restart from the first event with a fresh state.
    pub fn restart_loop(&mut self) -> usize {
        match &self.loop_snapshot {
            Some(s) => self.state.restore(s),
            None => self.state.restore(&TrackState::new()),
        }
        self.state.loop_point_event_index
    }
}
