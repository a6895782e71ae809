//! A single location for all of the errors in the converter

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeserializeError {
    #[error("Unable to open {0}: {1}")]
    OpenError(String, io::Error),

    #[error("Unable to read {0}: {1}")]
    SerdeError(String, serde_json::error::Error),

    #[error("Invalid preset conversion data in {0}: {1}")]
    InvalidPresetConversion(String, ValueError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("MIDI channel out of range ({0})")]
    MidiChannelOutOfRange(u32),

    #[error("MIDI note out of range ({0})")]
    MidiNoteOutOfRange(u32),

    #[error("MIDI bank out of range ({0})")]
    BankOutOfRange(i32),

    #[error("MIDI program out of range ({0})")]
    ProgramOutOfRange(u32),
}

/// Fatal errors that abort a sequence conversion.
///
/// `track` is the DSE track index and `event_index` the index of the event
/// inside that track.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("track {track}, event {event_index}: event 0x{code:02X} is not supported")]
    UnsupportedEvent {
        track: usize,
        event_index: usize,
        code: u8,
    },

    #[error("track {track}, event {event_index}: event 0x{code:02X} is missing parameter bytes")]
    MissingParameter {
        track: usize,
        event_index: usize,
        code: u8,
    },
}

#[derive(Error, Debug)]
pub enum MidiWriteError {
    #[error("Error writing {}: {}", .0.display(), .1)]
    Io(PathBuf, io::Error),

    #[error("Cannot serialize MIDI data: {0}")]
    Serialize(String),

    #[error("Too many MIDI tracks ({0})")]
    TooManyTracks(usize),
}
