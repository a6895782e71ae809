//! Parsed DSE music sequence

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::errors::{DeserializeError, ValueError};
use crate::events::TrkEvent;
use crate::newtype_macros::u8_newtype;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

u8_newtype!(MidiChannel, MidiChannelOutOfRange, 0, 15);

pub const DEFAULT_TICKS_PER_QUARTER_NOTE: u16 = 48;

fn default_tpqn() -> u16 {
    DEFAULT_TICKS_PER_QUARTER_NOTE
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SequenceMetadata {
    pub name: String,

    #[serde(default = "default_tpqn")]
    pub tpqn: u16,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MusicTrack {
    pub midi_channel: MidiChannel,
    pub events: Vec<TrkEvent>,
}

impl MusicTrack {
    pub fn new(midi_channel: MidiChannel, events: Vec<TrkEvent>) -> Self {
        Self {
            midi_channel,
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A fully parsed DSE sequence.
///
/// Track 0 holds the tempo and meta events of the song.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MusicSequence {
    pub metadata: SequenceMetadata,
    pub tracks: Vec<MusicTrack>,
}

impl MusicSequence {
    pub fn new(metadata: SequenceMetadata, tracks: Vec<MusicTrack>) -> Self {
        Self { metadata, tracks }
    }

    pub fn n_tracks(&self) -> usize {
        self.tracks.len()
    }

    pub fn track(&self, index: usize) -> Option<&MusicTrack> {
        self.tracks.get(index)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}

/// Loads a sequence that was previously parsed and saved as JSON.
pub fn load_sequence_file(path: &Path) -> Result<MusicSequence, DeserializeError> {
    let file_name = file_name(path);

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return Err(DeserializeError::OpenError(file_name, e)),
    };

    let reader = BufReader::new(file);

    match serde_json::from_reader(reader) {
        Ok(s) => Ok(s),
        Err(e) => Err(DeserializeError::SerdeError(file_name, e)),
    }
}
