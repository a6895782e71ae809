//! DSE sequence to MIDI converter

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

mod newtype_macros;

pub mod conversion_info;
pub mod errors;
pub mod events;
pub mod interpreter;
pub mod midi_export;
pub mod midi_output;
pub mod sequence;
pub mod time;
pub mod track_state;

pub use conversion_info::{load_conversion_info_db, ConversionInfoDb, PresetConversionInfo};
pub use midi_export::{sequence_to_midi, ExportSettings, MidiMode};
pub use midi_output::{write_midi_file, MidiFile, MidiFormat};
pub use sequence::{load_sequence_file, MusicSequence};
