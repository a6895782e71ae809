//! Preset conversion tables
//!
//! Describes how the DSE presets of a song are converted to MIDI bank/program
//! pairs, which notes must be remapped (ie, drum kits with complex splits) and
//! a few DSE-specific limits.

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::errors::{DeserializeError, ValueError};
use crate::newtype_macros::u8_newtype;
use crate::sequence::file_name;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

pub type DsePresetId = u16;

pub const MAX_MIDI_VALUE: u8 = 127;

u8_newtype!(MidiNote, MidiNoteOutOfRange, 0, MAX_MIDI_VALUE);

/// Bank used for presets that are missing from the conversion table.
pub const INVALID_BANK: u8 = 0x7F;

// File format sentinel values
const NO_POLYPHONY_LIMIT: u8 = 255;
const NO_PRESET_OVERRIDE: u8 = 255;
const NO_BANK_OVERRIDE: i16 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRemap {
    pub dest_note: u8,
    pub dest_preset: Option<u8>,
    pub dest_bank: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetConvData {
    pub midi_program: u8,
    pub midi_bank: u8,

    // `None` is the default polyphony
    pub max_polyphony: Option<u8>,
    // 0 is the global group
    pub priority: u8,
    // The longest a note can be held in MIDI ticks, `None` is unlimited
    pub max_key_down_duration: Option<u32>,
    // Signed number of octaves
    pub transpose: i8,

    pub note_remaps: BTreeMap<u8, NoteRemap>,
}

impl PresetConvData {
    pub fn new(midi_program: u8, midi_bank: u8) -> Self {
        Self {
            midi_program,
            midi_bank,
            max_polyphony: None,
            priority: 0,
            max_key_down_duration: None,
            transpose: 0,
            note_remaps: BTreeMap::new(),
        }
    }
}

/// How a remapped note changes the preset of its channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PresetOverride {
    /// Revert to the channel's active (non-overridden) bank and program
    Restore,
    /// Play the note with a different bank and/or program
    Override {
        bank: Option<u8>,
        program: Option<u8>,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NoteRemapResult {
    pub dest_note: u8,
    pub dest_preset: Option<u8>,
    pub dest_bank: Option<u8>,
}

impl NoteRemapResult {
    pub fn unchanged(note: u8) -> Self {
        Self {
            dest_note: note,
            dest_preset: None,
            dest_bank: None,
        }
    }

    pub fn preset_override(&self) -> PresetOverride {
        match (self.dest_bank, self.dest_preset) {
            (None, None) => PresetOverride::Restore,
            (bank, program) => PresetOverride::Override { bank, program },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetConversionInfo {
    presets: BTreeMap<DsePresetId, PresetConvData>,
}

impl PresetConversionInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn add_preset(&mut self, dse_preset: DsePresetId, data: PresetConvData) {
        self.presets.insert(dse_preset, data);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DsePresetId, &PresetConvData)> {
        self.presets.iter()
    }

    pub fn lookup(&self, dse_preset: DsePresetId) -> Option<&PresetConvData> {
        self.presets.get(&dse_preset)
    }

    /// Returns the note (and optional preset override) to use when playing `note` with `dse_preset`.
    ///
    /// Notes without a remap entry are returned unchanged with no preset override,
    /// which signals the caller to restore any overridden preset.
    pub fn remap_note(&self, dse_preset: DsePresetId, note: u8) -> NoteRemapResult {
        match self.lookup(dse_preset).and_then(|p| p.note_remaps.get(&note)) {
            Some(r) => NoteRemapResult {
                dest_note: r.dest_note,
                dest_preset: r.dest_preset,
                dest_bank: r.dest_bank,
            },
            None => NoteRemapResult::unchanged(note),
        }
    }
}

/// A named collection of conversion tables, one per song.
#[derive(Debug, Clone, Default)]
pub struct ConversionInfoDb {
    tables: BTreeMap<String, PresetConversionInfo>,
}

impl ConversionInfoDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn insert(&mut self, name: String, info: PresetConversionInfo) {
        self.tables.insert(name, info);
    }

    pub fn get(&self, name: &str) -> Option<&PresetConversionInfo> {
        self.tables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

// JSON file format
// ================

fn default_max_polyphony() -> u8 {
    NO_POLYPHONY_LIMIT
}
fn default_dest_preset() -> u8 {
    NO_PRESET_OVERRIDE
}
fn default_dest_bank() -> i16 {
    NO_BANK_OVERRIDE
}

#[derive(Deserialize, Debug)]
struct NoteRemapEntry {
    note: u8,
    dest_note: u8,

    #[serde(default = "default_dest_preset")]
    dest_preset: u8,
    #[serde(default = "default_dest_bank")]
    dest_bank: i16,
}

#[derive(Deserialize, Debug)]
struct PresetEntry {
    dse_preset: DsePresetId,

    midi_preset: u8,
    #[serde(default)]
    midi_bank: i16,

    #[serde(default = "default_max_polyphony")]
    max_polyphony: u8,
    #[serde(default)]
    priority: u8,
    #[serde(default)]
    max_key_down_duration: u32,
    #[serde(default)]
    transpose: i8,

    #[serde(default)]
    note_remaps: Vec<NoteRemapEntry>,
}

#[derive(Deserialize, Debug)]
struct ConversionTableEntry {
    presets: Vec<PresetEntry>,
}

fn midi_program(p: u8) -> Result<u8, ValueError> {
    match p {
        0..=MAX_MIDI_VALUE => Ok(p),
        p => Err(ValueError::ProgramOutOfRange(p.into())),
    }
}

fn midi_bank(b: i16) -> Result<u8, ValueError> {
    match u8::try_from(b) {
        Ok(b @ 0..=MAX_MIDI_VALUE) => Ok(b),
        _ => Err(ValueError::BankOutOfRange(b.into())),
    }
}

fn midi_note(n: u8) -> Result<u8, ValueError> {
    Ok(MidiNote::try_from(n)?.as_u8())
}

impl TryFrom<NoteRemapEntry> for NoteRemap {
    type Error = ValueError;

    fn try_from(e: NoteRemapEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            dest_note: midi_note(e.dest_note)?,
            dest_preset: match e.dest_preset {
                NO_PRESET_OVERRIDE => None,
                p => Some(midi_program(p)?),
            },
            dest_bank: match e.dest_bank {
                NO_BANK_OVERRIDE => None,
                b => Some(midi_bank(b)?),
            },
        })
    }
}

impl TryFrom<PresetEntry> for PresetConvData {
    type Error = ValueError;

    fn try_from(e: PresetEntry) -> Result<Self, Self::Error> {
        let note_remaps = e
            .note_remaps
            .into_iter()
            .map(|r| Ok((midi_note(r.note)?, NoteRemap::try_from(r)?)))
            .collect::<Result<_, ValueError>>()?;

        Ok(Self {
            midi_program: midi_program(e.midi_preset)?,
            midi_bank: midi_bank(e.midi_bank)?,
            max_polyphony: match e.max_polyphony {
                NO_POLYPHONY_LIMIT => None,
                p => Some(p),
            },
            priority: e.priority,
            max_key_down_duration: match e.max_key_down_duration {
                0 => None,
                d => Some(d),
            },
            transpose: e.transpose,
            note_remaps,
        })
    }
}

fn build_db(
    file_name: &str,
    tables: BTreeMap<String, ConversionTableEntry>,
) -> Result<ConversionInfoDb, DeserializeError> {
    let mut db = ConversionInfoDb::new();

    for (name, table) in tables {
        let mut info = PresetConversionInfo::new();

        for p in table.presets {
            let dse_preset = p.dse_preset;
            let data = PresetConvData::try_from(p).map_err(|e| {
                DeserializeError::InvalidPresetConversion(file_name.to_owned(), e)
            })?;
            info.add_preset(dse_preset, data);
        }

        db.insert(name, info);
    }

    Ok(db)
}

pub fn conversion_info_db_from_str(
    json: &str,
    file_name: &str,
) -> Result<ConversionInfoDb, DeserializeError> {
    match serde_json::from_str(json) {
        Ok(tables) => build_db(file_name, tables),
        Err(e) => Err(DeserializeError::SerdeError(file_name.to_owned(), e)),
    }
}

pub fn load_conversion_info_db(path: &Path) -> Result<ConversionInfoDb, DeserializeError> {
    let file_name = file_name(path);

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return Err(DeserializeError::OpenError(file_name, e)),
    };

    let reader = BufReader::new(file);

    match serde_json::from_reader(reader) {
        Ok(tables) => build_db(&file_name, tables),
        Err(e) => Err(DeserializeError::SerdeError(file_name, e)),
    }
}
