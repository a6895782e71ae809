//! DSE track events

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use serde::Deserialize;

pub mod opcodes {
    pub const FIRST_PLAY_NOTE: u8 = 0x00;
    pub const LAST_PLAY_NOTE: u8 = 0x7F;

    pub const FIRST_FIXED_PAUSE: u8 = 0x80;
    pub const LAST_FIXED_PAUSE: u8 = 0x8F;

    pub const REPEAT_LAST_PAUSE: u8 = 0x90;
    pub const ADD_TO_LAST_PAUSE: u8 = 0x91;
    pub const PAUSE_8_BITS: u8 = 0x92;
    pub const PAUSE_16_BITS: u8 = 0x93;
    pub const PAUSE_24_BITS: u8 = 0x94;
    pub const PAUSE_UNTIL_RELEASE: u8 = 0x95;

    pub const END_OF_TRACK: u8 = 0x98;
    pub const LOOP_POINT: u8 = 0x99;

    pub const SET_OCTAVE: u8 = 0xA0;
    pub const ADD_OCTAVE: u8 = 0xA1;

    pub const SET_TEMPO: u8 = 0xA4;
    pub const SET_TEMPO_2: u8 = 0xA5;

    pub const SET_PRESET: u8 = 0xAC;

    pub const SET_MODULATION: u8 = 0xBE;

    pub const PITCH_BEND: u8 = 0xD7;

    pub const SET_TRACK_VOLUME: u8 = 0xE0;
    pub const SET_EXPRESSION: u8 = 0xE3;
    pub const SET_TRACK_PAN: u8 = 0xE8;
}

/// Pause lengths (in ticks) of the fixed duration pause opcodes.
///
/// Indexed by `opcode - FIRST_FIXED_PAUSE`.
pub const FIXED_PAUSE_TICKS: [u8; 16] = [96, 72, 64, 48, 36, 32, 24, 18, 16, 12, 9, 8, 6, 4, 3, 2];

const _: () = assert!(
    FIXED_PAUSE_TICKS.len() == (opcodes::LAST_FIXED_PAUSE - opcodes::FIRST_FIXED_PAUSE + 1) as usize
);

pub const PLAY_NOTE_NOTE_MASK: u8 = 0x0F;
pub const PLAY_NOTE_OCTAVE_SHIFT_MASK: u8 = 0x30;
pub const PLAY_NOTE_HOLD_BYTES_SHIFT: u8 = 6;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OctaveShift {
    Lower,
    None,
    Reset,
    Higher,
}

impl OctaveShift {
    pub fn from_param(param1: u8) -> Self {
        match param1 & PLAY_NOTE_OCTAVE_SHIFT_MASK {
            0x00 => Self::Lower,
            0x10 => Self::None,
            0x20 => Self::Reset,
            _ => Self::Higher,
        }
    }
}

/// A single event of a parsed DSE track.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TrkEvent {
    #[serde(rename = "code")]
    pub evcode: u8,

    #[serde(default)]
    pub params: Vec<u8>,
}

impl TrkEvent {
    pub fn new(evcode: u8, params: &[u8]) -> Self {
        Self {
            evcode,
            params: params.to_vec(),
        }
    }
}

/// A typed view of a `TrkEvent`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DseEvent {
    PlayNote {
        velocity: u8,
        note: u8,
        octave_shift: OctaveShift,
        // `None` if the event does not contain a hold duration
        hold: Option<u32>,
    },

    FixedPause(u8),
    RepeatLastPause,
    AddToLastPause(i8),
    Pause(u32),
    PauseUntilRelease,

    EndOfTrack,
    LoopPoint,

    SetOctave(u8),
    AddOctave(i8),
    SetTempo(u8),
    SetPreset(u8),

    SetModulation(u8),
    PitchBend(i16),
    SetTrackVolume(u8),
    SetExpression(u8),
    SetTrackPan(u8),

    Unrecognized,
}

/// Error returned when an event does not contain enough parameter bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MissingParameter;

impl TrkEvent {
    fn param(&self, i: usize) -> Result<u8, MissingParameter> {
        self.params.get(i).copied().ok_or(MissingParameter)
    }

    pub fn decode(&self) -> Result<DseEvent, MissingParameter> {
        use opcodes::*;

        let e = match self.evcode {
            FIRST_PLAY_NOTE..=LAST_PLAY_NOTE => {
                let param1 = self.param(0)?;
                let n_hold_bytes = usize::from(param1 >> PLAY_NOTE_HOLD_BYTES_SHIFT);

                let hold = match n_hold_bytes {
                    0 => None,
                    n => {
                        let mut h: u32 = 0;
                        for i in 1..=n {
                            h = (h << 8) | u32::from(self.param(i)?);
                        }
                        Some(h)
                    }
                };

                DseEvent::PlayNote {
                    velocity: self.evcode & 0x7F,
                    note: param1 & PLAY_NOTE_NOTE_MASK,
                    octave_shift: OctaveShift::from_param(param1),
                    hold,
                }
            }

            FIRST_FIXED_PAUSE..=LAST_FIXED_PAUSE => DseEvent::FixedPause(
                FIXED_PAUSE_TICKS[usize::from(self.evcode - FIRST_FIXED_PAUSE)],
            ),

            REPEAT_LAST_PAUSE => DseEvent::RepeatLastPause,
            ADD_TO_LAST_PAUSE => DseEvent::AddToLastPause(i8::from_le_bytes([self.param(0)?])),
            PAUSE_8_BITS => DseEvent::Pause(self.param(0)?.into()),
            PAUSE_16_BITS => {
                DseEvent::Pause(u16::from_le_bytes([self.param(0)?, self.param(1)?]).into())
            }
            PAUSE_24_BITS => DseEvent::Pause(u32::from_le_bytes([
                self.param(0)?,
                self.param(1)?,
                self.param(2)?,
                0,
            ])),
            PAUSE_UNTIL_RELEASE => DseEvent::PauseUntilRelease,

            END_OF_TRACK => DseEvent::EndOfTrack,
            LOOP_POINT => DseEvent::LoopPoint,

            SET_OCTAVE => DseEvent::SetOctave(self.param(0)?),
            ADD_OCTAVE => DseEvent::AddOctave(i8::from_le_bytes([self.param(0)?])),
            SET_TEMPO | SET_TEMPO_2 => DseEvent::SetTempo(self.param(0)?),
            SET_PRESET => DseEvent::SetPreset(self.param(0)?),

            SET_MODULATION => DseEvent::SetModulation(self.param(0)?),
            PITCH_BEND => DseEvent::PitchBend(i16::from_be_bytes([self.param(0)?, self.param(1)?])),
            SET_TRACK_VOLUME => DseEvent::SetTrackVolume(self.param(0)?),
            SET_EXPRESSION => DseEvent::SetExpression(self.param(0)?),
            SET_TRACK_PAN => DseEvent::SetTrackPan(self.param(0)?),

            _ => DseEvent::Unrecognized,
        };

        Ok(e)
    }
}
