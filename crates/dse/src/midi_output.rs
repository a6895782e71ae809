//! MIDI message sink and Standard MIDI File writer

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::errors::MidiWriteError;
use crate::sequence::MidiChannel;
use crate::time::TickCounter;

use std::path::Path;

use midly::num::{u14, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, PitchBend, Smf, Timing, TrackEvent, TrackEventKind};

pub mod controllers {
    pub const BANK_SELECT: u8 = 0x00;
    pub const MODULATION: u8 = 0x01;
    pub const VOLUME: u8 = 0x07;
    pub const PAN: u8 = 0x0A;
    pub const EXPRESSION: u8 = 0x0B;
}

const MAX_TICKS_PER_QUARTER: u16 = 0x7FFF;
const MAX_DELTA_TIME: u32 = 0x0FFF_FFFF;

pub const MIN_PITCH_BEND: i16 = -0x2000;
pub const MAX_PITCH_BEND: i16 = 0x1FFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn {
        channel: MidiChannel,
        key: u8,
        velocity: u8,
    },
    NoteOff {
        channel: MidiChannel,
        key: u8,
        velocity: u8,
    },
    ControlChange {
        channel: MidiChannel,
        controller: u8,
        value: u8,
    },
    ProgramChange {
        channel: MidiChannel,
        program: u8,
    },
    // Signed, -0x2000 to 0x1FFF
    PitchBend {
        channel: MidiChannel,
        value: i16,
    },

    // Microseconds per quarter note
    Tempo(u32),
    TimeSignature {
        numerator: u8,
        denominator_power: u8,
    },
    TrackName(String),
    Text(String),
    Marker(String),

    // Without the leading 0xF0, includes the trailing 0xF7
    SysEx(Vec<u8>),
}

impl MidiEvent {
    pub fn channel(&self) -> Option<MidiChannel> {
        match self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::ProgramChange { channel, .. }
            | Self::PitchBend { channel, .. } => Some(*channel),

            Self::Tempo(_)
            | Self::TimeSignature { .. }
            | Self::TrackName(_)
            | Self::Text(_)
            | Self::Marker(_)
            | Self::SysEx(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedMidiEvent {
    pub tick: TickCounter,
    pub event: MidiEvent,
}

/// An append-only list of MIDI events with absolute timestamps.
#[derive(Debug, Clone, Default)]
pub struct MidiTrackBuffer {
    events: Vec<TimedMidiEvent>,
}

impl MidiTrackBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tick: TickCounter, event: MidiEvent) {
        self.events.push(TimedMidiEvent { tick, event });
    }

    pub fn events(&self) -> &[TimedMidiEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Stable sort by tick, events with the same tick keep their insertion order.
    pub fn sort_by_tick(&mut self) {
        self.events.sort_by_key(|e| e.tick);
    }

    pub fn last_tick(&self) -> TickCounter {
        self.events.iter().map(|e| e.tick).max().unwrap_or_default()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MidiFormat {
    /// SMF format 0, one track for all events
    SingleTrack,
    /// SMF format 1, a dedicated tempo track followed by one track per DSE track
    MultiTrack,
}

#[derive(Debug, Clone)]
pub struct MidiFile {
    format: MidiFormat,
    ticks_per_quarter: u16,
    tracks: Vec<MidiTrackBuffer>,
}

impl MidiFile {
    pub fn new(format: MidiFormat, ticks_per_quarter: u16, n_tracks: usize) -> Self {
        let n_tracks = match format {
            MidiFormat::SingleTrack => 1,
            MidiFormat::MultiTrack => n_tracks.max(1),
        };

        Self {
            format,
            ticks_per_quarter,
            tracks: vec![MidiTrackBuffer::new(); n_tracks],
        }
    }

    pub fn format(&self) -> MidiFormat {
        self.format
    }

    pub fn ticks_per_quarter(&self) -> u16 {
        self.ticks_per_quarter
    }

    pub fn tracks(&self) -> &[MidiTrackBuffer] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&MidiTrackBuffer> {
        self.tracks.get(index)
    }

    pub(crate) fn track_mut(&mut self, index: usize) -> &mut MidiTrackBuffer {
        &mut self.tracks[index]
    }

    pub(crate) fn sort_tracks(&mut self) {
        self.tracks.iter_mut().for_each(MidiTrackBuffer::sort_by_tick);
    }

    /// Serializes the MIDI file.
    ///
    /// Every track must be sorted by tick.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MidiWriteError> {
        if self.tracks.len() > usize::from(u16::MAX) {
            return Err(MidiWriteError::TooManyTracks(self.tracks.len()));
        }

        let header = Header {
            format: match self.format {
                MidiFormat::SingleTrack => Format::SingleTrack,
                MidiFormat::MultiTrack => Format::Parallel,
            },
            timing: Timing::Metrical(self.ticks_per_quarter.min(MAX_TICKS_PER_QUARTER).into()),
        };

        let smf = Smf {
            header,
            tracks: self.tracks.iter().map(build_track).collect(),
        };

        let mut out = Vec::new();
        smf.write(&mut out)
            .map_err(|e| MidiWriteError::Serialize(e.to_string()))?;

        Ok(out)
    }
}

fn u7(v: u8) -> u7 {
    (v & 0x7F).into()
}

fn channel(c: MidiChannel) -> u4 {
    c.as_u8().into()
}

fn event_kind(event: &MidiEvent) -> TrackEventKind<'_> {
    let midi = |c: MidiChannel, message: MidiMessage| TrackEventKind::Midi {
        channel: channel(c),
        message,
    };

    match event {
        MidiEvent::NoteOn {
            channel,
            key,
            velocity,
        } => midi(
            *channel,
            MidiMessage::NoteOn {
                key: u7(*key),
                vel: u7(*velocity),
            },
        ),
        MidiEvent::NoteOff {
            channel,
            key,
            velocity,
        } => midi(
            *channel,
            MidiMessage::NoteOff {
                key: u7(*key),
                vel: u7(*velocity),
            },
        ),
        MidiEvent::ControlChange {
            channel,
            controller,
            value,
        } => midi(
            *channel,
            MidiMessage::Controller {
                controller: u7(*controller),
                value: u7(*value),
            },
        ),
        MidiEvent::ProgramChange { channel, program } => midi(
            *channel,
            MidiMessage::ProgramChange {
                program: u7(*program),
            },
        ),
        MidiEvent::PitchBend { channel, value } => {
            let v = (*value).clamp(MIN_PITCH_BEND, MAX_PITCH_BEND);
            let v = (i32::from(v) + 0x2000) as u16;
            midi(
                *channel,
                MidiMessage::PitchBend {
                    bend: PitchBend(u14::from(v)),
                },
            )
        }

        MidiEvent::Tempo(t) => TrackEventKind::Meta(MetaMessage::Tempo((*t).into())),
        MidiEvent::TimeSignature {
            numerator,
            denominator_power,
        } => TrackEventKind::Meta(MetaMessage::TimeSignature(
            *numerator,
            *denominator_power,
            24,
            8,
        )),
        MidiEvent::TrackName(s) => TrackEventKind::Meta(MetaMessage::TrackName(s.as_bytes())),
        MidiEvent::Text(s) => TrackEventKind::Meta(MetaMessage::Text(s.as_bytes())),
        MidiEvent::Marker(s) => TrackEventKind::Meta(MetaMessage::Marker(s.as_bytes())),
        MidiEvent::SysEx(data) => TrackEventKind::SysEx(data),
    }
}

fn build_track(buffer: &MidiTrackBuffer) -> Vec<TrackEvent<'_>> {
    let mut out = Vec::with_capacity(buffer.len() + 1);
    let mut prev_tick = 0;

    for e in buffer.events() {
        let tick = e.tick.value();
        let delta = tick.saturating_sub(prev_tick);
        prev_tick = prev_tick.max(tick);

        out.push(TrackEvent {
            delta: delta.min(MAX_DELTA_TIME).into(),
            kind: event_kind(&e.event),
        });
    }

    out.push(TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    out
}

pub fn write_midi_file(path: &Path, midi: &MidiFile) -> Result<(), MidiWriteError> {
    let data = midi.to_bytes()?;

    match std::fs::write(path, data) {
        Ok(()) => Ok(()),
        Err(e) => Err(MidiWriteError::Io(path.to_owned(), e)),
    }
}
