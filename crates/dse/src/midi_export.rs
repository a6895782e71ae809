//! DSE sequence to MIDI exporter

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::conversion_info::PresetConversionInfo;
use crate::errors::ConversionError;
use crate::events::opcodes;
use crate::interpreter::{EventInterpreter, SongLoopState, LOOP_END_MARKER};
use crate::midi_output::{MidiEvent, MidiFile, MidiFormat, MidiTrackBuffer};
use crate::sequence::{MusicSequence, MusicTrack};
use crate::time::TickCounter;
use crate::track_state::TrackPlayback;

pub use crate::midi_output::write_midi_file;

use log::debug;

pub const UTILITY_TEXT: &str = "ExportedWith: ppmd_audioutil";

// Without the leading 0xF0
const GS_RESET: [u8; 10] = [0x41, 0x10, 0x42, 0x12, 0x40, 0x00, 0x7F, 0x00, 0x41, 0xF7];
const GS_DRUM_PART_OFF: [u8; 10] = [0x41, 0x10, 0x42, 0x12, 0x40, 0x10, 0x15, 0x00, 0x1B, 0xF7];
const XG_RESET: [u8; 8] = [0x43, 0x10, 0x4C, 0x00, 0x00, 0x7E, 0x00, 0xF7];

/// The synthesizer the MIDI file is initialised for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MidiMode {
    GeneralMidi,
    RolandGs,
    YamahaXg,
}

impl MidiMode {
    /// SysEx messages (without the leading 0xF0) sent at the start of the song.
    pub fn init_sysex(&self) -> &'static [&'static [u8]] {
        match self {
            Self::GeneralMidi => &[],
            Self::RolandGs => &[&GS_RESET, &GS_DRUM_PART_OFF],
            Self::YamahaXg => &[&XG_RESET],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub format: MidiFormat,
    pub mode: MidiMode,

    /// Number of times the looped section is repeated after the first pass
    pub n_loops: u32,

    pub mark_unsupported_events: bool,
    pub export_events_past_end_of_track: bool,
    pub leave_invalid_preset_notes: bool,

    /// Log every event at debug level
    pub log_events: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: MidiFormat::SingleTrack,
            mode: MidiMode::RolandGs,
            n_loops: 0,
            mark_unsupported_events: true,
            export_events_past_end_of_track: false,
            leave_invalid_preset_notes: false,
            log_events: false,
        }
    }
}

fn prepare_midi_file(midi: &mut MidiFile, sequence: &MusicSequence, settings: &ExportSettings) {
    let zero = TickCounter::new(0);
    let t = midi.track_mut(0);

    for sysex in settings.mode.init_sysex() {
        t.push(zero, MidiEvent::SysEx(sysex.to_vec()));
    }

    t.push(
        zero,
        MidiEvent::TimeSignature {
            numerator: 4,
            denominator_power: 2,
        },
    );
    t.push(zero, MidiEvent::TrackName(sequence.metadata.name.clone()));
    t.push(zero, MidiEvent::Text(UTILITY_TEXT.to_owned()));
}

struct TrackExporter<'a> {
    interpreter: EventInterpreter<'a>,
    track: &'a MusicTrack,
    output_track: usize,
    playback: TrackPlayback,
}

impl TrackExporter<'_> {
    fn export(
        &mut self,
        first_event: usize,
        settings: &ExportSettings,
        song: &mut SongLoopState,
        out: &mut MidiTrackBuffer,
    ) -> Result<(), ConversionError> {
        debug!(
            "Exporting track {} from event {}",
            self.interpreter.track_index(),
            first_event
        );

        for (i, e) in self.track.events.iter().enumerate().skip(first_event) {
            if e.evcode == opcodes::END_OF_TRACK && !settings.export_events_past_end_of_track {
                break;
            }
            self.interpreter
                .process_event(i, e, &mut self.playback, song, out)?;
        }

        Ok(())
    }

    fn end_tick(&self) -> TickCounter {
        self.playback.state.ticks
    }
}

/// Converts a DSE sequence into a MIDI file.
///
/// If `conversion_info` is `None` the DSE presets are used as MIDI programs.
pub fn sequence_to_midi(
    sequence: &MusicSequence,
    conversion_info: Option<&PresetConversionInfo>,
    settings: &ExportSettings,
) -> Result<MidiFile, ConversionError> {
    let mut midi = MidiFile::new(settings.format, sequence.metadata.tpqn, sequence.n_tracks());

    prepare_midi_file(&mut midi, sequence, settings);

    let mut tracks: Vec<TrackExporter> = sequence
        .tracks
        .iter()
        .enumerate()
        .map(|(i, track)| TrackExporter {
            interpreter: EventInterpreter::new(i, track.midi_channel, conversion_info, settings),
            track,
            output_track: match settings.format {
                MidiFormat::SingleTrack => 0,
                MidiFormat::MultiTrack => i,
            },
            playback: TrackPlayback::new(),
        })
        .collect();

    let mut song = SongLoopState::default();

    for t in &mut tracks {
        t.export(0, settings, &mut song, midi.track_mut(t.output_track))?;
    }

    if song.loopable {
        match settings.format {
            MidiFormat::SingleTrack => {
                let end = tracks.iter().map(TrackExporter::end_tick).max().unwrap_or_default();
                midi.track_mut(0)
                    .push(end, MidiEvent::Marker(LOOP_END_MARKER.to_owned()));
            }
            MidiFormat::MultiTrack => {
                for t in &tracks {
                    midi.track_mut(t.output_track)
                        .push(t.end_tick(), MidiEvent::Marker(LOOP_END_MARKER.to_owned()));
                }
            }
        }

        for l in 0..settings.n_loops {
            debug!("Loop {} of {}", l + 1, settings.n_loops);

            for t in &mut tracks {
                let first_event = t.playback.restart_loop();
                t.export(first_event, settings, &mut song, midi.track_mut(t.output_track))?;
            }
        }
    }

    midi.sort_tracks();

    Ok(midi)
}
