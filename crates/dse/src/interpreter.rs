//! DSE event interpreter
//!
//! Converts a single DSE event into zero or more MIDI events, updating the
//! track's state.

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::conversion_info::{PresetConversionInfo, INVALID_BANK, MAX_MIDI_VALUE};
use crate::errors::ConversionError;
use crate::events::{DseEvent, OctaveShift, TrkEvent};
use crate::midi_export::ExportSettings;
use crate::midi_output::{controllers, MidiEvent, MidiFormat, MidiTrackBuffer, MAX_PITCH_BEND, MIN_PITCH_BEND};
use crate::sequence::MidiChannel;
use crate::time::{bpm_to_microseconds_per_quarter_note, TickCounter};
use crate::track_state::{HeldNote, PresetChange, TrackPlayback, TrackState, MAX_OCTAVE};

use std::fmt::Write;

use log::{debug, error, warn};

pub const TEMPO_TRACK: usize = 0;

pub const SEMITONES_PER_OCTAVE: i32 = 12;

pub const LOOP_START_MARKER: &str = "LoopStart";
pub const LOOP_END_MARKER: &str = "LoopEnd";
pub const DSE_EVENT_MARKER: &str = "DSE_Event";

/// Song-wide loop state, shared by all tracks of a conversion.
#[derive(Debug, Clone, Default)]
pub struct SongLoopState {
    // Set if any track contains a loop point that was honored
    pub loopable: bool,
    // Only used in single track mode
    loop_start_marked: bool,
}

pub struct EventInterpreter<'a> {
    track_index: usize,
    channel: MidiChannel,
    conversion_info: Option<&'a PresetConversionInfo>,
    settings: &'a ExportSettings,
}

impl<'a> EventInterpreter<'a> {
    pub fn new(
        track_index: usize,
        channel: MidiChannel,
        conversion_info: Option<&'a PresetConversionInfo>,
        settings: &'a ExportSettings,
    ) -> Self {
        Self {
            track_index,
            channel,
            conversion_info,
            settings,
        }
    }

    pub fn track_index(&self) -> usize {
        self.track_index
    }

    /// Processes the event at `event_index`.
    ///
    /// MIDI events are appended to `out` with absolute ticks.
    pub fn process_event(
        &self,
        event_index: usize,
        event: &TrkEvent,
        playback: &mut TrackPlayback,
        song: &mut SongLoopState,
        out: &mut MidiTrackBuffer,
    ) -> Result<(), ConversionError> {
        playback.state.event_index = event_index;

        let decoded = match event.decode() {
            Ok(e) => e,
            Err(_) => {
                let e = ConversionError::MissingParameter {
                    track: self.track_index,
                    event_index,
                    code: event.evcode,
                };
                error!("{}", e);
                return Err(e);
            }
        };

        if self.settings.log_events {
            debug!(
                "{:>8} : track {} #{}: 0x{:02X} {:02X?}",
                playback.state.ticks.value(),
                self.track_index,
                event_index,
                event.evcode,
                event.params
            );
        }

        let s = &mut playback.state;

        match decoded {
            DseEvent::PlayNote {
                velocity,
                note,
                octave_shift,
                hold,
            } => self.play_note(s, velocity, note, octave_shift, hold, out),

            DseEvent::FixedPause(ticks) => {
                s.last_pause = ticks.into();
                s.advance(s.last_pause);
            }
            DseEvent::Pause(ticks) => {
                s.last_pause = ticks;
                s.advance(s.last_pause);
            }
            DseEvent::AddToLastPause(delta) => {
                let p = i64::from(s.last_pause) + i64::from(delta);
                s.last_pause = match u32::try_from(p) {
                    Ok(p) => p,
                    Err(_) => {
                        warn!(
                            "track {}, event {}: add to last pause resulted in a negative value, clamping to 0",
                            self.track_index, event_index
                        );
                        0
                    }
                };
                s.advance(s.last_pause);
            }
            DseEvent::RepeatLastPause => {
                s.advance(s.last_pause);
            }
            DseEvent::PauseUntilRelease => {
                let e = ConversionError::UnsupportedEvent {
                    track: self.track_index,
                    event_index,
                    code: event.evcode,
                };
                error!("{}", e);
                return Err(e);
            }

            DseEvent::LoopPoint => self.loop_point(playback, song, out),

            DseEvent::SetOctave(octave) => {
                if octave > MAX_OCTAVE {
                    warn!(
                        "track {}, event {}: octave {} is too high",
                        self.track_index, event_index, octave
                    );
                }
                s.octave = octave;
                s.last_set_octave = octave;
            }
            DseEvent::AddOctave(delta) => {
                s.octave = s.octave.saturating_add_signed(delta);
                if s.octave > MAX_OCTAVE {
                    warn!(
                        "track {}, event {}: octave {} is too high",
                        self.track_index, event_index, s.octave
                    );
                }
            }

            DseEvent::SetTempo(bpm) => self.set_tempo(s, bpm, out),
            DseEvent::SetPreset(preset) => self.set_preset(s, preset, out),

            DseEvent::SetModulation(v) => self.control_change(s, controllers::MODULATION, v, out),
            DseEvent::SetTrackVolume(v) => self.control_change(s, controllers::VOLUME, v, out),
            DseEvent::SetExpression(v) => self.control_change(s, controllers::EXPRESSION, v, out),
            DseEvent::SetTrackPan(v) => self.control_change(s, controllers::PAN, v, out),

            DseEvent::PitchBend(bend) => {
                out.push(
                    s.ticks,
                    MidiEvent::PitchBend {
                        channel: self.channel,
                        value: bend.clamp(MIN_PITCH_BEND, MAX_PITCH_BEND),
                    },
                );
            }

            // End of track is only processed when exporting events past the end of the track
            DseEvent::EndOfTrack | DseEvent::Unrecognized => self.mark_unsupported(s, event, out),
        }

        Ok(())
    }

    fn control_change(&self, s: &TrackState, controller: u8, value: u8, out: &mut MidiTrackBuffer) {
        out.push(
            s.ticks,
            MidiEvent::ControlChange {
                channel: self.channel,
                controller,
                value,
            },
        );
    }

    fn emit_preset_change(&self, ticks: TickCounter, change: PresetChange, out: &mut MidiTrackBuffer) {
        if let Some(bank) = change.bank {
            out.push(
                ticks,
                MidiEvent::ControlChange {
                    channel: self.channel,
                    controller: controllers::BANK_SELECT,
                    value: bank,
                },
            );
        }
        if let Some(program) = change.program {
            out.push(
                ticks,
                MidiEvent::ProgramChange {
                    channel: self.channel,
                    program,
                },
            );
        }
    }

    fn set_tempo(&self, s: &TrackState, bpm: u8, out: &mut MidiTrackBuffer) {
        if self.track_index != TEMPO_TRACK {
            warn!(
                "track {}, event {}: tempo changes are only allowed on track {}, ignoring",
                self.track_index, s.event_index, TEMPO_TRACK
            );
            return;
        }

        match bpm_to_microseconds_per_quarter_note(bpm) {
            Some(t) => out.push(s.ticks, MidiEvent::Tempo(t)),
            None => warn!(
                "track {}, event {}: invalid tempo {}, ignoring",
                self.track_index, s.event_index, bpm
            ),
        }
    }

    fn set_preset(&self, s: &mut TrackState, dse_program: u8, out: &mut MidiTrackBuffer) {
        s.dse_program = dse_program;

        match self.conversion_info {
            Some(conv) => match conv.lookup(dse_program.into()) {
                Some(p) => {
                    s.invalid_bank = false;
                    s.bank = p.midi_bank;
                    s.program = p.midi_program;
                    s.max_polyphony = p.max_polyphony;
                    s.priority = p.priority;
                    s.transpose = p.transpose;
                }
                None => {
                    warn!(
                        "track {}, event {}: cannot find preset {} in the conversion table, setting bank to {}",
                        self.track_index, s.event_index, dse_program, INVALID_BANK
                    );
                    s.invalid_bank = true;
                    s.bank = INVALID_BANK;
                    s.program = dse_program;
                    s.max_polyphony = None;
                    s.priority = 0;
                    s.transpose = 0;
                }
            },
            None => {
                s.invalid_bank = false;
                s.bank = 0;
                s.program = dse_program;
                s.max_polyphony = None;
                s.priority = 0;
                s.transpose = 0;
            }
        }

        // The new preset is applied when the override is restored
        if !s.preset_latch.is_active() {
            let change = PresetChange {
                bank: Some(s.bank),
                program: Some(s.program),
            };
            self.emit_preset_change(s.ticks, change, out);
        }

        s.held_notes.clear();
    }

    fn play_note(
        &self,
        s: &mut TrackState,
        velocity: u8,
        note: u8,
        octave_shift: OctaveShift,
        hold: Option<u32>,
        out: &mut MidiTrackBuffer,
    ) {
        match octave_shift {
            OctaveShift::Lower => s.octave = s.octave.saturating_sub(1),
            OctaveShift::Higher => s.octave = s.octave.saturating_add(1),
            OctaveShift::Reset => s.octave = s.last_set_octave,
            OctaveShift::None => (),
        }

        if let Some(h) = hold {
            s.last_hold_duration = h;
        }

        let note_id = i32::from(note) + i32::from(s.octave) * SEMITONES_PER_OCTAVE;
        let mut midi_note = match u8::try_from(note_id) {
            Ok(n @ 0..=MAX_MIDI_VALUE) => n,
            _ => {
                warn!(
                    "track {}, event {}: note {} is out of the MIDI range",
                    self.track_index, s.event_index, note_id
                );
                (note_id & 0x7F) as u8
            }
        };

        let mut hold = s.last_hold_duration;

        if let Some(conv) = self.conversion_info {
            let remap = conv.remap_note(s.dse_program.into(), midi_note);
            midi_note = remap.dest_note;

            let change = s.preset_latch.apply(remap.preset_override(), s.bank, s.program);
            self.emit_preset_change(s.ticks, change, out);

            if s.transpose != 0 {
                let transposed = i32::from(midi_note) + i32::from(s.transpose) * SEMITONES_PER_OCTAVE;

                match u8::try_from(transposed) {
                    Ok(n @ 0..=MAX_MIDI_VALUE) => midi_note = n,
                    _ => warn!(
                        "track {}, event {}: transposed note {} is out of the MIDI range, transposition ignored",
                        self.track_index, s.event_index, transposed
                    ),
                }
            }

            if let Some(max) = conv
                .lookup(s.dse_program.into())
                .and_then(|p| p.max_key_down_duration)
            {
                hold = hold.min(max);
            }
        }

        // Notes with an invalid preset are kept (and silenced) so the number of events is unchanged
        let note_on_velocity = match s.invalid_bank && !self.settings.leave_invalid_preset_notes {
            true => 0,
            false => velocity,
        };

        out.push(
            s.ticks,
            MidiEvent::NoteOn {
                channel: self.channel,
                key: midi_note,
                velocity: note_on_velocity,
            },
        );

        let note_off = s.ticks + TickCounter::new(hold);

        out.push(
            note_off,
            MidiEvent::NoteOff {
                channel: self.channel,
                key: midi_note,
                velocity,
            },
        );

        let n_held = s.push_held_note(HeldNote {
            note: midi_note,
            note_on: s.ticks,
            note_off,
        });
        if let Some(max) = s.max_polyphony {
            if n_held > usize::from(max) {
                debug!(
                    "track {}, event {}: {} notes held, preset {} polyphony is {} (priority {})",
                    self.track_index, s.event_index, n_held, s.dse_program, max, s.priority
                );
            }
        }
    }

    fn loop_point(&self, playback: &mut TrackPlayback, song: &mut SongLoopState, out: &mut MidiTrackBuffer) {
        // Single track MIDI files only have one loop start marker
        if self.settings.format == MidiFormat::SingleTrack {
            if song.loop_start_marked {
                return;
            }
            song.loop_start_marked = true;
        }
        song.loopable = true;

        let s = &mut playback.state;
        out.push(s.ticks, MidiEvent::Marker(LOOP_START_MARKER.to_owned()));

        s.loop_point_event_index = s.event_index + 1;
        playback.take_loop_snapshot();
    }

    fn mark_unsupported(&self, s: &TrackState, event: &TrkEvent, out: &mut MidiTrackBuffer) {
        if !self.settings.mark_unsupported_events {
            return;
        }

        let mut text = format!("{}_ID:0x{:02X}", DSE_EVENT_MARKER, event.evcode);
        for p in &event.params {
            // Writing to a String cannot fail
            let _ = write!(text, ", 0x{:02X}", p);
        }

        out.push(s.ticks, MidiEvent::Marker(text));
    }
}
