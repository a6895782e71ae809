// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::*;

use dse::midi_export::UTILITY_TEXT;

const GS_RESET: [u8; 10] = [0x41, 0x10, 0x42, 0x12, 0x40, 0x00, 0x7F, 0x00, 0x41, 0xF7];
const GS_DRUMS_OFF: [u8; 10] = [0x41, 0x10, 0x42, 0x12, 0x40, 0x10, 0x15, 0x00, 0x1B, 0xF7];
const XG_RESET: [u8; 8] = [0x43, 0x10, 0x4C, 0x00, 0x00, 0x7E, 0x00, 0xF7];

fn song() -> MusicSequence {
    sequence(vec![
        vec![ev(opcodes::SET_TEMPO, &[120])],
        vec![set_preset(5), note(100, 0, 10)],
    ])
}

fn header_events() -> [(u32, MidiEvent); 3] {
    [
        (
            0,
            MidiEvent::TimeSignature {
                numerator: 4,
                denominator_power: 2,
            },
        ),
        (0, MidiEvent::TrackName("test_song".to_owned())),
        (0, MidiEvent::Text(UTILITY_TEXT.to_owned())),
    ]
}

fn assert_init_precedes_channel_messages(midi: &MidiFile, n_init: usize) {
    let e = events(midi, 0);

    let first_channel_message = e.iter().position(|(_, e)| e.channel().is_some()).unwrap();
    assert!(first_channel_message >= n_init);

    assert!(e[..n_init]
        .iter()
        .all(|(t, e)| *t == 0 && matches!(e, MidiEvent::SysEx(_))));
}

#[test]
fn general_midi() {
    let midi = export(&song(), None, &gm_settings());

    assert_eq!(events(&midi, 0)[..3], header_events());
    assert!(!events(&midi, 0)
        .iter()
        .any(|(_, e)| matches!(e, MidiEvent::SysEx(_))));
}

#[test]
fn roland_gs() {
    let settings = ExportSettings {
        mode: MidiMode::RolandGs,
        ..ExportSettings::default()
    };
    let midi = export(&song(), None, &settings);

    let e = events(&midi, 0);
    assert_eq!(e[0], (0, MidiEvent::SysEx(GS_RESET.to_vec())));
    assert_eq!(e[1], (0, MidiEvent::SysEx(GS_DRUMS_OFF.to_vec())));
    assert_eq!(e[2..5], header_events());

    assert_init_precedes_channel_messages(&midi, 2);
}

#[test]
fn yamaha_xg() {
    let settings = ExportSettings {
        mode: MidiMode::YamahaXg,
        ..ExportSettings::default()
    };
    let midi = export(&song(), None, &settings);

    let e = events(&midi, 0);
    assert_eq!(e[0], (0, MidiEvent::SysEx(XG_RESET.to_vec())));
    assert_eq!(e[1..4], header_events());

    assert_init_precedes_channel_messages(&midi, 1);
}

#[test]
fn multi_track_init_is_on_the_first_track() {
    let settings = ExportSettings {
        format: MidiFormat::MultiTrack,
        mode: MidiMode::RolandGs,
        ..ExportSettings::default()
    };
    let midi = export(&song(), None, &settings);

    assert_eq!(midi.tracks().len(), 2);

    let e = events(&midi, 0);
    assert_eq!(e[0], (0, MidiEvent::SysEx(GS_RESET.to_vec())));
    assert_eq!(e[1], (0, MidiEvent::SysEx(GS_DRUMS_OFF.to_vec())));
    assert_eq!(e[2..5], header_events());
    assert_eq!(e[5], (0, MidiEvent::Tempo(500_000)));
    assert_eq!(e.len(), 6);

    assert!(!events(&midi, 1)
        .iter()
        .any(|(_, e)| e.channel().is_none()));
}

#[test]
fn default_settings() {
    let s = ExportSettings::default();

    assert_eq!(s.format, MidiFormat::SingleTrack);
    assert_eq!(s.mode, MidiMode::RolandGs);
    assert_eq!(s.n_loops, 0);
    assert!(s.mark_unsupported_events);
    assert!(!s.export_events_past_end_of_track);
    assert!(!s.leave_invalid_preset_notes);
    assert!(!s.log_events);
}
