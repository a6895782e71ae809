// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::*;

use dse::midi_output::controllers;

fn cc(channel: u8, controller: u8, value: u8) -> MidiEvent {
    MidiEvent::ControlChange {
        channel: ch(channel),
        controller,
        value,
    }
}

fn pitch_bend(channel: u8, value: i16) -> MidiEvent {
    MidiEvent::PitchBend {
        channel: ch(channel),
        value,
    }
}

#[test]
fn control_changes() {
    let seq = sequence(vec![
        vec![],
        vec![],
        vec![
            ev(opcodes::SET_TRACK_VOLUME, &[100]),
            ev(opcodes::SET_EXPRESSION, &[90]),
            pause(10),
            ev(opcodes::SET_TRACK_PAN, &[0x40]),
            ev(opcodes::SET_MODULATION, &[5]),
        ],
    ]);
    let midi = export_gm(&seq);

    assert_eq!(
        channel_events(&midi, 0),
        [
            (0, cc(2, controllers::VOLUME, 100)),
            (0, cc(2, controllers::EXPRESSION, 90)),
            (10, cc(2, controllers::PAN, 0x40)),
            (10, cc(2, controllers::MODULATION, 5)),
        ]
    );
}

#[test]
fn pitch_bend_range() {
    let midi = export_gm(&one_track_song(vec![
        ev(opcodes::PITCH_BEND, &[0x00, 0x00]),
        ev(opcodes::PITCH_BEND, &[0x10, 0x00]),
        ev(opcodes::PITCH_BEND, &[0xF0, 0x00]),
        ev(opcodes::PITCH_BEND, &[0x7F, 0xFF]),
        ev(opcodes::PITCH_BEND, &[0x80, 0x00]),
    ]));

    assert_eq!(
        channel_events(&midi, 0),
        [
            (0, pitch_bend(1, 0)),
            (0, pitch_bend(1, 0x1000)),
            (0, pitch_bend(1, -0x1000)),
            (0, pitch_bend(1, 0x1FFF)),
            (0, pitch_bend(1, -0x2000)),
        ]
    );
}

#[test]
fn tempo_only_on_the_first_track() {
    let seq = sequence(vec![
        vec![
            ev(opcodes::SET_TEMPO, &[120]),
            pause(48),
            ev(opcodes::SET_TEMPO_2, &[60]),
            pause(48),
            // ignored
            ev(opcodes::SET_TEMPO, &[0]),
        ],
        vec![pause(24), ev(opcodes::SET_TEMPO, &[240])],
    ]);
    let midi = export_gm(&seq);

    let tempo: Vec<_> = events(&midi, 0)
        .into_iter()
        .filter(|(_, e)| matches!(e, MidiEvent::Tempo(_)))
        .collect();

    assert_eq!(
        tempo,
        [(0, MidiEvent::Tempo(500_000)), (48, MidiEvent::Tempo(1_000_000))]
    );
}

#[test]
fn unsupported_events_are_marked() {
    let seq = one_track_song(vec![
        pause(10),
        ev(0xF6, &[0x01, 0xAB]),
        ev(0x9C, &[]),
        note(100, 0, 10),
    ]);

    let midi = export_gm(&seq);
    assert_eq!(
        markers(&midi, 0),
        [
            (10, "DSE_Event_ID:0xF6, 0x01, 0xAB".to_owned()),
            (10, "DSE_Event_ID:0x9C".to_owned()),
        ]
    );
    assert_eq!(note_on_ticks(&midi, 0), [10]);

    let settings = ExportSettings {
        mark_unsupported_events: false,
        ..gm_settings()
    };
    let midi = export(&seq, None, &settings);
    assert!(markers(&midi, 0).is_empty());
    assert_eq!(note_on_ticks(&midi, 0), [10]);
}

#[test]
fn set_preset_resets_nothing_else() {
    let midi = export_gm(&one_track_song(vec![
        set_octave(5),
        ev(opcodes::SET_TRACK_VOLUME, &[64]),
        set_preset(3),
        note(100, 0, 10),
    ]));

    assert_eq!(
        channel_events(&midi, 0),
        [
            (0, cc(1, controllers::VOLUME, 64)),
            (0, cc(1, controllers::BANK_SELECT, 0)),
            (
                0,
                MidiEvent::ProgramChange {
                    channel: ch(1),
                    program: 3
                }
            ),
            (
                0,
                MidiEvent::NoteOn {
                    channel: ch(1),
                    key: 60,
                    velocity: 100
                }
            ),
            (
                10,
                MidiEvent::NoteOff {
                    channel: ch(1),
                    key: 60,
                    velocity: 100
                }
            ),
        ]
    );
}
