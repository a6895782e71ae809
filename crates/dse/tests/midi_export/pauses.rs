// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::*;

#[test]
fn fixed_pauses() {
    let midi = export_gm(&one_track_song(vec![
        ev(0x80, &[]),
        note(100, 0, 1),
        ev(0x83, &[]),
        note(100, 0, 1),
        ev(0x8F, &[]),
        note(100, 0, 1),
    ]));

    assert_eq!(note_on_ticks(&midi, 0), [96, 96 + 48, 96 + 48 + 2]);
}

#[test]
fn variable_length_pauses() {
    let midi = export_gm(&one_track_song(vec![
        pause(20),
        note(100, 0, 1),
        ev(opcodes::PAUSE_16_BITS, &[0x00, 0x01]),
        note(100, 0, 1),
        ev(opcodes::PAUSE_24_BITS, &[0x00, 0x00, 0x01]),
        note(100, 0, 1),
    ]));

    assert_eq!(note_on_ticks(&midi, 0), [20, 20 + 0x100, 20 + 0x100 + 0x10000]);
}

#[test]
fn repeat_last_pause() {
    let midi = export_gm(&one_track_song(vec![
        pause(20),
        ev(opcodes::REPEAT_LAST_PAUSE, &[]),
        note(100, 0, 1),
        // Fixed pauses also set the last pause
        ev(0x83, &[]),
        ev(opcodes::REPEAT_LAST_PAUSE, &[]),
        note(100, 0, 1),
    ]));

    assert_eq!(note_on_ticks(&midi, 0), [40, 40 + 48 + 48]);
}

#[test]
fn add_to_last_pause() {
    let midi = export_gm(&one_track_song(vec![
        pause(10),
        ev(opcodes::ADD_TO_LAST_PAUSE, &[5]),
        note(100, 0, 1),
        ev(opcodes::REPEAT_LAST_PAUSE, &[]),
        note(100, 0, 1),
        ev(opcodes::ADD_TO_LAST_PAUSE, &[(-3_i8) as u8]),
        note(100, 0, 1),
    ]));

    assert_eq!(note_on_ticks(&midi, 0), [25, 40, 52]);
}

#[test]
fn add_to_last_pause_clamps_to_zero() {
    let midi = export_gm(&one_track_song(vec![
        pause(10),
        ev(opcodes::ADD_TO_LAST_PAUSE, &[(-20_i8) as u8]),
        note(100, 0, 1),
        ev(opcodes::REPEAT_LAST_PAUSE, &[]),
        note(100, 0, 1),
    ]));

    assert_eq!(note_on_ticks(&midi, 0), [10, 10]);
}

#[test]
fn pause_until_release_is_unsupported() {
    let seq = one_track_song(vec![
        pause(10),
        ev(opcodes::PAUSE_UNTIL_RELEASE, &[0]),
        note(100, 0, 1),
    ]);

    assert_eq!(
        export_error(&seq),
        ConversionError::UnsupportedEvent {
            track: 1,
            event_index: 1,
            code: opcodes::PAUSE_UNTIL_RELEASE
        }
    );
}

#[test]
fn missing_pause_parameter() {
    let seq = one_track_song(vec![pause(10), ev(opcodes::PAUSE_16_BITS, &[1])]);

    assert_eq!(
        export_error(&seq),
        ConversionError::MissingParameter {
            track: 1,
            event_index: 1,
            code: opcodes::PAUSE_16_BITS
        }
    );
}
