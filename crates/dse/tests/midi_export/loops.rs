// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::*;

fn loop_start(tick: u32) -> (u32, String) {
    (tick, "LoopStart".to_owned())
}

fn loop_end(tick: u32) -> (u32, String) {
    (tick, "LoopEnd".to_owned())
}

fn with_loops(settings: ExportSettings, n_loops: u32) -> ExportSettings {
    ExportSettings { n_loops, ..settings }
}

#[test]
fn loop_is_replayed() {
    let seq = one_track_song(vec![
        note(100, 0, 5),
        pause(10),
        loop_point(),
        note(100, 1, 5),
        pause(10),
        note(100, 2, 5),
        pause(10),
        note(100, 3, 5),
        pause(10),
        note(100, 4, 5),
        pause(10),
        note(100, 5, 5),
        pause(10),
        end_of_track(),
    ]);

    let midi = export(&seq, None, &with_loops(single_track_settings(), 2));

    assert_eq!(
        note_on_ticks(&midi, 0),
        [0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120, 130, 140, 150]
    );

    let keys: Vec<u8> = note_ons(&midi, 0).into_iter().map(|(_, k, _)| k).collect();
    assert_eq!(keys, [0, 1, 2, 3, 4, 5, 1, 2, 3, 4, 5, 1, 2, 3, 4, 5]);

    assert_eq!(markers(&midi, 0), [loop_start(10), loop_end(60)]);

    assert_note_offs_after_note_ons(&midi);
    assert_sorted(&midi);
}

#[test]
fn loop_restores_the_track_state() {
    let seq = one_track_song(vec![
        set_octave(2),
        loop_point(),
        note(100, 0, 5),
        set_octave(5),
        ev(opcodes::ADD_TO_LAST_PAUSE, &[10]),
        note(100, 0, 5),
        pause(10),
    ]);

    let midi = export(&seq, None, &with_loops(single_track_settings(), 1));

    assert_eq!(
        note_ons(&midi, 0),
        [(0, 24, 100), (10, 60, 100), (20, 24, 100), (30, 60, 100)]
    );
}

#[test]
fn no_loop_point() {
    let seq = one_track_song(vec![note(100, 0, 5), pause(10)]);
    let midi = export(&seq, None, &with_loops(single_track_settings(), 3));

    assert_eq!(note_on_ticks(&midi, 0), [0]);
    assert!(markers(&midi, 0).is_empty());
}

#[test]
fn single_track_has_one_loop_start() {
    let seq = sequence(vec![
        vec![],
        vec![pause(5), loop_point(), note(100, 0, 1), pause(10)],
        vec![pause(8), loop_point(), note(100, 1, 1), pause(10)],
    ]);

    let midi = export(&seq, None, &with_loops(single_track_settings(), 1));

    assert_eq!(midi.tracks().len(), 1);
    assert_eq!(markers(&midi, 0), [loop_start(5), loop_end(18)]);

    // The second track has no loop point and is replayed from the start
    assert_eq!(
        note_ons(&midi, 0),
        [(5, 0, 100), (8, 1, 100), (15, 0, 100), (18 + 8, 1, 100)]
    );
}

#[test]
fn tracks_without_a_loop_point_restart() {
    let seq = sequence(vec![
        vec![],
        vec![loop_point(), note(100, 0, 5), pause(20)],
        vec![set_octave(1), note(100, 7, 5), pause(10)],
    ]);

    let midi = export(&seq, None, &with_loops(single_track_settings(), 1));

    assert_eq!(
        note_ons(&midi, 0),
        [(0, 0, 100), (0, 19, 100), (10, 19, 100), (20, 0, 100)]
    );
}

#[test]
fn multi_track_loops() {
    let seq = sequence(vec![
        vec![ev(opcodes::SET_TEMPO, &[100])],
        vec![pause(5), loop_point(), note(100, 0, 1), pause(10)],
        vec![pause(8), loop_point(), note(100, 1, 1), pause(10)],
    ]);

    let midi = export(&seq, None, &with_loops(multi_track_settings(), 1));

    assert_eq!(midi.tracks().len(), 3);

    // Every track gets a loop end marker
    assert_eq!(markers(&midi, 0), [loop_end(0)]);
    assert_eq!(markers(&midi, 1), [loop_start(5), loop_end(15)]);
    assert_eq!(markers(&midi, 2), [loop_start(8), loop_end(18)]);

    assert_eq!(note_ons(&midi, 1), [(5, 0, 100), (15, 0, 100)]);
    assert_eq!(note_ons(&midi, 2), [(8, 1, 100), (18, 1, 100)]);

    assert!(channel_events(&midi, 0).is_empty());
}

#[test]
fn events_past_end_of_track() {
    let seq = one_track_song(vec![
        note(100, 0, 5),
        pause(10),
        end_of_track(),
        note(100, 1, 5),
    ]);

    let midi = export(&seq, None, &single_track_settings());
    assert_eq!(note_ons(&midi, 0), [(0, 0, 100)]);
    assert!(markers(&midi, 0).is_empty());

    let settings = ExportSettings {
        export_events_past_end_of_track: true,
        ..single_track_settings()
    };
    let midi = export(&seq, None, &settings);
    assert_eq!(note_ons(&midi, 0), [(0, 0, 100), (10, 1, 100)]);
    assert_eq!(markers(&midi, 0), [(10, "DSE_Event_ID:0x98".to_owned())]);
}

#[test]
fn replay_stops_at_end_of_track() {
    let seq = one_track_song(vec![
        loop_point(),
        note(100, 0, 5),
        pause(10),
        end_of_track(),
        note(100, 1, 5),
        pause(10),
    ]);

    let midi = export(&seq, None, &with_loops(single_track_settings(), 2));
    assert_eq!(note_ons(&midi, 0), [(0, 0, 100), (10, 0, 100), (20, 0, 100)]);

    let settings = ExportSettings {
        export_events_past_end_of_track: true,
        ..with_loops(single_track_settings(), 1)
    };
    let midi = export(&seq, None, &settings);
    assert_eq!(
        note_ons(&midi, 0),
        [(0, 0, 100), (10, 1, 100), (20, 0, 100), (30, 1, 100)]
    );
}
