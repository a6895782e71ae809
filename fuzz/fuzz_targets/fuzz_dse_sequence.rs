#![no_main]

use libfuzzer_sys::fuzz_target;

use dse::conversion_info::{NoteRemap, PresetConvData, PresetConversionInfo};
use dse::events::TrkEvent;
use dse::midi_export::{sequence_to_midi, ExportSettings, MidiMode};
use dse::midi_output::MidiFormat;
use dse::sequence::{MidiChannel, MusicSequence, MusicTrack, SequenceMetadata};

use std::sync::OnceLock;

const N_TRACKS: usize = 4;
const BYTES_PER_EVENT: usize = 6;

fn conversion_info() -> &'static PresetConversionInfo {
    static LOCK: OnceLock<PresetConversionInfo> = OnceLock::new();

    LOCK.get_or_init(|| {
        let mut info = PresetConversionInfo::new();

        let mut drums = PresetConvData::new(0, 8);
        drums.max_polyphony = Some(2);
        drums.max_key_down_duration = Some(48);
        drums.note_remaps.insert(
            36,
            NoteRemap {
                dest_note: 35,
                dest_preset: Some(25),
                dest_bank: Some(1),
            },
        );
        drums.note_remaps.insert(
            38,
            NoteRemap {
                dest_note: 40,
                dest_preset: None,
                dest_bank: Some(2),
            },
        );
        info.add_preset(1, drums);

        let mut bass = PresetConvData::new(33, 0);
        bass.transpose = -2;
        info.add_preset(2, bass);

        let mut lead = PresetConvData::new(80, 0);
        lead.transpose = 3;
        info.add_preset(3, lead);

        info
    })
}

// Each event is 6 bytes: track, code, n_params and up to 3 parameter bytes
fn build_sequence(data: &[u8]) -> MusicSequence {
    let mut tracks: Vec<MusicTrack> = (0..N_TRACKS)
        .map(|i| MusicTrack::new(MidiChannel::from_masked(i as u8), Vec::new()))
        .collect();

    for c in data.chunks_exact(BYTES_PER_EVENT) {
        let track = usize::from(c[0]) % N_TRACKS;
        let n_params = usize::from(c[2] % 4);

        tracks[track]
            .events
            .push(TrkEvent::new(c[1], &c[3..3 + n_params]));
    }

    MusicSequence::new(
        SequenceMetadata {
            name: "fuzz".to_owned(),
            tpqn: 48,
        },
        tracks,
    )
}

fuzz_target!(|data: &[u8]| {
    let Some((&flags, data)) = data.split_first() else {
        return;
    };

    let settings = ExportSettings {
        format: match flags & 1 {
            0 => MidiFormat::SingleTrack,
            _ => MidiFormat::MultiTrack,
        },
        mode: match (flags >> 1) & 3 {
            0 => MidiMode::GeneralMidi,
            1 => MidiMode::YamahaXg,
            _ => MidiMode::RolandGs,
        },
        n_loops: u32::from((flags >> 3) & 3),
        mark_unsupported_events: flags & 0x20 == 0,
        export_events_past_end_of_track: flags & 0x40 != 0,
        leave_invalid_preset_notes: false,
        log_events: false,
    };

    let conv = match flags & 0x80 {
        0 => None,
        _ => Some(conversion_info()),
    };

    let sequence = build_sequence(data);

    if let Ok(midi) = sequence_to_midi(&sequence, conv, &settings) {
        for t in midi.tracks() {
            assert!(t.events().windows(2).all(|w| w[0].tick <= w[1].tick));
        }
        midi.to_bytes().unwrap();
    }
});
