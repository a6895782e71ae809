//! audioutil binary

// SPDX-FileCopyrightText: © 2023 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use clap::{Args, Parser, Subcommand, ValueEnum};
use dse::{ExportSettings, MidiFile, MidiFormat, MidiMode, MusicSequence, PresetConversionInfo};

use std::path::{Path, PathBuf};

use log::{info, LevelFilter};

macro_rules! error {
    ($($arg:tt)*) => {{
        eprintln!($($arg)*);
        std::process::exit(1);
    }};
}

#[derive(Parser)]
#[command(author, version)]
#[command(about = "DSE audio utility")]
#[command(arg_required_else_help = true)]
struct ArgParser {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a DSE sequence to a MIDI file
    Smdl2midi(Smdl2MidiArgs),
}

#[derive(Copy, Clone, ValueEnum)]
enum FormatArg {
    /// SMF format 0
    Single,
    /// SMF format 1, one MIDI track per DSE track
    Multi,
}

#[derive(Copy, Clone, ValueEnum)]
enum ModeArg {
    Gm,
    Gs,
    Xg,
}

// Sequence to MIDI
// ================

#[derive(Args)]
struct Smdl2MidiArgs {
    #[arg(short = 'o', long, value_name = "FILE", help = "output MIDI file")]
    output: PathBuf,

    #[arg(value_name = "JSON_FILE", help = "parsed sequence json file")]
    sequence_file: PathBuf,

    #[arg(long, value_name = "JSON_FILE", help = "preset conversion json file")]
    conversion_info: Option<PathBuf>,

    #[arg(
        long,
        value_name = "NAME",
        help = "preset conversion table to use (default: the sequence name)"
    )]
    preset_set: Option<String>,

    #[arg(long, value_enum, default_value_t = FormatArg::Single)]
    format: FormatArg,

    #[arg(long, value_enum, default_value_t = ModeArg::Gs)]
    mode: ModeArg,

    #[arg(long, default_value_t = 0, help = "number of times to repeat the loop")]
    loops: u32,

    #[arg(long, help = "export events after the end of track event")]
    past_end_of_track: bool,

    #[arg(long, help = "do not add markers for unsupported events")]
    no_mark_unsupported: bool,

    #[arg(long, help = "do not silence notes with an unknown preset")]
    keep_invalid_preset_notes: bool,

    #[arg(short, long, help = "log every event")]
    verbose: bool,
}

fn smdl_to_midi(args: Smdl2MidiArgs) {
    init_logger(args.verbose);

    let sequence = load_sequence(&args.sequence_file);

    let conversion_db = args.conversion_info.as_ref().map(|path| {
        match dse::load_conversion_info_db(path) {
            Ok(db) => db,
            Err(e) => error!("{}", e),
        }
    });

    let conversion_info: Option<&PresetConversionInfo> = match &conversion_db {
        Some(db) => {
            let name = args.preset_set.as_deref().unwrap_or(&sequence.metadata.name);
            match db.get(name) {
                Some(c) => Some(c),
                None => error!(
                    "Cannot find preset conversion table: {} (tables: {})",
                    name,
                    db.names().collect::<Vec<_>>().join(", ")
                ),
            }
        }
        None => None,
    };

    let settings = ExportSettings {
        format: match args.format {
            FormatArg::Single => MidiFormat::SingleTrack,
            FormatArg::Multi => MidiFormat::MultiTrack,
        },
        mode: match args.mode {
            ModeArg::Gm => MidiMode::GeneralMidi,
            ModeArg::Gs => MidiMode::RolandGs,
            ModeArg::Xg => MidiMode::YamahaXg,
        },
        n_loops: args.loops,
        mark_unsupported_events: !args.no_mark_unsupported,
        export_events_past_end_of_track: args.past_end_of_track,
        leave_invalid_preset_notes: args.keep_invalid_preset_notes,
        log_events: args.verbose,
    };

    info!(
        "Converting {} ({} tracks)",
        sequence.metadata.name,
        sequence.n_tracks()
    );

    let midi = match dse::sequence_to_midi(&sequence, conversion_info, &settings) {
        Ok(m) => m,
        Err(e) => error!("Cannot convert {}: {}", sequence.metadata.name, e),
    };

    write_midi(args.output, &midi);
}

fn main() {
    let args = ArgParser::parse();

    match args.command {
        Command::Smdl2midi(c) => smdl_to_midi(c),
    }
}

fn init_logger(verbose: bool) {
    let level = match verbose {
        true => LevelFilter::Debug,
        false => LevelFilter::Warn,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_sequence(path: &Path) -> MusicSequence {
    match dse::load_sequence_file(path) {
        Ok(s) => s,
        Err(e) => error!("{}", e),
    }
}

fn write_midi(path: PathBuf, midi: &MidiFile) {
    match dse::write_midi_file(&path, midi) {
        Ok(()) => (),
        Err(e) => error!("{}", e),
    }
}
