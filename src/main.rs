// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::cmp::Ordering;
use std::env;

use anyhow::Result;
use songc::engine;
use songc::{LoopLibrary, Song};

fn print_usage() {
    println!("SONGC - Declarative Song Compiler");
    println!();
    println!("Usage: songc [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --render FILE [S B]     Render a song document, optionally from section S beat B");
    println!("  --yaml FILE [S B]       Render and dump the note list as YAML");
    println!("  --state-at FILE S B     Show the playback state at section S beat B");
    println!("  --list-loops            List built-in loop generators");
    println!("  --help                  Show this help message");
}

fn parse_start(args: &[String]) -> (usize, usize) {
    let section = args.first().and_then(|a| a.parse().ok()).unwrap_or(0);
    let beat = args.get(1).and_then(|a| a.parse().ok()).unwrap_or(0);
    (section, beat)
}

fn render_song(path: &str, section: usize, beat: usize, as_yaml: bool) -> Result<()> {
    let song = Song::load(path)?;
    let library = LoopLibrary::with_builtins();
    let rendered = engine::render(&song, &library, section, beat)?;

    let mut notes = rendered.flatten();
    notes.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));

    if as_yaml {
        println!("{}", serde_yaml::to_string(&notes)?);
        return Ok(());
    }

    println!("{} notes", notes.len());
    println!(
        "{:>10}  {:>10}  {:>5}  {:>6}  {:<12}  {}",
        "start", "dur", "pitch", "vol", "instrument", "at"
    );
    for note in &notes {
        println!(
            "{:>10.1}  {:>10.1}  {:>5}  {:>6.2}  {:<12}  s{}b{}",
            note.start, note.duration, note.pitch, note.volume, note.instrument, note.section, note.beat
        );
    }
    Ok(())
}

fn show_state(path: &str, section: usize, beat: usize) -> Result<()> {
    let song = Song::load(path)?;
    let state = engine::backtrack(&song, section, beat);

    println!("State at section {}, beat {}:", section, beat);
    if state.chord.is_empty() {
        println!("  chord: (none)");
    } else {
        println!("  chord: {}", state.chord);
    }
    println!("  loops:");
    for instance in &state.loops {
        println!(
            "    {} on '{}' since beat {}",
            instance.reference.raw, instance.layer, instance.start_beat
        );
    }
    println!("  fills:");
    for fill in state.fills.values() {
        println!(
            "    {} on '{}', {} remaining",
            fill.reference.raw, fill.layer, fill.remaining
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("SONGC - Declarative Song Compiler");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--render" | "--yaml" => {
            if args.len() < 3 {
                eprintln!("Error: {} requires a song file", args[1]);
                std::process::exit(1);
            }
            let (section, beat) = parse_start(&args[3..]);
            render_song(&args[2], section, beat, args[1] == "--yaml")?;
        }
        "--state-at" => {
            if args.len() < 5 {
                eprintln!("Error: --state-at requires a song file, section, and beat");
                std::process::exit(1);
            }
            let (section, beat) = parse_start(&args[3..]);
            show_state(&args[2], section, beat)?;
        }
        "--list-loops" => {
            let library = LoopLibrary::with_builtins();
            for name in library.available() {
                println!("{}", name);
            }
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
