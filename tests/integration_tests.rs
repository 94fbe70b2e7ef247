// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for SONGC
//!
//! These tests verify that document loading, state reconstruction, loop
//! dispatch, voicing, and sustain cutoff work together correctly.

use std::cmp::Ordering;
use std::io::Write;

use songc::engine::{backtrack, render};
use songc::error::EngineError;
use songc::song::{
    Beat, ChordChange, LoopAction, LoopDefinition, LoopEvent, MelodyNote, PatternNote,
    PatternPitch, Section, Song,
};
use songc::LoopLibrary;

fn chord(position: u32, symbol: &str) -> ChordChange {
    ChordChange {
        position,
        chord: symbol.to_string(),
    }
}

fn start(loop_ref: &str, layer: &str, position: u32) -> LoopEvent {
    LoopEvent {
        loop_ref: loop_ref.to_string(),
        action: LoopAction::Start,
        layer: layer.to_string(),
        position,
        ..Default::default()
    }
}

fn stop(loop_ref: &str, layer: &str, position: u32) -> LoopEvent {
    LoopEvent {
        loop_ref: loop_ref.to_string(),
        action: LoopAction::Stop,
        layer: layer.to_string(),
        position,
        ..Default::default()
    }
}

fn one_section(beats: Vec<Beat>) -> Song {
    let mut song = Song {
        sections: vec![Section {
            beats,
            ..Default::default()
        }],
        ..Default::default()
    };
    song.normalize();
    song
}

/// A two-beat sustained pad as a configured loop
fn pad_definition() -> LoopDefinition {
    LoopDefinition {
        instrument: "pad".to_string(),
        length: 2.0,
        divisions: 4,
        notes: vec![PatternNote {
            pitch: PatternPitch::Degree(0),
            start: 0.0,
            duration: 8.0,
            ..Default::default()
        }],
    }
}

/// One section at tempo 120, one beat carrying a C chord and a just-root
/// loop start: exactly one note, starting at zero, holding 0.97 beats
/// (485 ms), pitched at the root voicing of C in the generator's range.
#[test]
fn test_single_beat_just_root_scenario() {
    let song = one_section(vec![Beat {
        chord_changes: vec![chord(0, "C")],
        loop_events: vec![start("just-root", "piano", 0)],
        ..Default::default()
    }]);
    let library = LoopLibrary::with_builtins();

    let rendered = render(&song, &library, 0, 0).unwrap();
    let notes = rendered.flatten();

    assert_eq!(notes.len(), 1);
    let note = &notes[0];
    assert_eq!(note.start, 0.0);
    assert!((note.duration - 485.0).abs() < 1e-6);
    assert_eq!(note.pitch, 60);
    assert_eq!(note.instrument, "piano");
    assert_eq!(note.volume, 1.0);
    assert_eq!((note.section, note.beat), (0, 0));
}

/// A sustained whole-note crossing a chord change to a chord that does not
/// contain its pitch class ends exactly at the beat-2 boundary.
#[test]
fn test_sustain_cut_at_chord_boundary() {
    let mut song = one_section(vec![
        Beat {
            chord_changes: vec![chord(0, "C")],
            loop_events: vec![start("pad", "keys", 0)],
            ..Default::default()
        },
        Beat {
            chord_changes: vec![chord(0, "Dm")],
            ..Default::default()
        },
    ]);
    song.loops.insert("pad".to_string(), pad_definition());
    let library = LoopLibrary::with_builtins();

    let notes = render(&song, &library, 0, 0).unwrap().flatten();
    assert_eq!(notes.len(), 1);
    // C (pitch class 0) is not in D minor: cut at the beat-2 boundary,
    // not at the declared two-beat length
    assert!((notes[0].duration - 500.0).abs() < 1e-6);
}

/// The same setup moving to a chord that does contain the pitch class
/// leaves the declared duration untouched.
#[test]
fn test_sustain_survives_compatible_chord() {
    let mut song = one_section(vec![
        Beat {
            chord_changes: vec![chord(0, "C")],
            loop_events: vec![start("pad", "keys", 0)],
            ..Default::default()
        },
        Beat {
            chord_changes: vec![chord(0, "Am")],
            ..Default::default()
        },
    ]);
    song.loops.insert("pad".to_string(), pad_definition());
    let library = LoopLibrary::with_builtins();

    let notes = render(&song, &library, 0, 0).unwrap().flatten();
    assert_eq!(notes.len(), 1);
    assert!((notes[0].duration - 1000.0).abs() < 1e-6);
}

/// Flattened output sorted by start must be non-decreasing.
#[test]
fn test_sorted_output_is_chronological() {
    let mut song = Song {
        sections: vec![
            Section {
                tempo: 120.0,
                beats: vec![
                    Beat {
                        chord_changes: vec![chord(0, "C")],
                        loop_events: vec![
                            start("whole-note-block", "piano", 0),
                            start("four-on-floor:hats", "drums", 0),
                        ],
                        ..Default::default()
                    },
                    Beat {
                        chord_changes: vec![chord(2, "G7")],
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            Section {
                tempo: 90.0,
                beats: vec![Beat {
                    melody: [(
                        "lead".to_string(),
                        vec![
                            MelodyNote {
                                position: 0,
                                pitch: 72,
                                ..Default::default()
                            },
                            MelodyNote {
                                position: 2,
                                pitch: 74,
                                ..Default::default()
                            },
                        ],
                    )]
                    .into_iter()
                    .collect(),
                    ..Default::default()
                }],
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    song.normalize();
    let library = LoopLibrary::with_builtins();

    let mut notes = render(&song, &library, 0, 0).unwrap().flatten();
    assert!(!notes.is_empty());
    notes.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));
    for pair in notes.windows(2) {
        assert!(pair[0].start <= pair[1].start);
    }
}

/// Rendering an unmodified document twice yields identical output.
#[test]
fn test_render_is_idempotent() {
    let mut song = one_section(vec![
        Beat {
            chord_changes: vec![chord(0, "C")],
            loop_events: vec![start("whole-note-block", "piano", 0)],
            ..Default::default()
        },
        Beat {
            chord_changes: vec![chord(0, "F"), chord(2, "G")],
            loop_events: vec![start("four-on-floor", "drums", 1)],
            ..Default::default()
        },
        Beat::default(),
    ]);
    song.loops.insert("pad".to_string(), pad_definition());
    let library = LoopLibrary::with_builtins();

    let before = song.clone();
    let first = render(&song, &library, 0, 0).unwrap();
    let second = render(&song, &library, 0, 0).unwrap();
    assert_eq!(first, second);
    // No hidden mutation of the document either
    assert_eq!(song, before);
}

/// A loop started then stopped with a matching reference before any
/// generator fires emits nothing.
#[test]
fn test_start_then_stop_same_division_is_silent() {
    let song = one_section(vec![
        Beat {
            chord_changes: vec![chord(0, "C")],
            loop_events: vec![start("just-root", "piano", 2), stop("just-root", "", 2)],
            ..Default::default()
        },
        Beat::default(),
    ]);
    let library = LoopLibrary::with_builtins();

    let notes = render(&song, &library, 0, 0).unwrap().flatten();
    assert!(notes.is_empty());
}

/// A stop event with no loop reference removes by layer.
#[test]
fn test_stop_by_layer_silences_following_beats() {
    let song = one_section(vec![
        Beat {
            chord_changes: vec![chord(0, "C")],
            loop_events: vec![start("just-root", "piano", 0)],
            ..Default::default()
        },
        Beat {
            loop_events: vec![stop("", "piano", 0)],
            ..Default::default()
        },
        Beat::default(),
    ]);
    let library = LoopLibrary::with_builtins();

    let rendered = render(&song, &library, 0, 0).unwrap();
    assert_eq!(rendered.sections[0][0].len(), 1);
    assert!(rendered.sections[0][1].is_empty());
    assert!(rendered.sections[0][2].is_empty());
}

/// State reconstruction is path-independent: backtracking over a prefix
/// equals backtracking over the same prefix in a truncated document, and
/// a section boundary names the same point as one-past-the-end.
#[test]
fn test_backtrack_path_independence() {
    let mut song = Song {
        sections: vec![
            Section {
                beats: vec![
                    Beat {
                        chord_changes: vec![chord(0, "C")],
                        loop_events: vec![start("just-root", "piano", 0)],
                        ..Default::default()
                    },
                    Beat {
                        chord_changes: vec![chord(0, "F")],
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            Section {
                beats: vec![Beat {
                    loop_events: vec![start("pad", "keys", 2)],
                    ..Default::default()
                }],
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    song.loops.insert("pad".to_string(), pad_definition());
    song.normalize();

    assert_eq!(backtrack(&song, 1, 0), backtrack(&song, 0, 2));

    let mut truncated = song.clone();
    truncated.sections.truncate(1);
    assert_eq!(backtrack(&truncated, 0, 2), backtrack(&song, 0, 2));

    let state = backtrack(&song, 1, 0);
    assert_eq!(state.chord, "F");
    assert_eq!(state.loops.len(), 1);
    assert_eq!(state.loops[0].reference.raw, "just-root");
}

/// Rendering from a mid-song start point suppresses earlier output and
/// re-bases timestamps so the window opens at zero.
#[test]
fn test_mid_song_render_window() {
    let song = one_section(vec![
        Beat {
            chord_changes: vec![chord(0, "C")],
            loop_events: vec![start("just-root", "piano", 0)],
            ..Default::default()
        },
        Beat::default(),
        Beat::default(),
    ]);
    let library = LoopLibrary::with_builtins();

    let rendered = render(&song, &library, 0, 1).unwrap();
    assert!(rendered.sections[0][0].is_empty());
    assert_eq!(rendered.sections[0][1].len(), 1);
    assert_eq!(rendered.sections[0][2].len(), 1);

    // The loop keeps running (it started before the window) and the first
    // emitted note sits at time zero
    let note = &rendered.sections[0][1][0];
    assert_eq!(note.start, 0.0);
    assert_eq!(note.pitch, 60);
    let later = &rendered.sections[0][2][0];
    assert!((later.start - 500.0).abs() < 1e-6);
}

/// A fill is transient: its countdown is consumed division by division and
/// the instance disappears without a stop event.
#[test]
fn test_fill_expires_on_its_own() {
    let fill = LoopEvent {
        loop_ref: "just-root".to_string(),
        action: LoopAction::Fill,
        fill_length: 8,
        layer: "piano".to_string(),
        position: 0,
    };
    let song = one_section(vec![
        Beat {
            chord_changes: vec![chord(0, "C")],
            loop_events: vec![fill],
            ..Default::default()
        },
        Beat::default(),
        Beat::default(),
        Beat::default(),
    ]);
    let library = LoopLibrary::with_builtins();

    let rendered = render(&song, &library, 0, 0).unwrap();
    // Eight divisions of countdown cover two 4-division beats
    assert_eq!(rendered.sections[0][0].len(), 1);
    assert_eq!(rendered.sections[0][1].len(), 1);
    assert!(rendered.sections[0][2].is_empty());
    assert!(rendered.sections[0][3].is_empty());
}

/// Melody notes play verbatim on their layer's instrument.
#[test]
fn test_melody_emission() {
    let song = one_section(vec![Beat {
        melody: [(
            "lead".to_string(),
            vec![MelodyNote {
                position: 2,
                pitch: 70,
                volume: 0.5,
                duration: 1.0,
            }],
        )]
        .into_iter()
        .collect(),
        ..Default::default()
    }]);
    let library = LoopLibrary::with_builtins();

    let notes = render(&song, &library, 0, 0).unwrap().flatten();
    assert_eq!(notes.len(), 1);
    let note = &notes[0];
    assert_eq!(note.pitch, 70);
    assert_eq!(note.instrument, "lead");
    assert_eq!(note.volume, 0.5);
    assert!((note.start - 250.0).abs() < 1e-6);
    assert!((note.duration - 125.0).abs() < 1e-6);
}

/// Drum loops pass raw pitches through without chord remapping.
#[test]
fn test_drum_loop_raw_pitches() {
    let song = one_section(vec![Beat {
        chord_changes: vec![chord(0, "C")],
        loop_events: vec![start("four-on-floor:hats", "drums", 0)],
        ..Default::default()
    }]);
    let library = LoopLibrary::with_builtins();

    let mut notes = render(&song, &library, 0, 0).unwrap().flatten();
    notes.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].pitch, 36);
    assert_eq!(notes[1].pitch, 42);
    assert!((notes[1].start - 250.0).abs() < 1e-6);
    assert!(notes.iter().all(|n| n.instrument == "drums"));
}

/// A reference that is neither a built-in nor a configured loop is a
/// configuration error, not a silent drop.
#[test]
fn test_unknown_loop_reference_fails_fast() {
    let song = one_section(vec![Beat {
        loop_events: vec![start("no-such-loop", "piano", 0)],
        ..Default::default()
    }]);
    let library = LoopLibrary::with_builtins();

    let result = render(&song, &library, 0, 0);
    assert_eq!(
        result,
        Err(EngineError::UnknownLoop("no-such-loop".to_string()))
    );
}

/// Full pipeline through a YAML document on disk.
#[test]
fn test_yaml_document_end_to_end() {
    let yaml = r#"
loops:
  pad:
    instrument: pad
    length: 2
    divisions: 4
    notes:
      - { pitch: { degree: 0 }, start: 0, duration: 8 }
sections:
  - name: intro
    tempo: 120
    beats:
      - chord_changes:
          - { position: 0, chord: "C" }
        loop_events:
          - { loop: "pad", action: start, layer: "keys", position: 0 }
      - chord_changes:
          - { position: 0, chord: "Dm" }
"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let song = Song::load(file.path()).unwrap();
    let library = LoopLibrary::with_builtins();
    let notes = render(&song, &library, 0, 0).unwrap().flatten();

    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].instrument, "pad");
    // Cut at the D minor boundary
    assert!((notes[0].duration - 500.0).abs() < 1e-6);
}
