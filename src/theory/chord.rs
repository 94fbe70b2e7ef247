// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord symbol lookup.
//!
//! Maps chord symbols (C, Am, G7, Dm7, F#maj9, ...) to ordered pitch-class
//! sets. The rendering engine treats this lookup as authoritative and does
//! not validate symbols itself; unknown qualities fall back to a major triad.

use super::{Note, PitchClass};

/// The tones of a chord: ordered pitch classes plus the tonic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordTones {
    /// Pitch classes in chord order (root first)
    pub pitch_classes: Vec<PitchClass>,
    /// The root's pitch class
    pub tonic: PitchClass,
}

impl ChordTones {
    /// Check whether a pitch class belongs to this chord
    pub fn contains(&self, pc: PitchClass) -> bool {
        self.pitch_classes.contains(&(pc % 12))
    }
}

/// Intervals in semitones above the root for a chord quality suffix.
///
/// Common jazz/pop spellings; `-` is an accepted minor alias.
fn quality_intervals(quality: &str) -> &'static [u8] {
    match quality {
        "" | "maj" | "M" => &[0, 4, 7],
        "m" | "min" | "-" => &[0, 3, 7],
        "5" => &[0, 7],
        "dim" | "°" => &[0, 3, 6],
        "dim7" => &[0, 3, 6, 9],
        "aug" | "+" => &[0, 4, 8],
        "sus2" => &[0, 2, 7],
        "sus4" | "sus" => &[0, 5, 7],
        "6" => &[0, 4, 7, 9],
        "m6" | "min6" => &[0, 3, 7, 9],
        "7" => &[0, 4, 7, 10],
        "maj7" | "M7" => &[0, 4, 7, 11],
        "m7" | "min7" | "-7" => &[0, 3, 7, 10],
        "m7b5" | "ø" => &[0, 3, 6, 10],
        "9" => &[0, 4, 7, 10, 14],
        "maj9" | "M9" => &[0, 4, 7, 11, 14],
        "m9" | "min9" => &[0, 3, 7, 10, 14],
        "add9" => &[0, 4, 7, 14],
        // Unknown qualities read as plain major
        _ => &[0, 4, 7],
    }
}

/// Resolve a chord symbol to its pitch classes and tonic.
///
/// Returns `None` when no root note can be parsed from the symbol (the
/// empty string, or a name outside A-G); the engine reads that as
/// "no chord yet".
pub fn chord_tones(symbol: &str) -> Option<ChordTones> {
    let symbol = symbol.trim();
    let mut chars = symbol.char_indices();
    let (_, root_char) = chars.next()?;
    if !root_char.is_ascii_alphabetic() {
        return None;
    }

    // Root letter plus optional accidental
    let quality_start = match chars.next() {
        Some((i, c)) if c == '#' || c == 'b' => i + 1,
        Some((i, _)) => i,
        None => symbol.len(),
    };
    let root = Note::from_str(&symbol[..quality_start])?;
    let tonic = root.pitch_class();

    let pitch_classes = quality_intervals(&symbol[quality_start..])
        .iter()
        .map(|interval| (tonic + interval) % 12)
        .collect();

    Some(ChordTones {
        pitch_classes,
        tonic,
    })
}
