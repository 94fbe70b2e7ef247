// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord voicing and abstract-note resolution.
//!
//! [`get_voicing`] realizes a chord symbol as an ascending list of concrete
//! pitches within a range; [`resolve_abstract_note`] maps a generator's
//! chord-relative note onto that voicing (or passes raw pitches through
//! unchanged) to produce a playable note.

use tracing::warn;

use crate::loops::{AbstractNote, AbstractPitch};
use crate::song::ConcreteNote;
use crate::theory::{chord_tones, MidiNote};

/// Scan window above the range anchor, in semitones
const VOICING_WINDOW: u8 = 48;

/// Resolve a chord symbol to an ascending list of concrete pitches.
///
/// The starting pitch class is the chord tone at `inversion` (wrapped
/// modulo the chord's tone count). Scanning walks upward in semitones from
/// `anchor`, skipping everything until the starting pitch class appears
/// (or matching immediately when `lowest` is set), then collects every
/// pitch whose class belongs to the chord, over a 48-semitone window.
/// Two-tone results get their second entry duplicated and three-tone
/// results get the first entry doubled an octave up, so callers always see
/// at least four usable slots for real chords.
pub fn get_voicing(chord: &str, anchor: MidiNote, inversion: u32, lowest: bool) -> Vec<MidiNote> {
    let tones = match chord_tones(chord) {
        Some(tones) => tones,
        None => return Vec::new(),
    };
    if tones.pitch_classes.is_empty() {
        return Vec::new();
    }
    let start_class = tones.pitch_classes[inversion as usize % tones.pitch_classes.len()];

    let mut pitches = Vec::new();
    let mut started = lowest;
    let top = anchor.saturating_add(VOICING_WINDOW).min(127);
    for pitch in anchor..=top {
        let pc = pitch % 12;
        if !started {
            if pc == start_class {
                started = true;
                pitches.push(pitch);
            }
        } else if tones.contains(pc) {
            pitches.push(pitch);
        }
    }

    if pitches.len() == 2 {
        pitches.push(pitches[1]);
    }
    if pitches.len() == 3 {
        pitches.push(pitches[0].saturating_add(12).min(127));
    }
    pitches
}

/// Resolve an abstract note against the current chord and instrument.
///
/// Raw pitches, and every pitch on the "drums" instrument, bypass chord
/// voicing entirely. Slot indices that fall outside the resolved voicing
/// are a data-integrity problem in the pattern, not a reason to panic: the
/// first slot is substituted and the event is reported through `tracing`.
///
/// The returned note's `start` and `duration` are still in whole-beat
/// units; the renderer rescales them to milliseconds.
pub fn resolve_abstract_note(note: &AbstractNote, chord: &str, instrument: &str) -> ConcreteNote {
    let base = match note.pitch {
        AbstractPitch::Raw(value) => value,
        AbstractPitch::Slot(slot) if instrument == "drums" => slot as i32,
        AbstractPitch::Slot(slot) => {
            let voicing = get_voicing(chord, note.range.0, note.inversion, note.lowest);
            if voicing.is_empty() {
                warn!("no voicing for chord '{}', substituting middle C", chord);
                60
            } else if slot < voicing.len() {
                voicing[slot] as i32
            } else {
                warn!(
                    "voicing slot {} out of range for chord '{}' in loop '{}', using slot 0",
                    slot, chord, note.loop_name
                );
                voicing[0] as i32
            }
        }
    };
    let pitch = (base + note.octave * 12).clamp(0, 127) as u8;

    ConcreteNote {
        pitch,
        instrument: instrument.to_string(),
        duration: note.duration,
        volume: note.volume,
        start: note.start,
        section: 0,
        beat: 0,
    }
}
