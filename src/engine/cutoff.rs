// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sustain cutoff resolution.
//!
//! A sustained note cannot outlive the harmonic or loop context it was
//! resolved in: a chord change to a chord that no longer contains the
//! note's pitch class, or a loop event on the note's own loop or layer,
//! ends it early. Notes also never sustain across a tempo change.

use crate::loops::AbstractNote;
use crate::song::Song;
use crate::theory::chord_tones;

/// Find the effective end of a note, in absolute whole beats.
///
/// Scans forward from the beat at `(section_idx, beat_idx)` (whose absolute
/// beat index is `abs_beat`) while the tempo stays constant. Returns the
/// first boundary position strictly inside the note's span, or the note's
/// declared end when nothing cuts it short. A tempo change ends the scan at
/// the position reached.
pub fn find_cutoff(
    note: &AbstractNote,
    pitch: u8,
    song: &Song,
    section_idx: usize,
    beat_idx: usize,
    abs_beat: f64,
) -> f64 {
    let note_end = note.start + note.duration;
    let origin = match song.sections.get(section_idx) {
        Some(section) => section,
        None => return note_end,
    };
    let tempo = origin.effective_tempo();
    let pitch_class = pitch % 12;

    let mut beat_pos = abs_beat;
    for (pointer, section) in song.sections.iter().enumerate().skip(section_idx) {
        if section.effective_tempo() != tempo {
            return beat_pos;
        }
        let first = if pointer == section_idx { beat_idx } else { 0 };
        for beat in section.beats.iter().skip(first) {
            let divisions = beat.divisions.max(1) as f64;

            for change in &beat.chord_changes {
                let position = beat_pos + change.position as f64 / divisions;
                if position > note.start && position < note_end {
                    let still_in_chord = chord_tones(&change.chord)
                        .map(|tones| tones.contains(pitch_class))
                        .unwrap_or(true);
                    if !still_in_chord {
                        return position;
                    }
                }
            }

            for event in &beat.loop_events {
                let matches = event.loop_ref == note.loop_name
                    || (event.loop_ref.is_empty() && event.layer == note.layer);
                if matches {
                    let position = beat_pos + event.position as f64 / divisions;
                    if position > note.start && position < note_end {
                        return position;
                    }
                }
            }

            beat_pos += 1.0;
            if beat_pos >= note_end {
                return note_end;
            }
        }
    }
    note_end
}
