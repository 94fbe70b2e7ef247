// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configured-loop translation.
//!
//! Turns a user-defined note grid ([`LoopDefinition`]) into abstract notes:
//! the instance phase is wrapped modulo the loop's declared length, every
//! pattern note whose loop-local start falls inside the current one-beat
//! window is selected, and loop-local division units are rescaled into
//! whole-beat units.

use tracing::warn;

use super::{AbstractNote, AbstractPitch, LoopGenerator};
use crate::song::{LoopDefinition, PatternPitch};
use crate::theory::{parse_pitch, MidiNote};

/// A loop definition from the song document, viewed as a generator
pub struct ConfiguredLoop<'a> {
    name: &'a str,
    definition: &'a LoopDefinition,
}

impl<'a> ConfiguredLoop<'a> {
    pub fn new(name: &'a str, definition: &'a LoopDefinition) -> Self {
        Self { name, definition }
    }

    fn anchor(&self, name: &str, fallback: MidiNote) -> MidiNote {
        match parse_pitch(name) {
            Some(pitch) => pitch,
            None => {
                warn!(
                    "loop '{}' has unparsable range anchor '{}', using default",
                    self.name, name
                );
                fallback
            }
        }
    }
}

impl LoopGenerator for ConfiguredLoop<'_> {
    fn instrument(&self) -> &str {
        &self.definition.instrument
    }

    fn generate(&self, beat: f64, phase: f64, _arg: &str) -> Vec<AbstractNote> {
        let divisions = self.definition.divisions.max(1) as f64;
        let local = phase.rem_euclid(self.definition.length.max(1.0));

        let mut notes = Vec::new();
        for note in &self.definition.notes {
            let start_beats = note.start / divisions;
            if start_beats < local || start_beats >= local + 1.0 {
                continue;
            }
            notes.push(AbstractNote {
                pitch: match note.pitch {
                    PatternPitch::Degree(degree) => AbstractPitch::Slot(degree as usize),
                    PatternPitch::Raw(raw) => AbstractPitch::Raw(raw as i32),
                },
                start: beat + (start_beats - local),
                duration: note.duration / divisions,
                volume: note.volume,
                range: (
                    self.anchor(&note.range_min, 48),
                    self.anchor(&note.range_max, 72),
                ),
                octave: note.octave,
                inversion: note.inversion,
                lowest: note.lowest,
                ..Default::default()
            });
        }
        notes
    }
}
