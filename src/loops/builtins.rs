// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Built-in loop generators.

use super::{on_beat, AbstractNote, AbstractPitch, LoopGenerator};
use crate::theory::MidiNote;

/// Standard General MIDI drum notes
pub mod gm_drums {
    pub const KICK: u8 = 36;
    pub const CLOSED_HAT: u8 = 42;
}

const RANGE_LOW: (MidiNote, MidiNote) = (36, 48); // C2..C3
const RANGE_MID: (MidiNote, MidiNote) = (48, 60); // C3..C4
const RANGE_HIGH: (MidiNote, MidiNote) = (60, 79); // C4..G5

/// Six sustained voicing tones per beat: roots in three octave ranges plus
/// the upper chord slots, block-chord style.
pub struct WholeNoteBlock;

impl LoopGenerator for WholeNoteBlock {
    fn instrument(&self) -> &str {
        "piano"
    }

    fn generate(&self, beat: f64, phase: f64, _arg: &str) -> Vec<AbstractNote> {
        if !on_beat(phase) {
            return Vec::new();
        }
        let voices = [
            (AbstractPitch::Slot(0), RANGE_LOW),
            (AbstractPitch::Slot(0), RANGE_MID),
            (AbstractPitch::Slot(0), RANGE_HIGH),
            (AbstractPitch::Slot(1), RANGE_HIGH),
            (AbstractPitch::Slot(2), RANGE_HIGH),
            (AbstractPitch::Slot(2), RANGE_HIGH),
        ];
        voices
            .into_iter()
            .map(|(pitch, range)| AbstractNote {
                pitch,
                start: beat,
                duration: 1.0,
                range,
                ..Default::default()
            })
            .collect()
    }
}

/// A single chord root per beat, held just short of the full beat.
pub struct JustRoot;

impl LoopGenerator for JustRoot {
    fn instrument(&self) -> &str {
        "piano"
    }

    fn generate(&self, beat: f64, phase: f64, _arg: &str) -> Vec<AbstractNote> {
        if !on_beat(phase) {
            return Vec::new();
        }
        vec![AbstractNote {
            pitch: AbstractPitch::Slot(0),
            start: beat,
            duration: 0.97,
            range: RANGE_HIGH,
            ..Default::default()
        }]
    }
}

/// Four quarter-beat steps through the voicing, ascending by default or
/// descending with the `down` argument.
pub struct Arpeggio;

impl LoopGenerator for Arpeggio {
    fn instrument(&self) -> &str {
        "piano"
    }

    fn generate(&self, beat: f64, phase: f64, arg: &str) -> Vec<AbstractNote> {
        if !on_beat(phase) {
            return Vec::new();
        }
        (0..4)
            .map(|step| {
                let slot = if arg == "down" { 3 - step } else { step };
                AbstractNote {
                    pitch: AbstractPitch::Slot(slot),
                    start: beat + step as f64 * 0.25,
                    duration: 0.22,
                    range: RANGE_HIGH,
                    ..Default::default()
                }
            })
            .collect()
    }
}

/// Kick drum on every beat; the `hats` argument adds an off-beat closed
/// hi-hat. Raw pitches, no chord remapping.
pub struct FourOnFloor;

impl LoopGenerator for FourOnFloor {
    fn instrument(&self) -> &str {
        "drums"
    }

    fn generate(&self, beat: f64, phase: f64, arg: &str) -> Vec<AbstractNote> {
        if !on_beat(phase) {
            return Vec::new();
        }
        let mut notes = vec![AbstractNote {
            pitch: AbstractPitch::Raw(gm_drums::KICK as i32),
            start: beat,
            duration: 0.25,
            ..Default::default()
        }];
        if arg == "hats" {
            notes.push(AbstractNote {
                pitch: AbstractPitch::Raw(gm_drums::CLOSED_HAT as i32),
                start: beat + 0.5,
                duration: 0.2,
                volume: 0.8,
                ..Default::default()
            });
        }
        notes
    }
}
