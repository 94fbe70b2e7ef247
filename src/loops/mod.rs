// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Loop pattern library.
//!
//! A loop is a named pattern generator: a pure function of (absolute beat
//! position, phase within its own instance, argument string) to abstract
//! notes anchored at that beat. Built-in procedural generators live in
//! [`builtins`]; user-configured note grids are translated by
//! [`configured::ConfiguredLoop`]. Both implement [`LoopGenerator`].

pub mod builtins;
pub mod configured;

pub use configured::ConfiguredLoop;

use std::collections::HashMap;
use std::fmt;

use crate::song::Song;
use crate::theory::MidiNote;

/// Phase tolerance for generators that fire once per beat
pub const BEAT_EPSILON: f64 = 1e-4;

/// True when a loop phase sits on a whole-beat boundary.
///
/// Once-per-beat generators return nothing for off-beat phases, which
/// guards against firing mid-beat when a loop event triggers them at a
/// non-zero division.
pub fn on_beat(phase: f64) -> bool {
    phase - phase.floor() <= BEAT_EPSILON
}

/// Pitch descriptor of an abstract note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbstractPitch {
    /// Index into the chord voicing in effect when the note plays
    Slot(usize),
    /// Raw pitch value, bypassing chord voicing
    Raw(i32),
}

/// A chord-relative note description emitted by a generator.
///
/// `start` is absolute whole beats from the song start; `duration` is in
/// whole beats. The loop/layer tags identify the originating instance for
/// sustain-cutoff matching and are stamped by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractNote {
    pub pitch: AbstractPitch,
    pub start: f64,
    pub duration: f64,
    pub volume: f64,
    /// Pitch-range anchors for voicing resolution
    pub range: (MidiNote, MidiNote),
    /// Octave offset applied after voicing resolution
    pub octave: i32,
    /// Starting-tone index for voicing resolution
    pub inversion: u32,
    /// Start the voicing at the lowest chord tone in range
    pub lowest: bool,
    pub loop_name: String,
    pub layer: String,
}

impl Default for AbstractNote {
    fn default() -> Self {
        Self {
            pitch: AbstractPitch::Slot(0),
            start: 0.0,
            duration: 1.0,
            volume: 1.0,
            range: (48, 72), // C3..C5
            octave: 0,
            inversion: 0,
            lowest: false,
            loop_name: String::new(),
            layer: String::new(),
        }
    }
}

/// Trait for all loop pattern generators
pub trait LoopGenerator {
    /// Instrument the generated notes play on
    fn instrument(&self) -> &str;

    /// Generate abstract notes for one trigger.
    ///
    /// `beat` is the absolute beat position of the trigger; `phase` is the
    /// position within this loop instance (`beat - instance start`);
    /// `arg` is the optional `:argument` suffix of the loop reference.
    fn generate(&self, beat: f64, phase: f64, arg: &str) -> Vec<AbstractNote>;
}

/// Registry of built-in loop generators
#[derive(Default)]
pub struct LoopLibrary {
    generators: HashMap<String, Box<dyn LoopGenerator>>,
}

impl LoopLibrary {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with all built-in generators registered
    pub fn with_builtins() -> Self {
        let mut library = Self::new();
        library.register("whole-note-block", Box::new(builtins::WholeNoteBlock));
        library.register("just-root", Box::new(builtins::JustRoot));
        library.register("arpeggio", Box::new(builtins::Arpeggio));
        library.register("four-on-floor", Box::new(builtins::FourOnFloor));
        library
    }

    /// Register a generator under a name
    pub fn register(&mut self, name: &str, generator: Box<dyn LoopGenerator>) {
        self.generators.insert(name.to_string(), generator);
    }

    /// Look up a generator by name
    pub fn get(&self, name: &str) -> Option<&dyn LoopGenerator> {
        self.generators.get(name).map(|g| g.as_ref())
    }

    /// Get sorted list of registered generator names
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.generators.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for LoopLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopLibrary")
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Kind of a resolved loop reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopKind {
    /// A built-in generator, with the optional `:argument` suffix split off
    BuiltIn { name: String, arg: String },
    /// A configured loop definition in the song document
    Configured { name: String },
}

/// A loop reference resolved once at lookup time.
///
/// The raw string is kept for identity matching against stop events and
/// sustain-cutoff boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopRef {
    pub raw: String,
    pub kind: LoopKind,
}

impl LoopRef {
    /// Resolve a raw reference string against a song document.
    ///
    /// A name present in the song's loop-definition map is a configured
    /// loop; anything else is read as a built-in reference of the form
    /// `name` or `name:argument`.
    pub fn parse(raw: &str, song: &Song) -> Self {
        let kind = if song.loops.contains_key(raw) {
            LoopKind::Configured {
                name: raw.to_string(),
            }
        } else {
            let (name, arg) = match raw.split_once(':') {
                Some((name, arg)) => (name, arg),
                None => (raw, ""),
            };
            LoopKind::BuiltIn {
                name: name.to_string(),
                arg: arg.to_string(),
            }
        };
        Self {
            raw: raw.to_string(),
            kind,
        }
    }
}
