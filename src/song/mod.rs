// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Song document model.
//!
//! This module provides the data structures for a declarative song
//! description: sections of beats with chord changes, loop events, and
//! hand-written melody, plus named loop definitions. Documents load from
//! YAML; every optional field has a default applied at deserialization,
//! and [`Song::normalize`] fixes invalid values once so the rendering
//! engine can assume fully-populated data.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Substituted wherever a section's tempo is absent, zero, or negative
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Substituted wherever a beat's or loop's division count is absent or zero
pub const DEFAULT_DIVISIONS: u32 = 4;

/// A complete song document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Song {
    /// Named loop definitions referenced by loop events
    #[serde(default)]
    pub loops: BTreeMap<String, LoopDefinition>,
    /// Ordered sections
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Song {
    /// Load a song document from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read song file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a song document from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut song: Song = serde_yaml::from_str(yaml).context("Failed to parse song YAML")?;
        song.normalize();
        Ok(song)
    }

    /// Fix invalid field values in place.
    ///
    /// Tempo at or below zero becomes [`DEFAULT_TEMPO`], zero division
    /// counts become [`DEFAULT_DIVISIONS`], non-positive loop lengths become
    /// one beat, and all intra-beat positions are reduced modulo the beat's
    /// division count. Loaders call this automatically; hand-built documents
    /// should call it before rendering.
    pub fn normalize(&mut self) {
        for definition in self.loops.values_mut() {
            if definition.divisions == 0 {
                definition.divisions = DEFAULT_DIVISIONS;
            }
            if definition.length <= 0.0 {
                definition.length = 1.0;
            }
        }
        for section in &mut self.sections {
            if section.tempo <= 0.0 {
                section.tempo = DEFAULT_TEMPO;
            }
            for beat in &mut section.beats {
                if beat.divisions == 0 {
                    beat.divisions = DEFAULT_DIVISIONS;
                }
                for change in &mut beat.chord_changes {
                    change.position %= beat.divisions;
                }
                for event in &mut beat.loop_events {
                    event.position %= beat.divisions;
                }
                for notes in beat.melody.values_mut() {
                    for note in notes {
                        note.position %= beat.divisions;
                    }
                }
            }
        }
    }

    /// Total number of beats across all sections
    pub fn beat_count(&self) -> usize {
        self.sections.iter().map(|s| s.beats.len()).sum()
    }
}

/// A section with a constant tempo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    /// Section name, for display only
    #[serde(default)]
    pub name: String,
    /// Tempo in beats per minute
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Ordered beats
    #[serde(default)]
    pub beats: Vec<Beat>,
}

impl Section {
    /// Tempo with the invalid-value guard applied
    pub fn effective_tempo(&self) -> f64 {
        if self.tempo > 0.0 {
            self.tempo
        } else {
            DEFAULT_TEMPO
        }
    }

    /// Milliseconds per whole beat at this section's tempo
    pub fn time_per_beat(&self) -> f64 {
        60_000.0 / self.effective_tempo()
    }
}

impl Default for Section {
    fn default() -> Self {
        Self {
            name: String::new(),
            tempo: default_tempo(),
            beats: Vec::new(),
        }
    }
}

/// One beat: a subdivision grid carrying melody, chord changes, and loop events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Beat {
    /// Subdivision count for event positions within this beat
    #[serde(default = "default_divisions")]
    pub divisions: u32,
    /// Hand-written melody notes, by layer name
    #[serde(default)]
    pub melody: BTreeMap<String, Vec<MelodyNote>>,
    /// Chord changes scheduled within this beat
    #[serde(default)]
    pub chord_changes: Vec<ChordChange>,
    /// Loop events scheduled within this beat
    #[serde(default)]
    pub loop_events: Vec<LoopEvent>,
}

impl Default for Beat {
    fn default() -> Self {
        Self {
            divisions: default_divisions(),
            melody: BTreeMap::new(),
            chord_changes: Vec::new(),
            loop_events: Vec::new(),
        }
    }
}

/// An explicit melody note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MelodyNote {
    /// Position within the beat, in divisions
    #[serde(default)]
    pub position: u32,
    /// Absolute pitch number
    #[serde(default = "default_melody_pitch")]
    pub pitch: u8,
    /// Volume scale
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Duration in divisions
    #[serde(default = "default_melody_duration")]
    pub duration: f64,
}

impl Default for MelodyNote {
    fn default() -> Self {
        Self {
            position: 0,
            pitch: default_melody_pitch(),
            volume: default_volume(),
            duration: default_melody_duration(),
        }
    }
}

/// A chord change at a division within a beat
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChordChange {
    /// Position within the beat, in divisions
    #[serde(default)]
    pub position: u32,
    /// Chord symbol (e.g. "C", "Dm7")
    pub chord: String,
}

/// Loop event kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoopAction {
    Start,
    Stop,
    Fill,
}

/// A loop start/stop/fill event at a division within a beat
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoopEvent {
    /// Loop reference: a built-in generator name (with optional `:argument`
    /// suffix) or the name of a configured loop definition
    #[serde(rename = "loop", default)]
    pub loop_ref: String,
    /// What the event does
    pub action: LoopAction,
    /// How many beats a fill should last; 0 means the event is not a fill
    #[serde(default)]
    pub fill_length: u32,
    /// Layer the loop runs on
    #[serde(default)]
    pub layer: String,
    /// Position within the beat, in divisions
    #[serde(default)]
    pub position: u32,
}

impl Default for LoopEvent {
    fn default() -> Self {
        Self {
            loop_ref: String::new(),
            action: LoopAction::Start,
            fill_length: 0,
            layer: String::new(),
            position: 0,
        }
    }
}

/// A user-configured loop: a fixed-length note grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoopDefinition {
    /// Instrument the loop plays on
    pub instrument: String,
    /// Loop length in whole beats
    #[serde(default = "default_loop_length")]
    pub length: f64,
    /// Subdivisions per beat for the pattern grid
    #[serde(default = "default_divisions")]
    pub divisions: u32,
    /// Pattern notes
    #[serde(default)]
    pub notes: Vec<PatternNote>,
}

impl Default for LoopDefinition {
    fn default() -> Self {
        Self {
            instrument: String::new(),
            length: default_loop_length(),
            divisions: default_divisions(),
            notes: Vec::new(),
        }
    }
}

/// Pitch of a pattern note: a voicing index, or a raw pitch that bypasses
/// chord voicing entirely
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PatternPitch {
    /// Index into the chord voicing in effect when the note plays
    Degree(u32),
    /// Absolute pitch, no remapping
    Raw(u8),
}

/// One note in a configured loop's grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternNote {
    /// Voicing index or raw pitch
    pub pitch: PatternPitch,
    /// Start within the loop, in the loop's own divisions
    #[serde(default)]
    pub start: f64,
    /// Duration in the loop's own divisions
    #[serde(default = "default_pattern_duration")]
    pub duration: f64,
    /// Volume scale
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Octave offset applied after voicing resolution
    #[serde(default)]
    pub octave: i32,
    /// Lower pitch-range anchor, as a note name
    #[serde(default = "default_range_min")]
    pub range_min: String,
    /// Upper pitch-range anchor, as a note name
    #[serde(default = "default_range_max")]
    pub range_max: String,
    /// Starting-tone index for voicing resolution
    #[serde(default)]
    pub inversion: u32,
    /// Start the voicing at the lowest chord tone in range instead of the
    /// inversion's starting tone
    #[serde(default)]
    pub lowest: bool,
}

impl Default for PatternNote {
    fn default() -> Self {
        Self {
            pitch: PatternPitch::Degree(0),
            start: 0.0,
            duration: default_pattern_duration(),
            volume: default_volume(),
            octave: 0,
            range_min: default_range_min(),
            range_max: default_range_max(),
            inversion: 0,
            lowest: false,
        }
    }
}

/// A fully resolved, playable note
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConcreteNote {
    /// Absolute pitch number
    pub pitch: u8,
    /// Instrument identifier
    pub instrument: String,
    /// Duration in milliseconds
    pub duration: f64,
    /// Volume scale
    pub volume: f64,
    /// Start offset in milliseconds, relative to the render window's start
    pub start: f64,
    /// Originating section index (consumer feedback only)
    pub section: usize,
    /// Originating beat index (consumer feedback only)
    pub beat: usize,
}

fn default_tempo() -> f64 {
    DEFAULT_TEMPO
}
fn default_divisions() -> u32 {
    DEFAULT_DIVISIONS
}
fn default_volume() -> f64 {
    1.0
}
fn default_melody_pitch() -> u8 {
    64
}
fn default_melody_duration() -> f64 {
    0.25
}
fn default_loop_length() -> f64 {
    1.0
}
fn default_pattern_duration() -> f64 {
    1.0
}
fn default_range_min() -> String {
    "C3".to_string()
}
fn default_range_max() -> String {
    "C5".to_string()
}
