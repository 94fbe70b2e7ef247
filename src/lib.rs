// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! SONGC - declarative song compiler.
//!
//! Compiles a hierarchical song description (sections of beats with chord
//! changes, loop/fill events, and hand-written melody) into a flat sequence
//! of millisecond-timed notes for playback or export. The engine is a pure,
//! deterministic transform: it produces the note list; scheduling it against
//! a clock belongs to the caller.

pub mod engine;
pub mod error;
pub mod loops;
pub mod song;
pub mod theory;
pub mod voicing;

pub use engine::{backtrack, render, PlaybackState, RenderedSong};
pub use error::EngineError;
pub use loops::LoopLibrary;
pub use song::{ConcreteNote, Song};
