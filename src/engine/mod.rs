// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The rendering engine.
//!
//! [`backtrack`] reconstructs playback state at an arbitrary resume point
//! by replaying the song's history; [`render`] walks the whole document
//! beat-by-beat and division-by-division, dispatching loop generators and
//! chord-aware pitch resolution to produce millisecond-timed notes.
//!
//! Both are pure over an immutable [`Song`] snapshot. There is no
//! persistent incremental state: every render pass derives its own
//! [`PlaybackState`] from scratch and mutates it privately for the
//! remainder of the pass, so concurrent passes over one document are safe.

pub mod cutoff;

use std::collections::HashMap;

use serde::Serialize;

use crate::error::EngineError;
use crate::loops::{AbstractNote, ConfiguredLoop, LoopGenerator, LoopKind, LoopLibrary, LoopRef};
use crate::song::{Beat, ConcreteNote, LoopAction, LoopEvent, Song};
use crate::voicing;

/// A running loop attached to a layer, anchored at the absolute beat it
/// was started
#[derive(Debug, Clone, PartialEq)]
pub struct LoopInstance {
    pub reference: LoopRef,
    pub layer: String,
    /// Absolute whole beats from the song start
    pub start_beat: f64,
}

/// A transient loop instance with a remaining-division countdown
#[derive(Debug, Clone, PartialEq)]
pub struct FillInstance {
    pub reference: LoopRef,
    pub layer: String,
    pub start_beat: f64,
    /// Countdown; the fill is dropped once this falls below zero
    pub remaining: i64,
}

/// Engine-internal playback state: the current chord, active loops, and
/// active fills (at most one per layer)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub chord: String,
    pub loops: Vec<LoopInstance>,
    pub fills: HashMap<String, FillInstance>,
}

/// Rendered notes grouped by section, then beat
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSong {
    pub sections: Vec<Vec<Vec<ConcreteNote>>>,
}

impl RenderedSong {
    /// Flatten the grouping into a single list.
    ///
    /// The result is ordered by section and beat, not chronologically;
    /// callers needing time order must sort by `start`.
    pub fn flatten(&self) -> Vec<ConcreteNote> {
        self.sections
            .iter()
            .flat_map(|section| section.iter().flat_map(|beat| beat.iter().cloned()))
            .collect()
    }
}

/// Absolute beat index of a section/beat pair (clamped to the song's end)
fn absolute_beat_index(song: &Song, section_idx: usize, beat_idx: usize) -> u64 {
    let mut index = 0u64;
    for (pointer, section) in song.sections.iter().enumerate() {
        if pointer == section_idx {
            return index + beat_idx.min(section.beats.len()) as u64;
        }
        index += section.beats.len() as u64;
    }
    index
}

/// Reconstruct playback state as of (not including) a target beat.
///
/// Replays every beat strictly before `(target_section, target_beat)` in
/// document order, accumulating the chord and loop/fill starts. For chord
/// changes the last change listed in a beat wins, regardless of its
/// position. Stop events are not applied here (only the forward pass
/// removes loops), so seeking mid-song can report loops a full replay
/// would have stopped.
pub fn backtrack(song: &Song, target_section: usize, target_beat: usize) -> PlaybackState {
    let mut state = PlaybackState::default();
    let target_index = absolute_beat_index(song, target_section, target_beat);

    let mut beat_counter = 0u64;
    'replay: for (section_idx, section) in song.sections.iter().enumerate() {
        if section_idx > target_section {
            break;
        }
        for (beat_idx, beat) in section.beats.iter().enumerate() {
            if section_idx == target_section && beat_idx == target_beat {
                break 'replay;
            }

            if let Some(change) = beat.chord_changes.last() {
                state.chord = change.chord.clone();
            }

            let divisions = beat.divisions.max(1) as f64;
            for event in &beat.loop_events {
                let position = beat_counter as f64 + event.position as f64 / divisions;
                match event.action {
                    LoopAction::Stop => {}
                    LoopAction::Start if event.fill_length == 0 => {
                        apply_loop_start(&mut state, song, event, position);
                    }
                    _ => {
                        // Inclusive beat count from the event's beat to the
                        // target beat
                        let elapsed = (target_index - beat_counter) as i64 + 1;
                        let remaining = event.fill_length.max(1) as i64 - elapsed;
                        if remaining >= 0 {
                            state.fills.insert(
                                event.layer.clone(),
                                FillInstance {
                                    reference: LoopRef::parse(&event.loop_ref, song),
                                    layer: event.layer.clone(),
                                    start_beat: position,
                                    remaining,
                                },
                            );
                        }
                    }
                }
            }
            beat_counter += 1;
        }
    }
    state
}

/// Push a new loop instance, or refresh the anchor of one already tracked
/// under the same reference
fn apply_loop_start(state: &mut PlaybackState, song: &Song, event: &LoopEvent, position: f64) {
    if let Some(instance) = state
        .loops
        .iter_mut()
        .find(|l| l.reference.raw == event.loop_ref)
    {
        instance.start_beat = position;
    } else {
        state.loops.push(LoopInstance {
            reference: LoopRef::parse(&event.loop_ref, song),
            layer: event.layer.clone(),
            start_beat: position,
        });
    }
}

/// Stop-event removal predicate: a named reference removes its own
/// instances (optionally narrowed by layer); an unnamed event removes by
/// layer alone
fn stop_matches(event: &LoopEvent, instance: &LoopInstance) -> bool {
    if event.loop_ref.is_empty() {
        instance.layer == event.layer
    } else {
        instance.reference.raw == event.loop_ref
            && (event.layer.is_empty() || instance.layer == event.layer)
    }
}

/// Render a song into notes grouped by section then beat.
///
/// The pass always walks the full document so the beat counters and the
/// backtracked state stay consistent; beats before
/// `(start_section, start_beat)` only advance the counters and produce
/// empty groups. Timestamps are relative to the render window: the first
/// beat at or after the start point is time zero.
pub fn render(
    song: &Song,
    library: &LoopLibrary,
    start_section: usize,
    start_beat: usize,
) -> Result<RenderedSong, EngineError> {
    let mut state = backtrack(song, start_section, start_beat);

    let mut sections = Vec::with_capacity(song.sections.len());
    let mut beat_counter = 0u64;
    let mut beat_ms = 0.0f64;
    let mut window_start_ms: Option<f64> = None;

    for (section_idx, section) in song.sections.iter().enumerate() {
        let time_per_beat = section.time_per_beat();
        let mut section_out = Vec::with_capacity(section.beats.len());

        for (beat_idx, beat) in section.beats.iter().enumerate() {
            let suppressed = section_idx < start_section
                || (section_idx == start_section && beat_idx < start_beat);

            let mut beat_out = Vec::new();
            if !suppressed {
                let window_offset = *window_start_ms.get_or_insert(beat_ms);
                let cursor = BeatCursor {
                    section_idx,
                    beat_idx,
                    beat_counter,
                    beat_ms,
                    time_per_beat,
                    window_offset,
                };
                render_beat(song, library, &mut state, beat, &cursor, &mut beat_out)?;
            }
            section_out.push(beat_out);

            beat_counter += 1;
            beat_ms += time_per_beat;
        }
        sections.push(section_out);
    }

    Ok(RenderedSong { sections })
}

/// Where the renderer currently stands, in every unit it needs
struct BeatCursor {
    section_idx: usize,
    beat_idx: usize,
    /// Whole beats since the song start
    beat_counter: u64,
    /// Milliseconds since the song start
    beat_ms: f64,
    time_per_beat: f64,
    /// Milliseconds elapsed before the render window opened
    window_offset: f64,
}

fn render_beat(
    song: &Song,
    library: &LoopLibrary,
    state: &mut PlaybackState,
    beat: &Beat,
    cursor: &BeatCursor,
    out: &mut Vec<ConcreteNote>,
) -> Result<(), EngineError> {
    let divisions = beat.divisions.max(1);
    let divisions_f = divisions as f64;

    // Hand-written melody plays verbatim: no voicing, no cutoff
    for (layer, notes) in &beat.melody {
        for note in notes {
            out.push(ConcreteNote {
                pitch: note.pitch,
                instrument: layer.clone(),
                duration: note.duration / divisions_f * cursor.time_per_beat,
                volume: note.volume,
                start: cursor.beat_ms + note.position as f64 / divisions_f * cursor.time_per_beat
                    - cursor.window_offset,
                section: cursor.section_idx,
                beat: cursor.beat_idx,
            });
        }
    }

    // Division lookup tables; for chords the last listed change per
    // division wins
    let mut chord_at: HashMap<u32, &str> = HashMap::new();
    for change in &beat.chord_changes {
        chord_at.insert(change.position, &change.chord);
    }
    let mut events_at: HashMap<u32, Vec<&LoopEvent>> = HashMap::new();
    for event in &beat.loop_events {
        events_at.entry(event.position).or_default().push(event);
    }

    for division in 0..divisions {
        if let Some(chord) = chord_at.get(&division) {
            state.chord = chord.to_string();
        }

        let position = cursor.beat_counter as f64 + division as f64 / divisions_f;
        let empty = Vec::new();
        let events = events_at.get(&division).unwrap_or(&empty);

        let mut started_loops: Vec<&str> = Vec::new();
        let mut started_fills: Vec<&str> = Vec::new();
        for &event in events {
            match event.action {
                LoopAction::Start if event.fill_length == 0 => {
                    apply_loop_start(state, song, event, position);
                    started_loops.push(event.loop_ref.as_str());
                }
                LoopAction::Stop => {
                    state.loops.retain(|instance| !stop_matches(event, instance));
                }
                _ => {
                    state.fills.insert(
                        event.layer.clone(),
                        FillInstance {
                            reference: LoopRef::parse(&event.loop_ref, song),
                            layer: event.layer.clone(),
                            start_beat: position,
                            remaining: event.fill_length as i64,
                        },
                    );
                    started_fills.push(event.layer.as_str());
                }
            }
        }

        // Fill countdown: one tick per division, expired fills dropped
        state.fills.retain(|_, fill| {
            fill.remaining -= 1;
            fill.remaining >= 0
        });

        // Division 0 runs everything; other divisions run only what a loop
        // event just started or changed
        let run_loops: Vec<LoopInstance>;
        let fill_candidates: Vec<&FillInstance>;
        if division == 0 {
            run_loops = state.loops.clone();
            fill_candidates = state.fills.values().collect();
        } else if !events.is_empty() {
            run_loops = state
                .loops
                .iter()
                .filter(|l| started_loops.contains(&l.reference.raw.as_str()))
                .cloned()
                .collect();
            fill_candidates = state
                .fills
                .values()
                .filter(|f| started_fills.contains(&f.layer.as_str()))
                .collect();
        } else {
            continue;
        }
        let mut run_fills: Vec<LoopInstance> = fill_candidates
            .into_iter()
            .map(|fill| LoopInstance {
                reference: fill.reference.clone(),
                layer: fill.layer.clone(),
                start_beat: fill.start_beat,
            })
            .collect();
        run_fills.sort_by(|a, b| a.layer.cmp(&b.layer));

        for instance in run_loops.iter().chain(run_fills.iter()) {
            emit_instance(song, library, &state.chord, instance, position, cursor, out)?;
        }
    }

    Ok(())
}

/// Dispatch one loop or fill instance and append its resolved notes
fn emit_instance(
    song: &Song,
    library: &LoopLibrary,
    chord: &str,
    instance: &LoopInstance,
    position: f64,
    cursor: &BeatCursor,
    out: &mut Vec<ConcreteNote>,
) -> Result<(), EngineError> {
    let reference = &instance.reference;
    let phase = position - instance.start_beat;

    let (notes, instrument): (Vec<AbstractNote>, &str) = match &reference.kind {
        LoopKind::Configured { name } => {
            let definition = song
                .loops
                .get(name)
                .ok_or_else(|| EngineError::UnknownLoop(reference.raw.clone()))?;
            let generator = ConfiguredLoop::new(name, definition);
            (
                generator.generate(position, phase, ""),
                definition.instrument.as_str(),
            )
        }
        LoopKind::BuiltIn { name, arg } => {
            let generator = library
                .get(name)
                .ok_or_else(|| EngineError::UnknownLoop(reference.raw.clone()))?;
            (generator.generate(position, phase, arg), generator.instrument())
        }
    };

    for mut note in notes {
        note.loop_name = reference.raw.clone();
        note.layer = instance.layer.clone();

        let mut concrete = voicing::resolve_abstract_note(&note, chord, instrument);
        let end = cutoff::find_cutoff(
            &note,
            concrete.pitch,
            song,
            cursor.section_idx,
            cursor.beat_idx,
            cursor.beat_counter as f64,
        );
        concrete.duration = (end - note.start).max(0.0) * cursor.time_per_beat;

        // Beat-relative offset, then milliseconds, then absolute within the
        // render window
        let relative = note.start - position;
        concrete.start = relative * cursor.time_per_beat
            + (position - cursor.beat_counter as f64) * cursor.time_per_beat
            + cursor.beat_ms
            - cursor.window_offset;

        concrete.section = cursor.section_idx;
        concrete.beat = cursor.beat_idx;
        out.push(concrete);
    }
    Ok(())
}
