//! MusicXML decoder: converts a MusicXML document into a `Timeline`.
//!
//! Timing uses a single running clock: every rest and note advances it in
//! document order, across all measures, parts and voices. Chords and
//! interleaved voices are therefore laid out one after another.

use log::{debug, info, warn};
use roxmltree::{Document, Node};

use crate::error::{FingerboardError, Result};
use crate::model::*;

/// Tempo used when the score carries no tempo marking.
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Parse a MusicXML XML string into a Timeline.
pub fn parse_musicxml(xml: &str) -> Result<Timeline> {
    // MusicXML files include a DOCTYPE declaration, so we must allow DTDs
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    let doc = Document::parse_with_options(xml, options)
        .map_err(|e| FingerboardError::MalformedXml(e.to_string()))?;
    let root = doc.root_element();

    let divisions = parse_divisions(&root)?;
    let tempo_bpm = parse_tempo(&root)?;
    let mut timeline = Timeline::new(divisions, tempo_bpm);
    info!(
        "Score properties: divisions per quarter {divisions}, tempo {tempo_bpm} BPM, {:.4}s per division",
        timeline.seconds_per_subdivision
    );

    let mut clock = 0.0;
    let measures = root
        .descendants()
        .filter(|n| n.has_tag_name("measure"));
    for (measure_idx, measure) in measures.enumerate() {
        let entries = measure.children().filter(|n| n.has_tag_name("note"));
        for (entry_idx, entry) in entries.enumerate() {
            let at = EntryLocation {
                measure: measure_idx + 1,
                entry: entry_idx + 1,
            };
            match decode_entry(&entry, timeline.seconds_per_subdivision, at) {
                Entry::Skip => {}
                Entry::Rest(seconds) => clock += seconds,
                Entry::Note(mut event) => {
                    event.start_time = clock;
                    clock += event.duration;
                    timeline.events.push(event);
                }
            }
        }
    }

    info!("Decoded {} notes", timeline.len());
    Ok(timeline)
}

// ─── Score-level properties ──────────────────────────────────────────

fn parse_divisions(root: &Node) -> Result<f64> {
    let text = root
        .descendants()
        .find(|n| n.has_tag_name("divisions"))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(FingerboardError::MissingDivisions)?;

    let divisions: f64 = text
        .parse()
        .map_err(|_| FingerboardError::InvalidDivisions(text.to_string()))?;
    if divisions == 0.0 {
        return Err(FingerboardError::ZeroDivisions);
    }
    if !divisions.is_finite() || divisions < 0.0 {
        return Err(FingerboardError::InvalidDivisions(text.to_string()));
    }
    Ok(divisions)
}

/// `<sound tempo="…">` wins over `<metronome><per-minute>`; 120 BPM otherwise.
fn parse_tempo(root: &Node) -> Result<f64> {
    let sound_tempo = root
        .descendants()
        .filter(|n| n.has_tag_name("sound"))
        .find_map(|n| n.attribute("tempo"))
        .filter(|t| !t.trim().is_empty());

    let per_minute = || {
        root.descendants()
            .filter(|n| n.has_tag_name("metronome"))
            .find_map(|m| child_text(&m, "per-minute"))
    };

    let Some(text) = sound_tempo.or_else(per_minute) else {
        return Ok(DEFAULT_TEMPO_BPM);
    };
    match text.trim().parse::<f64>() {
        Ok(bpm) if bpm.is_finite() && bpm > 0.0 => Ok(bpm),
        _ => Err(FingerboardError::InvalidTempo(text.trim().to_string())),
    }
}

// ─── Notes and rests ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct EntryLocation {
    measure: usize,
    entry: usize,
}

enum Entry {
    /// Contributes neither an event nor time
    Skip,
    /// Advances the clock by this many seconds
    Rest(f64),
    /// A note whose `start_time` is filled in by the caller
    Note(NoteEvent),
}

fn decode_entry(node: &Node, seconds_per_division: f64, at: EntryLocation) -> Entry {
    let EntryLocation { measure, entry } = at;

    if has_child(node, "grace") {
        debug!("Skipping grace note in measure {measure}");
        return Entry::Skip;
    }

    if has_child(node, "rest") {
        return match child_text(node, "duration") {
            None => Entry::Skip,
            Some(text) => match text.parse::<f64>() {
                Ok(ticks) if (ticks * seconds_per_division).is_finite() && ticks >= 0.0 => {
                    Entry::Rest(ticks * seconds_per_division)
                }
                _ => {
                    warn!("Invalid duration '{text}' for rest in measure {measure}, entry {entry}. Skipping its time contribution.");
                    Entry::Skip
                }
            },
        };
    }

    let Some(pitch_node) = child(node, "pitch") else {
        debug!("Skipping note without pitch in measure {measure}, entry {entry}");
        return Entry::Skip;
    };
    let Some(pitch) = decode_pitch(&pitch_node, at) else {
        return Entry::Skip;
    };

    let Some(text) = child_text(node, "duration") else {
        warn!("Missing duration for note {pitch} in measure {measure}, entry {entry}. Skipping note.");
        return Entry::Skip;
    };
    let ticks = match text.parse::<f64>() {
        Ok(ticks) if (ticks * seconds_per_division).is_finite() && ticks > 0.0 => ticks,
        Ok(ticks) if ticks <= 0.0 => {
            warn!("Non-positive duration '{text}' for note {pitch} in measure {measure}, entry {entry}. Skipping note.");
            return Entry::Skip;
        }
        _ => {
            warn!("Invalid duration '{text}' for note {pitch} in measure {measure}, entry {entry}. Skipping note.");
            return Entry::Skip;
        }
    };

    Entry::Note(NoteEvent {
        pitch,
        start_time: 0.0,
        duration: ticks * seconds_per_division,
        voice: decode_voice(node, at),
        annotation: first_lyric(node),
    })
}

fn decode_pitch(node: &Node, at: EntryLocation) -> Option<Pitch> {
    let EntryLocation { measure, entry } = at;

    let (Some(step_text), Some(octave_text)) = (child_text(node, "step"), child_text(node, "octave"))
    else {
        warn!("Missing step or octave for note in measure {measure}, entry {entry}. Skipping note.");
        return None;
    };

    let mut letters = step_text.chars();
    let step = match (letters.next().and_then(Step::from_letter), letters.next()) {
        (Some(step), None) => step,
        _ => {
            warn!("Unknown step '{step_text}' in measure {measure}, entry {entry}. Skipping note.");
            return None;
        }
    };
    let Ok(octave) = octave_text.parse::<i32>() else {
        warn!("Invalid octave '{octave_text}' in measure {measure}, entry {entry}. Skipping note.");
        return None;
    };

    let accidental = match child_text(node, "alter") {
        None => Accidental::Natural,
        // Some files write alterations as floats, e.g. "1.0"
        Some(text) => match text.parse::<f64>() {
            Ok(alter) => Accidental::from_alter(alter.trunc() as i32).unwrap_or_else(|| {
                warn!("Unsupported alter '{text}' for note {step_text}{octave}. Treating as natural.");
                Accidental::Natural
            }),
            Err(_) => {
                warn!("Invalid alter value '{text}' for note {step_text}{octave}. Defaulting to no alteration.");
                Accidental::Natural
            }
        },
    };

    Some(Pitch::new(step, accidental, octave))
}

fn decode_voice(node: &Node, at: EntryLocation) -> u32 {
    match child_text(node, "voice") {
        None => 1,
        Some(text) => match text.parse::<u32>() {
            Ok(voice) if voice >= 1 => voice,
            _ => {
                warn!(
                    "Invalid voice '{text}' in measure {}, entry {}. Using voice 1.",
                    at.measure, at.entry
                );
                1
            }
        },
    }
}

fn first_lyric(node: &Node) -> Option<String> {
    node.descendants()
        .filter(|n| n.has_tag_name("lyric"))
        .find_map(|lyric| child(&lyric, "text"))
        .and_then(|t| t.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn has_child(node: &Node, name: &str) -> bool {
    child(node, name).is_some()
}

/// Trimmed, non-empty text of a direct child element.
fn child_text<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
