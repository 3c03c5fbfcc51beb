//! Data model for a decoded score timeline.
//!
//! A `Timeline` is the flat, time-stamped note list the renderer works from.
//! Events are stored in document order and never mutated after decoding.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Note name without accidental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    pub const fn letter(self) -> char {
        match self {
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
            Self::A => 'A',
            Self::B => 'B',
        }
    }

    pub const fn from_letter(c: char) -> Option<Self> {
        match c {
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'E' => Some(Self::E),
            'F' => Some(Self::F),
            'G' => Some(Self::G),
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            _ => None,
        }
    }

    /// Semitones above C within the same octave.
    pub const fn semitone(self) -> i32 {
        match self {
            Self::C => 0,
            Self::D => 2,
            Self::E => 4,
            Self::F => 5,
            Self::G => 7,
            Self::A => 9,
            Self::B => 11,
        }
    }
}

/// Chromatic alteration, bounded to double flat..double sharp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Map a MusicXML `<alter>` semitone count. Values outside -2..=2 have no spelling.
    pub const fn from_alter(alter: i32) -> Option<Self> {
        match alter {
            -2 => Some(Self::DoubleFlat),
            -1 => Some(Self::Flat),
            0 => Some(Self::Natural),
            1 => Some(Self::Sharp),
            2 => Some(Self::DoubleSharp),
            _ => None,
        }
    }

    pub const fn alter(self) -> i32 {
        match self {
            Self::DoubleFlat => -2,
            Self::Flat => -1,
            Self::Natural => 0,
            Self::Sharp => 1,
            Self::DoubleSharp => 2,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::DoubleFlat => "bb",
            Self::Flat => "b",
            Self::Natural => "",
            Self::Sharp => "#",
            Self::DoubleSharp => "##",
        }
    }

    pub const fn is_double(self) -> bool {
        matches!(self, Self::DoubleFlat | Self::DoubleSharp)
    }
}

/// A spelled pitch, e.g. `C#4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Pitch {
    pub step: Step,
    pub accidental: Accidental,
    /// Scientific octave (middle C = C4)
    pub octave: i32,
}

impl Pitch {
    pub const fn new(step: Step, accidental: Accidental, octave: i32) -> Self {
        Self {
            step,
            accidental,
            octave,
        }
    }

    pub const fn natural(step: Step, octave: i32) -> Self {
        Self::new(step, Accidental::Natural, octave)
    }

    /// MIDI note number (C4 = 60).
    pub const fn to_midi(self) -> i32 {
        (self.octave + 1) * 12 + self.step.semitone() + self.accidental.alter()
    }

    /// Sharp spelling of a MIDI note number.
    pub const fn from_midi_sharp(midi: i32) -> Self {
        let octave = midi.div_euclid(12) - 1;
        let (step, accidental) = match midi.rem_euclid(12) {
            0 => (Step::C, Accidental::Natural),
            1 => (Step::C, Accidental::Sharp),
            2 => (Step::D, Accidental::Natural),
            3 => (Step::D, Accidental::Sharp),
            4 => (Step::E, Accidental::Natural),
            5 => (Step::F, Accidental::Natural),
            6 => (Step::F, Accidental::Sharp),
            7 => (Step::G, Accidental::Natural),
            8 => (Step::G, Accidental::Sharp),
            9 => (Step::A, Accidental::Natural),
            10 => (Step::A, Accidental::Sharp),
            _ => (Step::B, Accidental::Natural),
        };
        Self::new(step, accidental, octave)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.step.letter(),
            self.accidental.symbol(),
            self.octave
        )
    }
}

/// Error returned when a pitch label such as `"Bb3"` cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pitch label '{0}'")]
pub struct PitchParseError(pub String);

impl FromStr for Pitch {
    type Err = PitchParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PitchParseError(s.to_string());
        let mut chars = s.chars();
        let step = chars.next().and_then(Step::from_letter).ok_or_else(err)?;
        let rest = chars.as_str();
        let octave_start = rest
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(err)?;
        let accidental = match &rest[..octave_start] {
            "bb" => Accidental::DoubleFlat,
            "b" => Accidental::Flat,
            "" => Accidental::Natural,
            "#" => Accidental::Sharp,
            "##" => Accidental::DoubleSharp,
            _ => return Err(err()),
        };
        let octave = rest[octave_start..].parse().map_err(|_| err())?;
        Ok(Self::new(step, accidental, octave))
    }
}

/// One sounding note with absolute timing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteEvent {
    pub pitch: Pitch,
    /// Start time in seconds from the beginning of the score
    pub start_time: f64,
    /// Duration in seconds (always > 0)
    pub duration: f64,
    /// Voice number (1-based)
    pub voice: u32,
    /// Display text, taken from the first lyric
    pub annotation: Option<String>,
}

impl NoteEvent {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Closed-open: active at its start instant, inactive at its end instant.
    pub fn is_active_at(&self, time: f64) -> bool {
        self.start_time <= time && time < self.end_time()
    }

    /// Lyric if present, else the pitch label.
    pub fn display_name(&self) -> String {
        self.annotation
            .clone()
            .unwrap_or_else(|| self.pitch.to_string())
    }
}

/// Decoded note sequence plus the timing scalars it was derived with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    /// Divisions per quarter note
    pub divisions: f64,
    /// Tempo in quarter-note beats per minute
    pub tempo_bpm: f64,
    /// Seconds per division (= 60 / tempo / divisions)
    pub seconds_per_subdivision: f64,
    /// Notes in document order
    pub events: Vec<NoteEvent>,
}

impl Timeline {
    pub fn new(divisions: f64, tempo_bpm: f64) -> Self {
        Self {
            divisions,
            tempo_bpm,
            seconds_per_subdivision: 60.0 / tempo_bpm / divisions,
            events: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// End of the last event in document order.
    pub fn end_time(&self) -> Option<f64> {
        self.events.last().map(NoteEvent::end_time)
    }

    /// Events sounding at `time`, in document order.
    pub fn active_at(&self, time: f64) -> impl Iterator<Item = &NoteEvent> + '_ {
        self.events.iter().filter(move |e| e.is_active_at(time))
    }
}
