//! Violin fingerboard positions.
//!
//! Maps a spelled pitch to the (fret, string) coordinate drawn on the
//! fingerboard. The four strings are G3, D4, A4 and E5; each string covers
//! sixteen chromatic positions starting from the open string.
//!
//! String ranges overlap (D4 is both fret 7 on the G string and the open D
//! string). The table keeps exactly one coordinate per pitch: strings are
//! entered from low to high and a later string overwrites an earlier one,
//! so overlapping pitches always resolve to the highest string that has them.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::model::{Accidental, Pitch, Step};

/// Open-string pitches from lowest to highest.
pub const STRINGS: [Pitch; 4] = [
    Pitch::natural(Step::G, 3),
    Pitch::natural(Step::D, 4),
    Pitch::natural(Step::A, 4),
    Pitch::natural(Step::E, 5),
];

/// Positions per string, open string included.
pub const FRETS_PER_STRING: usize = 16;

/// A fingerboard coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// 0 = open string
    pub fret: usize,
    /// Index into `STRINGS`
    pub string: usize,
}

/// Immutable pitch → position lookup.
#[derive(Debug, Clone)]
pub struct PositionTable {
    positions: HashMap<Pitch, Position>,
}

impl PositionTable {
    /// The fixed four-string violin layout, sharp-spelled.
    pub fn violin() -> Self {
        let mut positions = HashMap::new();
        for (string, open) in STRINGS.iter().enumerate() {
            for fret in 0..FRETS_PER_STRING {
                let pitch = Pitch::from_midi_sharp(open.to_midi() + fret as i32);
                positions.insert(pitch, Position { fret, string });
            }
        }
        Self { positions }
    }

    /// Shared table, built on first use.
    pub fn shared() -> &'static Self {
        static TABLE: OnceLock<PositionTable> = OnceLock::new();
        TABLE.get_or_init(Self::violin)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Direct lookup, then one retry with an enharmonic respelling.
    /// `None` means the pitch is not playable in this layout.
    pub fn resolve(&self, pitch: &Pitch) -> Option<Position> {
        self.positions
            .get(pitch)
            .or_else(|| respell(*pitch).and_then(|p| self.positions.get(&p)))
            .copied()
    }
}

/// The single rewrite attempted when a spelling is missing from the table.
///
/// Double accidentals are dropped outright (`C##4` → `C4`), matching the
/// way labels were simplified historically, not the sounding pitch.
fn respell(pitch: Pitch) -> Option<Pitch> {
    let Pitch {
        step,
        accidental,
        octave,
    } = pitch;
    if accidental.is_double() {
        return Some(Pitch::natural(step, octave));
    }
    match (step, accidental) {
        (Step::C, Accidental::Flat) => Some(Pitch::natural(Step::B, octave - 1)),
        (Step::B, Accidental::Sharp) => Some(Pitch::natural(Step::C, octave + 1)),
        (Step::F, Accidental::Flat) => Some(Pitch::natural(Step::E, octave)),
        (Step::E, Accidental::Sharp) => Some(Pitch::natural(Step::F, octave)),
        // remaining flats: the table is sharp-spelled
        (_, Accidental::Flat) => Some(Pitch::from_midi_sharp(pitch.to_midi())),
        _ => None,
    }
}

/// Finger-position label printed for a fret index.
pub fn finger_label(fret: usize) -> String {
    match fret {
        0 => "0".to_string(),
        1 => "-1".to_string(),
        2 => "1".to_string(),
        3 => "2".to_string(),
        4 => "2+".to_string(),
        n => (n - 2).to_string(),
    }
}
