//! Music-theory utilities — pitch classes, the fixed scale catalog, and
//! note-sequence derivation for drone sessions.

use crate::error::DroneError;
use crate::random;
use rand_pcg::Pcg32;

/// The 12 pitch-class names, in ascending semitone order from C.
pub const ROOTS: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// One musical scale: a name plus its ordered semitone intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleDefinition {
    pub name: &'static str,
    pub intervals: &'static [u8],
}

/// The fixed scale catalog.
pub const SCALES: [ScaleDefinition; 9] = [
    ScaleDefinition { name: "Major", intervals: &[2, 2, 1, 2, 2, 2] },
    ScaleDefinition { name: "Minor", intervals: &[2, 1, 2, 2, 1, 2] },
    ScaleDefinition { name: "HarmonicMinor", intervals: &[2, 1, 2, 2, 1, 3] },
    ScaleDefinition { name: "Dorian", intervals: &[2, 1, 2, 2, 2, 1] },
    ScaleDefinition { name: "Mixolydian", intervals: &[2, 2, 1, 2, 2, 1] },
    ScaleDefinition { name: "Phrygian", intervals: &[1, 2, 2, 2, 1, 2] },
    ScaleDefinition { name: "Lydian", intervals: &[2, 2, 2, 1, 2, 2] },
    ScaleDefinition { name: "PentatonicMinor", intervals: &[3, 2, 2, 3] },
    ScaleDefinition { name: "Blues", intervals: &[3, 2, 1, 1, 3] },
];

/// A concrete note: pitch class plus octave, stored as a MIDI number
/// (C4 = 60). Ordering follows pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Note {
    midi: i32,
}

impl Note {
    /// Build a note from a pitch-class index (0 = C .. 11 = B) and octave.
    pub fn new(pitch_class: i32, octave: i32) -> Self {
        Note { midi: (octave + 1) * 12 + pitch_class }
    }

    /// Parse a note name with optional octave suffix, e.g. "C", "F#3", "Bb0".
    pub fn from_name(name: &str) -> Option<Self> {
        let (pc, rest) = parse_pitch_class(name)?;
        let octave: i32 = if rest.is_empty() { 4 } else { rest.parse().ok()? };
        Some(Note::new(pc, octave))
    }

    /// The nearest note to a frequency in Hz (A4 = 440).
    pub fn from_frequency(freq: f64) -> Option<Self> {
        if freq <= 0.0 {
            return None;
        }
        let midi = (69.0 + 12.0 * (freq / 440.0).log2()).round() as i32;
        Some(Note { midi })
    }

    /// Transpose by a signed number of semitones.
    pub fn transpose(self, semitones: i32) -> Self {
        Note { midi: self.midi + semitones }
    }

    /// Frequency in Hz: `440 * 2^((midi - 69) / 12)`.
    pub fn frequency(&self) -> f64 {
        440.0 * (2.0_f64).powf((self.midi as f64 - 69.0) / 12.0)
    }

    pub fn midi(&self) -> i32 {
        self.midi
    }

    /// Pitch-class index (0 = C .. 11 = B).
    pub fn pitch_class(&self) -> i32 {
        self.midi.rem_euclid(12)
    }

    pub fn octave(&self) -> i32 {
        self.midi.div_euclid(12) - 1
    }

    /// Note name with octave, e.g. "C2".
    pub fn name(&self) -> String {
        format!("{}{}", ROOTS[self.pitch_class() as usize], self.octave())
    }
}

/// Parse a pitch-class prefix ("C", "F#", "Bb"), returning the class index
/// and the remaining octave digits.
fn parse_pitch_class(name: &str) -> Option<(i32, &str)> {
    let bytes = name.as_bytes();
    let base = match *bytes.first()? as char {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let mut idx = 1;
    let mut semitone: i32 = base;
    if let Some(&accidental) = bytes.get(1) {
        match accidental as char {
            '#' => {
                semitone += 1;
                idx += 1;
            }
            'b' => {
                semitone -= 1;
                idx += 1;
            }
            _ => {}
        }
    }
    Some((semitone.rem_euclid(12), &name[idx..]))
}

/// The tonic of a scale, given either as a note name or a raw frequency.
/// A frequency is normalised to its nearest pitch class; any octave digits
/// in a name are stripped and re-applied per target octave.
#[derive(Debug, Clone, Copy)]
pub enum Tonic<'a> {
    Name(&'a str),
    Frequency(f64),
}

impl<'a> From<&'a str> for Tonic<'a> {
    fn from(name: &'a str) -> Self {
        Tonic::Name(name)
    }
}

impl From<f64> for Tonic<'_> {
    fn from(freq: f64) -> Self {
        Tonic::Frequency(freq)
    }
}

impl Tonic<'_> {
    fn pitch_class(&self) -> Result<i32, DroneError> {
        match self {
            Tonic::Name(name) => parse_pitch_class(name)
                .map(|(pc, _)| pc)
                .ok_or_else(|| DroneError::InvalidScale {
                    reason: format!("unrecognised tonic '{name}'"),
                }),
            Tonic::Frequency(freq) => Note::from_frequency(*freq)
                .map(|n| n.pitch_class())
                .ok_or_else(|| DroneError::InvalidScale {
                    reason: format!("tonic frequency {freq} is not positive"),
                }),
        }
    }
}

/// Pick one of the 12 pitch classes, uniform random.
pub fn random_root_note(rng: &mut Pcg32) -> &'static str {
    *random::pick(rng, &ROOTS)
}

/// Pick one scale definition from the catalog, uniform random.
pub fn random_scale_type(rng: &mut Pcg32) -> ScaleDefinition {
    *random::pick(rng, &SCALES)
}

/// Derive the note sequence for a scale across an octave range.
///
/// For each octave in `[low_octave, high_octave]` inclusive, the sequence
/// starts at the tonic restated in that octave and transposes successively
/// by each interval, yielding `intervals.len() + 1` notes per octave,
/// concatenated ascending.
pub fn notes_from_scale(
    tonic: Tonic<'_>,
    intervals: &[u8],
    low_octave: i32,
    high_octave: i32,
) -> Result<Vec<Note>, DroneError> {
    if intervals.is_empty() {
        return Err(DroneError::InvalidScale {
            reason: "interval list is empty".to_string(),
        });
    }
    let pc = tonic.pitch_class()?;

    let mut notes = Vec::with_capacity(
        ((high_octave - low_octave + 1).max(0) as usize) * (intervals.len() + 1),
    );
    for octave in low_octave..=high_octave {
        let mut note = Note::new(pc, octave);
        notes.push(note);
        for &interval in intervals {
            note = note.transpose(interval as i32);
            notes.push(note);
        }
    }
    Ok(notes)
}
