// Spelled pitch classes and pitches.
//
// `PitchClass` is a letter plus a signed accidental count (-2 = double flat,
// +1 = sharp). `Pitch` adds a scientific-pitch octave, with C4 = MIDI 60.
// Octave numbers follow the letter, not the sounding pitch: B#3 and C4 are
// both MIDI 60, and Cb4 is MIDI 59.
//
// Both types serialize as their display strings ("F#", "Bb3") so JSON
// output reads the way musicians write.

use crate::error::TheoryError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    pub fn index(self) -> i32 {
        self as i32
    }

    /// Letter for any diatonic index, wrapping modulo 7.
    pub fn from_index(index: i32) -> Letter {
        Self::ALL[index.rem_euclid(7) as usize]
    }

    /// Semitone of the natural (unaltered) letter above C.
    pub fn natural_semitone(self) -> i32 {
        const NATURALS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];
        NATURALS[self.index() as usize]
    }

    fn from_char(c: char) -> Option<Letter> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        ['C', 'D', 'E', 'F', 'G', 'A', 'B'][self.index() as usize]
    }
}

/// A letter with accidentals, independent of octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitchClass {
    letter: Letter,
    accidental: i8,
}

impl PitchClass {
    pub const fn new(letter: Letter, accidental: i8) -> Self {
        Self { letter, accidental }
    }

    pub const fn natural(letter: Letter) -> Self {
        Self::new(letter, 0)
    }

    pub fn letter(self) -> Letter {
        self.letter
    }

    pub fn accidental(self) -> i8 {
        self.accidental
    }

    /// Sounding pitch class, 0 (C) through 11 (B).
    pub fn semitone(self) -> u8 {
        (self.letter.natural_semitone() + self.accidental as i32).rem_euclid(12) as u8
    }

    pub fn is_enharmonic(self, other: PitchClass) -> bool {
        self.semitone() == other.semitone()
    }

    /// Spell a semitone with sharps (C, C#, D, ...).
    pub fn with_sharps(semitone: u8) -> Self {
        const SHARPS: [(Letter, i8); 12] = [
            (Letter::C, 0),
            (Letter::C, 1),
            (Letter::D, 0),
            (Letter::D, 1),
            (Letter::E, 0),
            (Letter::F, 0),
            (Letter::F, 1),
            (Letter::G, 0),
            (Letter::G, 1),
            (Letter::A, 0),
            (Letter::A, 1),
            (Letter::B, 0),
        ];
        let (letter, acc) = SHARPS[(semitone % 12) as usize];
        Self::new(letter, acc)
    }

    /// Spell a semitone with flats (C, Db, D, ...).
    pub fn with_flats(semitone: u8) -> Self {
        const FLATS: [(Letter, i8); 12] = [
            (Letter::C, 0),
            (Letter::D, -1),
            (Letter::D, 0),
            (Letter::E, -1),
            (Letter::E, 0),
            (Letter::F, 0),
            (Letter::G, -1),
            (Letter::G, 0),
            (Letter::A, -1),
            (Letter::A, 0),
            (Letter::B, -1),
            (Letter::B, 0),
        ];
        let (letter, acc) = FLATS[(semitone % 12) as usize];
        Self::new(letter, acc)
    }

    /// Enharmonic simplification: drop double accidentals and the white-key
    /// oddities (E#, B#, Fb, Cb). Single sharps and flats on other letters
    /// are left alone, so Db stays Db and F# stays F#.
    pub fn simplify(self) -> Self {
        let odd_white_key = matches!(
            (self.letter, self.accidental),
            (Letter::E, 1) | (Letter::B, 1) | (Letter::F, -1) | (Letter::C, -1)
        );
        if self.accidental.abs() <= 1 && !odd_white_key {
            return self;
        }
        if self.accidental > 0 {
            Self::with_sharps(self.semitone())
        } else {
            Self::with_flats(self.semitone())
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter.as_char())?;
        let symbol = if self.accidental > 0 { '#' } else { 'b' };
        for _ in 0..self.accidental.unsigned_abs() {
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

/// Parse a leading letter plus accidentals; returns the class and the
/// unconsumed remainder.
pub(crate) fn parse_class_prefix(s: &str) -> Option<(PitchClass, &str)> {
    let mut chars = s.char_indices();
    let (_, first) = chars.next()?;
    let letter = Letter::from_char(first)?;
    let mut accidental: i8 = 0;
    let mut rest_at = first.len_utf8();
    for (i, c) in chars {
        let delta = match c {
            '#' | '♯' => 1,
            'x' | '𝄪' => 2,
            'b' | '♭' => -1,
            _ => break,
        };
        accidental = accidental.checked_add(delta)?;
        rest_at = i + c.len_utf8();
    }
    Some((PitchClass::new(letter, accidental), &s[rest_at..]))
}

impl FromStr for PitchClass {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match parse_class_prefix(trimmed) {
            Some((class, "")) => Ok(class),
            _ => Err(TheoryError::InvalidPitch(s.to_string())),
        }
    }
}

/// A pitch class at a specific octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    class: PitchClass,
    octave: i8,
}

impl Pitch {
    pub const fn new(class: PitchClass, octave: i8) -> Self {
        Self { class, octave }
    }

    pub fn class(self) -> PitchClass {
        self.class
    }

    pub fn octave(self) -> i8 {
        self.octave
    }

    pub fn midi(self) -> i32 {
        (self.octave as i32 + 1) * 12
            + self.class.letter.natural_semitone()
            + self.class.accidental as i32
    }

    /// Position on the white-key staff: octave * 7 + letter index.
    pub fn diatonic_index(self) -> i32 {
        self.octave as i32 * 7 + self.class.letter.index()
    }

    /// Spell a MIDI number with flats, e.g. 61 -> Db4.
    pub fn from_midi(midi: i32) -> Self {
        Self::spelled(midi, PitchClass::with_flats(midi.rem_euclid(12) as u8))
    }

    /// Spell a MIDI number with sharps, e.g. 61 -> C#4.
    pub fn from_midi_sharps(midi: i32) -> Self {
        Self::spelled(midi, PitchClass::with_sharps(midi.rem_euclid(12) as u8))
    }

    /// Spell `midi` using `class`, if the class sounds at that MIDI number.
    ///
    /// The octave is derived from the letter, so `(60, B#)` yields B#3.
    pub fn from_midi_as(midi: i32, class: PitchClass) -> Option<Self> {
        if class.semitone() as i32 != midi.rem_euclid(12) {
            return None;
        }
        Some(Self::spelled(midi, class))
    }

    fn spelled(midi: i32, class: PitchClass) -> Self {
        let natural = midi - class.accidental as i32 - class.letter.natural_semitone();
        let octave = natural.div_euclid(12) - 1;
        Self::new(class, octave as i8)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class, self.octave)
    }
}

impl FromStr for Pitch {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TheoryError::InvalidPitch(s.to_string());
        let (class, rest) = parse_class_prefix(s.trim()).ok_or_else(invalid)?;
        let octave: i8 = rest.parse().map_err(|_| invalid())?;
        Ok(Self::new(class, octave))
    }
}

impl Serialize for PitchClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PitchClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for Pitch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pitch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_numbers() {
        let c4: Pitch = "C4".parse().unwrap();
        assert_eq!(c4.midi(), 60);
        let a4: Pitch = "A4".parse().unwrap();
        assert_eq!(a4.midi(), 69);
        let bs3: Pitch = "B#3".parse().unwrap();
        assert_eq!(bs3.midi(), 60);
        let cb4: Pitch = "Cb4".parse().unwrap();
        assert_eq!(cb4.midi(), 59);
        let e2: Pitch = "E2".parse().unwrap();
        assert_eq!(e2.midi(), 40);
    }

    #[test]
    fn from_midi_spellings() {
        assert_eq!(Pitch::from_midi(61).to_string(), "Db4");
        assert_eq!(Pitch::from_midi_sharps(61).to_string(), "C#4");
        assert_eq!(Pitch::from_midi(59).to_string(), "B3");
        let bs = PitchClass::new(Letter::B, 1);
        assert_eq!(Pitch::from_midi_as(60, bs).map(|p| p.to_string()), Some("B#3".into()));
        assert_eq!(Pitch::from_midi_as(61, bs), None);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("H4".parse::<Pitch>().is_err());
        assert!("C".parse::<Pitch>().is_err());
        assert!("C#z".parse::<PitchClass>().is_err());
        assert!("".parse::<PitchClass>().is_err());
    }

    #[test]
    fn parse_accepts_lowercase_and_unicode() {
        let pc: PitchClass = "eb".parse().unwrap();
        assert_eq!(pc.to_string(), "Eb");
        let pc: PitchClass = "F♯".parse().unwrap();
        assert_eq!(pc.to_string(), "F#");
    }

    #[test]
    fn simplify_enharmonics() {
        let cases = [("E#", "F"), ("B#", "C"), ("Cb", "B"), ("Fb", "E"), ("F##", "G"), ("Dbb", "C"), ("Db", "Db"), ("F#", "F#")];
        for (input, expected) in cases {
            let pc: PitchClass = input.parse().unwrap();
            assert_eq!(pc.simplify().to_string(), expected, "simplifying {input}");
        }
    }

    #[test]
    fn serde_as_strings() {
        let p: Pitch = "C#4".parse().unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"C#4\"");
        let back: Pitch = serde_json::from_str("\"C#4\"").unwrap();
        assert_eq!(back, p);
    }
}
