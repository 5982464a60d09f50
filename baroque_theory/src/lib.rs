// Pitch arithmetic for the Baroque composer.
//
// Everything here works on *spelled* pitches: C# and Db are different
// values that happen to share a MIDI number. Spelling matters because the
// composer transposes subjects by diatonic intervals, resolves roman
// numerals against a key, and reports pitches as strings like "F#4".
//
// Module map:
// - `pitch`   : `Letter`, `PitchClass`, `Pitch` with MIDI conversion and parsing.
// - `interval`: diatonic `Interval` (steps + semitones), quality, simplification.
// - `scale`   : `ScaleType` and `scale_notes`.
// - `chord`   : `ChordQuality`, `ChordSymbol`, `chord_tones`.
// - `numeral` : `RomanNumeral` parsing and `roman_numeral_to_chord_symbol`.
// - `error`   : `TheoryError`, returned by every fallible lookup.
//
// The free functions re-exported below (`transpose`, `distance`,
// `semitones`, `simplify`, `scale_notes`, `chord_tones`,
// `roman_numeral_to_chord_symbol`) are the interface the composer calls.
// Fallible ones return `Result` so that callers choose their own fallback.

pub mod chord;
pub mod error;
pub mod interval;
pub mod numeral;
pub mod pitch;
pub mod scale;

pub use chord::{ChordQuality, ChordSymbol, chord_tones};
pub use error::TheoryError;
pub use interval::{Interval, Quality};
pub use numeral::{RomanNumeral, roman_numeral_to_chord_symbol};
pub use pitch::{Letter, Pitch, PitchClass};
pub use scale::{ScaleType, scale_notes};

/// Move `pitch` by `interval`, keeping diatonic spelling.
///
/// The letter advances by the interval's step count and the accidental is
/// whatever makes the semitone count come out right, so `E4 + 3M = G#4` and
/// `B3 + 2m = C4`.
pub fn transpose(pitch: Pitch, interval: Interval) -> Pitch {
    let target_index = pitch.diatonic_index() + interval.steps();
    let letter = Letter::from_index(target_index);
    let octave = target_index.div_euclid(7);
    let target_midi = pitch.midi() + interval.semitones();
    let natural_midi = (octave + 1) * 12 + letter.natural_semitone();
    let accidental = (target_midi - natural_midi) as i8;
    Pitch::new(PitchClass::new(letter, accidental), octave as i8)
}

/// Transpose a bare pitch class, ignoring octave.
pub fn transpose_class(class: PitchClass, interval: Interval) -> PitchClass {
    transpose(Pitch::new(class, 4), interval).class()
}

/// Interval from `a` up (or down) to `b`.
pub fn distance(a: Pitch, b: Pitch) -> Interval {
    Interval::new(b.diatonic_index() - a.diatonic_index(), b.midi() - a.midi())
}

pub fn semitones(interval: Interval) -> i32 {
    interval.semitones()
}

/// Reduce a compound interval to its simple form. See [`Interval::simplify`].
pub fn simplify(interval: Interval) -> Interval {
    interval.simplify()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Pitch {
        s.parse().unwrap()
    }

    #[test]
    fn transpose_keeps_spelling() {
        assert_eq!(transpose(p("E4"), Interval::MAJOR_THIRD).to_string(), "G#4");
        assert_eq!(transpose(p("B3"), Interval::MINOR_SECOND).to_string(), "C4");
        assert_eq!(transpose(p("D4"), Interval::PERFECT_FIFTH).to_string(), "A4");
        assert_eq!(transpose(p("A4"), Interval::PERFECT_FOURTH).to_string(), "D5");
        assert_eq!(transpose(p("F4"), Interval::PERFECT_FOURTH).to_string(), "Bb4");
    }

    #[test]
    fn transpose_downward() {
        let down_fifth = Interval::PERFECT_FIFTH.descending();
        assert_eq!(transpose(p("C4"), down_fifth).to_string(), "F3");
        let down_third = Interval::MINOR_THIRD.descending();
        assert_eq!(transpose(p("C4"), down_third).to_string(), "A3");
    }

    #[test]
    fn distance_and_semitones() {
        let i = distance(p("C4"), p("G4"));
        assert_eq!(i, Interval::PERFECT_FIFTH);
        assert_eq!(semitones(i), 7);
        let down = distance(p("G4"), p("C4"));
        assert_eq!(down.semitones(), -7);
        assert_eq!(down.to_string(), "-5P");
    }

    #[test]
    fn simplify_compound() {
        let tenth = distance(p("C3"), p("E4"));
        assert_eq!(tenth.to_string(), "10M");
        assert_eq!(simplify(tenth).to_string(), "3M");
        let octave = distance(p("C3"), p("C4"));
        assert_eq!(simplify(octave).to_string(), "8P");
    }

    #[test]
    fn transpose_class_wraps_octave() {
        let g: PitchClass = "G".parse().unwrap();
        assert_eq!(transpose_class(g, Interval::PERFECT_FIFTH).to_string(), "D");
    }
}
