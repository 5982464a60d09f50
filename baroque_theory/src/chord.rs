// Chord symbols ("G7", "F#dim", "Bbmaj7") and their tones.

use crate::error::TheoryError;
use crate::interval::Interval;
use crate::pitch::{PitchClass, parse_class_prefix};
use crate::transpose_class;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished7,
    Diminished7,
}

impl ChordQuality {
    /// Intervals above the root: root, third, fifth, and seventh if any.
    pub fn intervals(self) -> &'static [Interval] {
        use Interval as I;
        match self {
            ChordQuality::Major => &[I::UNISON, I::MAJOR_THIRD, I::PERFECT_FIFTH],
            ChordQuality::Minor => &[I::UNISON, I::MINOR_THIRD, I::PERFECT_FIFTH],
            ChordQuality::Diminished => &[I::UNISON, I::MINOR_THIRD, I::DIMINISHED_FIFTH],
            ChordQuality::Augmented => &[I::UNISON, I::MAJOR_THIRD, I::AUGMENTED_FIFTH],
            ChordQuality::Dominant7 => &[
                I::UNISON,
                I::MAJOR_THIRD,
                I::PERFECT_FIFTH,
                I::MINOR_SEVENTH,
            ],
            ChordQuality::Major7 => &[
                I::UNISON,
                I::MAJOR_THIRD,
                I::PERFECT_FIFTH,
                I::MAJOR_SEVENTH,
            ],
            ChordQuality::Minor7 => &[
                I::UNISON,
                I::MINOR_THIRD,
                I::PERFECT_FIFTH,
                I::MINOR_SEVENTH,
            ],
            ChordQuality::HalfDiminished7 => &[
                I::UNISON,
                I::MINOR_THIRD,
                I::DIMINISHED_FIFTH,
                I::MINOR_SEVENTH,
            ],
            ChordQuality::Diminished7 => &[
                I::UNISON,
                I::MINOR_THIRD,
                I::DIMINISHED_FIFTH,
                I::DIMINISHED_SEVENTH,
            ],
        }
    }

    pub fn has_seventh(self) -> bool {
        self.intervals().len() == 4
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::HalfDiminished7 => "m7b5",
            ChordQuality::Diminished7 => "dim7",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        let quality = match suffix {
            "" | "M" | "maj" => ChordQuality::Major,
            "m" | "min" | "-" => ChordQuality::Minor,
            "dim" | "°" | "o" => ChordQuality::Diminished,
            "aug" | "+" => ChordQuality::Augmented,
            "7" | "dom7" => ChordQuality::Dominant7,
            "maj7" | "M7" | "Δ7" => ChordQuality::Major7,
            "m7" | "min7" | "-7" => ChordQuality::Minor7,
            "m7b5" | "ø7" | "ø" => ChordQuality::HalfDiminished7,
            "dim7" | "°7" | "o7" => ChordQuality::Diminished7,
            _ => return None,
        };
        Some(quality)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChordSymbol {
    root: PitchClass,
    quality: ChordQuality,
}

impl ChordSymbol {
    pub fn new(root: PitchClass, quality: ChordQuality) -> Self {
        Self { root, quality }
    }

    pub fn root(self) -> PitchClass {
        self.root
    }

    pub fn quality(self) -> ChordQuality {
        self.quality
    }

    /// `[root, third, fifth, (seventh)]`, spelled from the root.
    pub fn tones(self) -> Vec<PitchClass> {
        self.quality
            .intervals()
            .iter()
            .map(|&i| transpose_class(self.root, i))
            .collect()
    }
}

impl fmt::Display for ChordSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root, self.quality.suffix())
    }
}

impl FromStr for ChordSymbol {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || TheoryError::UnknownChord(s.to_string());
        let (root, suffix) = parse_class_prefix(s.trim()).ok_or_else(unknown)?;
        let quality = ChordQuality::from_suffix(suffix).ok_or_else(unknown)?;
        Ok(Self::new(root, quality))
    }
}

/// Tones of a chord given by symbol string.
pub fn chord_tones(symbol: &str) -> Result<Vec<PitchClass>, TheoryError> {
    Ok(symbol.parse::<ChordSymbol>()?.tones())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tone_names(symbol: &str) -> Vec<String> {
        chord_tones(symbol)
            .unwrap()
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn triads_and_sevenths() {
        assert_eq!(tone_names("C"), ["C", "E", "G"]);
        assert_eq!(tone_names("Dm"), ["D", "F", "A"]);
        assert_eq!(tone_names("C#dim"), ["C#", "E", "G"]);
        assert_eq!(tone_names("G7"), ["G", "B", "D", "F"]);
        assert_eq!(tone_names("C#dim7"), ["C#", "E", "G", "Bb"]);
        assert_eq!(tone_names("Bm7b5"), ["B", "D", "F", "A"]);
        assert_eq!(tone_names("Bbmaj7"), ["Bb", "D", "F", "A"]);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for symbol in ["F#m", "Ebaug", "A7", "Gm7", "Dbmaj7", "Bdim"] {
            let parsed: ChordSymbol = symbol.parse().unwrap();
            assert_eq!(parsed.to_string(), symbol);
        }
    }

    #[test]
    fn unknown_symbols_fail() {
        assert!(chord_tones("Csus4").is_err());
        assert!(chord_tones("X7").is_err());
    }
}
