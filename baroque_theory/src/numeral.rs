// Roman-numeral harmony labels and their resolution to chord symbols.
//
// Grammar: optional accidental prefix (`b`, `#`), a roman numeral I..VII
// whose case gives the triad quality (upper = major, lower = minor), then an
// optional suffix: `°`/`o` diminished, `+` augmented, `7` seventh, `°7`
// diminished seventh, `ø7` half-diminished seventh, `maj7` major seventh.
//
// The root is the scale degree of the supplied scale. Callers pick the
// scale: for minor keys the composer passes natural minor for most
// numerals and harmonic minor for the leading-tone family, so that `VI` in
// D minor is Bb while `vii°` is C#.

use crate::chord::{ChordQuality, ChordSymbol};
use crate::error::TheoryError;
use crate::pitch::PitchClass;
use crate::scale::{ScaleType, scale_notes};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RomanNumeral {
    /// Chromatic alteration of the root (-1 for `bVI`).
    pub accidental: i8,
    /// Scale degree, 1..=7.
    pub degree: u8,
    pub quality: ChordQuality,
}

const ROMANS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

impl RomanNumeral {
    pub fn has_seventh(self) -> bool {
        self.quality.has_seventh()
    }

    /// Root of this numeral in `scale` on `tonic`.
    pub fn root_in(self, tonic: PitchClass, scale: ScaleType) -> PitchClass {
        let degree_class = scale_notes(tonic, scale)[(self.degree - 1) as usize];
        PitchClass::new(
            degree_class.letter(),
            degree_class.accidental() + self.accidental,
        )
    }
}

impl FromStr for RomanNumeral {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || TheoryError::UnknownNumeral(s.to_string());
        let mut rest = s.trim();

        let mut accidental: i8 = 0;
        while let Some(c) = rest.chars().next() {
            match c {
                'b' | '♭' => accidental -= 1,
                '#' | '♯' => accidental += 1,
                _ => break,
            }
            rest = &rest[c.len_utf8()..];
        }

        let roman_len = rest
            .find(|c: char| !matches!(c, 'I' | 'V' | 'i' | 'v'))
            .unwrap_or(rest.len());
        let (roman, suffix) = rest.split_at(roman_len);
        if roman.is_empty() {
            return Err(unknown());
        }
        let upper = roman.chars().all(|c| c.is_ascii_uppercase());
        let lower = roman.chars().all(|c| c.is_ascii_lowercase());
        if !upper && !lower {
            return Err(unknown());
        }
        let degree = ROMANS
            .iter()
            .position(|r| r.eq_ignore_ascii_case(roman))
            .ok_or_else(unknown)? as u8
            + 1;

        let quality = match (upper, suffix) {
            (true, "") => ChordQuality::Major,
            (false, "") => ChordQuality::Minor,
            (false, "°" | "o" | "dim") => ChordQuality::Diminished,
            (true, "+" | "aug") => ChordQuality::Augmented,
            (true, "7") => ChordQuality::Dominant7,
            (_, "maj7" | "M7") => ChordQuality::Major7,
            (false, "7") => ChordQuality::Minor7,
            (false, "°7" | "o7") => ChordQuality::Diminished7,
            (false, "ø7" | "ø") => ChordQuality::HalfDiminished7,
            _ => return Err(unknown()),
        };

        Ok(Self {
            accidental,
            degree,
            quality,
        })
    }
}

impl fmt::Display for RomanNumeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.accidental > 0 { "#" } else { "b" };
        for _ in 0..self.accidental.unsigned_abs() {
            write!(f, "{prefix}")?;
        }
        let roman = ROMANS[(self.degree - 1) as usize];
        let major_family = matches!(
            self.quality,
            ChordQuality::Major
                | ChordQuality::Augmented
                | ChordQuality::Dominant7
                | ChordQuality::Major7
        );
        if major_family {
            write!(f, "{roman}")?;
        } else {
            write!(f, "{}", roman.to_ascii_lowercase())?;
        }
        let suffix = match self.quality {
            ChordQuality::Major | ChordQuality::Minor => "",
            ChordQuality::Diminished => "°",
            ChordQuality::Augmented => "+",
            ChordQuality::Dominant7 | ChordQuality::Minor7 => "7",
            ChordQuality::Major7 => "maj7",
            ChordQuality::HalfDiminished7 => "ø7",
            ChordQuality::Diminished7 => "°7",
        };
        write!(f, "{suffix}")
    }
}

/// Resolve `numeral` against the scale on `tonic`.
pub fn roman_numeral_to_chord_symbol(
    tonic: PitchClass,
    scale: ScaleType,
    numeral: &str,
) -> Result<ChordSymbol, TheoryError> {
    let parsed: RomanNumeral = numeral.parse()?;
    Ok(ChordSymbol::new(parsed.root_in(tonic, scale), parsed.quality))
}
