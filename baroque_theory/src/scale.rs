// Seven-note scales built by transposing a tonic through a fixed interval
// pattern, so spellings stay diatonic (D harmonic minor gives C#, not Db).

use crate::error::TheoryError;
use crate::interval::Interval;
use crate::pitch::PitchClass;
use crate::transpose_class;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleType {
    Major,
    NaturalMinor,
    HarmonicMinor,
    /// Ascending form (raised 6th and 7th).
    MelodicMinor,
}

impl ScaleType {
    pub fn intervals(self) -> [Interval; 7] {
        use Interval as I;
        match self {
            ScaleType::Major => [
                I::UNISON,
                I::MAJOR_SECOND,
                I::MAJOR_THIRD,
                I::PERFECT_FOURTH,
                I::PERFECT_FIFTH,
                I::MAJOR_SIXTH,
                I::MAJOR_SEVENTH,
            ],
            ScaleType::NaturalMinor => [
                I::UNISON,
                I::MAJOR_SECOND,
                I::MINOR_THIRD,
                I::PERFECT_FOURTH,
                I::PERFECT_FIFTH,
                I::MINOR_SIXTH,
                I::MINOR_SEVENTH,
            ],
            ScaleType::HarmonicMinor => [
                I::UNISON,
                I::MAJOR_SECOND,
                I::MINOR_THIRD,
                I::PERFECT_FOURTH,
                I::PERFECT_FIFTH,
                I::MINOR_SIXTH,
                I::MAJOR_SEVENTH,
            ],
            ScaleType::MelodicMinor => [
                I::UNISON,
                I::MAJOR_SECOND,
                I::MINOR_THIRD,
                I::PERFECT_FOURTH,
                I::PERFECT_FIFTH,
                I::MAJOR_SIXTH,
                I::MAJOR_SEVENTH,
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Major => "major",
            ScaleType::NaturalMinor => "minor",
            ScaleType::HarmonicMinor => "harmonic minor",
            ScaleType::MelodicMinor => "melodic minor",
        }
    }
}

impl FromStr for ScaleType {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" | "ionian" => Ok(ScaleType::Major),
            "minor" | "natural minor" | "aeolian" => Ok(ScaleType::NaturalMinor),
            "harmonic minor" => Ok(ScaleType::HarmonicMinor),
            "melodic minor" => Ok(ScaleType::MelodicMinor),
            _ => Err(TheoryError::UnknownScale(s.to_string())),
        }
    }
}

/// The seven pitch classes of `scale` on `tonic`, tonic first.
pub fn scale_notes(tonic: PitchClass, scale: ScaleType) -> [PitchClass; 7] {
    scale.intervals().map(|i| transpose_class(tonic, i))
}

/// String-keyed lookup, for callers holding names rather than typed values.
pub fn scale_notes_named(tonic: &str, scale: &str) -> Result<[PitchClass; 7], TheoryError> {
    Ok(scale_notes(tonic.parse()?, scale.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(notes: [PitchClass; 7]) -> Vec<String> {
        notes.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn major_scales() {
        let c = scale_notes_named("C", "major").unwrap();
        assert_eq!(names(c), ["C", "D", "E", "F", "G", "A", "B"]);
        let eb = scale_notes_named("Eb", "major").unwrap();
        assert_eq!(names(eb), ["Eb", "F", "G", "Ab", "Bb", "C", "D"]);
    }

    #[test]
    fn minor_variants() {
        let d_nat = scale_notes_named("D", "minor").unwrap();
        assert_eq!(names(d_nat), ["D", "E", "F", "G", "A", "Bb", "C"]);
        let d_harm = scale_notes_named("D", "harmonic minor").unwrap();
        assert_eq!(names(d_harm)[6], "C#");
        let a_mel = scale_notes_named("A", "melodic minor").unwrap();
        assert_eq!(names(a_mel), ["A", "B", "C", "D", "E", "F#", "G#"]);
    }

    #[test]
    fn unknown_names_fail() {
        assert!(scale_notes_named("C", "lydian dominant").is_err());
        assert!(scale_notes_named("Q", "major").is_err());
    }
}
