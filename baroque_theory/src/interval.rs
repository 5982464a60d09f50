// Diatonic intervals.
//
// An interval carries both a signed diatonic step count (0 = unison,
// 4 = fifth, 7 = octave) and a signed semitone count. Keeping both is what
// distinguishes an augmented fourth from a diminished fifth, and lets
// `transpose` pick the right letter.
//
// Display follows number-then-quality notation: "5P", "3M", "-2m", "4A",
// "7d", "10M".

use crate::error::TheoryError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    steps: i32,
    semitones: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Perfect,
    Major,
    Minor,
    /// Augmented by the given number of semitones beyond major/perfect.
    Augmented(u8),
    /// Diminished by the given number of semitones below minor/perfect.
    Diminished(u8),
}

/// Reference semitones for each simple step in the major scale.
const MAJOR_REFERENCE: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

fn is_perfect_type(simple_steps: i32) -> bool {
    matches!(simple_steps, 0 | 3 | 4)
}

impl Interval {
    pub const UNISON: Interval = Interval::new(0, 0);
    pub const MINOR_SECOND: Interval = Interval::new(1, 1);
    pub const MAJOR_SECOND: Interval = Interval::new(1, 2);
    pub const MINOR_THIRD: Interval = Interval::new(2, 3);
    pub const MAJOR_THIRD: Interval = Interval::new(2, 4);
    pub const PERFECT_FOURTH: Interval = Interval::new(3, 5);
    pub const AUGMENTED_FOURTH: Interval = Interval::new(3, 6);
    pub const DIMINISHED_FIFTH: Interval = Interval::new(4, 6);
    pub const PERFECT_FIFTH: Interval = Interval::new(4, 7);
    pub const AUGMENTED_FIFTH: Interval = Interval::new(4, 8);
    pub const MINOR_SIXTH: Interval = Interval::new(5, 8);
    pub const MAJOR_SIXTH: Interval = Interval::new(5, 9);
    pub const DIMINISHED_SEVENTH: Interval = Interval::new(6, 9);
    pub const MINOR_SEVENTH: Interval = Interval::new(6, 10);
    pub const MAJOR_SEVENTH: Interval = Interval::new(6, 11);
    pub const OCTAVE: Interval = Interval::new(7, 12);

    pub const fn new(steps: i32, semitones: i32) -> Self {
        Self { steps, semitones }
    }

    pub fn steps(self) -> i32 {
        self.steps
    }

    pub fn semitones(self) -> i32 {
        self.semitones
    }

    /// Conventional interval number: 1 for unison, 5 for a fifth, negative
    /// when descending.
    pub fn number(self) -> i32 {
        if self.steps >= 0 {
            self.steps + 1
        } else {
            self.steps - 1
        }
    }

    pub fn is_descending(self) -> bool {
        self.steps < 0 || (self.steps == 0 && self.semitones < 0)
    }

    /// The same interval pointing downward.
    pub fn descending(self) -> Self {
        Self::new(-self.steps.abs(), -self.semitones.abs())
    }

    pub fn is_compound(self) -> bool {
        self.steps.abs() > 7
    }

    /// Reduce a compound interval to within an octave, keeping direction.
    ///
    /// The octave itself stays an octave (it is already simple), while a
    /// double octave reduces to an octave and a ninth to a second.
    pub fn simplify(self) -> Self {
        let sign = if self.is_descending() { -1 } else { 1 };
        let mut steps = self.steps.abs();
        let mut semis = self.semitones.abs();
        while steps > 7 {
            steps -= 7;
            semis -= 12;
        }
        Self::new(sign * steps, sign * semis)
    }

    pub fn quality(self) -> Quality {
        let steps = self.steps.abs();
        let simple = steps % 7;
        let octaves = steps / 7;
        let reduced = self.semitones.abs() - 12 * octaves;
        let diff = reduced - MAJOR_REFERENCE[simple as usize];
        if is_perfect_type(simple) {
            match diff {
                0 => Quality::Perfect,
                d if d > 0 => Quality::Augmented(d as u8),
                d => Quality::Diminished((-d) as u8),
            }
        } else {
            match diff {
                0 => Quality::Major,
                -1 => Quality::Minor,
                d if d > 0 => Quality::Augmented(d as u8),
                d => Quality::Diminished((-d - 1) as u8),
            }
        }
    }

    /// Perfect unison, fifth, or octave (or their compounds).
    pub fn is_perfect_consonance(self) -> bool {
        let simple = self.steps.abs() % 7;
        matches!(simple, 0 | 4) && self.quality() == Quality::Perfect
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())?;
        match self.quality() {
            Quality::Perfect => write!(f, "P"),
            Quality::Major => write!(f, "M"),
            Quality::Minor => write!(f, "m"),
            Quality::Augmented(n) => write!(f, "{}", "A".repeat(n as usize)),
            Quality::Diminished(n) => write!(f, "{}", "d".repeat(n as usize)),
        }
    }
}

impl FromStr for Interval {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TheoryError::InvalidInterval(s.to_string());
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(invalid)?;
        let (num_part, quality_part) = trimmed.split_at(split);
        let number: i32 = num_part.parse().map_err(|_| invalid())?;
        if number == 0 {
            return Err(invalid());
        }
        let steps = number.abs() - 1;
        let simple = steps % 7;
        let octaves = steps / 7;
        let reference = MAJOR_REFERENCE[simple as usize] + 12 * octaves;
        let count = quality_part.len() as i32;
        let semis = match quality_part.chars().next() {
            Some('P') if count == 1 && is_perfect_type(simple) => reference,
            Some('M') if count == 1 && !is_perfect_type(simple) => reference,
            Some('m') if count == 1 && !is_perfect_type(simple) => reference - 1,
            Some('A') if quality_part.chars().all(|c| c == 'A') => reference + count,
            Some('d') if quality_part.chars().all(|c| c == 'd') => {
                if is_perfect_type(simple) {
                    reference - count
                } else {
                    reference - 1 - count
                }
            }
            _ => return Err(invalid()),
        };
        let sign = number.signum();
        Ok(Self::new(sign * steps, sign * semis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_qualities() {
        assert_eq!(Interval::PERFECT_FIFTH.to_string(), "5P");
        assert_eq!(Interval::MINOR_THIRD.to_string(), "3m");
        assert_eq!(Interval::AUGMENTED_FOURTH.to_string(), "4A");
        assert_eq!(Interval::DIMINISHED_FIFTH.to_string(), "5d");
        assert_eq!(Interval::DIMINISHED_SEVENTH.to_string(), "7d");
        assert_eq!(Interval::OCTAVE.to_string(), "8P");
        assert_eq!(Interval::MAJOR_SECOND.descending().to_string(), "-2M");
    }

    #[test]
    fn parse_matches_constants() {
        assert_eq!("5P".parse::<Interval>().unwrap(), Interval::PERFECT_FIFTH);
        assert_eq!("-3m".parse::<Interval>().unwrap(), Interval::MINOR_THIRD.descending());
        assert_eq!("7d".parse::<Interval>().unwrap(), Interval::DIMINISHED_SEVENTH);
        assert_eq!("10M".parse::<Interval>().unwrap(), Interval::new(9, 16));
        assert!("5M".parse::<Interval>().is_err());
        assert!("3P".parse::<Interval>().is_err());
        assert!("0P".parse::<Interval>().is_err());
    }

    #[test]
    fn simplify_keeps_direction() {
        let down_ninth = Interval::new(-8, -14);
        assert_eq!(down_ninth.simplify(), Interval::new(-1, -2));
        assert_eq!(Interval::new(14, 24).simplify(), Interval::OCTAVE);
        assert_eq!(Interval::PERFECT_FIFTH.simplify(), Interval::PERFECT_FIFTH);
    }

    #[test]
    fn perfect_consonances() {
        assert!(Interval::PERFECT_FIFTH.is_perfect_consonance());
        assert!(Interval::OCTAVE.is_perfect_consonance());
        assert!(Interval::new(11, 19).is_perfect_consonance());
        assert!(!Interval::PERFECT_FOURTH.is_perfect_consonance());
        assert!(!Interval::DIMINISHED_FIFTH.is_perfect_consonance());
    }
}
