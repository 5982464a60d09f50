// Melodic motifs as scale-degree contours.
//
// A motif is a starting degree, a list of signed steps between successive
// notes, and one duration per note. Degrees are zero-based and unbounded:
// 0 is the tonic, 7 the tonic an octave up, -1 the leading tone below.
// Working in degrees rather than semitones keeps every transform diatonic,
// so an inverted or transposed motif stays in the key it is realized in.

use crate::key::Key;
use crate::note::{Beat, Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motif {
    pub start: i32,
    pub steps: Vec<i32>,
    pub rhythm: Vec<Duration>,
}

impl Motif {
    /// A motif whose notes follow `degrees` with `rhythm`. Extra durations
    /// or degrees beyond the shorter list are dropped.
    pub fn from_degrees(degrees: &[i32], rhythm: &[Duration]) -> Motif {
        let len = degrees.len().min(rhythm.len());
        Motif {
            start: degrees.first().copied().unwrap_or(0),
            steps: degrees[..len].windows(2).map(|w| w[1] - w[0]).collect(),
            rhythm: rhythm[..len].to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.rhythm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rhythm.is_empty()
    }

    pub fn degrees(&self) -> Vec<i32> {
        let mut degree = self.start;
        let mut out = Vec::with_capacity(self.len());
        out.push(degree);
        for step in &self.steps {
            degree += step;
            out.push(degree);
        }
        out.truncate(self.len());
        out
    }

    /// Total length.
    pub fn span(&self) -> Beat {
        Beat::from_ticks(self.rhythm.iter().map(|d| d.ticks()).sum())
    }

    /// Mirror the contour around the starting degree.
    pub fn invert(&self) -> Motif {
        Motif {
            start: self.start,
            steps: self.steps.iter().map(|s| -s).collect(),
            rhythm: self.rhythm.clone(),
        }
    }

    /// Play the motif backwards, contour and rhythm both.
    pub fn retrograde(&self) -> Motif {
        let mut degrees = self.degrees();
        degrees.reverse();
        let mut rhythm = self.rhythm.clone();
        rhythm.reverse();
        Motif::from_degrees(&degrees, &rhythm)
    }

    /// Reverse only the rhythm; the contour is kept.
    pub fn retrograde_rhythm(&self) -> Motif {
        let mut rhythm = self.rhythm.clone();
        rhythm.reverse();
        Motif {
            start: self.start,
            steps: self.steps.clone(),
            rhythm,
        }
    }

    pub fn transpose(&self, degrees: i32) -> Motif {
        Motif {
            start: self.start + degrees,
            steps: self.steps.clone(),
            rhythm: self.rhythm.clone(),
        }
    }

    /// MIDI numbers and durations, with degree 0 on `tonic_midi`.
    pub fn realize(&self, key: Key, tonic_midi: i32) -> Vec<(i32, Duration)> {
        self.degrees()
            .into_iter()
            .zip(self.rhythm.iter().copied())
            .map(|(degree, d)| (degree_to_midi(key, tonic_midi, degree), d))
            .collect()
    }
}

/// MIDI number of a zero-based scale `degree` of `key`'s natural scale,
/// counted from `tonic_midi`.
pub fn degree_to_midi(key: Key, tonic_midi: i32, degree: i32) -> i32 {
    let scale = key.scale();
    let tonic = key.tonic().semitone() as i32;
    let octave = degree.div_euclid(7);
    let class = scale[degree.rem_euclid(7) as usize].semitone() as i32;
    tonic_midi + 12 * octave + (class - tonic).rem_euclid(12)
}

/// The MIDI number of `key`'s tonic nearest to `near`.
pub fn tonic_near(key: Key, near: i32) -> i32 {
    let tonic = key.tonic().semitone() as i32;
    let below = near - (near - tonic).rem_euclid(12);
    if near - below <= 6 { below } else { below + 12 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Mode;
    use crate::note::Duration::{Eighth, Half, Quarter};

    fn motif() -> Motif {
        Motif::from_degrees(&[0, 1, 2, 0], &[Quarter, Eighth, Eighth, Half])
    }

    #[test]
    fn test_degrees_and_span() {
        let m = motif();
        assert_eq!(m.steps, vec![1, 1, -2]);
        assert_eq!(m.degrees(), vec![0, 1, 2, 0]);
        assert_eq!(m.span(), Beat::from_beats(4));
    }

    #[test]
    fn test_invert_and_transpose() {
        assert_eq!(motif().invert().degrees(), vec![0, -1, -2, 0]);
        assert_eq!(motif().transpose(4).degrees(), vec![4, 5, 6, 4]);
    }

    #[test]
    fn test_retrograde() {
        let r = motif().retrograde();
        assert_eq!(r.degrees(), vec![0, 2, 1, 0]);
        assert_eq!(r.rhythm, vec![Half, Eighth, Eighth, Quarter]);
        let rr = motif().retrograde_rhythm();
        assert_eq!(rr.degrees(), motif().degrees());
        assert_eq!(rr.rhythm, vec![Half, Eighth, Eighth, Quarter]);
    }

    #[test]
    fn test_realize_in_minor() {
        let d_minor = Key::new("D".parse().unwrap(), Mode::Minor);
        let notes = Motif::from_degrees(&[0, 2, 4, -1, 7], &[Quarter; 5]).realize(d_minor, 62);
        let midi: Vec<i32> = notes.iter().map(|&(m, _)| m).collect();
        assert_eq!(midi, vec![62, 65, 69, 60, 74]);
    }

    #[test]
    fn test_tonic_near() {
        let g = Key::new("G".parse().unwrap(), Mode::Major);
        assert_eq!(tonic_near(g, 60), 55);
        assert_eq!(tonic_near(g, 66), 67);
    }
}
