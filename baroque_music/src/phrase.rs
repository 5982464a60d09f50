// Phrase shapes built from generated progressions.
//
// Every shape is a list of phrase plans (key, length, cadence) handed to
// the harmony generator one at a time and stitched together. Lengths always
// sum to the requested chord count, so a section gets exactly one chord per
// bar.
//
//   period     antecedent (half cadence) + consequent (authentic)
//   sentence   presentation + continuation + cadential phrase
//   binary     first half in the start key, second half in the end key
//   ternary    A (home), B (excursion key), A' (home)
//
// At each seam the first chord of the new phrase is checked against the
// last chord of the previous one. A tritone between roots, or the same
// chord twice, is awkward; the new phrase is regenerated up to three times.
//
// `analyze_phrases` goes the other way: given any progression, it finds
// cadence points and reports the spans between them.

use crate::harmony::{
    CadencePosition, CadenceType, Chord, Inversion, MIN_PROGRESSION_LEN, ProgressionSpec,
    generate_progression, select_cadence,
};
use crate::key::{Key, Mode};
use baroque_prng::ComposerRng;
use serde::Serialize;

/// Regenerations allowed for an awkward seam.
const SEAM_RETRIES: usize = 3;

/// A labelled span of chords, by index into the progression, closing on
/// `cadence`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseMarker {
    pub name: String,
    pub start: usize,
    pub end: usize,
    #[serde(serialize_with = "serialize_cadence")]
    pub cadence: Option<CadenceType>,
}

fn serialize_cadence<S: serde::Serializer>(cadence: &Option<CadenceType>, s: S) -> Result<S::Ok, S::Error> {
    match cadence {
        Some(c) => s.serialize_str(c.abbreviation()),
        None => s.serialize_none(),
    }
}

impl PhraseMarker {
    /// The same marker shifted `offset` chords later.
    pub fn offset(&self, offset: usize) -> PhraseMarker {
        PhraseMarker {
            name: self.name.clone(),
            start: self.start + offset,
            end: self.end + offset,
            cadence: self.cadence,
        }
    }
}

/// A stitched progression with its phrase boundaries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Phrase {
    pub chords: Vec<Chord>,
    pub markers: Vec<PhraseMarker>,
}

/// One phrase to generate.
#[derive(Debug, Clone)]
pub struct PhrasePlan {
    pub name: &'static str,
    pub key: Key,
    pub length: usize,
    pub cadence: CadenceType,
}

impl PhrasePlan {
    pub fn new(name: &'static str, key: Key, length: usize, cadence: CadenceType) -> Self {
        Self {
            name,
            key,
            length,
            cadence,
        }
    }
}

/// Roots a tritone apart, or the very same chord.
pub fn is_awkward_seam(last: &Chord, first: &Chord) -> bool {
    let interval = (first.root().semitone() as i32 - last.root().semitone() as i32).rem_euclid(12);
    interval == 6 || (last.symbol == first.symbol && last.inversion == first.inversion)
}

/// Generate and stitch `plans` in order.
pub fn stitch(plans: &[PhrasePlan], rng: &mut ComposerRng) -> Phrase {
    let mut out = Phrase::default();
    for plan in plans {
        // After a tonic arrival the next phrase starts mid-stream rather
        // than restating the same tonic.
        let mut spec = ProgressionSpec::new(plan.length, CadencePosition::Middle).with_cadence(plan.cadence);
        let previous = out.chords.last().cloned();
        if previous.as_ref().is_some_and(|c| c.is_tonic() && c.key == plan.key) {
            spec = spec.continuing();
        }
        let mut chords = generate_progression(plan.key, &spec, rng);
        if let Some(last) = &previous {
            let mut retries = 0;
            while retries < SEAM_RETRIES && is_awkward_seam(last, &chords[0]) {
                log::trace!("awkward seam {} -> {}, regenerating", last.figured(), chords[0].figured());
                chords = generate_progression(plan.key, &spec, rng);
                retries += 1;
            }
        }
        let start = out.chords.len();
        out.markers.push(PhraseMarker {
            name: plan.name.to_string(),
            start,
            end: start + chords.len() - 1,
            cadence: Some(plan.cadence),
        });
        out.chords.extend(chords);
    }
    out
}

/// Split `total` into parts proportional to `shares`, each at least the
/// shortest progression. The last part absorbs rounding.
fn split(total: usize, shares: &[usize]) -> Vec<usize> {
    let whole: usize = shares.iter().sum();
    let mut parts: Vec<usize> = shares
        .iter()
        .map(|&s| (total * s / whole).max(MIN_PROGRESSION_LEN))
        .collect();
    let assigned: usize = parts[..parts.len() - 1].iter().sum();
    if let Some(last) = parts.last_mut() {
        *last = total.saturating_sub(assigned).max(MIN_PROGRESSION_LEN);
    }
    parts
}

fn closing(key: Key, final_phrase: bool, rng: &mut ComposerRng) -> CadenceType {
    if final_phrase {
        select_cadence(key.mode(), CadencePosition::End, rng)
    } else {
        CadenceType::Perfect
    }
}

/// Antecedent closing on a half cadence, consequent closing authentically.
pub fn period(key: Key, length: usize, final_phrase: bool, rng: &mut ComposerRng) -> Phrase {
    let parts = split(length, &[1, 1]);
    let cadence = closing(key, final_phrase, rng);
    stitch(
        &[
            PhrasePlan::new("antecedent", key, parts[0], CadenceType::Half),
            PhrasePlan::new("consequent", key, parts[1], cadence),
        ],
        rng,
    )
}

/// Presentation, continuation, and cadential phrase.
pub fn sentence(key: Key, length: usize, final_phrase: bool, rng: &mut ComposerRng) -> Phrase {
    let parts = split(length, &[1, 1, 1]);
    let presentation = select_cadence(key.mode(), CadencePosition::Beginning, rng);
    let continuation = select_cadence(key.mode(), CadencePosition::Middle, rng);
    let cadence = closing(key, final_phrase, rng);
    stitch(
        &[
            PhrasePlan::new("presentation", key, parts[0], presentation),
            PhrasePlan::new("continuation", key, parts[1], continuation),
            PhrasePlan::new("cadential", key, parts[2], cadence),
        ],
        rng,
    )
}

/// First half in `start`, second in `end`. When the keys differ the first
/// half stops on a half cadence so the second can take over.
pub fn binary(start: Key, end: Key, length: usize, final_phrase: bool, rng: &mut ComposerRng) -> Phrase {
    let parts = split(length, &[1, 1]);
    let opening = if start == end {
        CadenceType::Imperfect
    } else {
        CadenceType::Half
    };
    let cadence = closing(end, final_phrase, rng);
    stitch(
        &[
            PhrasePlan::new("A", start, parts[0], opening),
            PhrasePlan::new("B", end, parts[1], cadence),
        ],
        rng,
    )
}

/// A in `home`, B in `via` closing on a half cadence, A' back in `home`.
pub fn ternary(home: Key, via: Key, length: usize, final_phrase: bool, rng: &mut ComposerRng) -> Phrase {
    let parts = split(length, &[1, 1, 1]);
    let cadence = closing(home, final_phrase, rng);
    stitch(
        &[
            PhrasePlan::new("A", home, parts[0], CadenceType::Imperfect),
            PhrasePlan::new("B", via, parts[1], CadenceType::Half),
            PhrasePlan::new("A'", home, parts[2], cadence),
        ],
        rng,
    )
}

/// A single progression with no internal phrase boundaries.
pub fn single(key: Key, length: usize, final_phrase: bool, rng: &mut ComposerRng) -> Phrase {
    let position = if final_phrase {
        CadencePosition::End
    } else {
        CadencePosition::Middle
    };
    let chords = generate_progression(key, &ProgressionSpec::new(length, position), rng);
    Phrase {
        chords,
        markers: Vec::new(),
    }
}

fn cadence_between(prev: &Chord, chord: &Chord, next: Option<&Chord>) -> Option<CadenceType> {
    if prev.is_dominant() && chord.is_tonic() {
        let perfect = chord.inversion == Inversion::Root && prev.inversion == Inversion::Root;
        return Some(if perfect {
            CadenceType::Perfect
        } else {
            CadenceType::Imperfect
        });
    }
    if prev.is_dominant() && chord.is_submediant() {
        return Some(CadenceType::Deceptive);
    }
    let resolves = next.is_some_and(|n| n.is_tonic() || n.is_submediant());
    if chord.is_dominant() && !chord.has_seventh() && !resolves {
        let phrygian = chord.key.mode() == Mode::Minor
            && prev.is_subdominant()
            && prev.inversion == Inversion::First;
        return Some(if phrygian {
            CadenceType::Phrygian
        } else {
            CadenceType::Half
        });
    }
    None
}

/// Phrase spans ending at each cadence point, plus a final span closing on
/// the last chord.
pub fn analyze_phrases(chords: &[Chord]) -> Vec<PhraseMarker> {
    let mut markers = Vec::new();
    let mut start = 0;
    for i in 1..chords.len() {
        let cadence = cadence_between(&chords[i - 1], &chords[i], chords.get(i + 1));
        let last = i + 1 == chords.len();
        if cadence.is_some() || last {
            markers.push(PhraseMarker {
                name: format!("phrase {}", markers.len() + 1),
                start,
                end: i,
                cadence,
            });
            start = i + 1;
        }
    }
    if markers.is_empty() && !chords.is_empty() {
        markers.push(PhraseMarker {
            name: "phrase 1".to_string(),
            start: 0,
            end: chords.len() - 1,
            cadence: None,
        });
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_major() -> Key {
        Key::new("C".parse().unwrap(), Mode::Major)
    }

    fn chord(key: Key, numeral: &str, inversion: Inversion) -> Chord {
        Chord::from_numeral(key, numeral, inversion)
    }

    #[test]
    fn test_period_shape() {
        let key = c_major();
        for seed in 0..10 {
            let phrase = period(key, 8, true, &mut ComposerRng::new(seed));
            assert_eq!(phrase.chords.len(), 8);
            assert_eq!(phrase.markers.len(), 2);
            assert_eq!(phrase.markers[0].cadence, Some(CadenceType::Half));
            assert!(phrase.chords[phrase.markers[0].end].is_dominant());
            assert!(phrase.chords.last().unwrap().is_tonic());
            assert_eq!(phrase.markers[1].end, 7);
        }
    }

    #[test]
    fn test_lengths_sum_exactly() {
        let key = c_major();
        let mut rng = ComposerRng::new(3);
        for length in [12, 13, 16, 20] {
            assert_eq!(sentence(key, length, false, &mut rng).chords.len(), length);
            assert_eq!(ternary(key, key, length, false, &mut rng).chords.len(), length);
        }
        for length in [8, 9, 11] {
            assert_eq!(period(key, length, false, &mut rng).chords.len(), length);
        }
    }

    #[test]
    fn test_binary_moves_key() {
        let c = c_major();
        let g = Key::new("G".parse().unwrap(), Mode::Major);
        let phrase = binary(c, g, 8, false, &mut ComposerRng::new(9));
        assert_eq!(phrase.chords[0].key, c);
        assert_eq!(phrase.chords.last().unwrap().key, g);
        assert_eq!(phrase.markers[0].cadence, Some(CadenceType::Half));
        assert_eq!(phrase.markers[1].cadence, Some(CadenceType::Perfect));
    }

    #[test]
    fn test_seam_detection() {
        let key = c_major();
        let v = chord(key, "V", Inversion::Root);
        let iv = chord(key, "IV", Inversion::Root);
        let vii = chord(key, "vii°", Inversion::Root);
        assert!(is_awkward_seam(&iv, &vii));
        assert!(is_awkward_seam(&v, &v.clone()));
        assert!(!is_awkward_seam(&v, &chord(key, "V", Inversion::First)));
        assert!(!is_awkward_seam(&v, &chord(key, "I", Inversion::Root)));
    }

    #[test]
    fn test_analyze_finds_cadences() {
        let key = c_major();
        let chords = vec![
            chord(key, "I", Inversion::Root),
            chord(key, "IV", Inversion::Root),
            chord(key, "V", Inversion::Root),
            chord(key, "vi", Inversion::Root),
            chord(key, "ii", Inversion::First),
            chord(key, "V", Inversion::Root),
            chord(key, "I", Inversion::Root),
        ];
        let markers = analyze_phrases(&chords);
        let found: Vec<(usize, usize, Option<CadenceType>)> =
            markers.iter().map(|m| (m.start, m.end, m.cadence)).collect();
        assert_eq!(
            found,
            vec![(0, 3, Some(CadenceType::Deceptive)), (4, 6, Some(CadenceType::Perfect))]
        );
    }

    #[test]
    fn test_analyze_half_and_phrygian() {
        let key = Key::new("A".parse().unwrap(), Mode::Minor);
        let chords = vec![
            chord(key, "i", Inversion::Root),
            chord(key, "iv", Inversion::First),
            chord(key, "V", Inversion::Root),
            chord(key, "i", Inversion::First),
            chord(key, "iv", Inversion::Root),
            chord(key, "V", Inversion::Root),
        ];
        let markers = analyze_phrases(&chords);
        assert_eq!(markers[0].cadence, Some(CadenceType::Imperfect));
        assert_eq!(markers.last().unwrap().cadence, Some(CadenceType::Half));
        assert_eq!(markers.last().unwrap().end, 5);

        let phrygian = analyze_phrases(&chords[..3]);
        assert_eq!(phrygian[0].cadence, Some(CadenceType::Phrygian));
    }

    #[test]
    fn test_marker_serializes_abbreviation() {
        let marker = PhraseMarker {
            name: "antecedent".into(),
            start: 0,
            end: 3,
            cadence: Some(CadenceType::Half),
        };
        let json = serde_json::to_value(&marker).unwrap();
        assert_eq!(json["cadence"], "HC");
        assert_eq!(json["end"], 3);
    }
}
