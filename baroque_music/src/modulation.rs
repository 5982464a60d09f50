// Key planning across sections.
//
// A `Modulator` walks the section list once, turning each section's
// abstract key change into concrete start and end keys. Fixed areas resolve
// against the home key; modulating sections move from wherever the previous
// section ended to a related key picked by weight:
//
//   dominant 0.40, subdominant 0.25, relative 0.25, supertonic 0.10
//
// Modulated keys are respelled with the usual signature for their tonic
// (Db major rather than C# major, G# minor rather than Ab minor). The last
// section always ends in the home key.

use crate::key::{Key, Mode};
use crate::structure::{KeyArea, KeyChange, Section};
use baroque_prng::ComposerRng;
use baroque_theory::{Interval, Letter, PitchClass, transpose_class};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Dominant,
    Subdominant,
    Relative,
    Supertonic,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Dominant,
        Relation::Subdominant,
        Relation::Relative,
        Relation::Supertonic,
    ];

    pub fn weight(self) -> f64 {
        match self {
            Relation::Dominant => 0.4,
            Relation::Subdominant => 0.25,
            Relation::Relative => 0.25,
            Relation::Supertonic => 0.1,
        }
    }

    pub fn sample(rng: &mut ComposerRng) -> Relation {
        let weights = Relation::ALL.map(Relation::weight);
        rng.weighted_index(&weights)
            .map(|i| Relation::ALL[i])
            .unwrap_or(Relation::Dominant)
    }
}

/// The key standing in `relation` to `key`. In minor the supertonic
/// relation lands on the major subtonic (VII), the diatonic neighbour key.
pub fn related_key(key: Key, relation: Relation) -> Key {
    let (interval, mode) = match (key.mode(), relation) {
        (Mode::Major, Relation::Dominant) => (Interval::PERFECT_FIFTH, Mode::Major),
        (Mode::Major, Relation::Subdominant) => (Interval::PERFECT_FOURTH, Mode::Major),
        (Mode::Major, Relation::Relative) => (Interval::MAJOR_SIXTH, Mode::Minor),
        (Mode::Major, Relation::Supertonic) => (Interval::MAJOR_SECOND, Mode::Minor),
        (Mode::Minor, Relation::Dominant) => (Interval::PERFECT_FIFTH, Mode::Minor),
        (Mode::Minor, Relation::Subdominant) => (Interval::PERFECT_FOURTH, Mode::Minor),
        (Mode::Minor, Relation::Relative) => (Interval::MINOR_THIRD, Mode::Major),
        (Mode::Minor, Relation::Supertonic) => (Interval::MINOR_SEVENTH, Mode::Major),
    };
    simplify_key(Key::new(transpose_class(key.tonic(), interval), mode))
}

const MAJOR_SPELLINGS: [(Letter, i8); 12] = [
    (Letter::C, 0),
    (Letter::D, -1),
    (Letter::D, 0),
    (Letter::E, -1),
    (Letter::E, 0),
    (Letter::F, 0),
    (Letter::F, 1),
    (Letter::G, 0),
    (Letter::A, -1),
    (Letter::A, 0),
    (Letter::B, -1),
    (Letter::B, 0),
];

const MINOR_SPELLINGS: [(Letter, i8); 12] = [
    (Letter::C, 0),
    (Letter::C, 1),
    (Letter::D, 0),
    (Letter::E, -1),
    (Letter::E, 0),
    (Letter::F, 0),
    (Letter::F, 1),
    (Letter::G, 0),
    (Letter::G, 1),
    (Letter::A, 0),
    (Letter::B, -1),
    (Letter::B, 0),
];

/// Respell the tonic with the conventional signature for its mode.
pub fn simplify_key(key: Key) -> Key {
    let table = match key.mode() {
        Mode::Major => &MAJOR_SPELLINGS,
        Mode::Minor => &MINOR_SPELLINGS,
    };
    let (letter, accidental) = table[key.tonic().semitone() as usize % 12];
    Key::new(PitchClass::new(letter, accidental), key.mode())
}

/// The concrete key of `area` relative to `home`.
pub fn resolve_area(home: Key, area: KeyArea) -> Key {
    match (area, home.mode()) {
        (KeyArea::Tonic, _) => home,
        (KeyArea::Dominant, Mode::Major) => related_key(home, Relation::Dominant),
        (KeyArea::Dominant, Mode::Minor) | (KeyArea::Relative, _) => related_key(home, Relation::Relative),
        (KeyArea::Submediant, Mode::Major) => related_key(home, Relation::Relative),
        (KeyArea::Submediant, Mode::Minor) => simplify_key(Key::new(
            transpose_class(home.tonic(), Interval::MINOR_SIXTH),
            Mode::Major,
        )),
    }
}

/// Concrete keys for one section. `via` is set for excursions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPlanEntry {
    pub start: Key,
    pub end: Key,
    pub via: Option<Key>,
}

pub struct Modulator {
    home: Key,
}

impl Modulator {
    pub fn new(home: Key) -> Self {
        Self { home }
    }

    pub fn home(&self) -> Key {
        self.home
    }

    /// One entry per section. The final entry always ends at home.
    pub fn plan(&self, sections: &[Section], rng: &mut ComposerRng) -> Vec<KeyPlanEntry> {
        let mut current = self.home;
        let mut entries: Vec<KeyPlanEntry> = sections
            .iter()
            .map(|section| {
                let entry = match section.key_change {
                    KeyChange::Fixed { start, end } => KeyPlanEntry {
                        start: resolve_area(self.home, start),
                        end: resolve_area(self.home, end),
                        via: None,
                    },
                    KeyChange::Excursion { via } => KeyPlanEntry {
                        start: self.home,
                        end: self.home,
                        via: Some(resolve_area(self.home, via)),
                    },
                    KeyChange::Modulating => {
                        let relation = Relation::sample(rng);
                        KeyPlanEntry {
                            start: current,
                            end: related_key(current, relation),
                            via: None,
                        }
                    }
                };
                current = entry.end;
                entry
            })
            .collect();

        if let Some(last) = entries.last_mut().filter(|e| e.end != self.home) {
            log::debug!("forcing final section from {} back to {}", last.end, self.home);
            last.end = self.home;
        }
        for (section, entry) in sections.iter().zip(&entries) {
            log::debug!("{}: {} -> {}", section.name, entry.start, entry.end);
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Form, plan};

    fn key(tonic: &str, mode: Mode) -> Key {
        Key::new(tonic.parse().unwrap(), mode)
    }

    #[test]
    fn test_related_keys_in_major() {
        let c = key("C", Mode::Major);
        assert_eq!(related_key(c, Relation::Dominant), key("G", Mode::Major));
        assert_eq!(related_key(c, Relation::Subdominant), key("F", Mode::Major));
        assert_eq!(related_key(c, Relation::Relative), key("A", Mode::Minor));
        assert_eq!(related_key(c, Relation::Supertonic), key("D", Mode::Minor));
    }

    #[test]
    fn test_related_keys_in_minor() {
        let d = key("D", Mode::Minor);
        assert_eq!(related_key(d, Relation::Dominant), key("A", Mode::Minor));
        assert_eq!(related_key(d, Relation::Relative), key("F", Mode::Major));
        assert_eq!(related_key(d, Relation::Supertonic), key("C", Mode::Major));
    }

    #[test]
    fn test_simplify_prefers_conventional_spelling() {
        assert_eq!(simplify_key(key("C#", Mode::Major)), key("Db", Mode::Major));
        assert_eq!(simplify_key(key("Ab", Mode::Minor)), key("G#", Mode::Minor));
        assert_eq!(simplify_key(key("A#", Mode::Major)), key("Bb", Mode::Major));
        // F# major's dominant is C# major, respelled as Db.
        assert_eq!(related_key(key("F#", Mode::Major), Relation::Dominant), key("Db", Mode::Major));
    }

    #[test]
    fn test_areas_in_minor() {
        let a = key("A", Mode::Minor);
        assert_eq!(resolve_area(a, KeyArea::Dominant), key("C", Mode::Major));
        assert_eq!(resolve_area(a, KeyArea::Submediant), key("F", Mode::Major));
        assert_eq!(resolve_area(a, KeyArea::Tonic), a);
    }

    #[test]
    fn test_plan_returns_home() {
        let home = key("Bb", Mode::Major);
        let sections = plan(Form::Ritornello, 3.0);
        for seed in 0..10 {
            let entries = Modulator::new(home).plan(&sections, &mut ComposerRng::new(seed));
            assert_eq!(entries.len(), sections.len());
            assert_eq!(entries[0].start, home);
            assert_eq!(entries.last().unwrap().end, home);
            for pair in entries.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn test_chorale_plan_visits_dominant() {
        let home = key("C", Mode::Major);
        let entries = Modulator::new(home).plan(&plan(Form::Chorale, 2.0), &mut ComposerRng::new(1));
        assert_eq!(entries[0].end, key("G", Mode::Major));
        assert_eq!(entries[2].start, key("G", Mode::Major));
        assert_eq!(entries[3].end, home);
    }
}
