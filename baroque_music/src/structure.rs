// Large-scale form: which sections a piece has, how long each is, and how
// its key moves.
//
// `plan` maps a `Form` to an ordered list of `Section`s. One bar is one
// harmonic slot (two quarter-note beats). Fixed forms (chorale, prelude, the
// binary dances) scale their reference bar counts by `duration / 2`;
// extended forms (ritornello, variations) keep adding sections until they
// reach `duration * 15` bars; the suite is a fixed sequence of movements;
// the fugue's stages are fixed by the subject length and ignore `duration`.
//
// Keys here are abstract areas relative to the home key. The modulation
// planner turns them into concrete keys, and the planner realizes each
// section's progression from its key change.

use crate::key::Key;
use crate::note::Beat;
use serde::Serialize;
use std::fmt;

/// Bars in the reference (duration 2) version of a fixed form section.
const REFERENCE_DURATION: f64 = 2.0;

/// No scaled section is shorter than this.
pub const MIN_SECTION_BARS: usize = 4;

/// Bars added per unit of duration in the extended forms.
const EXTENDED_BARS_PER_DURATION: f64 = 15.0;

/// Fugue subject length in bars (8 beats).
pub const FUGUE_SUBJECT_BARS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Form {
    Chorale,
    Prelude,
    Fugue,
    Gigue,
    Allemande,
    Courante,
    Sarabande,
    Minuet,
    Passacaglia,
    Ritornello,
    Variations,
    Suite,
}

impl Form {
    pub const ALL: [Form; 12] = [
        Form::Chorale,
        Form::Prelude,
        Form::Fugue,
        Form::Gigue,
        Form::Allemande,
        Form::Courante,
        Form::Sarabande,
        Form::Minuet,
        Form::Passacaglia,
        Form::Ritornello,
        Form::Variations,
        Form::Suite,
    ];

    /// Case-insensitive lookup by name.
    pub fn parse(s: &str) -> Option<Form> {
        let wanted = s.trim();
        Form::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
    }

    pub fn name(self) -> &'static str {
        match self {
            Form::Chorale => "Chorale",
            Form::Prelude => "Prelude",
            Form::Fugue => "Fugue",
            Form::Gigue => "Gigue",
            Form::Allemande => "Allemande",
            Form::Courante => "Courante",
            Form::Sarabande => "Sarabande",
            Form::Minuet => "Minuet",
            Form::Passacaglia => "Passacaglia",
            Form::Ritornello => "Ritornello",
            Form::Variations => "Variations",
            Form::Suite => "Suite",
        }
    }

    /// Dance movements, whose bass alternates a walking figure.
    pub fn is_dance(self) -> bool {
        matches!(
            self,
            Form::Gigue
                | Form::Allemande
                | Form::Courante
                | Form::Sarabande
                | Form::Minuet
                | Form::Passacaglia
        )
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A key area relative to the home key. In minor the dominant area is the
/// relative major, the usual goal of a minor-mode first half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyArea {
    Tonic,
    Dominant,
    Submediant,
    /// vi in major, III in minor.
    Relative,
}

/// How a section's key moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyChange {
    /// From one area to another (possibly the same).
    Fixed { start: KeyArea, end: KeyArea },
    /// Leaves the tonic for `via` and comes back.
    Excursion { via: KeyArea },
    /// Moves to a key related to wherever the previous section ended.
    Modulating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Exposition,
    Development,
    Recapitulation,
    Episode,
    MiddleEntries,
    Stretto,
    FinalEntry,
    Theme,
    Variation,
    Tutti,
    Solo,
    Movement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub kind: SectionKind,
    pub bars: usize,
    pub key_change: KeyChange,
    /// Form whose rhythmic figuration fills the section. Differs from the
    /// piece's form only inside a suite.
    pub texture: Form,
    /// 1-based variation number, for sections that restate a theme.
    pub variation: Option<u32>,
}

impl Section {
    fn new(name: &str, kind: SectionKind, bars: usize, key_change: KeyChange, texture: Form) -> Self {
        Self {
            name: name.to_string(),
            kind,
            bars,
            key_change,
            texture,
            variation: None,
        }
    }

    fn varied(mut self, n: u32) -> Self {
        self.variation = Some(n);
        self
    }
}

/// Where a section landed on the score clock, for piece metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpan {
    pub name: String,
    pub start_beat: Beat,
    pub end_beat: Beat,
    /// "G major".
    pub key: String,
}

impl SectionSpan {
    pub fn new(name: &str, start: Beat, end: Beat, key: Key) -> Self {
        Self {
            name: name.to_string(),
            start_beat: start,
            end_beat: end,
            key: key.label(),
        }
    }
}

fn fixed(start: KeyArea, end: KeyArea) -> KeyChange {
    KeyChange::Fixed { start, end }
}

fn scaled(bars: usize, duration: f64) -> usize {
    let bars = (bars as f64 * duration / REFERENCE_DURATION).round() as usize;
    bars.max(MIN_SECTION_BARS)
}

/// Sections of `form` for a piece of the given `duration`.
pub fn plan(form: Form, duration: f64) -> Vec<Section> {
    use KeyArea::*;
    use SectionKind::*;
    let duration = if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        REFERENCE_DURATION
    };
    let target = (duration * EXTENDED_BARS_PER_DURATION).ceil() as usize;

    let sections = match form {
        Form::Chorale => vec![
            Section::new("A", Exposition, scaled(8, duration), fixed(Tonic, Dominant), form),
            Section::new("A'", Exposition, scaled(8, duration), fixed(Tonic, Dominant), form),
            Section::new("B", Development, scaled(8, duration), fixed(Dominant, Tonic), form),
            Section::new("B'", Recapitulation, scaled(8, duration), fixed(Dominant, Tonic), form),
        ],
        Form::Prelude => vec![
            Section::new("Exposition", Exposition, scaled(8, duration), fixed(Tonic, Dominant), form),
            Section::new("Development", Development, scaled(12, duration), fixed(Dominant, Submediant), form),
            Section::new("Recapitulation", Recapitulation, scaled(8, duration), fixed(Submediant, Tonic), form),
        ],
        Form::Gigue | Form::Allemande | Form::Courante | Form::Minuet => vec![
            Section::new("A", Exposition, scaled(8, duration), fixed(Tonic, Dominant), form),
            Section::new("B", Recapitulation, scaled(8, duration), fixed(Dominant, Tonic), form),
        ],
        Form::Sarabande => vec![
            Section::new("A", Exposition, scaled(8, duration), fixed(Tonic, Tonic), form),
            Section::new("B", Development, scaled(8, duration), fixed(Tonic, Dominant), form),
            Section::new("A'", Recapitulation, scaled(8, duration), fixed(Dominant, Tonic), form),
        ],
        Form::Passacaglia => {
            let bars = scaled(8, duration);
            let mut sections = vec![Section::new("Theme", Theme, bars, fixed(Tonic, Tonic), form)];
            for n in 1..=3 {
                sections.push(
                    Section::new(&format!("Variation {n}"), Variation, bars, fixed(Tonic, Tonic), form).varied(n),
                );
            }
            sections
        }
        Form::Ritornello => {
            let mut sections = Vec::new();
            let mut total = 0;
            let mut tutti = true;
            while total < target {
                let section = if tutti {
                    Section::new("Tutti", Tutti, scaled(4, duration), KeyChange::Modulating, form)
                } else {
                    Section::new("Solo", Solo, scaled(8, duration), KeyChange::Modulating, form)
                };
                total += section.bars;
                sections.push(section);
                tutti = !tutti;
            }
            sections
        }
        Form::Variations => {
            let mut sections = vec![Section::new("Theme", Theme, 16, fixed(Tonic, Tonic), form)];
            let mut total = 16;
            let mut n = 1;
            while total < target {
                sections.push(
                    Section::new(&format!("Variation {n}"), Variation, 16, fixed(Tonic, Tonic), form).varied(n),
                );
                total += 16;
                n += 1;
            }
            sections
        }
        Form::Suite => [Form::Allemande, Form::Courante, Form::Sarabande, Form::Gigue]
            .into_iter()
            .map(|dance| {
                Section::new(dance.name(), Movement, 16, KeyChange::Excursion { via: Dominant }, dance)
            })
            .collect(),
        Form::Fugue => {
            let l = FUGUE_SUBJECT_BARS;
            vec![
                Section::new("Exposition", Exposition, 4 * l, fixed(Tonic, Tonic), form),
                Section::new("Episode", Episode, 8, fixed(Tonic, Tonic), form),
                Section::new("Middle Entries", MiddleEntries, 2 * l, fixed(Relative, Relative), form),
                Section::new("Episode 2", Episode, 8, fixed(Tonic, Tonic), form),
                Section::new("Stretto", Stretto, 3 + l, fixed(Tonic, Tonic), form),
                Section::new("Final Entry", FinalEntry, l, fixed(Tonic, Tonic), form),
            ]
        }
    };
    log::debug!(
        "{form}: {} sections, {} bars",
        sections.len(),
        sections.iter().map(|s| s.bars).sum::<usize>()
    );
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(sections: &[Section]) -> Vec<usize> {
        sections.iter().map(|s| s.bars).collect()
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Form::parse("chorale"), Some(Form::Chorale));
        assert_eq!(Form::parse(" FUGUE "), Some(Form::Fugue));
        assert_eq!(Form::parse("Rondo"), None);
        for form in Form::ALL {
            assert_eq!(Form::parse(form.name()), Some(form));
        }
    }

    #[test]
    fn test_chorale_reference_shape() {
        let sections = plan(Form::Chorale, 2.0);
        assert_eq!(bars(&sections), vec![8, 8, 8, 8]);
        assert_eq!(sections[0].key_change, fixed(KeyArea::Tonic, KeyArea::Dominant));
        assert_eq!(sections[3].key_change, fixed(KeyArea::Dominant, KeyArea::Tonic));
    }

    #[test]
    fn test_duration_scales_fixed_forms() {
        assert_eq!(bars(&plan(Form::Prelude, 4.0)), vec![16, 24, 16]);
        assert_eq!(bars(&plan(Form::Gigue, 0.5)), vec![4, 4]);
        assert_eq!(bars(&plan(Form::Minuet, f64::NAN)), vec![8, 8]);
    }

    #[test]
    fn test_extended_forms_reach_target() {
        let ritornello = plan(Form::Ritornello, 2.0);
        assert!(ritornello.iter().map(|s| s.bars).sum::<usize>() >= 30);
        assert_eq!(ritornello[0].kind, SectionKind::Tutti);
        assert_eq!(ritornello[1].kind, SectionKind::Solo);
        assert!(ritornello.iter().all(|s| s.key_change == KeyChange::Modulating));
        assert_eq!(bars(&ritornello[..2]), vec![4, 8]);
        assert_eq!(bars(&plan(Form::Ritornello, 6.0)[..2]), vec![12, 24]);

        let variations = plan(Form::Variations, 3.0);
        assert_eq!(variations.len(), 3);
        assert_eq!(variations[2].variation, Some(2));
    }

    #[test]
    fn test_suite_movements_carry_their_texture() {
        let suite = plan(Form::Suite, 2.0);
        let textures: Vec<Form> = suite.iter().map(|s| s.texture).collect();
        assert_eq!(textures, vec![Form::Allemande, Form::Courante, Form::Sarabande, Form::Gigue]);
    }

    #[test]
    fn test_fugue_stages_ignore_duration() {
        assert_eq!(plan(Form::Fugue, 2.0), plan(Form::Fugue, 9.0));
        assert_eq!(bars(&plan(Form::Fugue, 2.0)), vec![16, 8, 8, 8, 7, 4]);
    }
}
