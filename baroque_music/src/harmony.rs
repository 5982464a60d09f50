// Functional harmony: progressions, cadences, sequences.
//
// A progression is a walk over three harmonic functions (tonic,
// subdominant, dominant) driven by a fixed transition table. Each step
// samples a function, then a numeral from that function's weighted table,
// then an inversion. Root motion is steered toward strong intervals by a
// quality table with a bounded number of resamples; a fixed share of
// "free" motion is always accepted so progressions do not collapse into
// endless circles of fifths.
//
// The last three chords are always a cadence template. `select_cadence`
// never returns a deceptive cadence for the end position, which is what
// guarantees every non-fugal piece closes on the tonic.
//
// Numerals are strings ("V7", "vii°") resolved through the key. A numeral
// the oracle rejects falls back to the tonic triad with a warning.

use crate::key::{Key, Mode};
use crate::note::Beat;
use baroque_prng::ComposerRng;
use baroque_theory::{ChordQuality, ChordSymbol, PitchClass, RomanNumeral};

/// Chords in a cadence template.
pub const CADENCE_LEN: usize = 3;

/// Shortest progression: an opening chord plus the cadence.
pub const MIN_PROGRESSION_LEN: usize = CADENCE_LEN + 1;

/// Resamples allowed when the root motion is judged weak.
const ROOT_MOTION_ATTEMPTS: usize = 3;

/// Share of steps that skip the root-motion check.
const FREE_MOTION_PROBABILITY: f64 = 0.2;

/// Root-motion quality by ascending semitone distance between roots.
/// Fourths and fifths are strongest, the tritone weakest.
const ROOT_MOTION_QUALITY: [f64; 12] = [
    0.3,  // repetition
    0.4,  // m2
    0.7,  // M2
    0.6,  // m3
    0.6,  // M3
    1.0,  // P4
    0.15, // tritone
    1.0,  // P5
    0.6,  // m6
    0.6,  // M6
    0.7,  // m7
    0.4,  // M7
];

// ── Functions and numeral tables ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
}

/// Rows: from tonic, subdominant, dominant. Columns in the same order.
const TRANSITIONS: [[f64; 3]; 3] = [
    [0.30, 0.40, 0.30],
    [0.10, 0.20, 0.70],
    [0.85, 0.05, 0.10],
];

type NumeralTable = &'static [(&'static str, f64)];

const MAJOR_TONIC: NumeralTable = &[("I", 0.6), ("vi", 0.3), ("iii", 0.1)];
const MAJOR_SUBDOMINANT: NumeralTable = &[("IV", 0.5), ("ii", 0.35), ("ii7", 0.15)];
const MAJOR_DOMINANT: NumeralTable = &[("V", 0.5), ("V7", 0.35), ("vii°", 0.15)];
const MAJOR_RESOLUTION: NumeralTable = &[("I", 0.85), ("vi", 0.15)];

const MINOR_TONIC: NumeralTable = &[("i", 0.6), ("VI", 0.3), ("III", 0.1)];
const MINOR_SUBDOMINANT: NumeralTable = &[("iv", 0.6), ("ii°", 0.3), ("iiø7", 0.1)];
const MINOR_DOMINANT: NumeralTable = &[("V", 0.45), ("V7", 0.35), ("vii°", 0.12), ("vii°7", 0.08)];
const MINOR_RESOLUTION: NumeralTable = &[("i", 0.85), ("VI", 0.15)];

impl HarmonicFunction {
    pub const ALL: [HarmonicFunction; 3] = [
        HarmonicFunction::Tonic,
        HarmonicFunction::Subdominant,
        HarmonicFunction::Dominant,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn transition_weights(self) -> [f64; 3] {
        TRANSITIONS[self.index()]
    }

    /// Sample the next function from this one's transition row.
    pub fn next(self, rng: &mut ComposerRng) -> HarmonicFunction {
        rng.weighted_index(&self.transition_weights())
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(HarmonicFunction::Tonic)
    }

    pub fn numerals(self, mode: Mode) -> NumeralTable {
        match (mode, self) {
            (Mode::Major, HarmonicFunction::Tonic) => MAJOR_TONIC,
            (Mode::Major, HarmonicFunction::Subdominant) => MAJOR_SUBDOMINANT,
            (Mode::Major, HarmonicFunction::Dominant) => MAJOR_DOMINANT,
            (Mode::Minor, HarmonicFunction::Tonic) => MINOR_TONIC,
            (Mode::Minor, HarmonicFunction::Subdominant) => MINOR_SUBDOMINANT,
            (Mode::Minor, HarmonicFunction::Dominant) => MINOR_DOMINANT,
        }
    }
}

fn resolution_table(mode: Mode) -> NumeralTable {
    match mode {
        Mode::Major => MAJOR_RESOLUTION,
        Mode::Minor => MINOR_RESOLUTION,
    }
}

pub fn tonic_numeral(mode: Mode) -> &'static str {
    match mode {
        Mode::Major => "I",
        Mode::Minor => "i",
    }
}

fn subdominant_numeral(mode: Mode) -> &'static str {
    match mode {
        Mode::Major => "IV",
        Mode::Minor => "iv",
    }
}

// ── Chords ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Inversion {
    Root,
    First,
    Second,
}

impl Inversion {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Inversion {
        match index {
            1 => Inversion::First,
            2 => Inversion::Second,
            _ => Inversion::Root,
        }
    }
}

/// A numeral resolved in a key, with its inversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    pub symbol: ChordSymbol,
    pub numeral: String,
    pub inversion: Inversion,
    pub key: Key,
}

impl Chord {
    /// Resolve `numeral` in `key`. Unknown numerals become the tonic triad.
    pub fn from_numeral(key: Key, numeral: &str, inversion: Inversion) -> Chord {
        match key.resolve(numeral) {
            Ok(symbol) => Chord {
                symbol,
                numeral: numeral.to_string(),
                inversion,
                key,
            },
            Err(err) => {
                log::warn!("{err}; substituting the tonic triad of {key}");
                let quality = match key.mode() {
                    Mode::Major => ChordQuality::Major,
                    Mode::Minor => ChordQuality::Minor,
                };
                Chord {
                    symbol: ChordSymbol::new(key.tonic(), quality),
                    numeral: tonic_numeral(key.mode()).to_string(),
                    inversion: Inversion::Root,
                    key,
                }
            }
        }
    }

    pub fn tones(&self) -> Vec<PitchClass> {
        self.symbol.tones()
    }

    pub fn root(&self) -> PitchClass {
        self.symbol.root()
    }

    pub fn third(&self) -> PitchClass {
        self.tones()[1]
    }

    pub fn seventh(&self) -> Option<PitchClass> {
        self.tones().get(3).copied()
    }

    pub fn has_seventh(&self) -> bool {
        self.symbol.quality().has_seventh()
    }

    /// Pitch class the bass must carry for this inversion.
    pub fn bass_class(&self) -> PitchClass {
        let tones = self.tones();
        tones
            .get(self.inversion.index())
            .copied()
            .unwrap_or(self.root())
    }

    fn roman(&self) -> Option<RomanNumeral> {
        self.numeral.parse().ok()
    }

    /// V or V7 on the unaltered fifth degree.
    pub fn is_dominant(&self) -> bool {
        self.roman().is_some_and(|r| {
            r.degree == 5
                && r.accidental == 0
                && matches!(r.quality, ChordQuality::Major | ChordQuality::Dominant7)
        })
    }

    /// I or i.
    pub fn is_tonic(&self) -> bool {
        self.roman()
            .is_some_and(|r| r.degree == 1 && r.accidental == 0 && !r.has_seventh())
    }

    /// The deceptive target: vi in major, VI in minor.
    pub fn is_submediant(&self) -> bool {
        self.roman().is_some_and(|r| r.degree == 6 && r.accidental == 0)
    }

    pub fn is_subdominant(&self) -> bool {
        self.roman().is_some_and(|r| r.degree == 4 && r.accidental == 0)
    }

    /// Numeral with figured-bass inversion: "V6", "I6/4", "V6/5", "vii°4/3".
    pub fn figured(&self) -> String {
        let base = if self.has_seventh() {
            self.numeral.strip_suffix('7').unwrap_or(&self.numeral)
        } else {
            self.numeral.as_str()
        };
        match (self.inversion, self.has_seventh()) {
            (Inversion::Root, _) => self.numeral.clone(),
            (Inversion::First, false) => format!("{base}6"),
            (Inversion::Second, false) => format!("{base}6/4"),
            (Inversion::First, true) => format!("{base}6/5"),
            (Inversion::Second, true) => format!("{base}4/3"),
        }
    }
}

/// A chord placed on the score clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarmonicSlot {
    pub chord: Chord,
    pub start: Beat,
    pub end: Beat,
}

/// "I - IV - V6 - I".
pub fn progression_label(chords: &[Chord]) -> String {
    chords
        .iter()
        .map(Chord::figured)
        .collect::<Vec<_>>()
        .join(" - ")
}

// ── Cadences ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CadenceType {
    Perfect,
    Imperfect,
    Half,
    Deceptive,
    /// Minor-mode half cadence, iv6 to V.
    Phrygian,
}

impl CadenceType {
    pub fn abbreviation(self) -> &'static str {
        match self {
            CadenceType::Perfect => "PAC",
            CadenceType::Imperfect => "IAC",
            CadenceType::Half => "HC",
            CadenceType::Deceptive => "DC",
            CadenceType::Phrygian => "PHC",
        }
    }

    pub fn is_authentic(self) -> bool {
        matches!(self, CadenceType::Perfect | CadenceType::Imperfect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadencePosition {
    Beginning,
    Middle,
    End,
}

/// Pick a cadence for a phrase ending at `position`. The end position only
/// ever yields authentic cadences.
pub fn select_cadence(mode: Mode, position: CadencePosition, rng: &mut ComposerRng) -> CadenceType {
    use CadenceType::*;
    let table: &[(CadenceType, f64)] = match (position, mode) {
        (CadencePosition::End, _) => &[(Perfect, 0.7), (Imperfect, 0.3)],
        (CadencePosition::Beginning, _) => &[(Imperfect, 0.5), (Half, 0.5)],
        (CadencePosition::Middle, Mode::Major) => &[(Half, 0.65), (Deceptive, 0.25), (Imperfect, 0.1)],
        (CadencePosition::Middle, Mode::Minor) => {
            &[(Half, 0.5), (Phrygian, 0.2), (Deceptive, 0.2), (Imperfect, 0.1)]
        }
    };
    let weights: Vec<f64> = table.iter().map(|&(_, w)| w).collect();
    rng.weighted_index(&weights)
        .map(|i| table[i].0)
        .unwrap_or(Perfect)
}

/// The three-chord template for `cadence` in `key`.
pub fn cadence_chords(key: Key, cadence: CadenceType) -> Vec<Chord> {
    let template: [(&str, usize); CADENCE_LEN] = match (key.mode(), cadence) {
        (Mode::Major, CadenceType::Perfect) => [("I", 2), ("V", 0), ("I", 0)],
        (Mode::Major, CadenceType::Imperfect) => [("I", 2), ("V", 0), ("I", 1)],
        (Mode::Major, CadenceType::Half | CadenceType::Phrygian) => [("I", 0), ("IV", 0), ("V", 0)],
        (Mode::Major, CadenceType::Deceptive) => [("I", 2), ("V", 0), ("vi", 0)],
        (Mode::Minor, CadenceType::Perfect) => [("i", 2), ("V", 0), ("i", 0)],
        (Mode::Minor, CadenceType::Imperfect) => [("i", 2), ("V", 0), ("i", 1)],
        (Mode::Minor, CadenceType::Half) => [("i", 0), ("iv", 0), ("V", 0)],
        (Mode::Minor, CadenceType::Phrygian) => [("i", 0), ("iv", 1), ("V", 0)],
        (Mode::Minor, CadenceType::Deceptive) => [("i", 2), ("V", 0), ("VI", 0)],
    };
    template
        .iter()
        .map(|&(numeral, inv)| Chord::from_numeral(key, numeral, Inversion::from_index(inv)))
        .collect()
}

// ── Progression generation ──

/// What to generate: length, where the phrase sits, and whether to open on
/// the tonic or continue from an implied tonic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionSpec {
    pub length: usize,
    pub position: CadencePosition,
    pub cadence: Option<CadenceType>,
    pub open_on_tonic: bool,
}

impl ProgressionSpec {
    pub fn new(length: usize, position: CadencePosition) -> Self {
        Self {
            length,
            position,
            cadence: None,
            open_on_tonic: true,
        }
    }

    pub fn with_cadence(mut self, cadence: CadenceType) -> Self {
        self.cadence = Some(cadence);
        self
    }

    /// Start mid-stream: the first chord is sampled rather than fixed to I.
    pub fn continuing(mut self) -> Self {
        self.open_on_tonic = false;
        self
    }
}

/// Generate a progression of exactly `max(spec.length, 4)` chords.
pub fn generate_progression(key: Key, spec: &ProgressionSpec, rng: &mut ComposerRng) -> Vec<Chord> {
    let length = spec.length.max(MIN_PROGRESSION_LEN);
    let cadence = spec
        .cadence
        .unwrap_or_else(|| select_cadence(key.mode(), spec.position, rng));
    let body_len = length - CADENCE_LEN;

    let tonic = Chord::from_numeral(key, tonic_numeral(key.mode()), Inversion::Root);
    let mut chords = Vec::with_capacity(length);
    let mut current = tonic.clone();
    let mut function = HarmonicFunction::Tonic;
    if spec.open_on_tonic {
        chords.push(tonic);
    }

    while chords.len() < body_len {
        let next_function = function.next(rng);
        let table = if function == HarmonicFunction::Dominant && next_function == HarmonicFunction::Tonic {
            resolution_table(key.mode())
        } else {
            next_function.numerals(key.mode())
        };
        let chord = choose_chord(key, table, &current, rng);
        log::trace!("{:?} -> {:?}: {}", function, next_function, chord.figured());
        current = chord.clone();
        chords.push(chord);
        function = next_function;
    }

    chords.extend(cadence_chords(key, cadence));
    log::debug!(
        "progression in {key} ({}): {}",
        cadence.abbreviation(),
        progression_label(&chords)
    );
    chords
}

fn sample_numeral(table: NumeralTable, rng: &mut ComposerRng) -> &'static str {
    let weights: Vec<f64> = table.iter().map(|&(_, w)| w).collect();
    rng.weighted_index(&weights)
        .map(|i| table[i].0)
        .unwrap_or(table[0].0)
}

/// Quality of moving from `from` to `to` by root, 0..1.
pub fn root_motion_quality(from: PitchClass, to: PitchClass) -> f64 {
    let interval = (to.semitone() as i32 - from.semitone() as i32).rem_euclid(12);
    ROOT_MOTION_QUALITY[interval as usize]
}

fn choose_chord(key: Key, table: NumeralTable, current: &Chord, rng: &mut ComposerRng) -> Chord {
    let mut numeral = sample_numeral(table, rng);
    for _ in 1..ROOT_MOTION_ATTEMPTS {
        let candidate_root = Chord::from_numeral(key, numeral, Inversion::Root).root();
        let quality = root_motion_quality(current.root(), candidate_root);
        if rng.random_bool(FREE_MOTION_PROBABILITY) || rng.random_bool(quality) {
            break;
        }
        numeral = sample_numeral(table, rng);
    }
    let inversion = sample_inversion(numeral, rng);
    Chord::from_numeral(key, numeral, inversion)
}

/// 50% root, 35% first, 15% second; second inversion only on V, V7, IV/iv.
fn sample_inversion(numeral: &str, rng: &mut ComposerRng) -> Inversion {
    let roll = rng.next_f64();
    if roll < 0.5 {
        Inversion::Root
    } else if roll < 0.85 {
        Inversion::First
    } else if matches!(numeral, "V" | "V7" | "IV" | "iv") {
        Inversion::Second
    } else {
        Inversion::Root
    }
}

// ── Sequences and the final cadence ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    DescendingFifths,
    Romanesca,
    DescendingThirds,
}

impl SequenceKind {
    /// Major-mode numerals with inversions.
    fn pattern(self) -> &'static [(&'static str, usize)] {
        match self {
            SequenceKind::DescendingFifths => &[
                ("I", 0),
                ("IV", 0),
                ("vii°", 0),
                ("iii", 0),
                ("vi", 0),
                ("ii", 0),
                ("V", 0),
                ("I", 0),
            ],
            SequenceKind::Romanesca => &[
                ("I", 0),
                ("V", 1),
                ("vi", 0),
                ("iii", 1),
                ("IV", 0),
                ("I", 1),
                ("IV", 0),
                ("V", 0),
            ],
            SequenceKind::DescendingThirds => &[
                ("I", 0),
                ("vi", 0),
                ("IV", 0),
                ("ii", 1),
                ("V", 0),
                ("I", 0),
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SequenceKind::DescendingFifths => "descending fifths",
            SequenceKind::Romanesca => "romanesca",
            SequenceKind::DescendingThirds => "descending thirds",
        }
    }
}

/// Minor-mode counterpart of a major-mode sequence numeral. Inside
/// sequences the seventh degree is the natural subtonic.
fn minor_substitute(numeral: &'static str) -> &'static str {
    match numeral {
        "I" => "i",
        "ii" => "ii°",
        "iii" => "III",
        "IV" => "iv",
        "vi" => "VI",
        "vii°" => "VII",
        other => other,
    }
}

/// A fixed harmonic sequence, cycled or truncated to `length` chords
/// (`0` means one full statement).
pub fn generate_sequence(key: Key, kind: SequenceKind, length: usize) -> Vec<Chord> {
    let pattern = kind.pattern();
    let length = if length == 0 { pattern.len() } else { length };
    pattern
        .iter()
        .cycle()
        .take(length)
        .map(|&(numeral, inv)| {
            let numeral = match key.mode() {
                Mode::Major => numeral,
                Mode::Minor => minor_substitute(numeral),
            };
            Chord::from_numeral(key, numeral, Inversion::from_index(inv))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalCadenceStyle {
    /// IV – V – I.
    Plain,
    /// IV – I6/4 – V – I.
    CadentialSixFour,
}

/// Closing cadence in `key`, independent of any key visited before it.
/// Always ends on a root-position tonic.
pub fn final_cadence(key: Key, style: FinalCadenceStyle) -> Vec<Chord> {
    let mode = key.mode();
    let tonic = tonic_numeral(mode);
    let mut chords = vec![Chord::from_numeral(key, subdominant_numeral(mode), Inversion::Root)];
    if style == FinalCadenceStyle::CadentialSixFour {
        chords.push(Chord::from_numeral(key, tonic, Inversion::Second));
    }
    chords.push(Chord::from_numeral(key, "V", Inversion::Root));
    chords.push(Chord::from_numeral(key, tonic, Inversion::Root));
    chords
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(tonic: &str, mode: Mode) -> Key {
        Key::new(tonic.parse().unwrap(), mode)
    }

    fn numerals(chords: &[Chord]) -> Vec<String> {
        chords.iter().map(Chord::figured).collect()
    }

    #[test]
    fn test_transition_rows_sum_to_one() {
        for f in HarmonicFunction::ALL {
            let sum: f64 = f.transition_weights().iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "{f:?} row sums to {sum}");
        }
    }

    #[test]
    fn test_progression_length_and_opening() {
        let mut rng = ComposerRng::new(1);
        for length in [1, 4, 8, 13] {
            let spec = ProgressionSpec::new(length, CadencePosition::Middle);
            let chords = generate_progression(key("C", Mode::Major), &spec, &mut rng);
            assert_eq!(chords.len(), length.max(MIN_PROGRESSION_LEN));
            assert!(chords[0].is_tonic());
            assert_eq!(chords[0].inversion, Inversion::Root);
        }
    }

    #[test]
    fn test_end_position_never_deceptive() {
        let mut rng = ComposerRng::new(7);
        for mode in [Mode::Major, Mode::Minor] {
            for _ in 0..500 {
                let cadence = select_cadence(mode, CadencePosition::End, &mut rng);
                assert!(cadence.is_authentic(), "got {cadence:?}");
            }
        }
    }

    #[test]
    fn test_end_progressions_close_on_tonic() {
        let mut rng = ComposerRng::from_seed_str("closure");
        for mode in [Mode::Major, Mode::Minor] {
            for _ in 0..100 {
                let spec = ProgressionSpec::new(8, CadencePosition::End);
                let chords = generate_progression(key("G", mode), &spec, &mut rng);
                let last = &chords[chords.len() - 1];
                let penultimate = &chords[chords.len() - 2];
                assert!(last.is_tonic());
                assert!(penultimate.is_dominant());
            }
        }
    }

    #[test]
    fn test_cadence_templates() {
        let c = key("C", Mode::Major);
        assert_eq!(numerals(&cadence_chords(c, CadenceType::Perfect)), ["I6/4", "V", "I"]);
        assert_eq!(numerals(&cadence_chords(c, CadenceType::Imperfect)), ["I6/4", "V", "I6"]);
        assert_eq!(numerals(&cadence_chords(c, CadenceType::Half)), ["I", "IV", "V"]);
        assert_eq!(numerals(&cadence_chords(c, CadenceType::Deceptive)), ["I6/4", "V", "vi"]);
        let a = key("A", Mode::Minor);
        assert_eq!(numerals(&cadence_chords(a, CadenceType::Phrygian)), ["i", "iv6", "V"]);
        let v = &cadence_chords(a, CadenceType::Perfect)[1];
        assert_eq!(v.symbol.to_string(), "E");
    }

    #[test]
    fn test_second_inversion_restricted() {
        let mut rng = ComposerRng::new(3);
        for _ in 0..300 {
            let spec = ProgressionSpec::new(12, CadencePosition::Middle);
            let chords = generate_progression(key("D", Mode::Minor), &spec, &mut rng);
            let body = &chords[..chords.len() - CADENCE_LEN];
            for chord in body {
                if chord.inversion == Inversion::Second {
                    assert!(matches!(chord.numeral.as_str(), "V" | "V7" | "IV" | "iv"));
                }
            }
        }
    }

    #[test]
    fn test_minor_numerals_resolve_diatonically() {
        let d = key("D", Mode::Minor);
        let vi = Chord::from_numeral(d, "VI", Inversion::Root);
        assert_eq!(vi.symbol.to_string(), "Bb");
        let v7 = Chord::from_numeral(d, "V7", Inversion::First);
        assert_eq!(v7.bass_class().to_string(), "C#");
        assert_eq!(v7.figured(), "V6/5");
    }

    #[test]
    fn test_unknown_numeral_falls_back_to_tonic() {
        let chord = Chord::from_numeral(key("E", Mode::Minor), "XIV", Inversion::First);
        assert_eq!(chord.numeral, "i");
        assert_eq!(chord.symbol.to_string(), "Em");
        assert_eq!(chord.inversion, Inversion::Root);
    }

    #[test]
    fn test_sequences_substitute_in_minor() {
        let seq = generate_sequence(key("D", Mode::Minor), SequenceKind::DescendingFifths, 0);
        assert_eq!(numerals(&seq), ["i", "iv", "VII", "III", "VI", "ii°", "V", "i"]);
        assert_eq!(seq[2].symbol.to_string(), "C");
        let romanesca = generate_sequence(key("C", Mode::Major), SequenceKind::Romanesca, 10);
        assert_eq!(romanesca.len(), 10);
        assert_eq!(romanesca[1].figured(), "V6");
    }

    #[test]
    fn test_final_cadence_is_key_invariant() {
        for style in [FinalCadenceStyle::Plain, FinalCadenceStyle::CadentialSixFour] {
            let chords = final_cadence(key("D", Mode::Minor), style);
            let last = chords.last().unwrap();
            assert!(last.is_tonic());
            assert_eq!(last.inversion, Inversion::Root);
            assert_eq!(last.bass_class().to_string(), "D");
            assert!(chords[0].is_subdominant());
        }
    }

    #[test]
    fn test_progression_is_deterministic() {
        let spec = ProgressionSpec::new(10, CadencePosition::End);
        let a = generate_progression(key("F", Mode::Major), &spec, &mut ComposerRng::new(5));
        let b = generate_progression(key("F", Mode::Major), &spec, &mut ComposerRng::new(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_root_motion_prefers_fifths() {
        let c: PitchClass = "C".parse().unwrap();
        let g: PitchClass = "G".parse().unwrap();
        let fs: PitchClass = "F#".parse().unwrap();
        assert!(root_motion_quality(c, g) > root_motion_quality(c, fs));
    }
}
