// Keys, modes, and key-aware spelling.
//
// A `Key` is a tonic pitch class plus major/minor. It owns the decisions
// that depend on mode: which scale a roman numeral resolves against, what
// the leading tone is, how to spell a MIDI number diatonically, and where
// the diatonic neighbours of a pitch lie.

use crate::note::Beat;
use baroque_theory::{
    ChordQuality, ChordSymbol, Pitch, PitchClass, RomanNumeral, ScaleType, TheoryError,
    scale_notes,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Mode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" | "maj" | "ionian" => Some(Mode::Major),
            "minor" | "min" | "aeolian" => Some(Mode::Minor),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }

    pub fn scale_type(self) -> ScaleType {
        match self {
            Mode::Major => ScaleType::Major,
            Mode::Minor => ScaleType::NaturalMinor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    tonic: PitchClass,
    mode: Mode,
}

impl Key {
    pub fn new(tonic: PitchClass, mode: Mode) -> Self {
        Self { tonic, mode }
    }

    pub fn tonic(self) -> PitchClass {
        self.tonic
    }

    pub fn mode(self) -> Mode {
        self.mode
    }

    /// Natural scale: major, or natural minor.
    pub fn scale(self) -> [PitchClass; 7] {
        scale_notes(self.tonic, self.mode.scale_type())
    }

    /// Major, or harmonic minor (raised 7th).
    pub fn harmonic_scale(self) -> [PitchClass; 7] {
        match self.mode {
            Mode::Major => self.scale(),
            Mode::Minor => scale_notes(self.tonic, ScaleType::HarmonicMinor),
        }
    }

    /// Major, or ascending melodic minor (raised 6th and 7th).
    pub fn melodic_scale(self) -> [PitchClass; 7] {
        match self.mode {
            Mode::Major => self.scale(),
            Mode::Minor => scale_notes(self.tonic, ScaleType::MelodicMinor),
        }
    }

    pub fn leading_tone(self) -> PitchClass {
        self.harmonic_scale()[6]
    }

    pub fn dominant(self) -> PitchClass {
        self.scale()[4]
    }

    /// Resolve a roman numeral in this key.
    ///
    /// In minor, the leading-tone family (`vii°`, `vii°7`, `viiø7`) takes
    /// its root from harmonic minor; everything else reads natural minor,
    /// whose upper-case `V` still comes out major because quality follows
    /// the numeral's case.
    pub fn resolve(self, numeral: &str) -> Result<ChordSymbol, TheoryError> {
        let parsed: RomanNumeral = numeral.parse()?;
        let leading_tone_family = parsed.degree == 7
            && matches!(
                parsed.quality,
                ChordQuality::Diminished
                    | ChordQuality::Diminished7
                    | ChordQuality::HalfDiminished7
            );
        let scale = match (self.mode, leading_tone_family) {
            (Mode::Minor, true) => ScaleType::HarmonicMinor,
            (mode, _) => mode.scale_type(),
        };
        Ok(ChordSymbol::new(parsed.root_in(self.tonic, scale), parsed.quality))
    }

    /// Whether the MIDI number belongs to the key, counting the raised 6th
    /// and 7th of minor.
    pub fn contains_midi(self, midi: i32) -> bool {
        self.spelling_for(midi).is_some()
    }

    fn spelling_for(self, midi: i32) -> Option<PitchClass> {
        let pc = midi.rem_euclid(12) as u8;
        [self.scale(), self.harmonic_scale(), self.melodic_scale()]
            .into_iter()
            .flatten()
            .find(|c| c.semitone() == pc)
    }

    /// Spell a MIDI number in this key, falling back to sharps or flats by
    /// key signature for chromatic pitches.
    pub fn spell(self, midi: i32) -> Pitch {
        if let Some(p) = self
            .spelling_for(midi)
            .and_then(|class| Pitch::from_midi_as(midi, class))
        {
            return p;
        }
        if self.scale().iter().any(|c| c.accidental() > 0) {
            Pitch::from_midi_sharps(midi)
        } else {
            Pitch::from_midi(midi)
        }
    }

    /// Diatonic neighbour above `midi` (natural scale), within a whole step.
    pub fn step_above(self, midi: i32) -> Option<i32> {
        let scale = self.scale();
        (midi + 1..=midi + 2).find(|m| scale.iter().any(|c| c.semitone() as i32 == m.rem_euclid(12)))
    }

    /// Diatonic neighbour below `midi`. Minor keys use the raised 7th, so the
    /// lower neighbour of the tonic is the leading tone.
    pub fn step_below(self, midi: i32) -> Option<i32> {
        let scale = self.harmonic_scale();
        (midi - 2..midi)
            .rev()
            .find(|m| scale.iter().any(|c| c.semitone() as i32 == m.rem_euclid(12)))
    }

    /// All MIDI numbers in `[lo, hi]` that belong to the natural scale, plus
    /// the leading tone in minor.
    pub fn pitches_in(self, lo: i32, hi: i32) -> Vec<i32> {
        let mut classes: Vec<u8> = self.scale().iter().map(|c| c.semitone()).collect();
        if self.mode == Mode::Minor {
            classes.push(self.leading_tone().semitone());
        }
        (lo..=hi)
            .filter(|m| classes.contains(&(m.rem_euclid(12) as u8)))
            .collect()
    }

    /// "D minor".
    pub fn label(self) -> String {
        format!("{} {}", self.tonic, self.mode.name())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A stretch of the score governed by one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpan {
    pub start: Beat,
    pub end: Beat,
    pub key: Key,
}

/// The key in force at `t`, or `fallback` outside every span.
pub fn key_at(spans: &[KeySpan], t: Beat, fallback: Key) -> Key {
    spans
        .iter()
        .find(|s| s.start <= t && t < s.end)
        .map(|s| s.key)
        .unwrap_or(fallback)
}
