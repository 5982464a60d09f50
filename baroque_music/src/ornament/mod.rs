// Melodic ornamentation: a chain of passes over a four-voice score.
//
// Each pass takes a `Score` and returns a new one; nothing is flagged in
// place. A pass rewrites one voice at a time, left to right, and the voices
// it has already rewritten are visible to the dissonance guard of the
// voices that follow. Pass order:
//
//   4-3 suspension → passing → neighbor → appoggiatura → 9-8 →
//   trill → mordent → turn → cleanup → humanize
//
// Only notes that are not already ornaments can be decorated. Every
// insertion passes three gates: the note must end before the cadence zone,
// a draw of `density × voice multiplier × ornament probability` must hit,
// and every new pitch must stay in range without forming a second, seventh
// or ninth against any overlapping note in another voice. `cleanup` then
// removes any harsh overlap that still involves an ornament, and
// `humanize` adds velocity and timing jitter.
//
// `fix_fugue_dissonances` is not part of the chain; the fugue runs it on
// its base lines before calling `ornament`.

mod cleanup;
mod figures;
mod melodic;
mod suspension;

pub use cleanup::{cleanup, fix_fugue_dissonances, humanize};
pub use figures::{mordents, trills, turns};
pub use melodic::{appoggiaturas, neighbor_tones, passing_tones};
pub use suspension::{four_three_suspensions, nine_eight_suspensions};

use crate::harmony::HarmonicSlot;
use crate::key::{Key, KeySpan, key_at};
use crate::note::{Beat, MEASURE, Note, Voice, sort_notes};
use baroque_prng::ComposerRng;

/// Harsh intervals in semitones: seconds, sevenths, ninths.
const HARSH_INTERVALS: [i32; 6] = [1, 2, 10, 11, 13, 14];

/// Seconds, sevenths, and ninths are harsh; larger compounds are not.
pub fn is_harsh_interval(a: i32, b: i32) -> bool {
    HARSH_INTERVALS.contains(&(a - b).abs())
}

/// Base probability of each ornament before density and voice scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct OrnamentProbabilities {
    pub suspension: f64,
    pub passing: f64,
    pub neighbor: f64,
    pub appoggiatura: f64,
    pub nine_eight: f64,
    pub trill: f64,
    pub mordent: f64,
    pub turn: f64,
}

impl Default for OrnamentProbabilities {
    fn default() -> Self {
        Self {
            suspension: 0.8,
            passing: 0.35,
            neighbor: 0.15,
            appoggiatura: 0.15,
            nine_eight: 0.2,
            trill: 0.12,
            mordent: 0.1,
            turn: 0.08,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HumanizeConfig {
    pub base_velocity: u8,
    pub velocity_jitter: i32,
    /// Added on slot downbeats.
    pub downbeat_accent: i32,
    /// Subtracted from ornament notes.
    pub ornament_softening: i32,
    /// Chance that a note after a rest is played one tick early.
    pub early_probability: f64,
}

impl Default for HumanizeConfig {
    fn default() -> Self {
        Self {
            base_velocity: 80,
            velocity_jitter: 8,
            downbeat_accent: 6,
            ornament_softening: 6,
            early_probability: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrnamentConfig {
    /// Overall density, 0..1.
    pub density: f64,
    /// SATB scaling of every ornament probability.
    pub voice_multipliers: [f64; 4],
    /// Extra SATB bias for appoggiaturas, which belong mainly to the soprano.
    pub appoggiatura_bias: [f64; 4],
    pub probabilities: OrnamentProbabilities,
    /// Length of the piece in measures.
    pub total_measures: u32,
    /// Trailing measures kept free of ornaments.
    pub cadence_measures_suppressed: u32,
    pub humanize: HumanizeConfig,
}

impl Default for OrnamentConfig {
    fn default() -> Self {
        Self {
            density: 0.5,
            voice_multipliers: [1.0, 0.7, 0.7, 0.5],
            appoggiatura_bias: [1.0, 0.25, 0.25, 0.1],
            probabilities: OrnamentProbabilities::default(),
            total_measures: 0,
            cadence_measures_suppressed: 1,
            humanize: HumanizeConfig::default(),
        }
    }
}

impl OrnamentConfig {
    /// Map the 0..100 option scale onto `density`.
    pub fn with_density_percent(mut self, percent: f64) -> Self {
        self.density = (percent / 100.0).clamp(0.0, 1.0);
        self
    }
}

/// What the passes need to know about the piece besides its notes.
#[derive(Debug, Clone, Copy)]
pub struct OrnamentContext<'a> {
    pub config: &'a OrnamentConfig,
    pub slots: &'a [HarmonicSlot],
    pub key_spans: &'a [KeySpan],
    pub home: Key,
}

impl OrnamentContext<'_> {
    pub fn key_at(&self, t: Beat) -> Key {
        key_at(self.key_spans, t, self.home)
    }

    /// Start of the ornament-free cadence zone.
    pub fn zone_start(&self) -> Beat {
        let kept = self
            .config
            .total_measures
            .saturating_sub(self.config.cadence_measures_suppressed);
        Beat::from_ticks(kept * MEASURE.ticks())
    }

    pub fn in_cadence_zone(&self, note: &Note) -> bool {
        note.end() > self.zone_start()
    }

    /// The slot starting exactly at `t`.
    pub fn slot_starting_at(&self, t: Beat) -> Option<(usize, &HarmonicSlot)> {
        self.slots.iter().enumerate().find(|(_, s)| s.start == t)
    }

    /// Cadence-zone and probability gates for decorating `note`.
    pub fn gate(&self, note: &Note, base_probability: f64, bias: f64, rng: &mut ComposerRng) -> bool {
        if note.is_ornament() || self.in_cadence_zone(note) {
            return false;
        }
        let p = self.config.density * self.config.voice_multipliers[note.voice.index()] * base_probability * bias;
        rng.random_bool(p)
    }
}

/// Notes grouped by voice, each line ordered by start time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Score {
    voices: [Vec<Note>; 4],
}

impl Score {
    pub fn from_notes(notes: Vec<Note>) -> Self {
        let mut score = Score::default();
        for note in notes {
            score.voices[note.voice.index()].push(note);
        }
        for line in &mut score.voices {
            line.sort_by_key(|n| n.start_time);
        }
        score
    }

    pub fn voice(&self, voice: Voice) -> &[Note] {
        &self.voices[voice.index()]
    }

    /// All notes in canonical order.
    pub fn into_notes(self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.voices.into_iter().flatten().collect();
        sort_notes(&mut notes);
        notes
    }

    /// Whether `midi` sounding over `[start, end)` in `voice` would form a
    /// harsh interval with any other voice.
    pub fn clashes(&self, voice: Voice, midi: i32, start: Beat, end: Beat) -> bool {
        Voice::ALL
            .iter()
            .filter(|&&v| v != voice)
            .flat_map(|&v| self.voice(v))
            .any(|n| n.overlaps_span(start, end) && is_harsh_interval(n.midi(), midi))
    }

    /// In range for `voice` and free of harsh intervals.
    pub fn admits(&self, voice: Voice, midi: i32, start: Beat, end: Beat) -> bool {
        voice.contains(midi) && !self.clashes(voice, midi, start, end)
    }

    /// Rewrite each voice in turn. The closure sees the score with the
    /// voices already rewritten.
    pub(crate) fn rewrite(&self, mut f: impl FnMut(Voice, &[Note], &Score) -> Vec<Note>) -> Score {
        let mut out = self.clone();
        for voice in Voice::ALL {
            let line = out.voices[voice.index()].clone();
            let rewritten = f(voice, &line, &out);
            out.voices[voice.index()] = rewritten;
        }
        out
    }
}

/// A new note at `midi` spelled in the key in force at `start`.
pub(crate) fn spelled(ctx: &OrnamentContext<'_>, midi: i32, template: &Note, start: Beat) -> Note {
    let mut note = template.clone();
    note.pitch = ctx.key_at(start).spell(midi);
    note.start_time = start;
    note
}

/// Run the full ornament chain.
pub fn ornament(notes: Vec<Note>, ctx: &OrnamentContext<'_>, rng: &mut ComposerRng) -> Vec<Note> {
    let before = notes.len();
    let score = Score::from_notes(notes);
    let score = four_three_suspensions(&score, ctx, rng);
    let score = passing_tones(&score, ctx, rng);
    let score = neighbor_tones(&score, ctx, rng);
    let score = appoggiaturas(&score, ctx, rng);
    let score = nine_eight_suspensions(&score, ctx, rng);
    let score = trills(&score, ctx, rng);
    let score = mordents(&score, ctx, rng);
    let score = turns(&score, ctx, rng);
    let notes = cleanup(score.into_notes());
    let notes = humanize(notes, ctx, rng);
    log::debug!(
        "ornamentation: {before} notes in, {} out (density {:.2})",
        notes.len(),
        ctx.config.density
    );
    notes
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::note::Duration;

    #[test]
    fn test_harsh_interval_set() {
        for semis in [1, 2, 10, 11, 13, 14] {
            assert!(is_harsh_interval(60, 60 + semis));
            assert!(is_harsh_interval(60 + semis, 60));
        }
        for semis in [0, 3, 4, 5, 6, 7, 8, 9, 12, 15, 22] {
            assert!(!is_harsh_interval(60, 60 + semis), "{semis}");
        }
    }

    #[test]
    fn test_cadence_zone() {
        let config = OrnamentConfig {
            total_measures: 4,
            cadence_measures_suppressed: 1,
            ..OrnamentConfig::default()
        };
        let slots = slots(c_major(), &["I", "IV", "V", "I"]);
        let ctx = OrnamentContext {
            config: &config,
            slots: &slots,
            key_spans: &[],
            home: c_major(),
        };
        assert_eq!(ctx.zone_start(), Beat::from_beats(6));
        assert!(!ctx.in_cadence_zone(&note("C4", Duration::Half, 4, Voice::Soprano)));
        assert!(ctx.in_cadence_zone(&note("C4", Duration::Half, 5, Voice::Soprano)));
    }

    #[test]
    fn test_zero_density_changes_nothing_but_velocity() {
        let config = OrnamentConfig {
            density: 0.0,
            total_measures: 2,
            ..OrnamentConfig::default()
        };
        let slots = slots(c_major(), &["I", "I"]);
        let ctx = OrnamentContext {
            config: &config,
            slots: &slots,
            key_spans: &[],
            home: c_major(),
        };
        let notes = vec![
            note("E5", Duration::Half, 0, Voice::Soprano),
            note("C5", Duration::Half, 2, Voice::Soprano),
            note("G4", Duration::Half, 0, Voice::Alto),
            note("E4", Duration::Half, 2, Voice::Alto),
            note("C4", Duration::Half, 0, Voice::Tenor),
            note("G3", Duration::Half, 2, Voice::Tenor),
            note("C3", Duration::Half, 0, Voice::Bass),
            note("C3", Duration::Half, 2, Voice::Bass),
        ];
        let out = ornament(notes.clone(), &ctx, &mut ComposerRng::new(1));
        assert_eq!(out.len(), notes.len());
        for n in &out {
            assert!(n.kind.is_none());
            let v = n.velocity.unwrap();
            assert!((1..=127).contains(&v));
        }
    }

    #[test]
    fn test_score_clash_ignores_own_voice() {
        let score = Score::from_notes(vec![
            note("C5", Duration::Half, 0, Voice::Soprano),
            note("E4", Duration::Half, 0, Voice::Alto),
        ]);
        assert!(score.clashes(Voice::Alto, 71, Beat::ZERO, Beat::from_beats(1)));
        assert!(!score.clashes(Voice::Soprano, 71, Beat::ZERO, Beat::from_beats(1)));
        assert!(!score.clashes(Voice::Alto, 71, Beat::from_beats(2), Beat::from_beats(3)));
        assert!(!score.admits(Voice::Alto, 90, Beat::ZERO, Beat::from_beats(1)));
    }
}
