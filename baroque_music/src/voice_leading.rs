// Four-part voice leading: one SATB voicing per chord.
//
// Each chord after the first is connected to the previous voicing by a
// small beam search: every voice proposes the chord tones nearest its last
// pitch (previous octave, one below, one above), keeps the closest few, and
// every combination that satisfies ordering and spacing is costed. Cost is
// total motion plus penalties from `VoiceLeadingOptions`:
//
//   parallel fifths/octaves   forbidden (infinite)
//   hidden perfects           heavy penalty
//   unresolved sevenths       medium penalty
//   doubled leading tone      heaviest penalty
//   root not doubled          light penalty (root-position triads)
//   missing chord members     medium penalty
//
// When no combination survives, `closed_voicing` searches every in-range
// arrangement exhaustively, and as a last resort drops the parallel rule
// and then completeness. A progression with nothing before it opens in
// close position, root in the bass and doubled, when its first chord is in
// root position. The bass always carries the chord's inversion
// pitch class. Ties are broken with the composer rng.

use crate::harmony::{Chord, Inversion};
use crate::note::Voice;
use baroque_prng::ComposerRng;
use baroque_theory::PitchClass;

/// Preferred centre of each voice for an unconstrained voicing.
const VOICING_CENTERS: [i32; 4] = [72, 65, 58, 48];

/// Widest interval allowed between soprano/alto and alto/tenor.
pub const MAX_UPPER_SPACING: i32 = 12;

const COST_EPSILON: f64 = 1e-9;

/// MIDI pitches in SATB order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Voicing(pub [i32; 4]);

impl Voicing {
    pub fn get(&self, voice: Voice) -> i32 {
        self.0[voice.index()]
    }

    pub fn in_range(&self) -> bool {
        Voice::ALL.iter().all(|&v| v.contains(self.get(v)))
    }

    /// Strict S > A > T > B with upper spacing within an octave.
    pub fn is_well_spaced(&self) -> bool {
        let [s, a, t, b] = self.0;
        s > a && a > t && t > b && s - a <= MAX_UPPER_SPACING && a - t <= MAX_UPPER_SPACING
    }

    fn count_class(&self, class: PitchClass) -> usize {
        self.0
            .iter()
            .filter(|m| m.rem_euclid(12) == class.semitone() as i32)
            .count()
    }
}

/// Penalty weights and switches. Defaults are what `generate` uses.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceLeadingOptions {
    /// Reject parallel perfect intervals outright.
    pub avoid_parallels: bool,
    /// Apply the doubling and completeness terms.
    pub check_doubling: bool,
    /// Candidates kept per voice in the beam search.
    pub candidates_per_voice: usize,
    pub hidden_perfect: f64,
    pub unresolved_seventh: f64,
    pub doubled_leading_tone: f64,
    pub undoubled_root: f64,
    pub missing_member: f64,
}

impl Default for VoiceLeadingOptions {
    fn default() -> Self {
        Self {
            avoid_parallels: true,
            check_doubling: true,
            candidates_per_voice: 2,
            hidden_perfect: 50.0,
            unresolved_seventh: 20.0,
            doubled_leading_tone: 100.0,
            undoubled_root: 5.0,
            missing_member: 40.0,
        }
    }
}

// ── Motion analysis ──

/// How two voices move relative to each other between two sonorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Neither voice moves.
    Static,
    /// One voice holds while the other moves.
    Oblique,
    /// Opposite directions.
    Contrary,
    /// Same direction, different interval.
    Similar,
    /// Same direction, same interval.
    Parallel,
}

/// Classify motion from `(upper_prev, lower_prev)` to `(upper_next, lower_next)`.
pub fn classify_motion(prev: (i32, i32), next: (i32, i32)) -> Motion {
    let du = next.0 - prev.0;
    let dl = next.1 - prev.1;
    match (du.signum(), dl.signum()) {
        (0, 0) => Motion::Static,
        (0, _) | (_, 0) => Motion::Oblique,
        (a, b) if a != b => Motion::Contrary,
        _ if prev.0 - prev.1 == next.0 - next.1 => Motion::Parallel,
        _ => Motion::Similar,
    }
}

/// Unison, fifth, or octave (compound intervals included).
pub fn is_perfect_interval(semitones: i32) -> bool {
    matches!(semitones.rem_euclid(12), 0 | 7)
}

/// Voice pairs that move in parallel fifths or octaves from `prev` to `next`.
pub fn parallel_perfects(prev: &Voicing, next: &Voicing) -> Vec<(Voice, Voice)> {
    let mut found = Vec::new();
    for (i, &upper) in Voice::ALL.iter().enumerate() {
        for &lower in &Voice::ALL[i + 1..] {
            if is_parallel_perfect(
                (prev.get(upper), prev.get(lower)),
                (next.get(upper), next.get(lower)),
            ) {
                found.push((upper, lower));
            }
        }
    }
    found
}

/// Both intervals perfect of the same class, both voices moving the same way.
pub fn is_parallel_perfect(prev: (i32, i32), next: (i32, i32)) -> bool {
    let before = prev.0 - prev.1;
    let after = next.0 - next.1;
    let du = next.0 - prev.0;
    let dl = next.1 - prev.1;
    is_perfect_interval(before)
        && is_perfect_interval(after)
        && before.rem_euclid(12) == after.rem_euclid(12)
        && du != 0
        && du.signum() == dl.signum()
}

fn is_hidden_perfect(prev: (i32, i32), next: (i32, i32)) -> bool {
    let du = next.0 - prev.0;
    let dl = next.1 - prev.1;
    du != 0
        && du.signum() == dl.signum()
        && is_perfect_interval(next.0 - next.1)
        && !is_parallel_perfect(prev, next)
}

// ── Costs ──

/// Cost of moving from `prev` to `next`. `prev_chord` supplies the seventh
/// that must resolve down by step.
pub fn transition_cost(
    prev: &Voicing,
    prev_chord: Option<&Chord>,
    next: &Voicing,
    options: &VoiceLeadingOptions,
) -> f64 {
    let mut cost: f64 = prev.0.iter().zip(next.0.iter()).map(|(a, b)| (b - a).abs() as f64).sum();

    for (i, &upper) in Voice::ALL.iter().enumerate() {
        for &lower in &Voice::ALL[i + 1..] {
            let before = (prev.get(upper), prev.get(lower));
            let after = (next.get(upper), next.get(lower));
            if options.avoid_parallels && is_parallel_perfect(before, after) {
                return f64::INFINITY;
            }
            if is_hidden_perfect(before, after) {
                cost += options.hidden_perfect;
            }
        }
    }

    if let Some(seventh) = prev_chord.and_then(Chord::seventh) {
        for voice in Voice::ALL {
            let from = prev.get(voice);
            if from.rem_euclid(12) != seventh.semitone() as i32 {
                continue;
            }
            let step = next.get(voice) - from;
            if !(-2..=-1).contains(&step) {
                cost += options.unresolved_seventh;
            }
        }
    }
    cost
}

/// Doubling and completeness penalties for `voicing` over `chord`.
pub fn chord_cost(voicing: &Voicing, chord: &Chord, options: &VoiceLeadingOptions) -> f64 {
    if !options.check_doubling {
        return 0.0;
    }
    let mut cost = 0.0;
    if !validate_doubling(voicing, chord) {
        cost += options.doubled_leading_tone;
    }
    if !chord.has_seventh()
        && chord.inversion == Inversion::Root
        && voicing.count_class(chord.root()) < 2
    {
        cost += options.undoubled_root;
    }
    let tones = chord.tones();
    let essential = [Some(tones[0]), tones.get(1).copied(), chord.seventh()];
    for class in essential.into_iter().flatten() {
        if voicing.count_class(class) == 0 {
            cost += options.missing_member;
        }
    }
    cost
}

/// False when the key's leading tone appears in more than one voice.
pub fn validate_doubling(voicing: &Voicing, chord: &Chord) -> bool {
    voicing.count_class(chord.key.leading_tone()) < 2
}

/// Whether every distinct pitch class of the chord is present.
pub fn is_complete(voicing: &Voicing, chord: &Chord) -> bool {
    chord.tones().iter().all(|&c| voicing.count_class(c) > 0)
}

// ── Search ──

fn pick_cheapest(scored: Vec<(f64, Voicing)>, rng: &mut ComposerRng) -> Option<Voicing> {
    let best = scored
        .iter()
        .map(|&(c, _)| c)
        .filter(|c| c.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !best.is_finite() {
        return None;
    }
    let ties: Vec<Voicing> = scored
        .into_iter()
        .filter(|&(c, _)| (c - best).abs() < COST_EPSILON)
        .map(|(_, v)| v)
        .collect();
    rng.choose(&ties).copied()
}

/// Pitches of `classes` within `voice`'s range, nearest to `anchor` first,
/// at most `keep` of them, drawn from the anchor's octave and its neighbours.
fn nearby_candidates(voice: Voice, anchor: i32, classes: &[PitchClass], keep: usize) -> Vec<i32> {
    let octave = anchor.div_euclid(12);
    let mut out: Vec<i32> = classes
        .iter()
        .flat_map(|c| (-1..=1).map(move |o| 12 * (octave + o) + c.semitone() as i32))
        .filter(|&m| voice.contains(m))
        .collect();
    out.sort_by_key(|&m| ((m - anchor).abs(), m));
    out.dedup();
    out.truncate(keep);
    out
}

/// Connect `prev` to `chord` with minimal cost.
pub fn connect(
    prev: &Voicing,
    prev_chord: Option<&Chord>,
    chord: &Chord,
    options: &VoiceLeadingOptions,
    rng: &mut ComposerRng,
) -> Voicing {
    let tones = chord.tones();
    let bass_class = [chord.bass_class()];
    let keep = options.candidates_per_voice.max(1);
    let per_voice: Vec<Vec<i32>> = Voice::ALL
        .iter()
        .map(|&v| {
            let classes: &[PitchClass] = if v == Voice::Bass { &bass_class } else { &tones };
            nearby_candidates(v, prev.get(v), classes, keep)
        })
        .collect();

    let mut scored = Vec::new();
    for &s in &per_voice[0] {
        for &a in &per_voice[1] {
            for &t in &per_voice[2] {
                for &b in &per_voice[3] {
                    let candidate = Voicing([s, a, t, b]);
                    if !candidate.is_well_spaced() {
                        continue;
                    }
                    let cost = transition_cost(prev, prev_chord, &candidate, options)
                        + chord_cost(&candidate, chord, options);
                    scored.push((cost, candidate));
                }
            }
        }
    }

    match pick_cheapest(scored, rng) {
        Some(v) => v,
        None => {
            log::debug!("beam search failed for {}; searching all voicings", chord.figured());
            closed_voicing(chord, Some((prev, prev_chord)), options, rng)
        }
    }
}

fn in_range_of(voice: Voice, classes: &[PitchClass]) -> Vec<i32> {
    let (lo, hi) = voice.range();
    (lo..=hi)
        .filter(|m| classes.iter().any(|c| c.semitone() as i32 == m.rem_euclid(12)))
        .collect()
}

/// Close position with the root in the bass and doubled above it.
fn is_opening_shape(voicing: &Voicing, chord: &Chord) -> bool {
    let [s, _, t, _] = voicing.0;
    s - t <= MAX_UPPER_SPACING && voicing.count_class(chord.root()) >= 2
}

fn search_voicings(
    chord: &Chord,
    previous: Option<(&Voicing, Option<&Chord>)>,
    options: &VoiceLeadingOptions,
    opening: bool,
    rng: &mut ComposerRng,
) -> Option<Voicing> {
    let tones = chord.tones();
    let basses = in_range_of(Voice::Bass, &[chord.bass_class()]);
    let tenors = in_range_of(Voice::Tenor, &tones);
    let altos = in_range_of(Voice::Alto, &tones);
    let sopranos = in_range_of(Voice::Soprano, &tones);

    // Strict pass, then without the parallel rule, then without completeness.
    let relaxed = VoiceLeadingOptions {
        avoid_parallels: false,
        ..options.clone()
    };
    let passes = [(options, true), (&relaxed, true), (&relaxed, false)];

    for (pass_options, require_complete) in passes {
        let mut scored = Vec::new();
        for &b in &basses {
            for &t in tenors.iter().filter(|&&t| t > b) {
                for &a in altos.iter().filter(|&&a| a > t && a - t <= MAX_UPPER_SPACING) {
                    for &s in sopranos.iter().filter(|&&s| s > a && s - a <= MAX_UPPER_SPACING) {
                        let candidate = Voicing([s, a, t, b]);
                        if require_complete && !is_complete(&candidate, chord) {
                            continue;
                        }
                        if opening && !is_opening_shape(&candidate, chord) {
                            continue;
                        }
                        let center: i32 = candidate
                            .0
                            .iter()
                            .zip(VOICING_CENTERS)
                            .map(|(m, c)| (m - c).abs())
                            .sum();
                        let spread = (s - t) as f64 * 0.25;
                        let mut cost = center as f64 + spread + chord_cost(&candidate, chord, pass_options);
                        if let Some((prev, prev_chord)) = previous {
                            cost += transition_cost(prev, prev_chord, &candidate, pass_options);
                        }
                        scored.push((cost, candidate));
                    }
                }
            }
        }
        if let Some(v) = pick_cheapest(scored, rng) {
            return Some(v);
        }
    }
    None
}

/// Exhaustive search for the best voicing of `chord`, optionally joined to
/// a previous voicing. Prefers central, compact, complete voicings.
pub fn closed_voicing(
    chord: &Chord,
    previous: Option<(&Voicing, Option<&Chord>)>,
    options: &VoiceLeadingOptions,
    rng: &mut ComposerRng,
) -> Voicing {
    search_voicings(chord, previous, options, false, rng).unwrap_or_else(|| {
        // Ranges are wide enough that the last pass always finds something.
        log::warn!("no voicing found for {}; using voice centres", chord.figured());
        Voicing(VOICING_CENTERS)
    })
}

/// Voicing for the first chord of a progression. A root-position chord
/// starts in close position with its root doubled; inversions keep their
/// bass and take the ordinary search.
pub fn opening_voicing(chord: &Chord, options: &VoiceLeadingOptions, rng: &mut ComposerRng) -> Voicing {
    if chord.inversion != Inversion::Root {
        return closed_voicing(chord, None, options, rng);
    }
    match search_voicings(chord, None, options, true, rng) {
        Some(v) => v,
        None => {
            log::debug!("no close root-doubled opening for {}", chord.figured());
            closed_voicing(chord, None, options, rng)
        }
    }
}

/// Voice a whole progression, continuing from `previous` when given.
pub fn voice_progression(
    chords: &[Chord],
    previous: Option<(Voicing, Chord)>,
    options: &VoiceLeadingOptions,
    rng: &mut ComposerRng,
) -> Vec<Voicing> {
    let mut out: Vec<Voicing> = Vec::with_capacity(chords.len());
    let mut last = previous;
    for chord in chords {
        let voicing = match &last {
            Some((prev, prev_chord)) => connect(prev, Some(prev_chord), chord, options, rng),
            None => opening_voicing(chord, options, rng),
        };
        out.push(voicing);
        last = Some((voicing, chord.clone()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::{CadencePosition, ProgressionSpec, generate_progression, generate_sequence, SequenceKind};
    use crate::key::{Key, Mode};

    fn key(tonic: &str, mode: Mode) -> Key {
        Key::new(tonic.parse().unwrap(), mode)
    }

    fn chord(k: Key, numeral: &str, inversion: Inversion) -> Chord {
        Chord::from_numeral(k, numeral, inversion)
    }

    #[test]
    fn test_motion_classification() {
        assert_eq!(classify_motion((72, 60), (74, 62)), Motion::Parallel);
        assert_eq!(classify_motion((72, 60), (74, 59)), Motion::Contrary);
        assert_eq!(classify_motion((72, 60), (76, 62)), Motion::Similar);
        assert_eq!(classify_motion((72, 60), (72, 62)), Motion::Oblique);
        assert_eq!(classify_motion((72, 60), (72, 60)), Motion::Static);
    }

    #[test]
    fn test_parallel_octaves_are_forbidden() {
        let prev = Voicing([72, 67, 64, 48]);
        let next = Voicing([74, 69, 65, 50]);
        let cost = transition_cost(&prev, None, &next, &VoiceLeadingOptions::default());
        assert!(cost.is_infinite());
        assert!(!parallel_perfects(&prev, &next).is_empty());
    }

    #[test]
    fn test_unresolved_seventh_penalized() {
        let c = key("C", Mode::Major);
        let v7 = chord(c, "V7", Inversion::Root);
        let prev = Voicing([65, 62, 59, 43]); // F in the soprano is the seventh
        let resolved = Voicing([64, 60, 60, 48]);
        let unresolved = Voicing([67, 60, 60, 48]);
        let opts = VoiceLeadingOptions::default();
        let good = transition_cost(&prev, Some(&v7), &resolved, &opts);
        let bad = transition_cost(&prev, Some(&v7), &unresolved, &opts);
        assert!(bad >= good + opts.unresolved_seventh);
    }

    #[test]
    fn test_doubled_leading_tone_rejected() {
        let c = key("C", Mode::Major);
        let v = chord(c, "V", Inversion::Root);
        assert!(!validate_doubling(&Voicing([71, 67, 59, 43]), &v));
        assert!(validate_doubling(&Voicing([71, 67, 62, 43]), &v));
    }

    #[test]
    fn test_closed_voicing_is_complete_and_spaced() {
        let mut rng = ComposerRng::new(1);
        let opts = VoiceLeadingOptions::default();
        for numeral in ["I", "IV", "V7", "vii°", "ii"] {
            for inv in [Inversion::Root, Inversion::First] {
                let ch = chord(key("E", Mode::Minor), numeral, inv);
                let v = closed_voicing(&ch, None, &opts, &mut rng);
                assert!(v.in_range(), "{numeral}: {v:?}");
                assert!(v.is_well_spaced(), "{numeral}: {v:?}");
                assert_eq!(v.get(Voice::Bass).rem_euclid(12), ch.bass_class().semitone() as i32);
            }
        }
    }

    #[test]
    fn test_progression_opens_close_with_doubled_root() {
        let opts = VoiceLeadingOptions::default();
        let keys = [("C", Mode::Major), ("F#", Mode::Minor), ("Bb", Mode::Major), ("E", Mode::Minor)];
        for (tonic, mode) in keys {
            let k = key(tonic, mode);
            for seed in 0..10 {
                let mut rng = ComposerRng::new(seed);
                let chords = generate_progression(k, &ProgressionSpec::new(8, CadencePosition::End), &mut rng);
                let opening = voice_progression(&chords, None, &opts, &mut rng)[0];
                let root = chords[0].root();
                assert_eq!(chords[0].inversion, Inversion::Root);
                assert_eq!(opening.get(Voice::Bass).rem_euclid(12), root.semitone() as i32, "{tonic} {seed}");
                assert!(opening.count_class(root) >= 2, "{tonic} {seed}: {opening:?}");
                assert!(opening.get(Voice::Soprano) - opening.get(Voice::Tenor) <= 12, "{opening:?}");
            }
        }

        let mut rng = ComposerRng::new(3);
        let sixth = chord(key("C", Mode::Major), "I", Inversion::First);
        let v = opening_voicing(&sixth, &opts, &mut rng);
        assert_eq!(v.get(Voice::Bass).rem_euclid(12), 4);
    }

    #[test]
    fn test_progressions_avoid_parallels() {
        let opts = VoiceLeadingOptions::default();
        for seed in 0..40 {
            let mut rng = ComposerRng::new(seed);
            let k = if seed % 2 == 0 { key("C", Mode::Major) } else { key("G", Mode::Minor) };
            let chords = generate_progression(k, &ProgressionSpec::new(12, CadencePosition::End), &mut rng);
            let voicings = voice_progression(&chords, None, &opts, &mut rng);
            assert_eq!(voicings.len(), chords.len());
            for (v, ch) in voicings.iter().zip(&chords) {
                assert!(v.in_range());
                assert!(v.is_well_spaced());
                assert_eq!(v.get(Voice::Bass).rem_euclid(12), ch.bass_class().semitone() as i32);
            }
            for pair in voicings.windows(2) {
                assert!(parallel_perfects(&pair[0], &pair[1]).is_empty(), "seed {seed}");
            }
        }
    }

    #[test]
    fn test_sequences_voice_smoothly() {
        let mut rng = ComposerRng::new(9);
        let chords = generate_sequence(key("D", Mode::Minor), SequenceKind::DescendingFifths, 8);
        let voicings = voice_progression(&chords, None, &VoiceLeadingOptions::default(), &mut rng);
        for pair in voicings.windows(2) {
            let soprano_leap = (pair[1].get(Voice::Soprano) - pair[0].get(Voice::Soprano)).abs();
            assert!(soprano_leap <= 12);
        }
    }
}
