// Four-voice fugue.
//
// The fugue runs as a fixed sequence of stages taken from the fugue plan in
// `structure`. With an 8-beat subject L:
//
//   Exposition       4L   S subject, A answer, T subject, B answer. The
//                         voice that just finished plays the countersubject;
//                         earlier voices continue in free counterpoint.
//   Episode          16   descending-fifths sequence, inner voices drop out
//                         at random
//   Middle Entries   2L   relative key: alto subject, then tenor answer
//                         against the alto's countersubject
//   Episode 2        16   romanesca sequence
//   Stretto          6+L  B, T, A, S entries two beats apart
//   Final Entry      L    soprano subject over a tonic pedal, then the
//                         closing IV - V - I in the home key
//
// The subject is a random walk over scale degrees on one of five rhythm
// templates; its last note lands on a tonic-triad degree. The answer is
// tonal: every note moves up a fifth except the dominant itself, which
// moves up a fourth. The countersubject is the inverted subject with its
// rhythm reversed, nudged onto consonances against the line it accompanies.
//
// After assembly, clashing base notes are repaired by strength of role, and
// the general ornament chain runs with the last four measures left plain.

use crate::harmony::{
    Chord, FinalCadenceStyle, HarmonicSlot, SequenceKind, final_cadence, generate_sequence,
    progression_label,
};
use crate::key::{Key, KeySpan};
use crate::modulation::{Relation, related_key};
use crate::motif::{Motif, tonic_near};
use crate::note::{Beat, Duration, MEASURE, Note, NoteKind, Voice, fill_span, sort_notes};
use crate::ornament::{
    OrnamentConfig, OrnamentContext, fix_fugue_dissonances, is_harsh_interval, ornament,
};
use crate::rhythm::fill_slot;
use crate::structure::{FUGUE_SUBJECT_BARS, Form, SectionKind, SectionSpan, plan};
use crate::voice_leading::{VoiceLeadingOptions, voice_progression};
use baroque_prng::ComposerRng;

/// Length of subject, answer, and countersubject.
pub const SUBJECT_LEN: Beat = Beat::from_beats(2 * FUGUE_SUBJECT_BARS as u32);

/// Distance between successive stretto entries.
const STRETTO_OFFSET: Beat = Beat::from_beats(2);

/// Chance that an inner voice rests for one episode chord.
const EPISODE_DROPOUT: f64 = 0.25;

/// Measures at the end kept free of ornaments.
const CADENCE_MEASURES: u32 = 4;

/// Scale-degree bounds of the subject walk.
const WALK_LOW: i32 = -3;
const WALK_HIGH: i32 = 7;

/// Tonic-triad degrees a subject may end on.
const TRIAD_DEGREES: [i32; 5] = [-3, 0, 2, 4, 7];

/// Subject rhythms, each exactly eight beats.
const SUBJECT_RHYTHMS: [&[Duration]; 5] = [
    &[
        Duration::Quarter,
        Duration::Quarter,
        Duration::Eighth,
        Duration::Eighth,
        Duration::Quarter,
        Duration::Half,
        Duration::Quarter,
        Duration::Quarter,
    ],
    &[
        Duration::Half,
        Duration::Quarter,
        Duration::Quarter,
        Duration::Eighth,
        Duration::Eighth,
        Duration::Eighth,
        Duration::Eighth,
        Duration::Half,
    ],
    &[
        Duration::DottedQuarter,
        Duration::Eighth,
        Duration::Quarter,
        Duration::Quarter,
        Duration::DottedQuarter,
        Duration::Eighth,
        Duration::Half,
    ],
    &[
        Duration::Quarter,
        Duration::Eighth,
        Duration::Eighth,
        Duration::Quarter,
        Duration::Quarter,
        Duration::Eighth,
        Duration::Eighth,
        Duration::Eighth,
        Duration::Eighth,
        Duration::Half,
    ],
    &[
        Duration::Half,
        Duration::DottedQuarter,
        Duration::Eighth,
        Duration::Quarter,
        Duration::Quarter,
        Duration::Half,
    ],
];

fn times(span: Beat, n: usize) -> Beat {
    Beat::from_ticks(span.ticks() * n as u32)
}

// ── Subject, answer, countersubject ──

fn reflect(degree: i32) -> i32 {
    if degree > WALK_HIGH {
        2 * WALK_HIGH - degree
    } else if degree < WALK_LOW {
        2 * WALK_LOW - degree
    } else {
        degree
    }
}

fn snap_to_triad(degree: i32) -> i32 {
    TRIAD_DEGREES
        .into_iter()
        .min_by_key(|&t| ((t - degree).abs(), t))
        .unwrap_or(0)
}

/// A fresh subject starting on the tonic.
pub fn generate_subject(rng: &mut ComposerRng) -> Motif {
    let rhythm = rng.choose(&SUBJECT_RHYTHMS).copied().unwrap_or(SUBJECT_RHYTHMS[0]);
    let mut degree = 0;
    let mut degrees = vec![degree];
    for _ in 1..rhythm.len() {
        let roll = rng.next_f64();
        let step = if roll < 0.4 {
            1
        } else if roll < 0.7 {
            -1
        } else if roll < 0.85 {
            2
        } else {
            -2
        };
        degree = reflect(degree + step);
        degrees.push(degree);
    }
    if let Some(last) = degrees.last_mut() {
        *last = snap_to_triad(*last);
    }
    let subject = Motif::from_degrees(&degrees, rhythm);
    log::debug!("fugue subject degrees {:?}", subject.degrees());
    subject
}

/// Shift a line by octaves so it lies in `voice`'s range, as close to the
/// middle of the range as possible. Lines too wide to fit are folded note
/// by note.
fn place(line: Vec<(i32, Duration)>, voice: Voice) -> Vec<(i32, Duration)> {
    let (lo, hi) = voice.range();
    if line.is_empty() {
        return line;
    }
    let mean = line.iter().map(|&(m, _)| m).sum::<i32>() / line.len() as i32;
    let fits = |shift: i32| line.iter().all(|&(m, _)| (lo..=hi).contains(&(m + shift)));
    let shift = [0, -12, 12, -24, 24]
        .into_iter()
        .filter(|&s| fits(s))
        .min_by_key(|&s| (mean + s - voice.center()).abs());
    match shift {
        Some(s) => line.into_iter().map(|(m, d)| (m + s, d)).collect(),
        None => line
            .into_iter()
            .map(|(m, d)| (fold_into_range(m, lo, hi), d))
            .collect(),
    }
}

fn fold_into_range(mut midi: i32, lo: i32, hi: i32) -> i32 {
    while midi < lo {
        midi += 12;
    }
    while midi > hi {
        midi -= 12;
    }
    midi
}

/// The motif in `key`, placed for `voice`.
fn realize_in(motif: &Motif, key: Key, voice: Voice) -> Vec<(i32, Duration)> {
    place(motif.realize(key, tonic_near(key, voice.center())), voice)
}

/// Up a fifth, except the dominant, which goes up a fourth.
pub fn tonal_answer(key: Key, subject: &[(i32, Duration)]) -> Vec<(i32, Duration)> {
    let dominant = key.dominant().semitone() as i32;
    subject
        .iter()
        .map(|&(m, d)| {
            let shift = if m.rem_euclid(12) == dominant { 5 } else { 7 };
            (m + shift, d)
        })
        .collect()
}

pub fn countersubject(subject: &Motif) -> Motif {
    subject.invert().retrograde_rhythm()
}

fn to_notes(pitches: &[(i32, Duration)], key: Key, start: Beat, voice: Voice, kind: NoteKind) -> Vec<Note> {
    let mut t = start;
    pitches
        .iter()
        .map(|&(m, d)| {
            let note = Note::new(key.spell(m), d, t, voice).tagged(kind);
            t += d.span();
            note
        })
        .collect()
}

fn is_consonant_against(sounding: &[i32], midi: i32) -> bool {
    sounding
        .iter()
        .all(|&o| !is_harsh_interval(o, midi) && (o - midi).rem_euclid(12) != 6)
}

/// Move notes of `line` that clash with `against` to the nearest consonant
/// scale pitch within a major third.
fn consonance_filter(line: Vec<Note>, against: &[Note], key: Key) -> Vec<Note> {
    line.into_iter()
        .map(|mut note| {
            let sounding: Vec<i32> = against
                .iter()
                .filter(|o| o.overlaps(&note))
                .map(Note::midi)
                .collect();
            let midi = note.midi();
            if is_consonant_against(&sounding, midi) {
                return note;
            }
            let mut candidates: Vec<i32> = key
                .pitches_in(midi - 4, midi + 4)
                .into_iter()
                .filter(|&m| note.voice.contains(m) && is_consonant_against(&sounding, m))
                .collect();
            candidates.sort_by_key(|&m| ((m - midi).abs(), m));
            if let Some(&m) = candidates.first() {
                note.pitch = key.spell(m);
            }
            note
        })
        .collect()
}

// ── Free counterpoint ──

fn free_cost(midi: i32, prev: i32, voice: Voice, sounding: &[&Note]) -> f64 {
    let leap = (midi - prev).abs();
    let mut cost = leap as f64;
    if leap > 7 {
        cost += 5.0;
    }
    for other in sounding {
        let o = other.midi();
        if is_harsh_interval(o, midi) {
            cost += 100.0;
        }
        match (o - midi).rem_euclid(12) {
            6 => cost += 20.0,
            3 | 4 | 8 | 9 => cost -= 4.0,
            _ => {}
        }
        let crossed = (other.voice < voice && midi >= o) || (other.voice > voice && midi <= o);
        if crossed {
            cost += 30.0;
        }
    }
    cost
}

/// Half notes in `voice` over `[start, start + span)`, each the cheapest
/// scale pitch against whatever `context` has sounding.
pub fn free_counterpoint(
    key: Key,
    voice: Voice,
    start: Beat,
    span: Beat,
    context: &[Note],
    rng: &mut ComposerRng,
) -> Vec<Note> {
    let mut prev = context
        .iter()
        .filter(|n| n.voice == voice && n.end() <= start)
        .max_by_key(|n| n.start_time)
        .map(Note::midi)
        .unwrap_or(voice.center());
    let (lo, hi) = voice.range();
    let candidates = key.pitches_in(lo, hi);

    let mut out = Vec::new();
    let mut t = start;
    for d in fill_slot(&[Duration::Half], span) {
        let end = t + d.span();
        let sounding: Vec<&Note> = context
            .iter()
            .filter(|n| n.voice != voice && n.overlaps_span(t, end))
            .collect();
        let best = candidates
            .iter()
            .map(|&m| (free_cost(m, prev, voice, &sounding) + rng.next_f64() * 0.5, m))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, m)| m)
            .unwrap_or(prev);
        out.push(Note::new(key.spell(best), d, t, voice));
        prev = best;
        t = end;
    }
    out
}

// ── Assembly ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Material {
    Subject,
    Answer,
}

/// A finished fugue with the context the planner reports.
#[derive(Debug, Clone)]
pub struct Fugue {
    pub notes: Vec<Note>,
    pub sections: Vec<SectionSpan>,
    pub key_spans: Vec<KeySpan>,
    pub slots: Vec<HarmonicSlot>,
    pub progression: String,
    pub subject: Motif,
}

struct FugueBuilder<'r> {
    home: Key,
    subject: Motif,
    notes: Vec<Note>,
    slots: Vec<HarmonicSlot>,
    labels: Vec<String>,
    options: VoiceLeadingOptions,
    rng: &'r mut ComposerRng,
}

impl FugueBuilder<'_> {
    /// State the subject or answer in `key`; returns the notes stated.
    fn entry(&mut self, material: Material, key: Key, voice: Voice, start: Beat, kind: NoteKind) -> Vec<Note> {
        let subject = realize_in(&self.subject, key, voice);
        let (pitches, spelling) = match material {
            Material::Subject => (subject, key),
            Material::Answer => (
                place(tonal_answer(key, &subject), voice),
                related_key(key, Relation::Dominant),
            ),
        };
        let notes = to_notes(&pitches, spelling, start, voice, kind);
        log::trace!("{:?} in {} at beat {}", material, voice.name(), start.as_beats());
        self.notes.extend(notes.iter().cloned());
        notes
    }

    /// Countersubject in `voice` against an entry of `material` in `key`.
    fn countersubject(&mut self, material: Material, key: Key, voice: Voice, start: Beat, against: &[Note]) {
        let key = match material {
            Material::Subject => key,
            Material::Answer => related_key(key, Relation::Dominant),
        };
        let pitches = realize_in(&countersubject(&self.subject), key, voice);
        let line = to_notes(&pitches, key, start, voice, NoteKind::Countersubject);
        self.notes.extend(consonance_filter(line, against, key));
    }

    fn free(&mut self, key: Key, voice: Voice, start: Beat, span: Beat) {
        let line = free_counterpoint(key, voice, start, span, &self.notes, self.rng);
        self.notes.extend(line);
    }

    /// Voice `chords` and lay them out with the given durations.
    fn chords(&mut self, chords: &[Chord], durations: &[Duration], start: Beat, kind: NoteKind, dropout: bool) -> Beat {
        let voicings = voice_progression(chords, None, &self.options, self.rng);
        let mut t = start;
        for ((chord, voicing), &d) in chords.iter().zip(&voicings).zip(durations.iter().cycle()) {
            for voice in Voice::ALL {
                let inner = matches!(voice, Voice::Alto | Voice::Tenor);
                if dropout && inner && self.rng.random_bool(EPISODE_DROPOUT) {
                    continue;
                }
                let pitch = chord.key.spell(voicing.get(voice));
                self.notes
                    .extend(fill_span(pitch, t, d.span(), voice).into_iter().map(|n| n.tagged(kind)));
            }
            self.slots.push(HarmonicSlot {
                chord: chord.clone(),
                start: t,
                end: t + d.span(),
            });
            t += d.span();
        }
        self.labels.push(progression_label(chords));
        t
    }

    fn exposition(&mut self, start: Beat) {
        let home = self.home;
        for (i, &voice) in Voice::ALL.iter().enumerate() {
            let at = start + times(SUBJECT_LEN, i);
            let (material, kind) = if i % 2 == 0 {
                (Material::Subject, NoteKind::Subject)
            } else {
                (Material::Answer, NoteKind::Answer)
            };
            let stated = self.entry(material, home, voice, at, kind);
            if i >= 1 {
                self.countersubject(material, home, Voice::ALL[i - 1], at, &stated);
            }
            for &older in &Voice::ALL[..i.saturating_sub(1)] {
                self.free(home, older, at, SUBJECT_LEN);
            }
        }
    }

    fn episode(&mut self, start: Beat, bars: usize, kind: SequenceKind) {
        let chords = generate_sequence(self.home, kind, bars);
        log::debug!("fugue episode: {}", kind.name());
        self.chords(&chords, &[Duration::Half], start, NoteKind::Episode, true);
    }

    fn middle_entries(&mut self, start: Beat, key: Key) {
        let second = start + SUBJECT_LEN;
        self.entry(Material::Subject, key, Voice::Alto, start, NoteKind::Subject);
        self.free(key, Voice::Soprano, start, SUBJECT_LEN);
        self.free(key, Voice::Bass, start, SUBJECT_LEN);

        let stated = self.entry(Material::Answer, key, Voice::Tenor, second, NoteKind::Answer);
        self.countersubject(Material::Answer, key, Voice::Alto, second, &stated);
        self.free(key, Voice::Soprano, second, SUBJECT_LEN);
        self.free(key, Voice::Bass, second, SUBJECT_LEN);
    }

    fn stretto(&mut self, start: Beat) {
        let home = self.home;
        let entries = [
            (Voice::Bass, Material::Subject),
            (Voice::Tenor, Material::Answer),
            (Voice::Alto, Material::Subject),
            (Voice::Soprano, Material::Answer),
        ];
        for (i, &(voice, material)) in entries.iter().enumerate() {
            self.entry(material, home, voice, start + times(STRETTO_OFFSET, i), NoteKind::Stretto);
        }
        for (i, &(voice, _)) in entries.iter().enumerate().skip(1) {
            self.free(home, voice, start, times(STRETTO_OFFSET, i));
        }
    }

    /// Final entry over a tonic pedal, then the closing cadence. Returns
    /// the end of the piece.
    fn final_entry(&mut self, start: Beat) -> Beat {
        let home = self.home;
        self.entry(Material::Subject, home, Voice::Soprano, start, NoteKind::Subject);
        let pedal = home.spell(tonic_near(home, Voice::Bass.center()));
        self.notes.extend(
            fill_span(pedal, start, SUBJECT_LEN, Voice::Bass)
                .into_iter()
                .map(|n| n.tagged(NoteKind::Pedal)),
        );
        self.free(home, Voice::Alto, start, SUBJECT_LEN);
        self.free(home, Voice::Tenor, start, SUBJECT_LEN);

        let cadence = final_cadence(home, FinalCadenceStyle::Plain);
        let durations = [Duration::Half, Duration::Half, Duration::Whole];
        self.chords(&cadence, &durations, start + SUBJECT_LEN, NoteKind::Cadence, false)
    }
}

/// Compose a fugue in `home`, repair clashes, and ornament it.
pub fn generate_fugue(home: Key, density_percent: f64, rng: &mut ComposerRng) -> Fugue {
    let relative = related_key(home, Relation::Relative);
    let subject = generate_subject(rng);
    let mut builder = FugueBuilder {
        home,
        subject: subject.clone(),
        notes: Vec::new(),
        slots: Vec::new(),
        labels: Vec::new(),
        options: VoiceLeadingOptions::default(),
        rng,
    };

    let mut sections = Vec::new();
    let mut key_spans = Vec::new();
    let mut t = Beat::ZERO;
    let mut episodes = 0;
    for section in plan(Form::Fugue, 2.0) {
        let key = if section.kind == SectionKind::MiddleEntries {
            relative
        } else {
            home
        };
        let mut end = t + times(MEASURE, section.bars);
        match section.kind {
            SectionKind::Exposition => builder.exposition(t),
            SectionKind::Episode => {
                let kind = if episodes == 0 {
                    SequenceKind::DescendingFifths
                } else {
                    SequenceKind::Romanesca
                };
                episodes += 1;
                builder.episode(t, section.bars, kind);
            }
            SectionKind::MiddleEntries => builder.middle_entries(t, key),
            SectionKind::Stretto => builder.stretto(t),
            SectionKind::FinalEntry => end = builder.final_entry(t),
            _ => log::warn!("fugue plan has an unexpected {:?} section", section.kind),
        }
        log::debug!("fugue {}: beats {} to {}", section.name, t.as_beats(), end.as_beats());
        sections.push(SectionSpan::new(&section.name, t, end, key));
        key_spans.push(KeySpan { start: t, end, key });
        t = end;
    }

    let FugueBuilder {
        mut notes,
        slots,
        labels,
        rng,
        ..
    } = builder;
    sort_notes(&mut notes);
    let notes = fix_fugue_dissonances(notes, &key_spans, home);

    let config = OrnamentConfig {
        total_measures: t.ticks().div_ceil(MEASURE.ticks()),
        cadence_measures_suppressed: CADENCE_MEASURES,
        ..OrnamentConfig::default().with_density_percent(density_percent)
    };
    let ctx = OrnamentContext {
        config: &config,
        slots: &slots,
        key_spans: &key_spans,
        home,
    };
    let notes = ornament(notes, &ctx, rng);

    Fugue {
        notes,
        sections,
        key_spans,
        slots,
        progression: labels.join(" | "),
        subject,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Mode;

    fn key(tonic: &str, mode: Mode) -> Key {
        Key::new(tonic.parse().unwrap(), mode)
    }

    #[test]
    fn test_subject_fills_eight_beats_within_bounds() {
        for seed in 0..50 {
            let subject = generate_subject(&mut ComposerRng::new(seed));
            assert_eq!(subject.span(), SUBJECT_LEN);
            let degrees = subject.degrees();
            assert_eq!(degrees[0], 0);
            assert!(degrees.iter().all(|d| (WALK_LOW..=WALK_HIGH).contains(d)), "{degrees:?}");
            assert!(TRIAD_DEGREES.contains(degrees.last().unwrap()));
        }
    }

    #[test]
    fn test_subject_rhythms_are_eight_beats() {
        for rhythm in SUBJECT_RHYTHMS {
            let ticks: u32 = rhythm.iter().map(|d| d.ticks()).sum();
            assert_eq!(ticks, SUBJECT_LEN.ticks());
        }
    }

    #[test]
    fn test_tonal_answer_moves_dominant_by_fourth() {
        let c = key("C", Mode::Major);
        let subject = vec![(60, Duration::Quarter), (67, Duration::Quarter), (64, Duration::Half)];
        let answer: Vec<i32> = tonal_answer(c, &subject).iter().map(|&(m, _)| m).collect();
        assert_eq!(answer, vec![67, 72, 71]);
    }

    #[test]
    fn test_place_fits_range() {
        let line = vec![(84, Duration::Quarter), (88, Duration::Quarter)];
        let placed = place(line, Voice::Tenor);
        assert!(placed.iter().all(|&(m, _)| Voice::Tenor.contains(m)));
        assert_eq!(placed[1].0 - placed[0].0, 4);
    }

    #[test]
    fn test_countersubject_avoids_harsh_intervals() {
        let c = key("C", Mode::Major);
        let against = vec![Note::new("E4".parse().unwrap(), Duration::Half, Beat::ZERO, Voice::Alto)];
        let line = vec![Note::new("F4".parse().unwrap(), Duration::Half, Beat::ZERO, Voice::Tenor)];
        let out = consonance_filter(line, &against, c);
        assert!(!is_harsh_interval(out[0].midi(), 64));
        assert_ne!((out[0].midi() - 64).rem_euclid(12), 6);
    }

    #[test]
    fn test_free_counterpoint_stays_consonant_and_below() {
        let c = key("C", Mode::Major);
        let context = vec![Note::new("C5".parse().unwrap(), Duration::Whole, Beat::ZERO, Voice::Soprano)];
        let line = free_counterpoint(c, Voice::Alto, Beat::ZERO, Beat::from_beats(4), &context, &mut ComposerRng::new(2));
        assert_eq!(line.len(), 2);
        for n in &line {
            assert!(n.midi() < 72);
            assert!(!is_harsh_interval(n.midi(), 72));
            assert!(Voice::Alto.contains(n.midi()));
        }
    }

    #[test]
    fn test_fugue_stages_and_closure() {
        let home = key("D", Mode::Minor);
        let fugue = generate_fugue(home, 50.0, &mut ComposerRng::from_seed_str("t2"));
        let names: Vec<&str> = fugue.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Exposition", "Episode", "Middle Entries", "Episode 2", "Stretto", "Final Entry"]
        );
        assert_eq!(fugue.sections[2].key, "F major");
        for pair in fugue.sections.windows(2) {
            assert_eq!(pair[0].end_beat, pair[1].start_beat);
        }
        let bass = fugue.notes.iter().filter(|n| n.voice == Voice::Bass).max_by_key(|n| n.start_time).unwrap();
        assert_eq!(bass.midi().rem_euclid(12), 2);
        assert_eq!(bass.kind, Some(NoteKind::Cadence));
        assert!(fugue.notes.iter().all(|n| n.voice.contains(n.midi())));
    }

    #[test]
    fn test_fugue_is_deterministic() {
        let home = key("G", Mode::Major);
        let a = generate_fugue(home, 70.0, &mut ComposerRng::new(11));
        let b = generate_fugue(home, 70.0, &mut ComposerRng::new(11));
        assert_eq!(a.notes, b.notes);
    }
}
