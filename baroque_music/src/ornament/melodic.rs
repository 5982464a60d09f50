// Melodic non-chord tones: passing tones, neighbors, appoggiaturas.
//
// Each splits a base note in place; the total length of a voice never
// changes. Passing tones fill a melodic third with the scale step between
// its ends (melodic minor when rising in a minor key). Neighbors step away
// and back inside one note. Appoggiaturas replace the first half of a note
// with an accented step above or below it.

use super::{OrnamentContext, Score, spelled};
use crate::key::Key;
use crate::note::{Note, NoteKind, TICKS_PER_BEAT, Voice};
use baroque_prng::ComposerRng;

/// The scale step inside a third from `from` to `to`, if any. Both steps
/// must be a semitone or a whole tone.
pub fn passing_pitch(key: Key, from: i32, to: i32) -> Option<i32> {
    let scale = if to > from { key.melodic_scale() } else { key.scale() };
    let (lo, hi) = (from.min(to), from.max(to));
    (lo + 1..hi).find(|&m| {
        scale.iter().any(|c| c.semitone() as i32 == m.rem_euclid(12))
            && (1..=2).contains(&(m - lo))
            && (1..=2).contains(&(hi - m))
    })
}

pub fn passing_tones(score: &Score, ctx: &OrnamentContext<'_>, rng: &mut ComposerRng) -> Score {
    score.rewrite(|voice, line, current| {
        let mut out = Vec::with_capacity(line.len() * 2);
        for (i, note) in line.iter().enumerate() {
            let figure = line
                .get(i + 1)
                .and_then(|next| passing(ctx, current, voice, note, next, rng));
            match figure {
                Some(split) => out.extend(split),
                None => out.push(note.clone()),
            }
        }
        out
    })
}

fn passing(
    ctx: &OrnamentContext<'_>,
    current: &Score,
    voice: Voice,
    note: &Note,
    next: &Note,
    rng: &mut ComposerRng,
) -> Option<Vec<Note>> {
    if next.start_time != note.end() || !matches!((next.midi() - note.midi()).abs(), 3 | 4) {
        return None;
    }
    let half = note.duration.half()?;
    if !ctx.gate(note, ctx.config.probabilities.passing, 1.0, rng) {
        return None;
    }
    let midi = passing_pitch(ctx.key_at(note.start_time), note.midi(), next.midi())?;
    let split = note.start_time + half.span();
    if !current.admits(voice, midi, split, note.end()) {
        return None;
    }

    let mut head = note.clone();
    head.duration = half;
    let mut tone = spelled(ctx, midi, note, split);
    tone.duration = half;
    tone.kind = Some(NoteKind::Passing);
    Some(vec![head, tone])
}

pub fn neighbor_tones(score: &Score, ctx: &OrnamentContext<'_>, rng: &mut ComposerRng) -> Score {
    score.rewrite(|voice, line, current| {
        let mut out = Vec::with_capacity(line.len() * 3);
        for note in line {
            match neighbor(ctx, current, voice, note, rng) {
                Some(figure) => out.extend(figure),
                None => out.push(note.clone()),
            }
        }
        out
    })
}

/// `[main ½][neighbor ¼][main ¼]`.
fn neighbor(
    ctx: &OrnamentContext<'_>,
    current: &Score,
    voice: Voice,
    note: &Note,
    rng: &mut ComposerRng,
) -> Option<Vec<Note>> {
    if note.duration.ticks() < TICKS_PER_BEAT {
        return None;
    }
    let half = note.duration.half()?;
    let quarter = half.half()?;
    if !ctx.gate(note, ctx.config.probabilities.neighbor, 1.0, rng) {
        return None;
    }

    let key = ctx.key_at(note.start_time);
    let above = key.step_above(note.midi());
    let below = key.step_below(note.midi());
    let order = if rng.random_bool(0.5) { [above, below] } else { [below, above] };
    let start = note.start_time + half.span();
    let end = start + quarter.span();
    let midi = order
        .into_iter()
        .flatten()
        .find(|&m| current.admits(voice, m, start, end))?;

    let mut head = note.clone();
    head.duration = half;
    let mut step = spelled(ctx, midi, note, start);
    step.duration = quarter;
    step.kind = Some(NoteKind::Neighbor);
    let mut tail = note.clone();
    tail.duration = quarter;
    tail.start_time = end;
    Some(vec![head, step, tail])
}

pub fn appoggiaturas(score: &Score, ctx: &OrnamentContext<'_>, rng: &mut ComposerRng) -> Score {
    score.rewrite(|voice, line, current| {
        let mut out = Vec::with_capacity(line.len() * 2);
        for note in line {
            match appoggiatura(ctx, current, voice, note, rng) {
                Some(figure) => out.extend(figure),
                None => out.push(note.clone()),
            }
        }
        out
    })
}

/// `[appoggiatura ½][target ½]`, leaning from above more often than below.
fn appoggiatura(
    ctx: &OrnamentContext<'_>,
    current: &Score,
    voice: Voice,
    note: &Note,
    rng: &mut ComposerRng,
) -> Option<Vec<Note>> {
    if note.duration.ticks() < TICKS_PER_BEAT {
        return None;
    }
    let half = note.duration.half()?;
    let bias = ctx.config.appoggiatura_bias[voice.index()];
    if !ctx.gate(note, ctx.config.probabilities.appoggiatura, bias, rng) {
        return None;
    }

    let key = ctx.key_at(note.start_time);
    let above = key.step_above(note.midi());
    let below = key.step_below(note.midi());
    let order = if rng.random_bool(0.7) { [above, below] } else { [below, above] };
    let resolution = note.start_time + half.span();
    let midi = order
        .into_iter()
        .flatten()
        .find(|&m| current.admits(voice, m, note.start_time, resolution))?;

    let mut lean = spelled(ctx, midi, note, note.start_time);
    lean.duration = half;
    lean.kind = Some(NoteKind::Appoggiatura);
    let mut target = note.clone();
    target.duration = half;
    target.start_time = resolution;
    Some(vec![lean, target])
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::key::Mode;
    use crate::note::{Beat, Duration};

    #[test]
    fn test_passing_pitch_in_minor() {
        let a_minor = Key::new("A".parse().unwrap(), Mode::Minor);
        assert_eq!(passing_pitch(a_minor, 64, 67), Some(66));
        assert_eq!(passing_pitch(a_minor, 67, 64), Some(65));
        assert_eq!(passing_pitch(c_major(), 60, 64), Some(62));
        assert_eq!(passing_pitch(c_major(), 60, 66), None);
    }

    #[test]
    fn test_passing_tone_fills_third() {
        let key = c_major();
        let slots = slots(key, &["I", "I"]);
        let config = always(4);
        let ctx = OrnamentContext { config: &config, slots: &slots, key_spans: &[], home: key };
        let score = Score::from_notes(vec![
            note("C5", Duration::Half, 0, Voice::Soprano),
            note("E5", Duration::Half, 2, Voice::Soprano),
        ]);
        let out = passing_tones(&score, &ctx, &mut ComposerRng::new(2));
        let soprano = out.voice(Voice::Soprano);
        assert_eq!(soprano.len(), 3);
        assert_eq!(soprano[1].pitch.to_string(), "D5");
        assert_eq!(soprano[1].kind, Some(NoteKind::Passing));
        assert_eq!(soprano[1].start_time, Beat::from_beats(1));
        assert!(is_contiguous(soprano));
        assert_eq!(total_ticks(soprano), 4 * TICKS_PER_BEAT);
    }

    #[test]
    fn test_neighbor_returns_to_main() {
        let key = c_major();
        let slots = slots(key, &["I"]);
        let config = always(4);
        let ctx = OrnamentContext { config: &config, slots: &slots, key_spans: &[], home: key };
        let score = Score::from_notes(vec![note("E5", Duration::Half, 0, Voice::Soprano)]);
        let out = neighbor_tones(&score, &ctx, &mut ComposerRng::new(3));
        let soprano = out.voice(Voice::Soprano);
        assert_eq!(soprano.len(), 3);
        assert_eq!(soprano[0].midi(), 76);
        assert_eq!(soprano[2].midi(), 76);
        assert_eq!(soprano[1].kind, Some(NoteKind::Neighbor));
        assert!(matches!(soprano[1].midi(), 74 | 77));
        assert_eq!(soprano[1].duration, Duration::Eighth);
        assert!(is_contiguous(soprano));
    }

    #[test]
    fn test_appoggiatura_resolves_to_target() {
        let key = c_major();
        let slots = slots(key, &["I"]);
        let config = always(4);
        let ctx = OrnamentContext { config: &config, slots: &slots, key_spans: &[], home: key };
        let score = Score::from_notes(vec![note("G4", Duration::Half, 0, Voice::Soprano)]);
        let out = appoggiaturas(&score, &ctx, &mut ComposerRng::new(4));
        let soprano = out.voice(Voice::Soprano);
        assert_eq!(soprano.len(), 2);
        assert_eq!(soprano[0].kind, Some(NoteKind::Appoggiatura));
        assert!(matches!(soprano[0].midi(), 65 | 69));
        assert_eq!(soprano[1].midi(), 67);
        assert_eq!(soprano[1].start_time, Beat::from_beats(1));
    }

    #[test]
    fn test_ornaments_are_not_reornamented() {
        let key = c_major();
        let slots = slots(key, &["I"]);
        let config = always(4);
        let ctx = OrnamentContext { config: &config, slots: &slots, key_spans: &[], home: key };
        let score = Score::from_notes(vec![
            note("G4", Duration::Half, 0, Voice::Soprano).tagged(NoteKind::Trill),
        ]);
        let out = appoggiaturas(&score, &ctx, &mut ComposerRng::new(4));
        assert_eq!(out, score);
    }
}
