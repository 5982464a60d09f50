// Suspensions: the 4-3 at dominant-to-tonic arrivals and the 9-8 before a
// falling step.
//
// A 4-3 needs a prepared tie. The voice carrying the leading tone on V must
// have held the tonic at the same register just before; the tonic is then
// held over the downbeat of V and resolves down to the leading tone at the
// note's midpoint.
//
// A 9-8 holds the current pitch one beat into the next note when the line
// falls by step, delaying and shortening that note.

use super::{OrnamentContext, Score, spelled};
use crate::note::{Beat, Duration, Note, NoteKind, TICKS_PER_BEAT, Voice, fill_span};
use baroque_prng::ComposerRng;

pub fn four_three_suspensions(score: &Score, ctx: &OrnamentContext<'_>, rng: &mut ComposerRng) -> Score {
    score.rewrite(|voice, line, current| {
        let mut out = Vec::with_capacity(line.len() + 2);
        for i in 0..line.len() {
            match four_three(ctx, current, voice, line, i, rng) {
                Some(figure) => out.extend(figure),
                None => out.push(line[i].clone()),
            }
        }
        out
    })
}

fn four_three(
    ctx: &OrnamentContext<'_>,
    current: &Score,
    voice: Voice,
    line: &[Note],
    i: usize,
    rng: &mut ComposerRng,
) -> Option<Vec<Note>> {
    let note = &line[i];
    let (index, slot) = ctx.slot_starting_at(note.start_time)?;
    let arrival = ctx.slots.get(index + 1)?;
    if !slot.chord.is_dominant() || !arrival.chord.is_tonic() || slot.chord.key != arrival.chord.key {
        return None;
    }
    if note.midi().rem_euclid(12) != slot.chord.third().semitone() as i32 {
        return None;
    }

    let suspended = note.midi() + 1;
    if suspended.rem_euclid(12) != arrival.chord.root().semitone() as i32 {
        return None;
    }
    let preparation = line.get(i.checked_sub(1)?)?;
    if preparation.end() != note.start_time || preparation.midi() != suspended {
        return None;
    }

    let half = note.duration.half()?;
    if !ctx.gate(note, ctx.config.probabilities.suspension, 1.0, rng) {
        return None;
    }
    let split = note.start_time + half.span();
    if !current.admits(voice, suspended, note.start_time, split) {
        return None;
    }

    log::trace!("4-3 suspension in {} at beat {}", voice.name(), note.start_time.as_beats());
    let mut held = spelled(ctx, suspended, note, note.start_time);
    held.duration = half;
    held.kind = Some(NoteKind::Suspension);

    let mut resolution = note.clone();
    resolution.duration = half;
    resolution.start_time = split;
    resolution.kind = Some(NoteKind::Resolution);
    Some(vec![held, resolution])
}

pub fn nine_eight_suspensions(score: &Score, ctx: &OrnamentContext<'_>, rng: &mut ComposerRng) -> Score {
    score.rewrite(|voice, line, current| {
        let mut out = Vec::with_capacity(line.len() + 2);
        let mut i = 0;
        while i < line.len() {
            let note = &line[i];
            let figure = line
                .get(i + 1)
                .and_then(|next| nine_eight(ctx, current, voice, note, next, rng));
            out.push(note.clone());
            match figure {
                Some(delayed) => {
                    out.extend(delayed);
                    i += 2;
                }
                None => i += 1,
            }
        }
        out
    })
}

/// The held note plus the delayed resolution, replacing `next`.
fn nine_eight(
    ctx: &OrnamentContext<'_>,
    current: &Score,
    voice: Voice,
    note: &Note,
    next: &Note,
    rng: &mut ComposerRng,
) -> Option<Vec<Note>> {
    if next.start_time != note.end() || next.is_ornament() || note.is_ornament() {
        return None;
    }
    if !(1..=2).contains(&(note.midi() - next.midi())) {
        return None;
    }
    let beat = Beat::from_beats(1);
    if next.duration.ticks() < 2 * TICKS_PER_BEAT {
        return None;
    }
    if !ctx.gate(next, ctx.config.probabilities.nine_eight, 1.0, rng) {
        return None;
    }
    if !current.admits(voice, note.midi(), next.start_time, next.start_time + beat) {
        return None;
    }

    log::trace!("9-8 suspension in {} at beat {}", voice.name(), next.start_time.as_beats());
    let mut held = note.clone();
    held.start_time = next.start_time;
    held.duration = Duration::Quarter;
    held.kind = Some(NoteKind::Suspension);

    let remaining = next.duration.span().saturating_sub(beat);
    let mut out = vec![held];
    out.extend(
        fill_span(next.pitch, next.start_time + beat, remaining, voice)
            .into_iter()
            .map(|mut n| {
                n.kind = next.kind;
                n
            }),
    );
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_prepared_four_three() {
        let key = c_major();
        let slots = slots(key, &["I", "V", "I"]);
        let config = always(3);
        let ctx = OrnamentContext { config: &config, slots: &slots, key_spans: &[], home: key };
        let score = Score::from_notes(vec![
            note("C5", Duration::Half, 0, Voice::Soprano),
            note("B4", Duration::Half, 2, Voice::Soprano),
            note("C5", Duration::Half, 4, Voice::Soprano),
            note("C3", Duration::Half, 0, Voice::Bass),
            note("G2", Duration::Half, 2, Voice::Bass),
            note("C3", Duration::Half, 4, Voice::Bass),
        ]);
        let out = four_three_suspensions(&score, &ctx, &mut ComposerRng::new(1));
        let soprano = out.voice(Voice::Soprano);
        assert_eq!(soprano.len(), 4);
        assert_eq!(soprano[1].pitch.to_string(), "C5");
        assert_eq!(soprano[1].kind, Some(NoteKind::Suspension));
        assert_eq!(soprano[1].duration, Duration::Quarter);
        assert_eq!(soprano[2].pitch.to_string(), "B4");
        assert_eq!(soprano[2].kind, Some(NoteKind::Resolution));
        assert_eq!(soprano[2].start_time, Beat::from_beats(3));
        assert!(is_contiguous(soprano));
        assert_eq!(out.voice(Voice::Bass), score.voice(Voice::Bass));
    }

    #[test]
    fn test_four_three_needs_preparation() {
        let key = c_major();
        let slots = slots(key, &["I", "V", "I"]);
        let config = always(3);
        let ctx = OrnamentContext { config: &config, slots: &slots, key_spans: &[], home: key };
        let score = Score::from_notes(vec![
            note("D5", Duration::Half, 0, Voice::Soprano),
            note("B4", Duration::Half, 2, Voice::Soprano),
            note("C5", Duration::Half, 4, Voice::Soprano),
        ]);
        let out = four_three_suspensions(&score, &ctx, &mut ComposerRng::new(1));
        assert_eq!(out, score);
    }

    #[test]
    fn test_nine_eight_delays_falling_step() {
        let key = c_major();
        let slots = slots(key, &["I", "I"]);
        let config = always(2);
        let ctx = OrnamentContext { config: &config, slots: &slots, key_spans: &[], home: key };
        let score = Score::from_notes(vec![
            note("D5", Duration::Half, 0, Voice::Soprano),
            note("C5", Duration::Half, 2, Voice::Soprano),
        ]);
        let out = nine_eight_suspensions(&score, &ctx, &mut ComposerRng::new(1));
        let soprano = out.voice(Voice::Soprano);
        assert_eq!(soprano.len(), 3);
        assert_eq!(soprano[1].pitch.to_string(), "D5");
        assert_eq!(soprano[1].kind, Some(NoteKind::Suspension));
        assert_eq!(soprano[2].pitch.to_string(), "C5");
        assert_eq!(soprano[2].start_time, Beat::from_beats(3));
        assert_eq!(total_ticks(soprano), 4 * TICKS_PER_BEAT);
        assert!(is_contiguous(soprano));
    }

    #[test]
    fn test_nine_eight_respects_guard() {
        let key = c_major();
        let slots = slots(key, &["I", "I"]);
        let config = always(2);
        let ctx = OrnamentContext { config: &config, slots: &slots, key_spans: &[], home: key };
        let score = Score::from_notes(vec![
            note("D5", Duration::Half, 0, Voice::Soprano),
            note("C5", Duration::Half, 2, Voice::Soprano),
            // E4 against a held D5 is a ninth.
            note("C4", Duration::Half, 0, Voice::Alto),
            note("E4", Duration::Half, 2, Voice::Alto),
        ]);
        let out = nine_eight_suspensions(&score, &ctx, &mut ComposerRng::new(1));
        assert_eq!(out, score);
    }
}
