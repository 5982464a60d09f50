// Trills, mordents, and turns.
//
// Each replaces a note of at least one beat with a rapid figure that ends
// on the original pitch:
//
//   trill    main/upper sixteenths, closing on a main eighth
//   mordent  main, lower (thirty-seconds), then the main pitch held
//   turn     upper, main, lower (sixteenths), then the main pitch held
//
// The held remainder of a mordent or turn keeps the note's original tag,
// so only the fast notes count as ornaments. A note that directly follows
// an ornament in its own voice is left alone.

use super::{OrnamentContext, Score, spelled};
use crate::note::{Beat, Duration, Note, NoteKind, TICKS_PER_BEAT, Voice, fill_span};
use baroque_prng::ComposerRng;

type Figure = fn(&OrnamentContext<'_>, &Score, Voice, &Note, &mut ComposerRng) -> Option<Vec<Note>>;

fn follows_ornament(line: &[Note], i: usize) -> bool {
    i.checked_sub(1)
        .and_then(|j| line.get(j))
        .is_some_and(|prev| prev.is_ornament() && prev.end() == line[i].start_time)
}

fn figure_pass(score: &Score, ctx: &OrnamentContext<'_>, rng: &mut ComposerRng, figure: Figure) -> Score {
    score.rewrite(|voice, line, current| {
        let mut out = Vec::with_capacity(line.len());
        for (i, note) in line.iter().enumerate() {
            let shaped = if follows_ornament(line, i) {
                None
            } else {
                figure(ctx, current, voice, note, rng)
            };
            match shaped {
                Some(notes) => out.extend(notes),
                None => out.push(note.clone()),
            }
        }
        out
    })
}

/// A copy of `note` at another pitch, time, and length, tagged `kind`.
fn part(ctx: &OrnamentContext<'_>, note: &Note, midi: i32, start: Beat, duration: Duration, kind: NoteKind) -> Note {
    let mut out = if midi == note.midi() {
        let mut same = note.clone();
        same.start_time = start;
        same
    } else {
        spelled(ctx, midi, note, start)
    };
    out.duration = duration;
    out.kind = Some(kind);
    out
}

/// The main pitch held from `start` to the end of `note`, keeping its tag.
fn held_remainder(note: &Note, start: Beat) -> Vec<Note> {
    fill_span(note.pitch, start, note.end().saturating_sub(start), note.voice)
        .into_iter()
        .map(|mut n| {
            n.kind = note.kind;
            n
        })
        .collect()
}

pub fn trills(score: &Score, ctx: &OrnamentContext<'_>, rng: &mut ComposerRng) -> Score {
    figure_pass(score, ctx, rng, trill)
}

fn trill(
    ctx: &OrnamentContext<'_>,
    current: &Score,
    voice: Voice,
    note: &Note,
    rng: &mut ComposerRng,
) -> Option<Vec<Note>> {
    let sixteenth = Duration::Sixteenth.ticks();
    let ticks = note.duration.ticks();
    if ticks < TICKS_PER_BEAT || ticks % sixteenth != 0 {
        return None;
    }
    if !ctx.gate(note, ctx.config.probabilities.trill, 1.0, rng) {
        return None;
    }
    let main = note.midi();
    let upper = ctx.key_at(note.start_time).step_above(main)?;
    if !current.admits(voice, upper, note.start_time, note.end())
        || current.clashes(voice, main, note.start_time, note.end())
    {
        return None;
    }

    let count = ticks / sixteenth;
    let mut out = Vec::with_capacity(count as usize);
    let mut t = note.start_time;
    for k in 0..count - 2 {
        let midi = if k % 2 == 0 { main } else { upper };
        out.push(part(ctx, note, midi, t, Duration::Sixteenth, NoteKind::Trill));
        t += Duration::Sixteenth.span();
    }
    out.push(part(ctx, note, main, t, Duration::Eighth, NoteKind::Trill));
    Some(out)
}

pub fn mordents(score: &Score, ctx: &OrnamentContext<'_>, rng: &mut ComposerRng) -> Score {
    figure_pass(score, ctx, rng, mordent)
}

fn mordent(
    ctx: &OrnamentContext<'_>,
    current: &Score,
    voice: Voice,
    note: &Note,
    rng: &mut ComposerRng,
) -> Option<Vec<Note>> {
    if note.duration.ticks() < TICKS_PER_BEAT {
        return None;
    }
    if !ctx.gate(note, ctx.config.probabilities.mordent, 1.0, rng) {
        return None;
    }
    let main = note.midi();
    let lower = ctx.key_at(note.start_time).step_below(main)?;
    let step = Duration::ThirtySecond.span();
    let start = note.start_time;
    if current.clashes(voice, main, start, start + step)
        || !current.admits(voice, lower, start + step, start + step + step)
    {
        return None;
    }

    let mut out = vec![
        part(ctx, note, main, start, Duration::ThirtySecond, NoteKind::Mordent),
        part(ctx, note, lower, start + step, Duration::ThirtySecond, NoteKind::Mordent),
    ];
    out.extend(held_remainder(note, start + step + step));
    Some(out)
}

pub fn turns(score: &Score, ctx: &OrnamentContext<'_>, rng: &mut ComposerRng) -> Score {
    figure_pass(score, ctx, rng, turn)
}

fn turn(
    ctx: &OrnamentContext<'_>,
    current: &Score,
    voice: Voice,
    note: &Note,
    rng: &mut ComposerRng,
) -> Option<Vec<Note>> {
    if note.duration.ticks() < TICKS_PER_BEAT {
        return None;
    }
    if !ctx.gate(note, ctx.config.probabilities.turn, 1.0, rng) {
        return None;
    }
    let key = ctx.key_at(note.start_time);
    let main = note.midi();
    let upper = key.step_above(main)?;
    let lower = key.step_below(main)?;
    let step = Duration::Sixteenth.span();
    let start = note.start_time;
    let shape = [upper, main, lower];
    let fits = shape.iter().enumerate().all(|(k, &m)| {
        let at = start + Beat::from_ticks(k as u32 * step.ticks());
        current.admits(voice, m, at, at + step)
    });
    if !fits {
        return None;
    }

    let mut out: Vec<Note> = shape
        .iter()
        .enumerate()
        .map(|(k, &m)| {
            let at = start + Beat::from_ticks(k as u32 * step.ticks());
            part(ctx, note, m, at, Duration::Sixteenth, NoteKind::Turn)
        })
        .collect();
    out.extend(held_remainder(note, start + Beat::from_ticks(3 * step.ticks())));
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn run(pass: fn(&Score, &OrnamentContext<'_>, &mut ComposerRng) -> Score, notes: Vec<Note>) -> Score {
        let key = c_major();
        let slots = slots(key, &["I", "I"]);
        let config = always(4);
        let ctx = OrnamentContext { config: &config, slots: &slots, key_spans: &[], home: key };
        pass(&Score::from_notes(notes), &ctx, &mut ComposerRng::new(5))
    }

    #[test]
    fn test_trill_alternates_and_closes_on_main() {
        let out = run(trills, vec![note("E5", Duration::Half, 0, Voice::Soprano)]);
        let soprano = out.voice(Voice::Soprano);
        let pitches: Vec<i32> = soprano.iter().map(Note::midi).collect();
        assert_eq!(pitches, vec![76, 77, 76, 77, 76, 77, 76]);
        assert_eq!(soprano.last().unwrap().duration, Duration::Eighth);
        assert!(soprano.iter().all(|n| n.kind == Some(NoteKind::Trill)));
        assert_eq!(total_ticks(soprano), 2 * TICKS_PER_BEAT);
        assert!(is_contiguous(soprano));
    }

    #[test]
    fn test_mordent_keeps_held_remainder_untagged() {
        let out = run(mordents, vec![note("C5", Duration::Half, 0, Voice::Soprano)]);
        let soprano = out.voice(Voice::Soprano);
        let pitches: Vec<i32> = soprano.iter().map(Note::midi).collect();
        assert_eq!(pitches, vec![72, 71, 72, 72]);
        assert_eq!(soprano[1].kind, Some(NoteKind::Mordent));
        assert_eq!(soprano[2].kind, None);
        assert_eq!(total_ticks(soprano), 2 * TICKS_PER_BEAT);
        assert!(is_contiguous(soprano));
    }

    #[test]
    fn test_turn_shape() {
        let out = run(turns, vec![note("E5", Duration::Quarter, 0, Voice::Soprano)]);
        let pitches: Vec<i32> = out.voice(Voice::Soprano).iter().map(Note::midi).collect();
        assert_eq!(pitches, vec![77, 76, 74, 76]);
    }

    #[test]
    fn test_no_figure_right_after_ornament() {
        let notes = vec![
            note("D5", Duration::Quarter, 0, Voice::Soprano).tagged(NoteKind::Passing),
            note("E5", Duration::Half, 1, Voice::Soprano),
        ];
        let out = run(trills, notes.clone());
        assert_eq!(out, Score::from_notes(notes));
    }

    #[test]
    fn test_short_notes_are_skipped() {
        let notes = vec![note("E5", Duration::Eighth, 0, Voice::Soprano)];
        let out = run(turns, notes.clone());
        assert_eq!(out, Score::from_notes(notes));
    }
}
