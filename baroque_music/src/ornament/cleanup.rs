// Dissonance repair and humanization.
//
// `cleanup` is the last music-theoretic pass: it walks every pair of
// overlapping notes in different voices in canonical order and, where the
// pair is harsh and at least one note is an ornament, deletes one of them.
// A lone ornament always loses to a base note. Between two ornaments the
// voice lower in priority (tenor, then alto, then bass) is dropped; the
// soprano line is kept whenever possible. Clashes between two base notes
// belong to the harmony and are left alone.
//
// `fix_fugue_dissonances` runs before ornamentation on independent
// contrapuntal lines. Instead of deleting, it moves the weaker of two
// clashing base notes to the nearest consonant scale pitch, in its own
// octave first and then one octave either side. When the weaker note has
// nowhere to go the stronger one is tried; only a pair where neither can
// move loses a note. Every candidate is checked against all notes
// sounding with it, and the pass repeats until nothing clashes. Strength
// follows the note's role: pedal and cadence notes never move, then come
// subject material, the countersubject, episodes and free lines.
//
// `humanize` is performative only: velocity jitter with downbeat accents,
// and an occasional one-tick early attack for notes that follow a rest.

use super::{OrnamentContext, Score, is_harsh_interval};
use crate::key::{Key, KeySpan, key_at};
use crate::note::{Beat, MEASURE, Note, NoteKind, Voice, sort_notes};
use baroque_prng::ComposerRng;

/// Higher survives a clash between two ornaments.
fn keep_priority(voice: Voice) -> u8 {
    match voice {
        Voice::Soprano => 3,
        Voice::Bass => 2,
        Voice::Alto => 1,
        Voice::Tenor => 0,
    }
}

/// Index of the note to drop from a harsh pair.
fn cleanup_loser(notes: &[Note], i: usize, j: usize) -> usize {
    match (notes[i].is_ornament(), notes[j].is_ornament()) {
        (true, false) => i,
        (false, true) => j,
        _ => {
            if keep_priority(notes[i].voice) < keep_priority(notes[j].voice) {
                i
            } else {
                j
            }
        }
    }
}

/// Remove ornaments that still clash with another voice.
pub fn cleanup(mut notes: Vec<Note>) -> Vec<Note> {
    sort_notes(&mut notes);
    let mut removed = vec![false; notes.len()];
    for i in 0..notes.len() {
        for j in i + 1..notes.len() {
            if removed[i] || notes[j].start_time >= notes[i].end() {
                break;
            }
            if removed[j] {
                continue;
            }
            let (a, b) = (&notes[i], &notes[j]);
            if a.voice == b.voice
                || !(a.is_ornament() || b.is_ornament())
                || !a.overlaps(b)
                || !is_harsh_interval(a.midi(), b.midi())
            {
                continue;
            }
            let loser = cleanup_loser(&notes, i, j);
            log::trace!(
                "cleanup drops {} {} at beat {}",
                notes[loser].voice.name(),
                notes[loser].pitch,
                notes[loser].start_time.as_beats()
            );
            removed[loser] = true;
        }
    }
    notes
        .into_iter()
        .zip(removed)
        .filter_map(|(note, gone)| (!gone).then_some(note))
        .collect()
}

/// How firmly a base note holds its pitch in a fugue.
fn anchor_rank(kind: Option<NoteKind>) -> u8 {
    match kind {
        Some(NoteKind::Pedal | NoteKind::Cadence) => 5,
        Some(NoteKind::Subject | NoteKind::Answer | NoteKind::Stretto) => 4,
        Some(NoteKind::Countersubject) => 3,
        Some(NoteKind::Episode) => 2,
        _ => 1,
    }
}

/// Passes over the fugue before giving up on convergence.
const FUGUE_FIX_PASSES: usize = 8;

/// Pedal and cadence notes never move.
fn is_anchored(note: &Note) -> bool {
    anchor_rank(note.kind) == 5
}

/// A harsh overlap between two base notes in different voices.
fn is_base_clash(a: &Note, b: &Note) -> bool {
    a.voice != b.voice
        && !a.is_ornament()
        && !b.is_ornament()
        && a.overlaps(b)
        && is_harsh_interval(a.midi(), b.midi())
}

/// The pair ordered weaker first: weaker role, then later start, then
/// lower voice.
fn adjustment_order(notes: &[Note], i: usize, j: usize) -> [usize; 2] {
    let rank = |n: &Note| (anchor_rank(n.kind), std::cmp::Reverse(n.start_time), std::cmp::Reverse(n.voice));
    if rank(&notes[i]) < rank(&notes[j]) { [i, j] } else { [j, i] }
}

/// Nearest pitch of `key` within an octave either side that fits the
/// voice and clashes with no other live note sounding against it. The
/// note's own octave is searched first.
fn consonant_substitute(notes: &[Note], removed: &[bool], target: usize, key: Key) -> Option<i32> {
    let note = &notes[target];
    let midi = note.midi();
    let others: Vec<i32> = notes
        .iter()
        .enumerate()
        .filter(|&(k, o)| k != target && !removed[k] && o.voice != note.voice && o.overlaps(note))
        .map(|(_, o)| o.midi())
        .collect();
    let mut candidates: Vec<i32> = key
        .pitches_in(midi - 12, midi + 12)
        .into_iter()
        .filter(|&m| m != midi && note.voice.contains(m))
        .filter(|&m| others.iter().all(|&o| !is_harsh_interval(o, m)))
        .collect();
    let octave = midi.div_euclid(12);
    candidates.sort_by_key(|&m| (m.div_euclid(12) != octave, (m - midi).abs(), m));
    candidates.first().copied()
}

/// Move clashing base notes between voices onto consonant scale pitches,
/// repeating until no harsh base pair remains. A pair where neither note
/// can move loses its weaker note.
pub fn fix_fugue_dissonances(mut notes: Vec<Note>, key_spans: &[KeySpan], home: Key) -> Vec<Note> {
    sort_notes(&mut notes);
    let mut removed = vec![false; notes.len()];
    let (mut moved, mut dropped) = (0usize, 0usize);
    for pass in 0..FUGUE_FIX_PASSES {
        let mut changed = false;
        for i in 0..notes.len() {
            for j in i + 1..notes.len() {
                if notes[j].start_time >= notes[i].end() {
                    break;
                }
                if removed[i] || removed[j] || !is_base_clash(&notes[i], &notes[j]) {
                    continue;
                }
                changed = true;
                let order = adjustment_order(&notes, i, j);
                let substitute = order
                    .into_iter()
                    .filter(|&t| !is_anchored(&notes[t]))
                    .find_map(|t| {
                        let key = key_at(key_spans, notes[t].start_time, home);
                        consonant_substitute(&notes, &removed, t, key).map(|m| (t, key.spell(m)))
                    });
                match substitute {
                    Some((target, pitch)) => {
                        log::trace!(
                            "fugue: {} {} -> {} at beat {}",
                            notes[target].voice.name(),
                            notes[target].pitch,
                            pitch,
                            notes[target].start_time.as_beats()
                        );
                        notes[target].pitch = pitch;
                        moved += 1;
                    }
                    None => {
                        let loser = order.into_iter().find(|&t| !is_anchored(&notes[t])).unwrap_or(order[0]);
                        log::trace!(
                            "fugue: dropping {} {} at beat {}",
                            notes[loser].voice.name(),
                            notes[loser].pitch,
                            notes[loser].start_time.as_beats()
                        );
                        removed[loser] = true;
                        dropped += 1;
                    }
                }
            }
        }
        if !changed {
            log::debug!("fugue dissonance fix settled after {} passes", pass + 1);
            break;
        }
    }
    log::debug!("fugue dissonance fix moved {moved} notes and dropped {dropped}");
    notes
        .into_iter()
        .zip(removed)
        .filter_map(|(note, gone)| (!gone).then_some(note))
        .collect()
}

/// Velocity and timing jitter.
pub fn humanize(mut notes: Vec<Note>, ctx: &OrnamentContext<'_>, rng: &mut ComposerRng) -> Vec<Note> {
    let cfg = &ctx.config.humanize;
    sort_notes(&mut notes);
    for note in &mut notes {
        let mut velocity = cfg.base_velocity as i32 + rng.range_i32_inclusive(-cfg.velocity_jitter, cfg.velocity_jitter);
        if note.start_time.is_aligned_to(MEASURE) {
            velocity += cfg.downbeat_accent;
        }
        if note.is_ornament() {
            velocity -= cfg.ornament_softening;
        }
        note.velocity = Some(velocity.clamp(1, 127) as u8);
    }

    let early = Beat::from_ticks(1);
    Score::from_notes(notes)
        .rewrite(|voice, line, current| {
            let mut out: Vec<Note> = Vec::with_capacity(line.len());
            for note in line {
                let mut note = note.clone();
                let after_rest = match out.last() {
                    Some(prev) => prev.end() < note.start_time,
                    None => note.start_time > Beat::ZERO,
                };
                if after_rest && rng.random_bool(cfg.early_probability) {
                    let start = note.start_time - early;
                    let end = note.end() - early;
                    let safe = Voice::ALL
                        .iter()
                        .filter(|&&v| v != voice)
                        .flat_map(|&v| current.voice(v))
                        .all(|o| {
                            !(o.overlaps_span(start, end)
                                && !o.overlaps(&note)
                                && is_harsh_interval(o.midi(), note.midi()))
                        });
                    if safe {
                        note.start_time = start;
                    }
                }
                out.push(note);
            }
            out
        })
        .into_notes()
}
