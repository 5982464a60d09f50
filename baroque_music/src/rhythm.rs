// Rhythmic figuration: how a voiced chord fills its two-beat slot.
//
// Each form has a slot figure (chorale half notes, prelude running eighths,
// gigue long-short, courante eighth-eighth-quarter). Figures are repeated
// cyclically until the slot is full, and the last value is cut short if it
// would spill over. The soprano carries the figure, arpeggiating upward
// through chord tones within a sixth of its voiced pitch. Inner voices hold
// their pitch for the whole slot. In the dances the bass walks in quarters
// on every other slot.
//
// Variations vary the figure: odd variations diminish it, even ones
// syncopate it. A transform that cannot be expressed in our note values,
// or would no longer fit the slot, yields `None` and the plain figure is
// used instead.

use crate::harmony::Chord;
use crate::note::{Beat, Duration, MEASURE, Note, Voice, fill_span};
use crate::structure::Form;
use crate::voice_leading::Voicing;

/// Highest arpeggio tone above the soprano's voiced pitch, in semitones.
const ARPEGGIO_REACH: i32 = 9;

pub fn slot_figure(form: Form) -> &'static [Duration] {
    use crate::note::Duration::*;
    match form {
        Form::Chorale | Form::Fugue => &[Half],
        Form::Prelude => &[Eighth, Eighth, Eighth, Eighth],
        Form::Gigue => &[DottedQuarter, Eighth],
        Form::Courante => &[Eighth, Eighth, Quarter],
        Form::Allemande | Form::Sarabande | Form::Minuet | Form::Passacaglia => &[Quarter, Quarter],
        Form::Ritornello | Form::Variations | Form::Suite => &[Quarter, Quarter],
    }
}

/// The walking-bass figure used by the dances.
pub fn bass_walk() -> &'static [Duration] {
    slot_figure(Form::Passacaglia)
}

fn total(pattern: &[Duration]) -> Beat {
    Beat::from_ticks(pattern.iter().map(|d| d.ticks()).sum())
}

/// Every value doubled.
pub fn augment(pattern: &[Duration]) -> Option<Vec<Duration>> {
    let doubled = pattern
        .iter()
        .map(|d| Duration::from_ticks(d.ticks() * 2))
        .collect::<Option<Vec<_>>>()?;
    (total(&doubled) <= MEASURE).then_some(doubled)
}

/// Every value halved.
pub fn diminish(pattern: &[Duration]) -> Option<Vec<Duration>> {
    pattern.iter().map(|d| d.half()).collect()
}

/// Quarters become dotted eighths, halves dotted quarters, eighths
/// sixteenths. `None` if nothing in the pattern can be displaced.
pub fn syncopate(pattern: &[Duration]) -> Option<Vec<Duration>> {
    let shifted: Vec<Duration> = pattern
        .iter()
        .map(|&d| match d {
            Duration::Quarter => Duration::DottedEighth,
            Duration::Half => Duration::DottedQuarter,
            Duration::Eighth => Duration::Sixteenth,
            other => other,
        })
        .collect();
    (shifted != pattern).then_some(shifted)
}

/// Repeat `pattern` until it covers `span`; the last value is shortened
/// to fit.
pub fn fill_slot(pattern: &[Duration], span: Beat) -> Vec<Duration> {
    if pattern.is_empty() {
        return Duration::decompose(span.ticks());
    }
    let mut out = Vec::new();
    let mut remaining = span.ticks();
    for &d in pattern.iter().cycle() {
        if remaining == 0 {
            break;
        }
        if d.ticks() <= remaining {
            out.push(d);
            remaining -= d.ticks();
        } else {
            out.extend(Duration::decompose(remaining));
            break;
        }
    }
    out
}

/// The soprano figure for `texture`, varied for variation `n`.
pub fn variation_figure(texture: Form, variation: Option<u32>) -> Vec<Duration> {
    let base = slot_figure(texture);
    let varied = match variation {
        Some(n) if n % 2 == 1 => diminish(base),
        Some(_) => syncopate(base),
        None => None,
    };
    varied.unwrap_or_else(|| base.to_vec())
}

/// Chord tones from `base` up to the reach, within the soprano range.
fn arpeggio(chord: &Chord, base: i32) -> Vec<i32> {
    let classes: Vec<i32> = chord.tones().iter().map(|c| c.semitone() as i32).collect();
    let mut tones: Vec<i32> = (base..=base + ARPEGGIO_REACH)
        .filter(|m| classes.contains(&m.rem_euclid(12)) && Voice::Soprano.contains(*m))
        .collect();
    if tones.first() != Some(&base) {
        tones.insert(0, base);
    }
    tones
}

/// Where a slot sits in its section and how its section is textured.
#[derive(Debug, Clone, Copy)]
pub struct SlotTexture {
    pub form: Form,
    pub variation: Option<u32>,
    /// Slot number within the section.
    pub index: usize,
}

/// The notes of one voiced chord starting at `start`.
pub fn realize_slot(chord: &Chord, voicing: &Voicing, start: Beat, texture: SlotTexture) -> Vec<Note> {
    let key = chord.key;
    let mut notes = Vec::new();

    let soprano = voicing.get(Voice::Soprano);
    let tones = arpeggio(chord, soprano);
    let mut t = start;
    for (d, midi) in fill_slot(&variation_figure(texture.form, texture.variation), MEASURE)
        .into_iter()
        .zip(tones.iter().cycle())
    {
        notes.push(Note::new(key.spell(*midi), d, t, Voice::Soprano));
        t += d.span();
    }

    for voice in [Voice::Alto, Voice::Tenor] {
        notes.extend(fill_span(key.spell(voicing.get(voice)), start, MEASURE, voice));
    }

    let bass = voicing.get(Voice::Bass);
    if texture.form.is_dance() && texture.index % 2 == 0 {
        let low = bass - 12;
        let step = if Voice::Bass.contains(low) { low } else { bass };
        let mut t = start;
        for (d, midi) in fill_slot(bass_walk(), MEASURE).into_iter().zip([bass, step].into_iter().cycle()) {
            notes.push(Note::new(key.spell(midi), d, t, Voice::Bass));
            t += d.span();
        }
    } else {
        notes.extend(fill_span(key.spell(bass), start, MEASURE, Voice::Bass));
    }
    notes
}
