// Top-level planner: options in, finished piece out.
//
// `generate` normalizes the options, then either hands off to the fugue or
// runs the section pipeline:
//
//   structure plan -> key plan -> one phrase shape per section
//   -> voicing over the whole progression -> slot figuration
//   -> ornamentation -> validation
//
// Every stage draws from one `ComposerRng` seeded from the seed string, so
// a given set of options always produces the same notes. Malformed options
// never fail; they are replaced by defaults with a warning. The only error
// is an invariant caught by the final validation (a note out of its voice's
// range, or two notes overlapping in one voice).

use crate::error::{GenerationError, Stage};
use crate::fugue::generate_fugue;
use crate::harmony::{Chord, HarmonicSlot, progression_label};
use crate::key::{Key, KeySpan, Mode};
use crate::modulation::{KeyPlanEntry, Modulator};
use crate::note::{Beat, MEASURE, Note, NoteKind, Voice, sort_notes};
use crate::ornament::{OrnamentConfig, OrnamentContext, ornament};
use crate::phrase::{Phrase, PhraseMarker, analyze_phrases, binary, period, sentence, single, ternary};
use crate::rhythm::{SlotTexture, realize_slot};
use crate::structure::{Form, KeyChange, Section, SectionKind, SectionSpan, plan};
use crate::voice_leading::{VoiceLeadingOptions, voice_progression};
use baroque_prng::ComposerRng;
use baroque_theory::{Letter, PitchClass};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION: f64 = 2.0;
pub const DEFAULT_SEED: &str = "default";
pub const DEFAULT_DENSITY: f64 = 50.0;

/// Longest accepted `duration`. Anything above is treated as malformed.
pub const MAX_DURATION: f64 = 64.0;

/// Sections at least this long are split into two or more phrases.
const PHRASED_BARS: usize = 8;
/// Excursions at least this long get a ternary shape.
const TERNARY_BARS: usize = 12;
/// Ritornello tutti at least this long are built as a sentence.
const SENTENCE_BARS: usize = 12;

/// Options as received from a caller. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateOptions {
    pub form: Option<String>,
    pub key: Option<String>,
    pub mode: Option<String>,
    pub duration: Option<f64>,
    pub seed: Option<String>,
    pub ornament_density: Option<f64>,
}

/// Options after defaulting and parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub form: Form,
    pub key: Key,
    pub duration: f64,
    pub seed: String,
    /// 0..100.
    pub density: f64,
}

impl GenerateOptions {
    pub fn normalize(&self) -> Normalized {
        let form = match self.form.as_deref() {
            None => Form::Chorale,
            Some(s) => Form::parse(s).unwrap_or_else(|| {
                log::warn!("unknown form {s:?}; using Chorale");
                Form::Chorale
            }),
        };
        let mode = match self.mode.as_deref() {
            None => Mode::Major,
            Some(s) => Mode::parse(s).unwrap_or_else(|| {
                log::warn!("unknown mode {s:?}; using major");
                Mode::Major
            }),
        };
        let default_tonic = PitchClass::new(Letter::C, 0);
        let tonic = match self.key.as_deref() {
            None => default_tonic,
            Some(s) => s.trim().parse::<PitchClass>().unwrap_or_else(|err| {
                log::warn!("{err}; using C");
                default_tonic
            }),
        };
        let duration = match self.duration {
            None => DEFAULT_DURATION,
            Some(d) if d.is_finite() && d > 0.0 && d <= MAX_DURATION => d,
            Some(d) => {
                log::warn!("duration {d} out of range; using {DEFAULT_DURATION}");
                DEFAULT_DURATION
            }
        };
        let seed = self
            .seed
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SEED.to_string());
        let density = match self.ornament_density {
            None => DEFAULT_DENSITY,
            Some(d) if d.is_finite() => d.clamp(0.0, 100.0),
            Some(d) => {
                log::warn!("ornament density {d} is not a number; using {DEFAULT_DENSITY}");
                DEFAULT_DENSITY
            }
        };
        Normalized {
            form,
            key: Key::new(tonic, mode),
            duration,
            seed,
            density,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceMeta {
    /// Tonic only, as requested: "C", "F#".
    pub key: String,
    pub mode: String,
    pub form: String,
    pub style: String,
    /// Section progressions joined by " | ".
    pub progression: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phrase_markers: Vec<PhraseMarker>,
    pub sections: Vec<SectionSpan>,
    pub seed: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Piece {
    pub notes: Vec<Note>,
    pub meta: PieceMeta,
}

/// Compose a piece.
pub fn generate(options: &GenerateOptions) -> Result<Piece, GenerationError> {
    let opts = options.normalize();
    log::debug!(
        "generating {} in {} (duration {}, seed {:?}, density {})",
        opts.form,
        opts.key,
        opts.duration,
        opts.seed,
        opts.density
    );
    let mut rng = ComposerRng::from_seed_str(&opts.seed);

    let (notes, progression, phrase_markers, sections) = if opts.form == Form::Fugue {
        let fugue = generate_fugue(opts.key, opts.density, &mut rng);
        validate(&fugue.notes, true)?;
        (fugue.notes, fugue.progression, Vec::new(), fugue.sections)
    } else {
        let realized = compose_sections(&opts, &mut rng)?;
        (realized.notes, realized.progression, realized.markers, realized.sections)
    };

    log::debug!("{} notes in {} sections", notes.len(), sections.len());
    Ok(Piece {
        notes,
        meta: PieceMeta {
            key: opts.key.tonic().to_string(),
            mode: opts.key.mode().name().to_string(),
            form: opts.form.name().to_string(),
            style: format!("Baroque {}", opts.form.name()),
            progression,
            phrase_markers,
            sections,
            seed: opts.seed,
        },
    })
}

struct Realized {
    notes: Vec<Note>,
    progression: String,
    markers: Vec<PhraseMarker>,
    sections: Vec<SectionSpan>,
}

/// The phrase shape for one section.
fn realize_section(
    form: Form,
    section: &Section,
    keys: &KeyPlanEntry,
    final_section: bool,
    rng: &mut ComposerRng,
) -> Phrase {
    let bars = section.bars;
    let sentence_shaped = (section.kind == SectionKind::Theme && form == Form::Variations)
        || (section.kind == SectionKind::Tutti && bars >= SENTENCE_BARS);
    match section.key_change {
        KeyChange::Excursion { .. } => {
            let via = keys.via.unwrap_or(keys.end);
            if bars >= TERNARY_BARS {
                ternary(keys.start, via, bars, final_section, rng)
            } else {
                period(keys.end, bars, final_section, rng)
            }
        }
        _ if sentence_shaped => sentence(keys.end, bars, final_section, rng),
        _ if keys.start == keys.end => {
            if bars >= PHRASED_BARS {
                period(keys.end, bars, final_section, rng)
            } else {
                single(keys.end, bars, final_section, rng)
            }
        }
        _ if bars >= PHRASED_BARS => binary(keys.start, keys.end, bars, final_section, rng),
        _ => single(keys.end, bars, final_section, rng),
    }
}

fn times(span: Beat, n: usize) -> Beat {
    Beat::from_ticks(span.ticks() * n as u32)
}

fn compose_sections(opts: &Normalized, rng: &mut ComposerRng) -> Result<Realized, GenerationError> {
    let sections = plan(opts.form, opts.duration);
    if sections.is_empty() {
        return Err(GenerationError::invariant(Stage::Structure, format!("{} planned no sections", opts.form)));
    }
    let keys = Modulator::new(opts.key).plan(&sections, rng);

    let mut chords: Vec<Chord> = Vec::new();
    let mut textures: Vec<SlotTexture> = Vec::new();
    let mut markers: Vec<PhraseMarker> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut spans: Vec<SectionSpan> = Vec::new();
    let mut theme: Option<Phrase> = None;

    for (i, (section, entry)) in sections.iter().zip(&keys).enumerate() {
        let final_section = i + 1 == sections.len();
        let restated = theme
            .as_ref()
            .filter(|t| section.kind == SectionKind::Variation && t.chords.len() == section.bars)
            .cloned();
        let phrase = match restated {
            Some(t) => t,
            None => realize_section(opts.form, section, entry, final_section, rng),
        };
        if phrase.chords.len() != section.bars {
            return Err(GenerationError::invariant(
                Stage::Harmony,
                format!("{} has {} chords for {} bars", section.name, phrase.chords.len(), section.bars),
            ));
        }
        if section.kind == SectionKind::Theme {
            theme = Some(phrase.clone());
        }

        let offset = chords.len();
        let section_markers = if phrase.markers.is_empty() {
            analyze_phrases(&phrase.chords)
        } else {
            phrase.markers.clone()
        };
        markers.extend(section_markers.iter().map(|m| m.offset(offset)));
        labels.push(progression_label(&phrase.chords));
        spans.push(SectionSpan::new(
            &section.name,
            times(MEASURE, offset),
            times(MEASURE, offset + phrase.chords.len()),
            phrase.chords.first().map(|c| c.key).unwrap_or(entry.start),
        ));
        textures.extend((0..phrase.chords.len()).map(|index| SlotTexture {
            form: section.texture,
            variation: section.variation,
            index,
        }));
        chords.extend(phrase.chords);
    }

    let options = VoiceLeadingOptions {
        check_doubling: true,
        ..VoiceLeadingOptions::default()
    };
    let voicings = voice_progression(&chords, None, &options, rng);

    let mut notes = Vec::new();
    let mut slots = Vec::with_capacity(chords.len());
    for (i, ((chord, voicing), texture)) in chords.iter().zip(&voicings).zip(&textures).enumerate() {
        let start = times(MEASURE, i);
        notes.extend(realize_slot(chord, voicing, start, *texture));
        slots.push(HarmonicSlot {
            chord: chord.clone(),
            start,
            end: start + MEASURE,
        });
    }
    sort_notes(&mut notes);

    let key_spans = merge_key_spans(&slots);
    let config = OrnamentConfig {
        total_measures: chords.len() as u32,
        ..OrnamentConfig::default().with_density_percent(opts.density)
    };
    let ctx = OrnamentContext {
        config: &config,
        slots: &slots,
        key_spans: &key_spans,
        home: opts.key,
    };
    let notes = ornament(notes, &ctx, rng);
    validate(&notes, false)?;

    Ok(Realized {
        notes,
        progression: labels.join(" | "),
        markers,
        sections: spans,
    })
}

/// One span per run of consecutive slots in the same key.
fn merge_key_spans(slots: &[HarmonicSlot]) -> Vec<KeySpan> {
    let mut spans: Vec<KeySpan> = Vec::new();
    for slot in slots {
        match spans.last_mut().filter(|s| s.key == slot.chord.key && s.end == slot.start) {
            Some(span) => span.end = slot.end,
            None => spans.push(KeySpan {
                start: slot.start,
                end: slot.end,
                key: slot.chord.key,
            }),
        }
    }
    spans
}

fn stage_of(note: &Note, fugue: bool) -> Stage {
    if note.is_ornament() {
        Stage::Ornamentation
    } else if fugue || note.kind.is_some_and(|k| k != NoteKind::Cadence) {
        Stage::Fugue
    } else {
        Stage::VoiceLeading
    }
}

/// Every note in its voice's range, and no two notes of one voice overlap.
pub fn validate(notes: &[Note], fugue: bool) -> Result<(), GenerationError> {
    for note in notes {
        if !note.voice.contains(note.midi()) {
            let (lo, hi) = note.voice.range();
            return Err(GenerationError::invariant(
                stage_of(note, fugue),
                format!(
                    "{} {} at beat {} outside {lo}..={hi}",
                    note.voice.name(),
                    note.pitch,
                    note.start_time.as_beats()
                ),
            ));
        }
    }
    for voice in Voice::ALL {
        let mut line: Vec<&Note> = notes.iter().filter(|n| n.voice == voice).collect();
        line.sort_by_key(|n| n.start_time);
        if let Some(pair) = line.windows(2).find(|w| w[0].end() > w[1].start_time) {
            return Err(GenerationError::invariant(
                stage_of(pair[1], fugue),
                format!(
                    "{} notes overlap at beat {}",
                    voice.name(),
                    pair[1].start_time.as_beats()
                ),
            ));
        }
    }
    Ok(())
}
