// Notes, durations, voices, and the tick clock.
//
// Time is kept in integer ticks, 48 to the quarter-note beat, so that every
// duration down to a thirty-second (6 ticks) and every halving the ornament
// passes perform stays exact. `Beat` serializes as a float beat count for
// the JSON surface ("startTime": 2.5).
//
// `Duration` is a closed set of rhythmic values. Splits that do not land on
// one of them go through `Duration::decompose`, which greedily covers a
// tick span with the largest values that fit.

use baroque_theory::Pitch;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

pub const TICKS_PER_BEAT: u32 = 48;

/// One harmonic slot ("bar"): two quarter-note beats.
pub const MEASURE: Beat = Beat::from_beats(2);

/// Position or span on the score clock, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Beat(u32);

impl Beat {
    pub const ZERO: Beat = Beat(0);

    pub const fn from_ticks(ticks: u32) -> Self {
        Beat(ticks)
    }

    pub const fn from_beats(beats: u32) -> Self {
        Beat(beats * TICKS_PER_BEAT)
    }

    pub fn ticks(self) -> u32 {
        self.0
    }

    pub fn as_beats(self) -> f64 {
        self.0 as f64 / TICKS_PER_BEAT as f64
    }

    pub fn saturating_sub(self, other: Beat) -> Beat {
        Beat(self.0.saturating_sub(other.0))
    }

    /// Whether this position falls on a multiple of `span`.
    pub fn is_aligned_to(self, span: Beat) -> bool {
        span.0 != 0 && self.0 % span.0 == 0
    }
}

impl Add for Beat {
    type Output = Beat;
    fn add(self, rhs: Beat) -> Beat {
        Beat(self.0 + rhs.0)
    }
}

impl AddAssign for Beat {
    fn add_assign(&mut self, rhs: Beat) {
        self.0 += rhs.0;
    }
}

impl Sub for Beat {
    type Output = Beat;
    fn sub(self, rhs: Beat) -> Beat {
        Beat(self.0 - rhs.0)
    }
}

impl Serialize for Beat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_beats())
    }
}

impl<'de> Deserialize<'de> for Beat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let beats = f64::deserialize(deserializer)?;
        if !beats.is_finite() || beats < 0.0 {
            return Err(serde::de::Error::custom("startTime must be a non-negative number"));
        }
        Ok(Beat((beats * TICKS_PER_BEAT as f64).round() as u32))
    }
}

/// Rhythmic values, longest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Duration {
    Whole,
    DottedHalf,
    Half,
    DottedQuarter,
    Quarter,
    DottedEighth,
    Eighth,
    DottedSixteenth,
    Sixteenth,
    ThirtySecond,
}

impl Duration {
    pub const ALL: [Duration; 10] = [
        Duration::Whole,
        Duration::DottedHalf,
        Duration::Half,
        Duration::DottedQuarter,
        Duration::Quarter,
        Duration::DottedEighth,
        Duration::Eighth,
        Duration::DottedSixteenth,
        Duration::Sixteenth,
        Duration::ThirtySecond,
    ];

    pub fn ticks(self) -> u32 {
        match self {
            Duration::Whole => 192,
            Duration::DottedHalf => 144,
            Duration::Half => 96,
            Duration::DottedQuarter => 72,
            Duration::Quarter => 48,
            Duration::DottedEighth => 36,
            Duration::Eighth => 24,
            Duration::DottedSixteenth => 18,
            Duration::Sixteenth => 12,
            Duration::ThirtySecond => 6,
        }
    }

    pub fn span(self) -> Beat {
        Beat::from_ticks(self.ticks())
    }

    pub fn from_ticks(ticks: u32) -> Option<Duration> {
        Self::ALL.into_iter().find(|d| d.ticks() == ticks)
    }

    /// Exactly half this value, if that is itself a rhythmic value.
    pub fn half(self) -> Option<Duration> {
        if self.ticks() % 2 != 0 {
            return None;
        }
        Self::from_ticks(self.ticks() / 2)
    }

    /// Cover `ticks` with as few values as possible, longest first. Any
    /// remainder shorter than a thirty-second is dropped.
    pub fn decompose(ticks: u32) -> Vec<Duration> {
        let mut remaining = ticks;
        let mut out = Vec::new();
        for d in Self::ALL {
            while remaining >= d.ticks() {
                out.push(d);
                remaining -= d.ticks();
            }
        }
        out
    }

    /// Tone.js-style notation: "2n", "4n.", "16n".
    pub fn notation(self) -> &'static str {
        match self {
            Duration::Whole => "1n",
            Duration::DottedHalf => "2n.",
            Duration::Half => "2n",
            Duration::DottedQuarter => "4n.",
            Duration::Quarter => "4n",
            Duration::DottedEighth => "8n.",
            Duration::Eighth => "8n",
            Duration::DottedSixteenth => "16n.",
            Duration::Sixteenth => "16n",
            Duration::ThirtySecond => "32n",
        }
    }

    pub fn from_notation(s: &str) -> Option<Duration> {
        Self::ALL.into_iter().find(|d| d.notation() == s)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.notation())
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.notation())
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Duration::from_notation(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown duration {s:?}")))
    }
}

/// Voice index in SATB order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Voice {
    Soprano = 0,
    Alto = 1,
    Tenor = 2,
    Bass = 3,
}

impl Voice {
    pub const ALL: [Voice; 4] = [Voice::Soprano, Voice::Alto, Voice::Tenor, Voice::Bass];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Voice> {
        Self::ALL.get(index).copied()
    }

    /// Inclusive MIDI range. Every emitted note must lie inside it.
    pub fn range(self) -> (i32, i32) {
        match self {
            Voice::Soprano => (60, 81), // C4–A5
            Voice::Alto => (55, 74),    // G3–D5
            Voice::Tenor => (48, 67),   // C3–G4
            Voice::Bass => (40, 60),    // E2–C4
        }
    }

    pub fn contains(self, midi: i32) -> bool {
        let (lo, hi) = self.range();
        (lo..=hi).contains(&midi)
    }

    pub fn center(self) -> i32 {
        let (lo, hi) = self.range();
        (lo + hi) / 2
    }

    pub fn name(self) -> &'static str {
        match self {
            Voice::Soprano => "Soprano",
            Voice::Alto => "Alto",
            Voice::Tenor => "Tenor",
            Voice::Bass => "Bass",
        }
    }

    /// The adjacent voice above, if any.
    pub fn above(self) -> Option<Voice> {
        self.index().checked_sub(1).and_then(Voice::from_index)
    }

    /// The adjacent voice below, if any.
    pub fn below(self) -> Option<Voice> {
        Voice::from_index(self.index() + 1)
    }
}

impl Serialize for Voice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.index() as u8)
    }
}

impl<'de> Deserialize<'de> for Voice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let idx = u8::deserialize(deserializer)?;
        Voice::from_index(idx as usize)
            .ok_or_else(|| serde::de::Error::custom(format!("voice index {idx} out of range")))
    }
}

/// What produced a note. Untagged notes are plain chord realizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Passing,
    Suspension,
    Resolution,
    Neighbor,
    Appoggiatura,
    Trill,
    Mordent,
    Turn,
    Subject,
    Answer,
    Countersubject,
    Episode,
    Stretto,
    Pedal,
    Cadence,
}

impl NoteKind {
    /// Tags added by the ornamentation pipeline, as opposed to structural
    /// material from harmony or the fugue.
    pub fn is_ornament(self) -> bool {
        matches!(
            self,
            NoteKind::Passing
                | NoteKind::Suspension
                | NoteKind::Resolution
                | NoteKind::Neighbor
                | NoteKind::Appoggiatura
                | NoteKind::Trill
                | NoteKind::Mordent
                | NoteKind::Turn
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub pitch: Pitch,
    pub duration: Duration,
    pub start_time: Beat,
    pub voice: Voice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<u8>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NoteKind>,
}

impl Note {
    pub fn new(pitch: Pitch, duration: Duration, start_time: Beat, voice: Voice) -> Self {
        Self {
            pitch,
            duration,
            start_time,
            voice,
            velocity: None,
            kind: None,
        }
    }

    pub fn tagged(mut self, kind: NoteKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn midi(&self) -> i32 {
        self.pitch.midi()
    }

    pub fn end(&self) -> Beat {
        self.start_time + self.duration.span()
    }

    pub fn is_ornament(&self) -> bool {
        self.kind.is_some_and(NoteKind::is_ornament)
    }

    /// True if the half-open spans `[start, end)` intersect.
    pub fn overlaps(&self, other: &Note) -> bool {
        self.overlaps_span(other.start_time, other.end())
    }

    pub fn overlaps_span(&self, start: Beat, end: Beat) -> bool {
        self.start_time < end && start < self.end()
    }

    /// Whether the note is sounding at `t`.
    pub fn sounds_at(&self, t: Beat) -> bool {
        self.start_time <= t && t < self.end()
    }
}

/// Canonical order: start time, then voice, then pitch.
pub fn sort_notes(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then(a.voice.cmp(&b.voice))
            .then(a.midi().cmp(&b.midi()))
    });
}

/// Split a span into consecutive notes of one pitch, in decompose order.
pub fn fill_span(pitch: Pitch, start: Beat, span: Beat, voice: Voice) -> Vec<Note> {
    let mut t = start;
    Duration::decompose(span.ticks())
        .into_iter()
        .map(|d| {
            let note = Note::new(pitch, d, t, voice);
            t += d.span();
            note
        })
        .collect()
}
