// MIDI output from finished pieces.
//
// Converts a Piece into a Standard MIDI File (SMF) for playback. Each voice
// maps to a separate named track on its own channel, after a tempo track.
// Score ticks (48 per quarter) are scaled to 480 ticks per quarter.
//
// Uses the `midly` crate for MIDI writing. Output is SMF Format 1 (multi-track).

use crate::error::GenerationError;
use crate::note::{TICKS_PER_BEAT, Voice};
use crate::planner::Piece;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Velocity for notes the humanizer did not touch.
const DEFAULT_VELOCITY: u8 = 80;

/// Harpsichord.
const PROGRAM: u8 = 6;

pub const DEFAULT_TEMPO_BPM: u16 = 72;

fn scale_ticks(score_ticks: u32) -> u32 {
    score_ticks * TICKS_PER_QUARTER as u32 / TICKS_PER_BEAT
}

/// Convert a piece to MIDI and write it to `path`.
pub fn write_midi(piece: &Piece, path: &Path, tempo_bpm: u16) -> Result<(), GenerationError> {
    let smf = to_smf(piece, tempo_bpm);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    std::fs::write(path, &buf)?;
    log::debug!("wrote {} bytes of MIDI to {}", buf.len(), path.display());
    Ok(())
}

/// Convert a piece to an in-memory SMF.
pub fn to_smf(piece: &Piece, tempo_bpm: u16) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo
    let tempo_microseconds = 60_000_000 / tempo_bpm.max(1) as u32;
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    for voice in Voice::ALL {
        smf.tracks.push(voice_track(piece, voice));
    }
    smf
}

fn voice_track(piece: &Piece, voice: Voice) -> Track<'static> {
    let channel = u4::new(voice.index() as u8);
    let mut track: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(voice.name().as_bytes())),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(PROGRAM),
                },
            },
        },
    ];

    // (tick, is_on, key, velocity); offs sort before ons at the same tick.
    let mut events: Vec<(u32, bool, u8, u8)> = Vec::new();
    for note in piece.notes.iter().filter(|n| n.voice == voice) {
        let key = note.midi().clamp(0, 127) as u8;
        let velocity = note.velocity.unwrap_or(DEFAULT_VELOCITY).min(127);
        events.push((scale_ticks(note.start_time.ticks()), true, key, velocity));
        events.push((scale_ticks(note.end().ticks()), false, key, 0));
    }
    events.sort_by_key(|&(tick, on, key, _)| (tick, on, key));

    let mut last_tick = 0;
    for (tick, on, key, vel) in events {
        let message = if on {
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(tick - last_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}
