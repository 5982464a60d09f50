// Baroque composer
//
// Procedurally composes four-voice (SATB) Baroque-style music. A seeded
// pseudo-random stream drives fixed rule tables: functional harmony, a
// constrained voicing search, rule-based ornament passes, and a fugue
// builder. The same options always produce the same notes.
//
// Architecture:
// - note.rs: Beats, durations, voices and their ranges, the `Note` value
// - key.rs: Major/minor keys over the pitch oracle in `baroque_theory`
// - harmony.rs: Functional progressions, cadences, sequences, final cadence
// - voice_leading.rs: SATB voicing search (parallels, spacing, doubling)
// - ornament/: Suspensions, passing and neighbour tones, appoggiaturas,
//   trills, mordents, turns, dissonance cleanup, humanization
// - structure.rs: Forms and their section plans
// - modulation.rs: Related keys and the per-section key plan
// - phrase.rs: Period, sentence, binary, ternary shapes and phrase analysis
// - motif.rs: Scale-degree motifs and their transforms
// - rhythm.rs: Per-form slot figuration and rhythmic transforms
// - fugue.rs: Subject, answer, countersubject, and the fugue stages
// - planner.rs: `generate`, option normalization, piece metadata
// - midi.rs: Standard MIDI File export
// - error.rs: `GenerationError`
//
// Library code logs through `log`; installing a logger is up to the caller.

pub mod error;
pub mod fugue;
pub mod harmony;
pub mod key;
pub mod midi;
pub mod modulation;
pub mod motif;
pub mod note;
pub mod ornament;
pub mod phrase;
pub mod planner;
pub mod rhythm;
pub mod structure;
pub mod voice_leading;

pub use error::{GenerationError, Stage};
pub use planner::{GenerateOptions, Piece, PieceMeta, generate};
