// Errors surfaced by `generate` and the MIDI writer.
//
// Lookup failures, search exhaustion, and malformed options are all
// recovered inside the pipeline. What reaches the caller is either an
// invariant the final validation caught (naming the stage that produced the
// bad notes) or an I/O failure while exporting.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Structure,
    Harmony,
    VoiceLeading,
    Ornamentation,
    Fugue,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Structure => "structure",
            Stage::Harmony => "harmony",
            Stage::VoiceLeading => "voice leading",
            Stage::Ornamentation => "ornamentation",
            Stage::Fugue => "fugue",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invariant violated during {stage}: {detail}")]
    Invariant { stage: Stage, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    pub fn invariant(stage: Stage, detail: impl Into<String>) -> Self {
        GenerationError::Invariant {
            stage,
            detail: detail.into(),
        }
    }

    /// The stage named by an invariant violation, if this is one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            GenerationError::Invariant { stage, .. } => Some(*stage),
            GenerationError::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_names_its_stage() {
        let err = GenerationError::invariant(Stage::VoiceLeading, "alto above soprano");
        assert_eq!(err.stage(), Some(Stage::VoiceLeading));
        assert_eq!(err.to_string(), "invariant violated during voice leading: alto above soprano");
        assert_eq!(serde_json::to_value(Stage::VoiceLeading).unwrap(), "voiceLeading");
    }
}
