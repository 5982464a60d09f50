// Lookup failures from the pitch oracle. Callers recover from these with
// their own fallbacks; nothing here is fatal.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TheoryError {
    #[error("invalid pitch {0:?}")]
    InvalidPitch(String),

    #[error("invalid interval {0:?}")]
    InvalidInterval(String),

    #[error("unknown scale {0:?}")]
    UnknownScale(String),

    #[error("unknown chord symbol {0:?}")]
    UnknownChord(String),

    #[error("unknown roman numeral {0:?}")]
    UnknownNumeral(String),
}
