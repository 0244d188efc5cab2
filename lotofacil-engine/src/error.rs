//! Error types for the statistics engine and the bet synthesizer.

use lotofacil_db::models::InvalidRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The statistic needs at least one draw.
    #[error("insufficient data: {0}")]
    InsufficientData(&'static str),

    /// Bet generation refused: too few draws to rank numbers.
    #[error("insufficient history: {available} draws available, {required} required")]
    InsufficientHistory { required: usize, available: usize },

    #[error("invalid record: {0}")]
    InvalidRecord(#[from] InvalidRecord),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The anchor set alone already breaks the 7/8 even-odd split.
    #[error("parity constraint cannot be met with anchors holding {even} even and {odd} odd numbers")]
    ParityUnsatisfiable { even: usize, odd: usize },

    #[error("sampling failed: {0}")]
    Sampling(String),

    /// Rejection sampling gave up.
    #[error("no acceptable bet after {attempts} attempts")]
    SamplingExhausted { attempts: usize },
}

pub type EngineResult<T> = Result<T, EngineError>;
