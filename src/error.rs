use thiserror::Error;

use crate::conv::ConvAlgorithm;

/// Errors reported by the checked convolution entry point and the benchmark harness.
///
/// The engines themselves never return these: invalid shapes passed straight to an
/// engine are a caller bug and end in a slice-index panic.
#[derive(Debug, Error)]
pub enum ConvError {
    #[error("invalid convolution parameters: {0}")]
    InvalidParams(String),

    #[error("{name} buffer has {actual} elements, expected {expected}")]
    BufferSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{algorithm} output differs from direct: MAE {mae:e} exceeds tolerance {tolerance:e}")]
    Mismatch {
        algorithm: ConvAlgorithm,
        mae: f32,
        tolerance: f32,
    },
}

pub type Result<T> = std::result::Result<T, ConvError>;
