//! Convolution algorithm implementations.
//!
//! Provides three algorithms for grouped, dilated, strided 2D convolution with
//! implicit zero padding: direct (reference), Im2col+GEMM and Patch2Vec.

mod params;
mod direct;
mod im2col;
mod patch2vec;
pub mod simd;

use std::fmt;

use crate::error::{ConvError, Result};

pub use params::{output_size, Conv2dParams};
pub use direct::conv2d_direct;
pub use im2col::{conv2d_im2col, gemm, im2col};
pub use patch2vec::conv2d_patch2vec;

/// Selects which convolution algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvAlgorithm {
    /// Sliding-window accumulation straight from the source (reference implementation).
    Direct,
    /// Im2col unfolding + one GEMM per group.
    Im2col,
    /// Per-pixel patch gather + dot product per output channel.
    Patch2Vec,
}

impl ConvAlgorithm {
    pub const ALL: [ConvAlgorithm; 3] = [
        ConvAlgorithm::Direct,
        ConvAlgorithm::Im2col,
        ConvAlgorithm::Patch2Vec,
    ];
}

impl fmt::Display for ConvAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvAlgorithm::Direct => write!(f, "Direct"),
            ConvAlgorithm::Im2col => write!(f, "Im2Col"),
            ConvAlgorithm::Patch2Vec => write!(f, "Patch2Vec"),
        }
    }
}

fn check_len(name: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(ConvError::BufferSize {
            name,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Dispatch convolution to the selected algorithm.
///
/// Unlike the engine functions, this checks the parameters and that every buffer
/// length matches the NCHW shape it is declared with.
pub fn conv2d(
    algorithm: ConvAlgorithm,
    input: &[f32],
    params: &Conv2dParams,
    weights: &[f32],
    bias: &[f32],
    output: &mut [f32],
) -> Result<()> {
    params.validate()?;
    check_len("input", params.src_len(), input.len())?;
    check_len("weight", params.weight_len(), weights.len())?;
    check_len("bias", params.bias_len(), bias.len())?;
    check_len("output", params.dst_len(), output.len())?;

    match algorithm {
        ConvAlgorithm::Direct => conv2d_direct(input, params, weights, bias, output),
        ConvAlgorithm::Im2col => conv2d_im2col(input, params, weights, bias, output),
        ConvAlgorithm::Patch2Vec => conv2d_patch2vec(input, params, weights, bias, output),
    }
    Ok(())
}
