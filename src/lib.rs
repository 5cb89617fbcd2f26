//! Three interchangeable 2D convolution engines over dense NCHW `f32` buffers.
//!
//! - **Direct**: sliding-window reference implementation.
//! - **Im2col**: unfold receptive fields into a patch matrix, then one GEMM per group.
//! - **Patch2Vec**: gather one patch vector per output pixel into a small private buffer
//!   and dot it against every output channel's kernel, without storing the patch matrix.
//!
//! All engines share the geometry in [`conv::Conv2dParams`] and must agree up to
//! floating-point summation order. [`benchmark`] times them and reports the
//! mean absolute error against the direct engine.
//!
//! # Example
//!
//! ```no_run
//! use patch2vec::benchmark::{run_benchmark, print_report, BenchConfig};
//!
//! let result = run_benchmark(&BenchConfig::default()).unwrap();
//! print_report(&result);
//! ```

/// Error type shared by the checked entry points.
pub mod error;
/// Dense NCHW tensors, random fill and error metrics.
pub mod tensor;
/// Convolution parameters and algorithm implementations.
pub mod conv;
/// Equivalence/benchmark harness.
pub mod metrics;

pub use error::{ConvError, Result};
pub use metrics::benchmark;
