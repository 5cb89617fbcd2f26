use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::conv::{conv2d, Conv2dParams, ConvAlgorithm};
use crate::error::{ConvError, Result};
use crate::tensor::{max_abs_diff, mean_abs, mean_absolute_error, Tensor};

/// Relative MAE above which two engines are considered to disagree.
///
/// Compared against `mae / max(mean |direct|, 1)`. Outputs grow with the patch
/// length, so an absolute bound would flag plain summation-order differences.
pub const DEFAULT_TOLERANCE: f32 = 1e-4;

/// What to run: one hyperparameter set, one seed for all generated data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchConfig {
    pub params: Conv2dParams,
    pub seed: u64,
    /// Timed runs per engine; the reported time is their mean.
    pub iterations: usize,
}

impl Default for BenchConfig {
    /// 1x64x128x128 input, 128 output channels, 5x5 kernel, padding 1.
    fn default() -> Self {
        BenchConfig {
            params: Conv2dParams::new(1, 64, 128, 128, 128).kernel(5, 5).pad_all(1),
            seed: 42,
            iterations: 1,
        }
    }
}

/// Timing and accuracy of one engine relative to the direct engine.
#[derive(Debug, Clone)]
pub struct EngineMetrics {
    pub algorithm: ConvAlgorithm,
    pub time: Duration,
    /// `None` for the direct engine itself.
    pub mae: Option<f32>,
    pub max_diff: Option<f32>,
}

/// Aggregate benchmark results, one entry per engine in [`ConvAlgorithm::ALL`] order.
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub params: Conv2dParams,
    /// Mean absolute value of the direct output.
    pub reference_magnitude: f32,
    pub engines: Vec<EngineMetrics>,
}

impl BenchmarkResult {
    pub fn engine(&self, algorithm: ConvAlgorithm) -> Option<&EngineMetrics> {
        self.engines.iter().find(|m| m.algorithm == algorithm)
    }

    /// MAE scaled by the output magnitude; absolute below a magnitude of 1.
    pub fn relative_mae(&self, mae: f32) -> f32 {
        mae / self.reference_magnitude.max(1.0)
    }

    /// Fail on the first engine whose relative MAE exceeds `tolerance`.
    pub fn check(&self, tolerance: f32) -> Result<()> {
        for m in &self.engines {
            if let Some(mae) = m.mae {
                let relative = self.relative_mae(mae);
                if relative.is_nan() || relative > tolerance {
                    return Err(ConvError::Mismatch {
                        algorithm: m.algorithm,
                        mae,
                        tolerance,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Run every engine on the same seeded input, weights and bias.
///
/// Each engine writes its own output buffer; im2col and patch2vec outputs are
/// compared against the direct output.
pub fn run_benchmark(config: &BenchConfig) -> Result<BenchmarkResult> {
    let params = config.params;
    params.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let input = Tensor::random(params.src_shape(), &mut rng);
    let weights = Tensor::random(params.weight_shape(), &mut rng);
    let bias = Tensor::random(params.bias_shape(), &mut rng);
    info!(%params, seed = config.seed, "generated benchmark inputs");

    let iterations = config.iterations.max(1);
    let mut reference: Option<Tensor> = None;
    let mut engines = Vec::with_capacity(ConvAlgorithm::ALL.len());

    for algorithm in ConvAlgorithm::ALL {
        let mut output = Tensor::zeros(params.dst_shape());
        let mut total = Duration::ZERO;
        for _ in 0..iterations {
            let start = Instant::now();
            conv2d(
                algorithm,
                input.as_slice(),
                &params,
                weights.as_slice(),
                bias.as_slice(),
                output.as_mut_slice(),
            )?;
            total += start.elapsed();
        }
        let time = mean_duration(total, iterations);

        let (mae, max_diff) = match &reference {
            Some(direct) => (
                Some(mean_absolute_error(direct.as_slice(), output.as_slice())),
                Some(max_abs_diff(direct.as_slice(), output.as_slice())),
            ),
            None => (None, None),
        };
        info!(%algorithm, ms = time.as_secs_f64() * 1000.0, ?mae, "engine finished");

        if algorithm == ConvAlgorithm::Direct {
            reference = Some(output);
        }
        engines.push(EngineMetrics {
            algorithm,
            time,
            mae,
            max_diff,
        });
    }

    let reference_magnitude = reference.as_ref().map_or(0.0, |t| mean_abs(t.as_slice()));

    Ok(BenchmarkResult {
        params,
        reference_magnitude,
        engines,
    })
}

fn mean_duration(total: Duration, runs: usize) -> Duration {
    Duration::from_secs_f64(total.as_secs_f64() / runs.max(1) as f64)
}

/// Print a formatted benchmark report to stdout.
pub fn print_report(result: &BenchmarkResult) {
    for m in &result.engines {
        let ms = m.time.as_secs_f64() * 1000.0;
        println!("{}: {:.3} ms", m.algorithm, ms);
        if let (Some(mae), Some(max_diff)) = (m.mae, m.max_diff) {
            println!(
                "MAE(Direct, {}): {:e} (max {:e})",
                m.algorithm, mae, max_diff
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::random_vec;

    fn small_config() -> BenchConfig {
        BenchConfig {
            params: Conv2dParams::new(2, 4, 9, 7, 6).kernel(3, 3).pad_all(1).group(2),
            seed: 3,
            iterations: 2,
        }
    }

    #[test]
    fn engines_agree_on_small_config() {
        let result = run_benchmark(&small_config()).unwrap();
        assert_eq!(result.engines.len(), 3);
        assert!(result.engine(ConvAlgorithm::Direct).unwrap().mae.is_none());
        let im2col = result.engine(ConvAlgorithm::Im2col).unwrap();
        assert!(im2col.mae.is_some());
        assert!(im2col.max_diff.unwrap() >= im2col.mae.unwrap());
        assert!(result.reference_magnitude > 0.0);
        result.check(DEFAULT_TOLERANCE).unwrap();
    }

    #[test]
    fn reordered_summation_passes_at_default_size() {
        // Default layer: 64 input channels x 5x5 kernel per output sample.
        let params = BenchConfig::default().params;
        let patch_len = params.patch_len();
        let mut rng = StdRng::seed_from_u64(42);
        let samples = 512;
        let patches = random_vec(samples * patch_len, &mut rng);
        let weights = random_vec(patch_len, &mut rng);

        let mut sequential = Vec::with_capacity(samples);
        let mut interleaved = Vec::with_capacity(samples);
        for patch in patches.chunks_exact(patch_len) {
            let mut sum = 0.0f32;
            let mut acc = [0.0f32; 2];
            for (i, (x, w)) in patch.iter().zip(&weights).enumerate() {
                sum += x * w;
                acc[i % 2] += x * w;
            }
            sequential.push(sum);
            interleaved.push(acc[0] + acc[1]);
        }

        let mae = mean_absolute_error(&sequential, &interleaved);
        let result = BenchmarkResult {
            params,
            reference_magnitude: mean_abs(&sequential),
            engines: vec![EngineMetrics {
                algorithm: ConvAlgorithm::Patch2Vec,
                time: Duration::ZERO,
                mae: Some(mae),
                max_diff: Some(max_abs_diff(&sequential, &interleaved)),
            }],
        };
        assert!(result.reference_magnitude > 100.0);
        result.check(DEFAULT_TOLERANCE).unwrap();
    }

    #[test]
    fn mean_duration_handles_huge_run_counts() {
        let runs = u32::MAX as usize + 2;
        let mean = mean_duration(Duration::from_secs(1 << 40), runs);
        assert!(mean > Duration::ZERO);
        assert!(mean < Duration::from_secs(300));
        let third = mean_duration(Duration::from_millis(9), 3);
        assert!((third.as_secs_f64() - 0.003).abs() < 1e-9);
    }

    #[test]
    fn check_reports_mismatch() {
        let mut result = run_benchmark(&small_config()).unwrap();
        result.engines[2].mae = Some(1.0);
        match result.check(DEFAULT_TOLERANCE) {
            Err(ConvError::Mismatch { algorithm, .. }) => {
                assert_eq!(algorithm, ConvAlgorithm::Patch2Vec)
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn invalid_params_rejected() {
        let config = BenchConfig {
            params: Conv2dParams::new(1, 3, 8, 8, 4).group(2),
            ..small_config()
        };
        assert!(matches!(run_benchmark(&config), Err(ConvError::InvalidParams(_))));
    }
}
