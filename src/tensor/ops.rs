use rand::Rng;

/// Fill `data` with uniform random values in `[0, 1)`.
pub fn fill_uniform<R: Rng + ?Sized>(data: &mut [f32], rng: &mut R) {
    for v in data.iter_mut() {
        *v = rng.gen::<f32>();
    }
}

/// Allocate `len` uniform random values in `[0, 1)`.
pub fn random_vec<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f32> {
    let mut data = vec![0.0f32; len];
    fill_uniform(&mut data, rng);
    data
}

/// Mean absolute error between two equal-length buffers.
///
/// Accumulates in `f64` so large outputs do not drown small differences.
/// Returns `0.0` for empty input.
pub fn mean_absolute_error(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "MAE over buffers of different length");
    if a.is_empty() {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs() as f64)
        .sum();
    (sum / a.len() as f64) as f32
}

/// Mean of absolute values; `0.0` for empty input.
pub fn mean_abs(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().map(|v| v.abs() as f64).sum();
    (sum / data.len() as f64) as f32
}

/// Largest per-element absolute difference.
pub fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "max_abs_diff over buffers of different length");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f32, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn uniform_values_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(7);
        let data = random_vec(1000, &mut rng);
        assert!(data.iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn same_seed_same_values() {
        let a = random_vec(64, &mut StdRng::seed_from_u64(1));
        let b = random_vec(64, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn mae_basic() {
        assert_eq!(mean_absolute_error(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
        assert!((mean_absolute_error(&[0.0, 0.0], &[1.0, -3.0]) - 2.0).abs() < 1e-6);
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
        assert_eq!(max_abs_diff(&[0.0, 0.0], &[1.0, -3.0]), 3.0);
        assert!((mean_abs(&[1.0, -3.0]) - 2.0).abs() < 1e-6);
        assert_eq!(mean_abs(&[]), 0.0);
    }
}
