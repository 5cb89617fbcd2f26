//! Tests for the FP32 micro-kernels and the GEMM built on them.

use patch2vec::conv::simd::{axpy_f32, dot_f32};
use patch2vec::conv::gemm;

/// Reference scalar matrix multiply (3-nested-loop) for correctness comparison.
fn gemm_scalar(a: &[f32], b: &[f32], m: usize, n: usize, k: usize) -> Vec<f32> {
    let mut c = vec![0.0f32; m * n];
    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0f32;
            for p in 0..k {
                sum += a[i * k + p] * b[p * n + j];
            }
            c[i * n + j] = sum;
        }
    }
    c
}

fn ramp(len: usize, scale: f32) -> Vec<f32> {
    (0..len).map(|i| ((i as f32) * scale).cos()).collect()
}

#[test]
fn test_gemm_vs_scalar_odd_sizes() {
    for &(m, n, k) in &[(1, 1, 1), (3, 5, 7), (8, 33, 17), (13, 4, 75)] {
        let a = ramp(m * k, 0.37);
        let b = ramp(k * n, 0.11);
        let mut c = vec![f32::NAN; m * n];
        gemm(&a, &b, m, n, k, &mut c);
        let expected = gemm_scalar(&a, &b, m, n, k);
        for (i, (x, y)) in c.iter().zip(expected.iter()).enumerate() {
            assert!((x - y).abs() < 1e-4, "({m},{n},{k}) index {i}: {x} vs {y}");
        }
    }
}

#[test]
fn test_axpy_tail_lengths() {
    for len in 0..11 {
        let b = ramp(len, 0.5);
        let mut c = vec![1.0f32; len];
        axpy_f32(&mut c, &b, -2.0);
        for j in 0..len {
            assert!((c[j] - (1.0 - 2.0 * b[j])).abs() < 1e-6);
        }
    }
}

#[test]
fn test_dot_tail_lengths() {
    for len in 0..21 {
        let a = ramp(len, 0.3);
        let b = ramp(len, 0.7);
        let expected: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        assert!((dot_f32(&a, &b) - expected).abs() < 1e-5, "len {len}");
    }
}
