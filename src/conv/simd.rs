//! SIMD micro-kernels with NEON acceleration and scalar fallbacks.

// ── FP32 AXPY: c[..] += a_val * b[..] ──

#[cfg(all(target_arch = "aarch64", feature = "simd"))]
pub fn axpy_f32(c: &mut [f32], b: &[f32], a_val: f32) {
    use core::arch::aarch64::*;
    let len = c.len().min(b.len());
    let mut j = 0usize;
    unsafe {
        let a_vec = vdupq_n_f32(a_val);
        while j + 4 <= len {
            let b_vec = vld1q_f32(b.as_ptr().add(j));
            let c_vec = vld1q_f32(c.as_ptr().add(j));
            let r = vfmaq_f32(c_vec, a_vec, b_vec);
            vst1q_f32(c.as_mut_ptr().add(j), r);
            j += 4;
        }
    }
    // scalar tail
    while j < len {
        c[j] += a_val * b[j];
        j += 1;
    }
}

#[cfg(not(all(target_arch = "aarch64", feature = "simd")))]
pub fn axpy_f32(c: &mut [f32], b: &[f32], a_val: f32) {
    for (cv, bv) in c.iter_mut().zip(b.iter()) {
        *cv += a_val * bv;
    }
}

// ── FP32 dot product: sum(a[..] * b[..]) ──
//
// The NEON path uses two vector accumulators, so its result differs from the
// sequential scalar sum in summation order only.

#[cfg(all(target_arch = "aarch64", feature = "simd"))]
pub fn dot_f32(a: &[f32], b: &[f32]) -> f32 {
    use core::arch::aarch64::*;
    let len = a.len().min(b.len());
    let mut j = 0usize;
    unsafe {
        let mut acc0 = vdupq_n_f32(0.0);
        let mut acc1 = vdupq_n_f32(0.0);
        while j + 8 <= len {
            let a0 = vld1q_f32(a.as_ptr().add(j));
            let b0 = vld1q_f32(b.as_ptr().add(j));
            let a1 = vld1q_f32(a.as_ptr().add(j + 4));
            let b1 = vld1q_f32(b.as_ptr().add(j + 4));
            acc0 = vfmaq_f32(acc0, a0, b0);
            acc1 = vfmaq_f32(acc1, a1, b1);
            j += 8;
        }
        let mut sum = vaddvq_f32(vaddq_f32(acc0, acc1));
        // scalar tail
        while j < len {
            sum += a[j] * b[j];
            j += 1;
        }
        sum
    }
}

#[cfg(not(all(target_arch = "aarch64", feature = "simd")))]
pub fn dot_f32(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        sum += x * y;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axpy_accumulates() {
        let mut c = vec![1.0f32; 7];
        let b: Vec<f32> = (0..7).map(|i| i as f32).collect();
        axpy_f32(&mut c, &b, 2.0);
        for (i, v) in c.iter().enumerate() {
            assert_eq!(*v, 1.0 + 2.0 * i as f32);
        }
    }

    #[test]
    fn dot_matches_sequential() {
        let a: Vec<f32> = (0..13).map(|i| (i as f32) * 0.5).collect();
        let b: Vec<f32> = (0..13).map(|i| 1.0 - (i as f32) * 0.1).collect();
        let expected: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        assert!((dot_f32(&a, &b) - expected).abs() < 1e-4);
        assert_eq!(dot_f32(&[], &[]), 0.0);
    }
}
