//! Im2col + GEMM convolution.
//!
//! Unfolds every receptive field of one batch item into a column matrix, then
//! computes each group's output block as a single matrix multiply.

use rayon::prelude::*;
use tracing::debug;

use super::simd;
use super::Conv2dParams;

/// Unfold one batch item into a column matrix.
///
/// `input` is a single `[src_c, src_h, src_w]` item. Output shape:
/// rows = `src_c * kernel_y * kernel_x` ordered `(sc, ky, kx)`, cols = `dst_h * dst_w`.
/// Rows of group `g` start at `g * patch_len`, so each group's block is contiguous.
/// Taps that land in the padding are written as zero.
pub fn im2col(input: &[f32], params: &Conv2dParams, col: &mut [f32]) {
    let p = params;
    let dst_w = p.dst_w();
    let col_cols = p.dst_h() * dst_w;
    let src_plane = p.src_h * p.src_w;
    let kernel_area = p.kernel_y * p.kernel_x;

    for sc in 0..p.src_c {
        let src_c = &input[sc * src_plane..(sc + 1) * src_plane];
        for ky in 0..p.kernel_y {
            for kx in 0..p.kernel_x {
                let row = sc * kernel_area + ky * p.kernel_x + kx;
                let col_row = &mut col[row * col_cols..(row + 1) * col_cols];
                for (dy, col_line) in col_row.chunks_exact_mut(dst_w).enumerate() {
                    let sy = (dy * p.stride_y + ky * p.dilation_y) as isize - p.pad_top as isize;
                    if sy < 0 || sy >= p.src_h as isize {
                        col_line.fill(0.0);
                        continue;
                    }
                    let src_row = &src_c[sy as usize * p.src_w..(sy as usize + 1) * p.src_w];
                    for (dx, v) in col_line.iter_mut().enumerate() {
                        let sx =
                            (dx * p.stride_x + kx * p.dilation_x) as isize - p.pad_left as isize;
                        *v = if sx >= 0 && sx < p.src_w as isize {
                            src_row[sx as usize]
                        } else {
                            0.0
                        };
                    }
                }
            }
        }
    }
}

/// Matrix multiply `C = A * B`, parallel over the rows of `C`.
///
/// A: m x k, B: k x n, C: m x n, all row-major. Each row of `C` is built as a sum
/// of rows of `B` scaled by the matching scalar of `A`, so `B` and `C` are both
/// read sequentially.
pub fn gemm(a: &[f32], b: &[f32], m: usize, n: usize, k: usize, c: &mut [f32]) {
    if n == 0 {
        return;
    }
    c[..m * n]
        .par_chunks_mut(n)
        .zip(a[..m * k].par_chunks(k.max(1)))
        .for_each(|(c_row, a_row)| {
            c_row.fill(0.0);
            for (p, &a_val) in a_row.iter().enumerate().take(k) {
                simd::axpy_f32(c_row, &b[p * n..(p + 1) * n], a_val);
            }
        });
}

/// Im2col + GEMM convolution over NCHW buffers.
///
/// One scratch matrix of `src_c * kernel_y * kernel_x * dst_h * dst_w` floats is
/// allocated per call and reused for every batch item; each item's unfold
/// completes before its multiplies read the matrix.
pub fn conv2d_im2col(
    input: &[f32],
    params: &Conv2dParams,
    weights: &[f32],
    bias: &[f32],
    output: &mut [f32],
) {
    let p = params;
    let m = p.dst_c_per_group();
    let n = p.dst_h() * p.dst_w();
    let k = p.patch_len();
    let src_item = p.src_c * p.src_h * p.src_w;
    let dst_item = p.dst_c * n;

    let mut col = vec![0.0f32; p.group * k * n];
    debug!(params = %p, scratch = col.len(), "im2col conv2d");

    for b in 0..p.batch {
        let src_b = &input[b * src_item..(b + 1) * src_item];
        let dst_b = &mut output[b * dst_item..(b + 1) * dst_item];

        im2col(src_b, p, &mut col);

        for g in 0..p.group {
            gemm(
                &weights[g * m * k..(g + 1) * m * k],
                &col[g * k * n..(g + 1) * k * n],
                m,
                n,
                k,
                &mut dst_b[g * m * n..(g + 1) * m * n],
            );
        }

        for (plane, &bias_val) in dst_b.chunks_exact_mut(n).zip(bias.iter()) {
            for v in plane.iter_mut() {
                *v += bias_val;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemm_small() {
        // [1 2; 3 4] * [5 6; 7 8]
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [f32::NAN; 4];
        gemm(&a, &b, 2, 2, 2, &mut c);
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn im2col_zero_fills_padding() {
        // 1x1x2x2 input, 2x2 kernel, pad 1 -> 3x3 output, 4 rows
        let p = Conv2dParams::new(1, 1, 2, 2, 1).kernel(2, 2).pad_all(1);
        let input = [1.0, 2.0, 3.0, 4.0];
        let mut col = vec![f32::NAN; 4 * 9];
        im2col(&input, &p, &mut col);
        // (ky=0, kx=0): top-left tap reads src[dy-1][dx-1]
        assert_eq!(&col[0..9], &[0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 0.0, 3.0, 4.0]);
        // (ky=1, kx=1): bottom-right tap reads src[dy][dx]
        assert_eq!(&col[27..36], &[1.0, 2.0, 0.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0]);
    }
}
