//! Patch2Vec convolution.
//!
//! For each output pixel the receptive field is gathered into one small patch
//! vector, ordered `(sc, ky, kx)` exactly like a flattened kernel, and dotted
//! against every output channel of the group. No im2col matrix is stored; the
//! gather is repeated per pixel instead.

use rayon::prelude::*;
use tracing::debug;

use super::simd;
use super::Conv2dParams;

/// Gather the receptive field of output pixel `(dy, dx)` into `patch`.
///
/// `src` holds the group's `src_c / group` input planes. Slot order must match
/// the weight layout `[sc][ky][kx]`; out-of-bounds taps are stored as zero.
fn gather_patch(src: &[f32], p: &Conv2dParams, dy: usize, dx: usize, patch: &mut [f32]) {
    let src_plane = p.src_h * p.src_w;
    let sy0 = (dy * p.stride_y) as isize - p.pad_top as isize;
    let sx0 = (dx * p.stride_x) as isize - p.pad_left as isize;

    let mut slots = patch.chunks_exact_mut(p.kernel_x);
    for sc in 0..p.src_c_per_group() {
        let src_c = &src[sc * src_plane..(sc + 1) * src_plane];
        for ky in 0..p.kernel_y {
            let Some(slot) = slots.next() else {
                return;
            };
            let sy = sy0 + (ky * p.dilation_y) as isize;
            if sy < 0 || sy >= p.src_h as isize {
                slot.fill(0.0);
                continue;
            }
            let src_row = &src_c[sy as usize * p.src_w..(sy as usize + 1) * p.src_w];
            for (kx, v) in slot.iter_mut().enumerate() {
                let sx = sx0 + (kx * p.dilation_x) as isize;
                *v = if sx >= 0 && sx < p.src_w as isize {
                    src_row[sx as usize]
                } else {
                    0.0
                };
            }
        }
    }
}

/// Patch2Vec convolution over NCHW buffers.
///
/// Parallel over output rows within each group. A row's outputs are strided across
/// the group's channel planes, so each worker is handed the `dst_c / group` row
/// slices for its `dy`; no two workers share a row.
pub fn conv2d_patch2vec(
    input: &[f32],
    params: &Conv2dParams,
    weights: &[f32],
    bias: &[f32],
    output: &mut [f32],
) {
    let p = params;
    let dst_h = p.dst_h();
    let dst_w = p.dst_w();
    let dst_plane = dst_h * dst_w;
    let src_c_pg = p.src_c_per_group();
    let dst_c_pg = p.dst_c_per_group();
    let src_group = src_c_pg * p.src_h * p.src_w;
    let dst_group = dst_c_pg * dst_plane;
    let src_item = p.group * src_group;
    let dst_item = p.group * dst_group;
    let patch_len = p.patch_len();

    debug!(params = %p, patch_len, "patch2vec conv2d");

    for n in 0..p.batch {
        let src_n = &input[n * src_item..(n + 1) * src_item];
        let dst_n = &mut output[n * dst_item..(n + 1) * dst_item];

        for (g, dst_g) in dst_n.chunks_exact_mut(dst_group).enumerate() {
            let src_g = &src_n[g * src_group..(g + 1) * src_group];
            let weight_g = &weights[g * dst_c_pg * patch_len..(g + 1) * dst_c_pg * patch_len];
            let bias_g = &bias[g * dst_c_pg..(g + 1) * dst_c_pg];

            // rows[dy][dc] is output row dy of channel dc
            let mut rows: Vec<Vec<&mut [f32]>> =
                (0..dst_h).map(|_| Vec::with_capacity(dst_c_pg)).collect();
            for plane in dst_g.chunks_exact_mut(dst_plane) {
                for (dy, row) in plane.chunks_exact_mut(dst_w).enumerate() {
                    rows[dy].push(row);
                }
            }

            rows.into_par_iter().enumerate().for_each_init(
                || vec![0.0f32; patch_len],
                |patch, (dy, mut channel_rows)| {
                    for dx in 0..dst_w {
                        gather_patch(src_g, p, dy, dx, &mut patch[..]);
                        for (dc, row) in channel_rows.iter_mut().enumerate() {
                            let w = &weight_g[dc * patch_len..(dc + 1) * patch_len];
                            row[dx] = simd::dot_f32(&patch[..], w) + bias_g[dc];
                        }
                    }
                },
            );
        }
    }
}
