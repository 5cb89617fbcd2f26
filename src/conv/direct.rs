//! Direct sliding-window convolution (reference implementation).
//!
//! Every output sample accumulates its receptive field straight from the
//! source tensor; out-of-bounds taps are skipped, which is the same as
//! reading implicit zero padding.

use rayon::prelude::*;
use tracing::debug;

use super::Conv2dParams;

/// One output channel plane of one group.
///
/// `src` holds the group's `src_c / group` input planes, `weight` the channel's
/// flattened `(sc, ky, kx)` kernel, `out` its `dst_h * dst_w` plane.
fn conv_channel(src: &[f32], weight: &[f32], bias: f32, p: &Conv2dParams, out: &mut [f32]) {
    let dst_w = p.dst_w();
    let src_plane = p.src_h * p.src_w;
    let kernel_area = p.kernel_y * p.kernel_x;

    for (dy, out_row) in out.chunks_exact_mut(dst_w).enumerate() {
        for (dx, out_val) in out_row.iter_mut().enumerate() {
            let mut sum = 0.0f32;
            for sc in 0..p.src_c_per_group() {
                let src_c = &src[sc * src_plane..(sc + 1) * src_plane];
                let weight_c = &weight[sc * kernel_area..(sc + 1) * kernel_area];
                for ky in 0..p.kernel_y {
                    let sy = (dy * p.stride_y + ky * p.dilation_y) as isize - p.pad_top as isize;
                    if sy < 0 || sy >= p.src_h as isize {
                        continue;
                    }
                    let src_row = &src_c[sy as usize * p.src_w..(sy as usize + 1) * p.src_w];
                    let weight_row = &weight_c[ky * p.kernel_x..(ky + 1) * p.kernel_x];
                    for (kx, w) in weight_row.iter().enumerate() {
                        let sx =
                            (dx * p.stride_x + kx * p.dilation_x) as isize - p.pad_left as isize;
                        if sx >= 0 && sx < p.src_w as isize {
                            sum += src_row[sx as usize] * w;
                        }
                    }
                }
            }
            *out_val = sum + bias;
        }
    }
}

/// Direct convolution over NCHW buffers.
///
/// With many small groups (`group > dst_c / group`, e.g. depthwise) work is split
/// across groups; otherwise across the output channels of each group. Either way
/// every parallel unit owns a disjoint block of `output`.
pub fn conv2d_direct(
    input: &[f32],
    params: &Conv2dParams,
    weights: &[f32],
    bias: &[f32],
    output: &mut [f32],
) {
    let p = params;
    let dst_plane = p.dst_h() * p.dst_w();
    let src_c_pg = p.src_c_per_group();
    let dst_c_pg = p.dst_c_per_group();
    let src_item = p.src_c * p.src_h * p.src_w;
    let src_group = src_c_pg * p.src_h * p.src_w;
    let dst_item = p.dst_c * dst_plane;
    let dst_group = dst_c_pg * dst_plane;
    let patch_len = p.patch_len();

    debug!(params = %p, by_group = p.group > dst_c_pg, "direct conv2d");

    for n in 0..p.batch {
        let src_n = &input[n * src_item..(n + 1) * src_item];
        let dst_n = &mut output[n * dst_item..(n + 1) * dst_item];

        if p.group > dst_c_pg {
            dst_n
                .par_chunks_mut(dst_group)
                .enumerate()
                .for_each(|(g, dst_g)| {
                    let src_g = &src_n[g * src_group..(g + 1) * src_group];
                    for (dc, out) in dst_g.chunks_exact_mut(dst_plane).enumerate() {
                        let oc = g * dst_c_pg + dc;
                        let w = &weights[oc * patch_len..(oc + 1) * patch_len];
                        conv_channel(src_g, w, bias[oc], p, out);
                    }
                });
        } else {
            for (g, dst_g) in dst_n.chunks_exact_mut(dst_group).enumerate() {
                let src_g = &src_n[g * src_group..(g + 1) * src_group];
                dst_g
                    .par_chunks_mut(dst_plane)
                    .enumerate()
                    .for_each(|(dc, out)| {
                        let oc = g * dst_c_pg + dc;
                        let w = &weights[oc * patch_len..(oc + 1) * patch_len];
                        conv_channel(src_g, w, bias[oc], p, out);
                    });
            }
        }
    }
}
