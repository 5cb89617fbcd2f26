use std::fmt;

use crate::error::{ConvError, Result};
use crate::tensor::Shape4;

/// Output extent along one spatial axis.
///
/// `floor((src + pad_before + pad_after - (dilation * (kernel - 1) + 1)) / stride) + 1`,
/// or `None` when the dilated kernel does not fit the padded input.
pub fn output_size(
    src: usize,
    kernel: usize,
    dilation: usize,
    stride: usize,
    pad_before: usize,
    pad_after: usize,
) -> Option<usize> {
    if kernel == 0 || dilation == 0 || stride == 0 {
        return None;
    }
    let extent = dilation * (kernel - 1) + 1;
    let padded = src + pad_before + pad_after;
    padded.checked_sub(extent).map(|span| span / stride + 1)
}

/// Hyperparameters of one grouped, dilated, strided 2D convolution.
///
/// Tensor layouts:
/// - input  `[batch, src_c, src_h, src_w]`
/// - weight `[dst_c, src_c / group, kernel_y, kernel_x]`
/// - bias   `[dst_c]`
/// - output `[batch, dst_c, dst_h, dst_w]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2dParams {
    pub batch: usize,
    pub src_c: usize,
    pub src_h: usize,
    pub src_w: usize,
    pub kernel_y: usize,
    pub kernel_x: usize,
    pub dilation_y: usize,
    pub dilation_x: usize,
    pub stride_y: usize,
    pub stride_x: usize,
    pub pad_top: usize,
    pub pad_left: usize,
    pub pad_bottom: usize,
    pub pad_right: usize,
    pub group: usize,
    pub dst_c: usize,
}

impl Conv2dParams {
    /// 1x1 kernel, unit stride and dilation, no padding, one group.
    pub fn new(batch: usize, src_c: usize, src_h: usize, src_w: usize, dst_c: usize) -> Self {
        Conv2dParams {
            batch,
            src_c,
            src_h,
            src_w,
            kernel_y: 1,
            kernel_x: 1,
            dilation_y: 1,
            dilation_x: 1,
            stride_y: 1,
            stride_x: 1,
            pad_top: 0,
            pad_left: 0,
            pad_bottom: 0,
            pad_right: 0,
            group: 1,
            dst_c,
        }
    }

    pub fn kernel(mut self, kernel_y: usize, kernel_x: usize) -> Self {
        self.kernel_y = kernel_y;
        self.kernel_x = kernel_x;
        self
    }

    pub fn dilation(mut self, dilation_y: usize, dilation_x: usize) -> Self {
        self.dilation_y = dilation_y;
        self.dilation_x = dilation_x;
        self
    }

    pub fn stride(mut self, stride_y: usize, stride_x: usize) -> Self {
        self.stride_y = stride_y;
        self.stride_x = stride_x;
        self
    }

    /// Padding in `(top, left, bottom, right)` order.
    pub fn padding(mut self, top: usize, left: usize, bottom: usize, right: usize) -> Self {
        self.pad_top = top;
        self.pad_left = left;
        self.pad_bottom = bottom;
        self.pad_right = right;
        self
    }

    pub fn pad_all(self, pad: usize) -> Self {
        self.padding(pad, pad, pad, pad)
    }

    pub fn group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    /// Output height. Panics on geometry that `validate` would reject.
    pub fn dst_h(&self) -> usize {
        output_size(
            self.src_h,
            self.kernel_y,
            self.dilation_y,
            self.stride_y,
            self.pad_top,
            self.pad_bottom,
        )
        .expect("kernel does not fit padded input height")
    }

    /// Output width. Panics on geometry that `validate` would reject.
    pub fn dst_w(&self) -> usize {
        output_size(
            self.src_w,
            self.kernel_x,
            self.dilation_x,
            self.stride_x,
            self.pad_left,
            self.pad_right,
        )
        .expect("kernel does not fit padded input width")
    }

    pub fn src_c_per_group(&self) -> usize {
        self.src_c / self.group
    }

    pub fn dst_c_per_group(&self) -> usize {
        self.dst_c / self.group
    }

    /// Length of one flattened kernel, and of one patch vector:
    /// `src_c / group * kernel_y * kernel_x`, ordered `(sc, ky, kx)`.
    pub fn patch_len(&self) -> usize {
        self.src_c_per_group() * self.kernel_y * self.kernel_x
    }

    pub fn src_shape(&self) -> Shape4 {
        Shape4::new(self.batch, self.src_c, self.src_h, self.src_w)
    }

    pub fn dst_shape(&self) -> Shape4 {
        Shape4::new(self.batch, self.dst_c, self.dst_h(), self.dst_w())
    }

    /// `[dst_c, src_c / group, kernel_y, kernel_x]`.
    pub fn weight_shape(&self) -> Shape4 {
        Shape4::new(self.dst_c, self.src_c_per_group(), self.kernel_y, self.kernel_x)
    }

    /// `[1, dst_c, 1, 1]`.
    pub fn bias_shape(&self) -> Shape4 {
        Shape4::new(1, self.dst_c, 1, 1)
    }

    pub fn src_len(&self) -> usize {
        self.src_shape().len()
    }

    pub fn weight_len(&self) -> usize {
        self.dst_c * self.patch_len()
    }

    pub fn bias_len(&self) -> usize {
        self.dst_c
    }

    pub fn dst_len(&self) -> usize {
        self.dst_shape().len()
    }

    /// Check the preconditions every engine silently assumes.
    pub fn validate(&self) -> Result<()> {
        let nonzero = [
            ("batch", self.batch),
            ("src_c", self.src_c),
            ("src_h", self.src_h),
            ("src_w", self.src_w),
            ("kernel_y", self.kernel_y),
            ("kernel_x", self.kernel_x),
            ("dilation_y", self.dilation_y),
            ("dilation_x", self.dilation_x),
            ("stride_y", self.stride_y),
            ("stride_x", self.stride_x),
            ("group", self.group),
            ("dst_c", self.dst_c),
        ];
        if let Some((name, _)) = nonzero.iter().find(|(_, v)| *v == 0) {
            return Err(ConvError::InvalidParams(format!("{name} must be non-zero")));
        }
        if self.src_c % self.group != 0 || self.dst_c % self.group != 0 {
            return Err(ConvError::InvalidParams(format!(
                "channels {} -> {} not divisible by group {}",
                self.src_c, self.dst_c, self.group
            )));
        }
        let dst_h = output_size(
            self.src_h,
            self.kernel_y,
            self.dilation_y,
            self.stride_y,
            self.pad_top,
            self.pad_bottom,
        );
        let dst_w = output_size(
            self.src_w,
            self.kernel_x,
            self.dilation_x,
            self.stride_x,
            self.pad_left,
            self.pad_right,
        );
        if dst_h.is_none() || dst_w.is_none() {
            return Err(ConvError::InvalidParams(format!(
                "dilated {}x{} kernel does not fit padded {}x{} input",
                self.kernel_y, self.kernel_x, self.src_h, self.src_w
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Conv2dParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}x{}x{}x{} k{}x{} d{}x{} s{}x{} p({},{},{},{}) g{}",
            self.src_shape(),
            self.batch,
            self.dst_c,
            self.dst_h(),
            self.dst_w(),
            self.kernel_y,
            self.kernel_x,
            self.dilation_y,
            self.dilation_x,
            self.stride_y,
            self.stride_x,
            self.pad_top,
            self.pad_left,
            self.pad_bottom,
            self.pad_right,
            self.group,
        )
    }
}
