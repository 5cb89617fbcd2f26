use std::fmt;

use rand::Rng;

use super::ops::random_vec;

/// Extents of a dense NCHW buffer.
///
/// Carries no data; indices are computed from row-major strides so that
/// `[n][c][h][w]` maps to `((n * c_len + c) * h_len + h) * w_len + w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape4 {
    pub n: usize,
    pub c: usize,
    pub h: usize,
    pub w: usize,
}

impl Shape4 {
    pub const fn new(n: usize, c: usize, h: usize, w: usize) -> Self {
        Shape4 { n, c, h, w }
    }

    /// Total number of elements.
    pub const fn len(&self) -> usize {
        self.n * self.c * self.h * self.w
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements in one `[h, w]` plane.
    pub const fn plane(&self) -> usize {
        self.h * self.w
    }

    /// Elements in one `[c, h, w]` item of the batch.
    pub const fn item(&self) -> usize {
        self.c * self.h * self.w
    }

    /// Flat offset of `[n][c][h][w]`.
    #[inline]
    pub const fn offset(&self, n: usize, c: usize, h: usize, w: usize) -> usize {
        ((n * self.c + c) * self.h + h) * self.w + w
    }
}

impl fmt::Display for Shape4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}x{}", self.n, self.c, self.h, self.w)
    }
}

/// A 4D floating-point tensor owning contiguous NCHW storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape4,
    data: Vec<f32>,
}

impl Tensor {
    pub fn new(n: usize, c: usize, h: usize, w: usize) -> Self {
        Tensor::zeros(Shape4::new(n, c, h, w))
    }

    pub fn zeros(shape: Shape4) -> Self {
        Tensor {
            shape,
            data: vec![0.0; shape.len()],
        }
    }

    /// Tensor filled with uniform values in `[0, 1)` drawn from `rng`.
    pub fn random<R: Rng + ?Sized>(shape: Shape4, rng: &mut R) -> Self {
        Tensor {
            shape,
            data: random_vec(shape.len(), rng),
        }
    }

    pub fn shape(&self) -> Shape4 {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, n: usize, c: usize, h: usize, w: usize) -> f32 {
        self.data[self.shape.offset(n, c, h, w)]
    }

    pub fn set(&mut self, n: usize, c: usize, h: usize, w: usize, val: f32) {
        let idx = self.shape.offset(n, c, h, w);
        self.data[idx] = val;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.shape.fmt(f)
    }
}
