mod tensor;
mod ops;

pub use tensor::{Shape4, Tensor};
pub use ops::{fill_uniform, max_abs_diff, mean_abs, mean_absolute_error, random_vec};
