/// Timing and MAE comparison of the convolution engines.
pub mod benchmark;
