//! Sampling, trilinear accumulation and normalization of the raw descriptor.
//!
//! The descriptor window is a `grid_width * subregion_width` square lattice,
//! rotated by the keypoint orientation and scaled by `sigma * sigma_to_pixels`.
//! Each in-bounds lattice sample contributes a Gaussian- and magnitude-weighted
//! vote that is spread over the neighboring (row, col, orientation-bin) cells
//! with tent kernels, so a sample moving across a cell boundary never causes a
//! jump in the descriptor.

use std::f32::consts::PI as PI32;

use itertools::Itertools;
use ndarray::ArrayView2;

use crate::gradient::{GradientImage, GradientPair};
use crate::weights::sample_radius;
use crate::SiftDescriptorConfig;

pub(crate) const TWO_PI: f32 = 2.0 * PI32;

/// Maps any angle into `[0, 2π)`.
pub(crate) fn wrap_two_pi(angle: f32) -> f32 {
    let wrapped = angle % TWO_PI;
    if wrapped < 0.0 {
        wrapped + TWO_PI
    } else {
        wrapped
    }
}

/// Minimal circular distance between two angles, in `[0, π]`.
fn circular_distance(a: f32, b: f32) -> f32 {
    let dist = (a - b).abs() % TWO_PI;
    dist.min(TWO_PI - dist)
}

/// Round half up, consistently for negative inputs: `-0.5` rounds to `0`,
/// `-0.6` to `-1`.
fn round_half_up(v: f32) -> i64 {
    (v + 0.5).floor() as i64
}

/// Walks the rotated/scaled sample lattice and accumulates every in-bounds
/// sample into `descriptor`, which must be zero-filled and of length
/// `grid_width² * num_orientation_bins`. Returns how many lattice samples
/// landed inside the image.
#[allow(clippy::too_many_arguments)]
pub(crate) fn compute_raw_descriptor<I: GradientImage>(
    descriptor: &mut [f32],
    config: &SiftDescriptorConfig,
    weights: ArrayView2<f32>,
    bin_width: f32,
    gradients: GradientPair<'_, I>,
    center_x: f32,
    center_y: f32,
    sigma: f32,
    orientation: f32,
) -> usize {
    let (sin_ori, cos_ori) = orientation.sin_cos();
    let sample_width = config.grid_width * config.subregion_width;
    let radius = sample_radius(sample_width);
    let sample_to_pixels = sigma * config.sigma_to_pixels;

    let mut accumulated = 0;
    for (sample_y, sample_x) in (0..sample_width).cartesian_product(0..sample_width) {
        // Lattice offset in pixels, before rotation.
        let local_y = sample_to_pixels * (sample_y as f32 - radius);
        let local_x = sample_to_pixels * (sample_x as f32 - radius);

        let pixel_x = round_half_up(local_x * cos_ori - local_y * sin_ori + center_x);
        let pixel_y = round_half_up(local_x * sin_ori + local_y * cos_ori + center_y);
        if !gradients.in_bounds(pixel_x, pixel_y) {
            continue;
        }
        let (deriv_x, deriv_y) = gradients.sample(pixel_x as usize, pixel_y as usize);

        // Gradient direction expressed in the keypoint's own frame (rotated by
        // -orientation); the magnitude is rotation invariant and comes from
        // the raw derivatives.
        let rot_dx = cos_ori * deriv_x + sin_ori * deriv_y;
        let rot_dy = -sin_ori * deriv_x + cos_ori * deriv_y;
        let angle = wrap_two_pi(f64::from(rot_dy).atan2(f64::from(rot_dx)) as f32);
        let magnitude = (deriv_x * deriv_x + deriv_y * deriv_y).sqrt();

        let weight = weights[(sample_y, sample_x)] * magnitude;
        let sub_x = sample_x as f32 / config.subregion_width as f32;
        let sub_y = sample_y as f32 / config.subregion_width as f32;
        accumulate_trilinear(
            descriptor,
            config.grid_width,
            config.num_orientation_bins,
            bin_width,
            weight,
            sub_x,
            sub_y,
            angle,
        );
        accumulated += 1;
    }
    accumulated
}

/// Adds one weighted sample to the histogram, spread across the neighboring
/// (row, col, orientation-bin) cells with tent kernels. Axes whose tent weight
/// is non-positive are skipped entirely.
#[allow(clippy::too_many_arguments)]
fn accumulate_trilinear(
    descriptor: &mut [f32],
    grid_width: usize,
    num_bins: usize,
    bin_width: f32,
    weight: f32,
    sub_x: f32,
    sub_y: f32,
    angle: f32,
) {
    for row in 0..grid_width {
        let weight_row = 1.0 - (sub_y - row as f32).abs();
        if weight_row <= 0.0 {
            continue;
        }
        for col in 0..grid_width {
            let weight_col = 1.0 - (sub_x - col as f32).abs();
            if weight_col <= 0.0 {
                continue;
            }
            for bin in 0..num_bins {
                let weight_bin = 1.0 - circular_distance(angle, bin as f32 * bin_width) / bin_width;
                if weight_bin <= 0.0 {
                    continue;
                }
                let index = (row * grid_width + col) * num_bins + bin;
                descriptor[index] += weight * weight_row * weight_col * weight_bin;
            }
        }
    }
}

/// Two-stage normalize-clip-normalize for lighting invariance: bounds the
/// influence of any single dominant gradient while keeping the vector unit
/// length. An all-zero histogram stays all-zero.
pub(crate) fn normalize_descriptor(descriptor: &mut [f32], max_element_value: f32) {
    normalize_l2(descriptor);
    for v in descriptor.iter_mut() {
        *v = v.min(max_element_value);
    }
    normalize_l2(descriptor);
}

fn normalize_l2(descriptor: &mut [f32]) {
    let norm = descriptor.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for v in descriptor.iter_mut() {
        *v /= norm;
    }
}
