//! Rotation- and scale-normalized SIFT descriptor computed at a given
//! keypoint from a pair of precomputed spatial derivative images.
//!
//! The descriptor is sampled inside a square grid which is scaled by the
//! keypoint's `sigma` and rotated by its orientation. The grid is made of
//! `grid_width * grid_width` sub-regions, each `subregion_width` samples on a
//! side, and every sub-region accumulates a histogram of gradient
//! orientations. With the default 4x4 grid and 8 orientation bins this is the
//! classic 128-element SIFT vector of [1].
//!
//! This crate only computes descriptors. Keypoint detection, scale-space
//! construction and feature matching are left to the caller, which supplies
//! the x/y derivative images (any [`GradientImage`] implementation) and one
//! `(x, y, sigma, orientation)` tuple per keypoint.
//!
//! Useful resources:
//! - [1]: [Lowe 2004](https://www.cs.ubc.ca/~lowe/papers/ijcv04.pdf)
//! - [2]: [Rey-Otero 2014](https://www.ipol.im/pub/art/2014/82/article.pdf)

use log::{debug, trace};
use ndarray::Array2;
use thiserror::Error;

mod descriptor;
mod gradient;
mod weights;

pub use gradient::{sobel_gradients, GradientImage, GradientPair, LumaFImage};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A constructor parameter violated its positivity constraint. The
    /// configuration must be fixed and the descriptor reconstructed.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: &'static str },
    /// The output buffer passed to [`SiftDescriptor::process`] has the wrong
    /// length. The buffer is left untouched.
    #[error("descriptor buffer has length {found}, expected {expected}")]
    DescriptorLengthMismatch { expected: usize, found: usize },
    /// The two derivative images handed to [`GradientPair::new`] differ in
    /// shape.
    #[error("derivative images have different shapes: {shape_x:?} vs {shape_y:?}")]
    DerivativeShapeMismatch {
        shape_x: (usize, usize),
        shape_y: (usize, usize),
    },
}

/// Descriptor geometry and weighting parameters, fixed at construction.
///
/// All values must be positive. The resulting descriptor length is
/// `grid_width² * num_orientation_bins`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiftDescriptorConfig {
    /// Samples per sub-region side. Try 4.
    pub subregion_width: usize,
    /// Sub-regions per descriptor side. Try 4.
    pub grid_width: usize,
    /// Orientation histogram bins per sub-region. Try 8.
    pub num_orientation_bins: usize,
    /// Conversion from scale-space sigma to pixels; scales the sample window.
    pub sigma_to_pixels: f32,
    /// The Gaussian weighting sigma is this fraction of the sample window
    /// width. Try 0.5.
    pub weighting_sigma_fraction: f32,
    /// Clip threshold for descriptor elements, for robustness to non-affine
    /// lighting changes. Try 0.2.
    pub max_element_value: f32,
}

impl Default for SiftDescriptorConfig {
    fn default() -> Self {
        Self {
            subregion_width: 4,
            grid_width: 4,
            num_orientation_bins: 8,
            sigma_to_pixels: 1.0,
            weighting_sigma_fraction: 0.5,
            max_element_value: 0.2,
        }
    }
}

impl SiftDescriptorConfig {
    fn validate(&self) -> Result<(), Error> {
        let reason = if self.subregion_width == 0 {
            "subregion_width must be positive"
        } else if self.grid_width == 0 {
            "grid_width must be positive"
        } else if self.num_orientation_bins == 0 {
            "num_orientation_bins must be at least 1"
        } else if !(self.sigma_to_pixels > 0.0) {
            "sigma_to_pixels must be positive"
        } else if !(self.weighting_sigma_fraction > 0.0) {
            "weighting_sigma_fraction must be positive"
        } else if !(self.max_element_value > 0.0) {
            "max_element_value must be positive"
        } else {
            return Ok(());
        };
        Err(Error::InvalidConfiguration { reason })
    }
}

/// Computes SIFT descriptors for keypoints, one `process` call each.
///
/// Owns only the configuration and the precomputed Gaussian weight table;
/// both are read-only after construction, so one instance can be shared
/// across threads for concurrent `process` calls on distinct output buffers.
#[derive(Debug, Clone)]
pub struct SiftDescriptor {
    config: SiftDescriptorConfig,
    gaussian_weight: Array2<f32>,
    /// Angular width of one orientation histogram bin, `2π / bins`.
    bin_width: f32,
}

impl SiftDescriptor {
    /// Validates the configuration and precomputes the Gaussian weight table.
    pub fn new(config: SiftDescriptorConfig) -> Result<Self, Error> {
        config.validate()?;
        let sample_width = config.grid_width * config.subregion_width;
        let weight_sigma = sample_width as f32 * config.weighting_sigma_fraction;
        let gaussian_weight = weights::gaussian_weight_table(weight_sigma, sample_width);
        let bin_width = descriptor::TWO_PI / config.num_orientation_bins as f32;
        debug!(
            "configured SIFT descriptor: {}x{} sub-regions of {}x{} samples, {} orientation bins, {} elements",
            config.grid_width,
            config.grid_width,
            config.subregion_width,
            config.subregion_width,
            config.num_orientation_bins,
            config.grid_width * config.grid_width * config.num_orientation_bins,
        );
        Ok(Self {
            config,
            gaussian_weight,
            bin_width,
        })
    }

    pub fn config(&self) -> &SiftDescriptorConfig {
        &self.config
    }

    /// Number of elements in the descriptor,
    /// `grid_width² * num_orientation_bins`.
    pub fn descriptor_length(&self) -> usize {
        self.config.grid_width * self.config.grid_width * self.config.num_orientation_bins
    }

    /// Nominal pixel radius the descriptor covers at `sigma_to_pixels = 1`
    /// and `sigma = 1`. Informational, for callers sizing pyramids or crops.
    pub fn canonical_radius(&self) -> usize {
        self.config.grid_width * self.config.subregion_width / 2
    }

    /// Computes the descriptor for the keypoint at `(center_x, center_y)`
    /// with scale `sigma` (> 0) and orientation in radians (any real value),
    /// writing it into `descriptor`.
    ///
    /// `descriptor` must have exactly [`descriptor_length`] elements; element
    /// `(row * grid_width + col) * num_orientation_bins + bin` holds the
    /// orientation bin `bin` of sub-region `(row, col)`. Samples falling
    /// outside the derivative images are skipped; a keypoint whose entire
    /// window is out of bounds legitimately yields an all-zero descriptor.
    /// Otherwise the output is L2-normalized with elements clipped to
    /// `max_element_value` before the final normalization pass.
    ///
    /// [`descriptor_length`]: Self::descriptor_length
    pub fn process<I: GradientImage>(
        &self,
        gradients: GradientPair<'_, I>,
        center_x: f32,
        center_y: f32,
        sigma: f32,
        orientation: f32,
        descriptor: &mut [f32],
    ) -> Result<(), Error> {
        let expected = self.descriptor_length();
        if descriptor.len() != expected {
            return Err(Error::DescriptorLengthMismatch {
                expected,
                found: descriptor.len(),
            });
        }
        debug_assert!(sigma > 0.0, "keypoint sigma must be positive");

        descriptor.fill(0.0);
        let orientation = descriptor::wrap_two_pi(orientation);
        let accumulated = descriptor::compute_raw_descriptor(
            descriptor,
            &self.config,
            self.gaussian_weight.view(),
            self.bin_width,
            gradients,
            center_x,
            center_y,
            sigma,
            orientation,
        );
        let sample_width = self.config.grid_width * self.config.subregion_width;
        trace!(
            "keypoint ({center_x}, {center_y}): accumulated {accumulated} of {} samples",
            sample_width * sample_width
        );
        descriptor::normalize_descriptor(descriptor, self.config.max_element_value);
        Ok(())
    }
}
