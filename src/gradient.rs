//! Read-only access to the derivative image pair the descriptor samples from.
//!
//! The descriptor never owns pixel data. It reads x/y spatial derivatives
//! through [`GradientImage`], a single capability interface implemented for
//! `ndarray` matrices/views and `image` float buffers, so callers can feed it
//! whatever representation their pyramid already uses.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use ndarray::{Array2, ArrayView2};
use nshare::IntoNdarray2;

use crate::Error;

/// `image` buffer type accepted as a gradient source.
pub type LumaFImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Point-sampled scalar field, one of the two spatial derivatives of an image.
///
/// Implementations only need cheap random access. `sample` may assume the
/// coordinate passed the `in_bounds` check; the descriptor core always checks
/// first and silently skips out-of-bounds samples.
pub trait GradientImage {
    /// Field size as `(width, height)` in pixels.
    ///
    /// Deliberately not named `dimensions`: `ImageBuffer` has an inherent
    /// method of that name returning `(u32, u32)`, which would shadow the
    /// trait method under method syntax.
    fn extent(&self) -> (usize, usize);

    /// Derivative value at pixel `(x, y)`. Must only be called in bounds.
    fn sample(&self, x: usize, y: usize) -> f32;

    fn in_bounds(&self, x: i64, y: i64) -> bool {
        let (width, height) = self.extent();
        x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height
    }
}

impl GradientImage for ArrayView2<'_, f32> {
    fn extent(&self) -> (usize, usize) {
        (self.ncols(), self.nrows())
    }

    fn sample(&self, x: usize, y: usize) -> f32 {
        self[(y, x)]
    }
}

impl GradientImage for Array2<f32> {
    fn extent(&self) -> (usize, usize) {
        (self.ncols(), self.nrows())
    }

    fn sample(&self, x: usize, y: usize) -> f32 {
        self[(y, x)]
    }
}

impl GradientImage for LumaFImage {
    fn extent(&self) -> (usize, usize) {
        (self.width() as usize, self.height() as usize)
    }

    fn sample(&self, x: usize, y: usize) -> f32 {
        self.get_pixel(x as u32, y as u32).0[0]
    }
}

/// Borrowed x/y derivative pair with a validated common shape.
///
/// Construct one per image (or per scale-space level) and pass it to every
/// [`process`](crate::SiftDescriptor::process) call on that image. Holding the
/// pair by shared reference keeps the descriptor free of hidden state: nothing
/// is bound to the [`SiftDescriptor`](crate::SiftDescriptor) instance itself.
#[derive(Debug)]
pub struct GradientPair<'a, I: GradientImage> {
    deriv_x: &'a I,
    deriv_y: &'a I,
}

// Not derived: the pair only holds references, so it is copyable no matter
// what `I` is.
impl<I: GradientImage> Clone for GradientPair<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I: GradientImage> Copy for GradientPair<'_, I> {}

impl<'a, I: GradientImage> GradientPair<'a, I> {
    /// Wraps the two derivative fields, checking that their shapes agree.
    pub fn new(deriv_x: &'a I, deriv_y: &'a I) -> Result<Self, Error> {
        let shape_x = deriv_x.extent();
        let shape_y = deriv_y.extent();
        if shape_x != shape_y {
            return Err(Error::DerivativeShapeMismatch { shape_x, shape_y });
        }
        Ok(Self { deriv_x, deriv_y })
    }

    pub fn deriv_x(&self) -> &I {
        self.deriv_x
    }

    pub fn deriv_y(&self) -> &I {
        self.deriv_y
    }

    /// Common `(width, height)` of both fields.
    pub fn extent(&self) -> (usize, usize) {
        self.deriv_x.extent()
    }

    pub(crate) fn in_bounds(&self, x: i64, y: i64) -> bool {
        self.deriv_x.in_bounds(x, y)
    }

    pub(crate) fn sample(&self, x: usize, y: usize) -> (f32, f32) {
        (self.deriv_x.sample(x, y), self.deriv_y.sample(x, y))
    }
}

/// Sobel x/y derivatives of an 8-bit grayscale image.
///
/// Convenience for callers that don't already carry derivative images around;
/// any derivative filter works as descriptor input, this is just the one the
/// usual detection pipelines use.
pub fn sobel_gradients(img: &GrayImage) -> (Array2<f32>, Array2<f32>) {
    let dx = horizontal_sobel(img).into_ndarray2().mapv(f32::from);
    let dy = vertical_sobel(img).into_ndarray2().mapv(f32::from);
    (dx, dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_check_matches_extent() {
        let field = Array2::<f32>::zeros((4, 6));
        assert_eq!(field.extent(), (6, 4));
        assert!(field.in_bounds(0, 0));
        assert!(field.in_bounds(5, 3));
        assert!(!field.in_bounds(6, 3));
        assert!(!field.in_bounds(5, 4));
        assert!(!field.in_bounds(-1, 0));
        assert!(!field.in_bounds(0, -1));
    }

    #[test]
    fn pair_rejects_mismatched_shapes() {
        let a = Array2::<f32>::zeros((4, 4));
        let b = Array2::<f32>::zeros((4, 5));
        match GradientPair::new(&a, &b) {
            Err(Error::DerivativeShapeMismatch { shape_x, shape_y }) => {
                assert_eq!(shape_x, (4, 4));
                assert_eq!(shape_y, (5, 4));
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn image_buffer_samples_like_ndarray() {
        let img = LumaFImage::from_fn(3, 2, |x, y| Luma([(y * 3 + x) as f32]));
        let arr = Array2::from_shape_fn((2, 3), |(y, x)| (y * 3 + x) as f32);
        // Method syntax must reach the trait, not an inherent `(u32, u32)`
        // accessor on the buffer.
        let extent: (usize, usize) = img.extent();
        assert_eq!(extent, arr.extent());
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(img.sample(x, y), arr.sample(x, y));
            }
        }
    }

    #[test]
    fn sobel_gradients_pick_up_a_vertical_edge() {
        // Dark left half, bright right half: strong dx at the seam, zero dy.
        let img = GrayImage::from_fn(8, 8, |x, _| if x < 4 { Luma([0]) } else { Luma([200]) });
        let (dx, dy) = sobel_gradients(&img);
        assert_eq!(dx.dim(), (8, 8));
        assert!(dx[(4, 4)] > 0.0);
        assert_eq!(dy[(4, 4)], 0.0);
    }
}
