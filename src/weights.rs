//! Precomputed Gaussian weighting of the descriptor sample window.

use ndarray::Array2;

/// Offset of lattice index `i` from the window center, symmetric about zero
/// for both even and odd widths. For an even width the offsets are
/// half-integers (no sample sits on the center), for an odd width the middle
/// sample lands exactly on it.
pub(crate) fn sample_radius(sample_width: usize) -> f32 {
    (sample_width / 2) as f32 - (1 - sample_width % 2) as f32 / 2.0
}

/// Isotropic 2D Gaussian over the `sample_width` x `sample_width` lattice,
/// divided by its maximum so the peak equals 1.
///
/// Row/column `i` is evaluated at offset `i - sample_radius(sample_width)`.
/// Pure function of its inputs; computed once at configuration time.
pub(crate) fn gaussian_weight_table(sigma: f32, sample_width: usize) -> Array2<f32> {
    let radius = sample_radius(sample_width);
    let inv_two_sigma_sq = 1.0 / (2.0 * sigma * sigma);
    let mut table = Array2::from_shape_fn((sample_width, sample_width), |(row, col)| {
        let dy = row as f32 - radius;
        let dx = col as f32 - radius;
        (-(dx * dx + dy * dy) * inv_two_sigma_sq).exp()
    });
    let max = table.iter().copied().fold(f32::MIN, f32::max);
    table.mapv_inplace(|v| v / max);
    table
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn radius_is_symmetric_for_both_parities() {
        // Offsets i - radius must cover [-radius, radius] exactly.
        assert_abs_diff_eq!(sample_radius(16), 7.5);
        assert_abs_diff_eq!(sample_radius(17), 8.0);
        assert_abs_diff_eq!(sample_radius(1), 0.0);
    }

    #[test]
    fn even_table_peaks_at_one_in_the_four_center_cells() {
        let table = gaussian_weight_table(8.0, 16);
        assert_eq!(table.dim(), (16, 16));
        for cell in [(7, 7), (7, 8), (8, 7), (8, 8)] {
            assert_abs_diff_eq!(table[cell], 1.0, epsilon = 1e-6);
        }
        assert!(table.iter().all(|&v| v > 0.0 && v <= 1.0));
    }

    #[test]
    fn odd_table_peaks_at_the_center_sample() {
        let table = gaussian_weight_table(4.0, 9);
        assert_abs_diff_eq!(table[(4, 4)], 1.0, epsilon = 1e-6);
        assert!(table[(0, 0)] < table[(4, 4)]);
    }

    #[test]
    fn table_is_symmetric_under_reflection() {
        let table = gaussian_weight_table(8.0, 16);
        for row in 0..16 {
            for col in 0..16 {
                let reflected = table[(15 - row, 15 - col)];
                assert_abs_diff_eq!(table[(row, col)], reflected, epsilon = 1e-6);
                let transposed = table[(col, row)];
                assert_abs_diff_eq!(table[(row, col)], transposed, epsilon = 1e-6);
            }
        }
    }
}
