//! Core utilities shared by the stencil stages:
//! - Border padding (constant halo around a field)
//! - Gaussian kernel generation

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::error::{check_kernel_size, EdgeError, Result};
use crate::field::{checked_area, Field};

// ============================================================================
// Border Padding
// ============================================================================

/// Extent of `field` after a `radius` halo, or `InvalidParameter` when the
/// padded buffer could not be allocated.
fn padded_dims(field: &Field, radius: usize) -> Result<(usize, usize)> {
    let (width, height) = field.dims();
    let dims = radius.checked_mul(2).and_then(|halo| {
        let padded_width = width.checked_add(halo)?;
        let padded_height = height.checked_add(halo)?;
        checked_area(padded_width, padded_height).map(|_| (padded_width, padded_height))
    });
    dims.ok_or_else(|| EdgeError::InvalidParameter {
        name: "radius",
        reason: format!("a {radius}-sample halo around a {width}x{height} field does not fit in memory"),
    })
}

/// Surround a field with a halo of `radius` samples set to `fill`.
///
/// The output is `(width + 2 * radius) x (height + 2 * radius)` and its inner
/// region equals `field` exactly. Rows of the output are written in parallel;
/// each worker owns one output row and only reads `field`.
pub fn pad(field: &Field, radius: usize, fill: f64) -> Result<Field> {
    let (width, height) = field.dims();
    let (padded_width, padded_height) = padded_dims(field, radius)?;

    let mut data = vec![0.0; padded_width * padded_height];
    data.par_chunks_mut(padded_width)
        .enumerate()
        .for_each(|(py, row)| {
            if py < radius || py >= height + radius {
                row.fill(fill);
                return;
            }
            row[..radius].fill(fill);
            row[radius..radius + width].copy_from_slice(field.row(py - radius));
            row[radius + width..].fill(fill);
        });

    Ok(Field::from_parts(padded_width, padded_height, data))
}

/// Single-threaded padding, sample by sample. Oracle for [`pad`].
pub fn pad_reference(field: &Field, radius: usize, fill: f64) -> Result<Field> {
    let (width, height) = field.dims();
    let (padded_width, padded_height) = padded_dims(field, radius)?;
    let source = field.view();

    let mut result = Array2::<f64>::from_elem((padded_height, padded_width), fill);
    for y in 0..height {
        for x in 0..width {
            result[[y + radius, x + radius]] = source[[y, x]];
        }
    }

    Ok(Field::from_parts(padded_width, padded_height, result.into_raw_vec_and_offset().0))
}

// ============================================================================
// Gaussian Kernel
// ============================================================================

/// Square smoothing kernel of odd side length whose weights sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Array2<f64>,
}

impl Kernel {
    /// Side length (always odd).
    pub fn size(&self) -> usize {
        self.weights.nrows()
    }

    /// Half the side length, rounded down.
    pub fn radius(&self) -> usize {
        self.size() / 2
    }

    pub fn weights(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    /// Weight at kernel row `ky`, column `kx`.
    #[inline]
    pub fn weight(&self, ky: usize, kx: usize) -> f64 {
        self.weights[[ky, kx]]
    }

    pub fn sum(&self) -> f64 {
        self.weights.sum()
    }
}

/// Generate a normalized 2D Gaussian kernel.
///
/// Each cell holds the isotropic Gaussian density at its offset from the
/// center; the matrix is then divided by its sum.
///
/// # Arguments
/// * `size` - Side length, odd and positive
/// * `sigma` - Standard deviation, finite and > 0
///
/// # Returns
/// `size x size` kernel, or `InvalidParameter` on a bad argument
pub fn gaussian_kernel(size: usize, sigma: f64) -> Result<Kernel> {
    check_kernel_size(size)?;
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(EdgeError::InvalidParameter {
            name: "sigma",
            reason: format!("must be finite and > 0, got {sigma}"),
        });
    }

    let half = (size / 2) as f64;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let norm = std::f64::consts::PI * two_sigma_sq;

    let mut weights = Array2::<f64>::from_shape_fn((size, size), |(ky, kx)| {
        let dy = ky as f64 - half;
        let dx = kx as f64 - half;
        (-(dx * dx + dy * dy) / two_sigma_sq).exp() / norm
    });

    let sum = weights.sum();
    weights.mapv_inplace(|w| w / sum);

    Ok(Kernel { weights })
}
