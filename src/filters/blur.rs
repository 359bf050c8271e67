//! Gaussian smoothing with a zero-padded border.
//!
//! Samples outside the field count as 0 (no clamping or reflection), so
//! pixels near the border get darker as the kernel grows. Both forms below
//! follow that policy:
//! - [`convolve_reference`] bounds-checks every tap
//! - [`convolve`] pads once, then runs row-parallel with 4-wide lanes
//!
//! For inputs in [0, 255] the two agree within 1e-6 per pixel.

use rayon::prelude::*;

use super::core::{gaussian_kernel, pad, Kernel};
use super::lanes::{self, LANES};
use crate::error::Result;
use crate::field::Field;

/// Smooth a field with a `kernel_size x kernel_size` Gaussian - optimized.
pub fn smooth(field: &Field, kernel_size: usize, sigma: f64) -> Result<Field> {
    let kernel = gaussian_kernel(kernel_size, sigma)?;
    convolve(field, &kernel)
}

/// Smooth a field with a `kernel_size x kernel_size` Gaussian - reference.
pub fn smooth_reference(field: &Field, kernel_size: usize, sigma: f64) -> Result<Field> {
    let kernel = gaussian_kernel(kernel_size, sigma)?;
    convolve_reference(field, &kernel)
}

/// Zero-padded 2D convolution, one pixel and one tap at a time.
pub fn convolve_reference(field: &Field, kernel: &Kernel) -> Result<Field> {
    let (width, height) = field.dims();
    let half = kernel.radius() as isize;
    let input = field.view();
    let mut output = Field::zeros(width, height);

    let out = output.as_mut_slice();
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f64;
            for ky in -half..=half {
                for kx in -half..=half {
                    let sy = y as isize + ky;
                    let sx = x as isize + kx;
                    let pixel = if sy < 0 || sy >= height as isize || sx < 0 || sx >= width as isize {
                        0.0
                    } else {
                        input[[sy as usize, sx as usize]]
                    };
                    sum += pixel * kernel.weight((ky + half) as usize, (kx + half) as usize);
                }
            }
            out[y * width + x] = sum;
        }
    }

    Ok(output)
}

/// Zero-padded 2D convolution - row-parallel, lane-vectorized.
///
/// The input is padded by the kernel radius so that every tap is a plain
/// slice read. Each output row is owned by one rayon task; within a row,
/// `LANES` adjacent outputs accumulate together and the remaining
/// `width % LANES` outputs use the scalar loop.
pub fn convolve(field: &Field, kernel: &Kernel) -> Result<Field> {
    let (width, height) = field.dims();
    let size = kernel.size();
    let padded = pad(field, kernel.radius(), 0.0)?;
    let padded_width = padded.width();
    let src = padded.as_slice();
    let aligned = lanes::aligned_len(width);

    let mut data = vec![0.0; width * height];
    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let mut x = 0;
            while x < aligned {
                let mut acc = lanes::splat(0.0);
                for ky in 0..size {
                    let base = (y + ky) * padded_width + x;
                    for kx in 0..size {
                        let pixels = lanes::load(&src[base + kx..]);
                        acc = pixels.mul_add(lanes::splat(kernel.weight(ky, kx)), acc);
                    }
                }
                lanes::store(acc, &mut row[x..]);
                x += LANES;
            }

            for x in aligned..width {
                let mut sum = 0.0f64;
                for ky in 0..size {
                    let base = (y + ky) * padded_width + x;
                    for kx in 0..size {
                        sum += src[base + kx] * kernel.weight(ky, kx);
                    }
                }
                row[x] = sum;
            }
        });

    Ok(Field::from_parts(width, height, data))
}
