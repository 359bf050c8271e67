//! Row-major 2D sample container passed between pipeline stages.
//!
//! A `Field` owns a flat `Vec<f64>` of `width * height` samples. Stages take
//! `&Field` and return a freshly allocated `Field`; none of them resizes or
//! mutates its input. Interop with `ndarray` goes through [`Field::view`],
//! [`Field::from_array`] and [`Field::into_array`], with shape
//! `(height, width)` so that `field.view()[[y, x]]` addresses column `x` of
//! row `y`.

use ndarray::{Array2, ArrayView2};

use crate::error::{EdgeError, Result};

/// `width * height` when a buffer of that many `f64` samples can exist.
pub(crate) fn checked_area(width: usize, height: usize) -> Option<usize> {
    let area = width.checked_mul(height)?;
    let bytes = area.checked_mul(std::mem::size_of::<f64>())?;
    (bytes <= isize::MAX as usize).then_some(area)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Field {
    /// Wrap a row-major sample buffer.
    ///
    /// Fails with [`EdgeError::InvalidDimensions`] when either dimension is
    /// zero or `data.len() != width * height`.
    pub fn new(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if width == 0 || height == 0 || checked_area(width, height) != Some(data.len()) {
            return Err(EdgeError::InvalidDimensions {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Field of the given shape with every sample set to `value`.
    pub fn filled(width: usize, height: usize, value: f64) -> Result<Self> {
        let len = checked_area(width, height).unwrap_or(0);
        Self::new(width, height, vec![value; len])
    }

    /// Copy a `(height, width)` array view into a new field.
    pub fn from_array(array: ArrayView2<'_, f64>) -> Result<Self> {
        let (height, width) = array.dim();
        let data = match array.as_slice() {
            Some(samples) => samples.to_vec(),
            None => array.iter().copied().collect(),
        };
        Self::new(width, height, data)
    }

    /// Convert into a `(height, width)` array without copying.
    pub fn into_array(self) -> Array2<f64> {
        Array2::from_shape_vec((self.height, self.width), self.data)
            .expect("Field length always matches its shape")
    }

    /// Borrow as a `(height, width)` array view.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        ArrayView2::from_shape((self.height, self.width), &self.data)
            .expect("Field length always matches its shape")
    }

    /// Zero field with an already validated shape.
    pub(crate) fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Build from a buffer whose length the caller has already checked.
    pub(crate) fn from_parts(width: usize, height: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self { width, height, data }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// `width * height`, never zero.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.data.len()
    }

    /// Sample at column `x`, row `y`, or `None` outside the field.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    /// Row `y` as a slice of `width` samples.
    #[inline]
    pub fn row(&self, y: usize) -> &[f64] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn same_shape(&self, other: &Field) -> bool {
        self.dims() == other.dims()
    }

    /// Fail with [`EdgeError::DimensionMismatch`] unless `other` has this shape.
    pub fn ensure_same_shape(&self, other: &Field) -> Result<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(EdgeError::DimensionMismatch {
                expected: self.dims(),
                actual: other.dims(),
            })
        }
    }

    /// Largest absolute per-sample difference between two same-shape fields.
    pub fn max_abs_diff(&self, other: &Field) -> Result<f64> {
        self.ensure_same_shape(other)?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max))
    }

    /// Number of samples equal to `value`.
    pub fn count(&self, value: f64) -> usize {
        self.data.iter().filter(|&&v| v == value).count()
    }
}
