//! fastcanny
//!
//! Canny-style edge detection on 2D scalar fields, with Python bindings via
//! PyO3 and WASM bindings for JavaScript.
//!
//! ## Field Format
//! A [`Field`] is a row-major `width x height` grid of `f64` samples. Its
//! ndarray view has shape `(height, width)`. Pipeline input samples lie in
//! `[0, 255]`; the edge map holds [`edge_value`]`(high)` on edges (at least
//! [`EDGE_VALUE`]) and 0 elsewhere.
//!
//! ## Pipeline
//! 1. Gaussian smoothing ([`filters::blur`])
//! 2. Sobel gradient ([`filters::gradient`])
//! 3. Non-maximum suppression ([`filters::suppression`])
//! 4. Double threshold ([`filters::threshold`])
//! 5. Hysteresis linking ([`linking`])
//!
//! [`detect_edges`] runs all five; each stage is also public on its own.

pub mod error;
pub mod field;
pub mod filters;
pub mod linking;
pub mod pipeline;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{EdgeError, Result};
pub use field::Field;
pub use filters::core::{gaussian_kernel, pad, pad_reference, Kernel};
pub use filters::blur::{convolve, convolve_reference, smooth, smooth_reference};
pub use filters::gradient::{gradient, gradient_reference, GradientPair};
pub use filters::suppression::{suppress, suppress_reference};
pub use filters::threshold::{classify, classify_reference};
pub use linking::{
    edge_value, link_edges, link_edges_reference, link_edges_with, link_labels, EdgeLinker,
    FrontierOrder, Label, LabelMap, QueueLinker, RelaxationLinker, EDGE_VALUE,
};
pub use pipeline::{detect_edges, CannyConfig, EdgeDetector, Execution, LinkStrategy};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::EdgeError;
    use crate::field::Field;

    impl From<EdgeError> for PyErr {
        fn from(err: EdgeError) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    fn to_field(array: &PyReadonlyArray2<'_, f64>) -> PyResult<Field> {
        Ok(Field::from_array(array.as_array())?)
    }

    fn to_numpy<'py>(py: Python<'py>, field: Field) -> Bound<'py, PyArray2<f64>> {
        field.into_array().into_pyarray(py)
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Detect edges in a 2D float64 array with samples in [0, 255].
    ///
    /// Returns an array of the same shape with max(255.0, high) on edges,
    /// 0.0 elsewhere.
    #[pyfunction]
    #[pyo3(signature = (image, low=100.0, high=200.0, kernel_size=3, sigma=0.5))]
    pub fn detect_edges<'py>(
        py: Python<'py>,
        image: PyReadonlyArray2<'py, f64>,
        low: f64,
        high: f64,
        kernel_size: usize,
        sigma: f64,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let field = to_field(&image)?;
        let edges = py.allow_threads(|| crate::detect_edges(&field, low, high, kernel_size, sigma))?;
        Ok(to_numpy(py, edges))
    }

    // ========================================================================
    // Stages
    // ========================================================================

    /// Normalized `size x size` Gaussian kernel.
    #[pyfunction]
    pub fn gaussian_kernel<'py>(
        py: Python<'py>,
        size: usize,
        sigma: f64,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let kernel = crate::gaussian_kernel(size, sigma)?;
        Ok(kernel.weights().to_owned().into_pyarray(py))
    }

    #[pyfunction]
    pub fn smooth<'py>(
        py: Python<'py>,
        image: PyReadonlyArray2<'py, f64>,
        kernel_size: usize,
        sigma: f64,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let field = to_field(&image)?;
        let out = py.allow_threads(|| crate::smooth(&field, kernel_size, sigma))?;
        Ok(to_numpy(py, out))
    }

    /// Sobel gradient. Returns `(magnitude, orientation)`, orientation in [0, 2*pi).
    #[pyfunction]
    pub fn gradient<'py>(
        py: Python<'py>,
        image: PyReadonlyArray2<'py, f64>,
    ) -> PyResult<(Bound<'py, PyArray2<f64>>, Bound<'py, PyArray2<f64>>)> {
        let field = to_field(&image)?;
        let pair = py.allow_threads(|| crate::gradient(&field))?;
        Ok((to_numpy(py, pair.magnitude), to_numpy(py, pair.orientation)))
    }

    #[pyfunction]
    pub fn suppress<'py>(
        py: Python<'py>,
        magnitude: PyReadonlyArray2<'py, f64>,
        orientation: PyReadonlyArray2<'py, f64>,
        kernel_size: usize,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let magnitude = to_field(&magnitude)?;
        let orientation = to_field(&orientation)?;
        let out = py.allow_threads(|| crate::suppress(&magnitude, &orientation, kernel_size))?;
        Ok(to_numpy(py, out))
    }

    #[pyfunction]
    pub fn classify<'py>(
        py: Python<'py>,
        image: PyReadonlyArray2<'py, f64>,
        low: f64,
        high: f64,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let field = to_field(&image)?;
        let out = py.allow_threads(|| crate::classify(&field, low, high))?;
        Ok(to_numpy(py, out))
    }

    /// Hysteresis linking. The input array is not modified.
    #[pyfunction]
    #[pyo3(signature = (image, low, high, relaxation=false))]
    pub fn link_edges<'py>(
        py: Python<'py>,
        image: PyReadonlyArray2<'py, f64>,
        low: f64,
        high: f64,
        relaxation: bool,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let field = to_field(&image)?;
        let out = py.allow_threads(|| {
            if relaxation {
                crate::link_edges_reference(&field, low, high)
            } else {
                crate::link_edges(&field, low, high)
            }
        })?;
        Ok(to_numpy(py, out))
    }

    #[pymodule]
    pub fn fastcanny(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Pipeline
        m.add_function(wrap_pyfunction!(detect_edges, m)?)?;

        // Stages
        m.add_function(wrap_pyfunction!(gaussian_kernel, m)?)?;
        m.add_function(wrap_pyfunction!(smooth, m)?)?;
        m.add_function(wrap_pyfunction!(gradient, m)?)?;
        m.add_function(wrap_pyfunction!(suppress, m)?)?;
        m.add_function(wrap_pyfunction!(classify, m)?)?;
        m.add_function(wrap_pyfunction!(link_edges, m)?)?;

        m.add("EDGE_VALUE", crate::EDGE_VALUE)?;
        Ok(())
    }
}
