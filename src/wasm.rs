//! WebAssembly exports for fastcanny.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Fields cross
//! the boundary as flat row-major `Float64Array`s plus their dimensions.
//! Stages run single-threaded (reference execution); errors surface as
//! JavaScript exceptions carrying the error message.

use wasm_bindgen::prelude::*;

use crate::error::EdgeError;
use crate::field::Field;
use crate::pipeline::{CannyConfig, EdgeDetector, Execution, LinkStrategy};

fn to_js(err: EdgeError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Detect edges in a grayscale field.
///
/// # Arguments
/// * `data` - Flat array of samples in [0, 255] (length = width * height)
/// * `width` - Field width in pixels
/// * `height` - Field height in pixels
/// * `low` - Weak threshold
/// * `high` - Strong threshold
/// * `kernel_size` - Gaussian side length, odd
/// * `sigma` - Gaussian standard deviation
///
/// # Returns
/// Flat edge map, max(255, high) on edges and 0 elsewhere
#[wasm_bindgen]
pub fn detect_edges_wasm(
    data: &[f64],
    width: usize,
    height: usize,
    low: f64,
    high: f64,
    kernel_size: usize,
    sigma: f64,
) -> Result<Vec<f64>, JsValue> {
    let field = Field::new(width, height, data.to_vec()).map_err(to_js)?;
    let config = CannyConfig {
        low_threshold: low,
        high_threshold: high,
        kernel_size,
        sigma,
        execution: Execution::Reference,
        linker: LinkStrategy::Queue,
        threads: None,
    };
    let detector = EdgeDetector::new(config).map_err(to_js)?;
    let edges = detector.detect(&field).map_err(to_js)?;
    Ok(edges.into_vec())
}

/// Hysteresis linking on a flat magnitude field.
#[wasm_bindgen]
pub fn link_edges_wasm(
    data: &[f64],
    width: usize,
    height: usize,
    low: f64,
    high: f64,
) -> Result<Vec<f64>, JsValue> {
    let field = Field::new(width, height, data.to_vec()).map_err(to_js)?;
    let edges = crate::linking::link_edges(&field, low, high).map_err(to_js)?;
    Ok(edges.into_vec())
}
