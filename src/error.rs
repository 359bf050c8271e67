//! Error type shared by every stage of the pipeline.
//!
//! All failures are precondition violations detected before a stage does
//! any work. Nothing here is retried or silently corrected.

use thiserror::Error;

use crate::field::checked_area;

#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("invalid dimensions: {width}x{height} field with {len} samples")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("sample {value} at ({x}, {y}) is outside [0, 255]")]
    InvalidRange { x: usize, y: usize, value: f64 },

    #[error("invalid thresholds: low {low}, high {high}")]
    InvalidThresholds { low: f64, high: f64 },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, EdgeError>;

/// Check a `(low, high)` threshold pair.
pub(crate) fn check_thresholds(low: f64, high: f64) -> Result<()> {
    if !low.is_finite() || !high.is_finite() || low > high {
        return Err(EdgeError::InvalidThresholds { low, high });
    }
    Ok(())
}

/// Check that a square kernel side length is odd, non-zero and small enough
/// for its `kernel_size * kernel_size` weights to be allocated.
pub(crate) fn check_kernel_size(kernel_size: usize) -> Result<()> {
    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(EdgeError::InvalidParameter {
            name: "kernel_size",
            reason: format!("must be odd and positive, got {kernel_size}"),
        });
    }
    if checked_area(kernel_size, kernel_size).is_none() {
        return Err(EdgeError::InvalidParameter {
            name: "kernel_size",
            reason: format!("{kernel_size}x{kernel_size} weights do not fit in memory"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_reject_inverted_pair() {
        assert!(check_thresholds(50.0, 150.0).is_ok());
        assert!(check_thresholds(100.0, 100.0).is_ok());
        assert!(matches!(
            check_thresholds(150.0, 50.0),
            Err(EdgeError::InvalidThresholds { .. })
        ));
        assert!(check_thresholds(f64::NAN, 50.0).is_err());
    }

    #[test]
    fn test_kernel_size_must_be_odd() {
        assert!(check_kernel_size(1).is_ok());
        assert!(check_kernel_size(5).is_ok());
        assert!(check_kernel_size(0).is_err());
        assert!(check_kernel_size(4).is_err());
    }

    #[test]
    fn test_kernel_size_must_fit_in_memory() {
        assert!(matches!(
            check_kernel_size(usize::MAX),
            Err(EdgeError::InvalidParameter { name: "kernel_size", .. })
        ));
        assert!(check_kernel_size((1 << 32) + 1).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = EdgeError::DimensionMismatch {
            expected: (8, 4),
            actual: (4, 8),
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected (8, 4), got (4, 8)");

        let err = EdgeError::InvalidRange { x: 1, y: 2, value: 300.0 };
        assert_eq!(err.to_string(), "sample 300 at (1, 2) is outside [0, 255]");
    }
}
