//! Edge detection pipeline: smooth, gradient, suppress, classify, link.

use crate::error::{check_kernel_size, check_thresholds, EdgeError, Result};
use crate::field::Field;
use crate::filters::blur::{smooth, smooth_reference};
use crate::filters::gradient::{gradient, gradient_reference};
use crate::filters::suppression::{suppress, suppress_reference};
use crate::filters::threshold::{classify, classify_reference};
use crate::linking::{
    edge_value, link_labels, EdgeLinker, Label, LabelMap, QueueLinker, RelaxationLinker,
};

/// Largest sample value accepted by [`detect_edges`].
pub const MAX_SAMPLE: f64 = 255.0;

/// Which implementation of the stencil stages to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// Row-parallel, lane-vectorized stages.
    #[default]
    Optimized,
    /// Scalar, single-threaded stages.
    Reference,
}

/// Which hysteresis strategy links the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStrategy {
    #[default]
    Queue,
    Relaxation,
}

/// Edge detection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CannyConfig {
    /// Weak threshold on suppressed gradient magnitude.
    pub low_threshold: f64,
    /// Strong threshold, `>= low_threshold`.
    pub high_threshold: f64,
    /// Gaussian side length, odd.
    pub kernel_size: usize,
    /// Gaussian standard deviation, > 0.
    pub sigma: f64,
    pub execution: Execution,
    pub linker: LinkStrategy,
    /// Worker threads. `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            low_threshold: 100.0,
            high_threshold: 200.0,
            kernel_size: 3,
            sigma: 0.5,
            execution: Execution::default(),
            linker: LinkStrategy::default(),
            threads: None,
        }
    }
}

impl CannyConfig {
    pub fn validate(&self) -> Result<()> {
        check_thresholds(self.low_threshold, self.high_threshold)?;
        check_kernel_size(self.kernel_size)?;
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(EdgeError::InvalidParameter {
                name: "sigma",
                reason: format!("must be finite and > 0, got {}", self.sigma),
            });
        }
        if self.threads == Some(0) {
            return Err(EdgeError::InvalidParameter {
                name: "threads",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// First sample outside `[0, MAX_SAMPLE]`, or non-finite.
fn check_sample_range(image: &Field) -> Result<()> {
    let width = image.width();
    match image
        .as_slice()
        .iter()
        .position(|v| !(0.0..=MAX_SAMPLE).contains(v))
    {
        Some(idx) => Err(EdgeError::InvalidRange {
            x: idx % width,
            y: idx / width,
            value: image.as_slice()[idx],
        }),
        None => Ok(()),
    }
}

/// Configured edge detector. Owns its worker pool when `threads` is set.
pub struct EdgeDetector {
    config: CannyConfig,
    linker: Box<dyn EdgeLinker>,
    pool: Option<rayon::ThreadPool>,
}

impl EdgeDetector {
    pub fn new(config: CannyConfig) -> Result<Self> {
        config.validate()?;
        let linker: Box<dyn EdgeLinker> = match config.linker {
            LinkStrategy::Queue => Box::new(QueueLinker::default()),
            LinkStrategy::Relaxation => Box::new(RelaxationLinker),
        };
        let pool = match config.threads {
            Some(threads) => Some(rayon::ThreadPoolBuilder::new().num_threads(threads).build()?),
            None => None,
        };
        Ok(Self {
            config,
            linker,
            pool,
        })
    }

    pub fn config(&self) -> &CannyConfig {
        &self.config
    }

    /// Detect edges in `image`.
    ///
    /// Every sample must lie in `[0, 255]`; the check runs before any stage.
    /// The result holds [`edge_value`]`(high_threshold)` on edges and 0
    /// elsewhere.
    pub fn detect(&self, image: &Field) -> Result<Field> {
        check_sample_range(image)?;
        match &self.pool {
            Some(pool) => pool.install(|| self.run(image)),
            None => self.run(image),
        }
    }

    fn run(&self, image: &Field) -> Result<Field> {
        let c = &self.config;
        let (width, height) = image.dims();
        log::debug!(
            "detecting edges in {width}x{height} field: thresholds ({}, {}), kernel {} sigma {}, {:?}/{:?}",
            c.low_threshold,
            c.high_threshold,
            c.kernel_size,
            c.sigma,
            c.execution,
            c.linker
        );

        let classified = match c.execution {
            Execution::Optimized => {
                let smoothed = smooth(image, c.kernel_size, c.sigma)?;
                let pair = gradient(&smoothed)?;
                let thin = suppress(&pair.magnitude, &pair.orientation, c.kernel_size)?;
                classify(&thin, c.low_threshold, c.high_threshold)?
            }
            Execution::Reference => {
                let smoothed = smooth_reference(image, c.kernel_size, c.sigma)?;
                let pair = gradient_reference(&smoothed)?;
                let thin = suppress_reference(&pair.magnitude, &pair.orientation, c.kernel_size)?;
                classify_reference(&thin, c.low_threshold, c.high_threshold)?
            }
        };

        let labels = LabelMap::classify(&classified, c.low_threshold, c.high_threshold)?;
        log::debug!(
            "classified: {} strong, {} weak",
            labels.count(Label::Strong),
            labels.count(Label::Weak)
        );

        let edges = link_labels(labels, self.linker.as_ref());
        log::debug!(
            "linked: {} edge pixels",
            edges.count(edge_value(c.high_threshold))
        );
        Ok(edges)
    }
}

/// Run the full pipeline with the default execution, linker and pool.
///
/// # Arguments
/// * `image` - Samples in `[0, 255]`
/// * `low` - Weak threshold
/// * `high` - Strong threshold, `>= low`
/// * `kernel_size` - Gaussian side length, odd
/// * `sigma` - Gaussian standard deviation, > 0
///
/// # Returns
/// Edge map of the same shape, or the first precondition that failed
pub fn detect_edges(image: &Field, low: f64, high: f64, kernel_size: usize, sigma: f64) -> Result<Field> {
    let config = CannyConfig {
        low_threshold: low,
        high_threshold: high,
        kernel_size,
        sigma,
        ..CannyConfig::default()
    };
    EdgeDetector::new(config)?.detect(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linking::EDGE_VALUE;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// 32x32 black field with a white square covering `[10, 22)` on both axes.
    fn square() -> Field {
        let data = (0..32 * 32)
            .map(|i| {
                let (x, y) = (i % 32, i / 32);
                if (10..22).contains(&x) && (10..22).contains(&y) {
                    255.0
                } else {
                    0.0
                }
            })
            .collect();
        Field::new(32, 32, data).unwrap()
    }

    fn near_square_boundary(x: usize, y: usize) -> bool {
        let near = |v: usize| (8..=12).contains(&v) || (19..=23).contains(&v);
        let inside = |v: usize| (8..=23).contains(&v);
        (near(x) && inside(y)) || (near(y) && inside(x))
    }

    #[test]
    fn test_square_outline_is_found() {
        let image = square();
        for execution in [Execution::Optimized, Execution::Reference] {
            for linker in [LinkStrategy::Queue, LinkStrategy::Relaxation] {
                let config = CannyConfig {
                    execution,
                    linker,
                    ..CannyConfig::default()
                };
                let edges = EdgeDetector::new(config).unwrap().detect(&image).unwrap();
                assert_eq!(edges.dims(), (32, 32));
                assert!(edges.as_slice().iter().all(|&v| v == 0.0 || v == EDGE_VALUE));
                assert!(edges.count(EDGE_VALUE) >= 40, "{execution:?}/{linker:?}");
                for y in 0..32 {
                    for x in 0..32 {
                        if edges.get(x, y) == Some(EDGE_VALUE) {
                            assert!(near_square_boundary(x, y), "stray edge at ({x}, {y})");
                        }
                    }
                }
                assert_eq!(edges.get(16, 16), Some(0.0));
            }
        }
    }

    #[test]
    fn test_edges_carry_high_threshold_above_255() {
        // Step edges of the square reach a magnitude of roughly 900.
        let config = CannyConfig {
            low_threshold: 300.0,
            high_threshold: 600.0,
            ..CannyConfig::default()
        };
        let edges = EdgeDetector::new(config).unwrap().detect(&square()).unwrap();
        assert!(edges.as_slice().iter().all(|&v| v == 0.0 || v == 600.0));
        assert!(edges.count(600.0) >= 40);
        assert_eq!(crate::linking::link_edges(&edges, 300.0, 600.0).unwrap(), edges);
    }

    #[test]
    fn test_linker_strategy_does_not_change_result() {
        let mut rng = StdRng::seed_from_u64(314);
        let data = (0..45 * 27).map(|_| rng.gen_range(0.0..=255.0)).collect();
        let image = Field::new(45, 27, data).unwrap();
        let run = |linker| {
            let config = CannyConfig {
                low_threshold: 60.0,
                high_threshold: 180.0,
                linker,
                ..CannyConfig::default()
            };
            EdgeDetector::new(config).unwrap().detect(&image).unwrap()
        };
        assert_eq!(run(LinkStrategy::Queue), run(LinkStrategy::Relaxation));
    }

    #[test]
    fn test_single_and_multi_thread_agree() {
        let mut rng = StdRng::seed_from_u64(2718);
        let data = (0..61 * 38).map(|_| rng.gen_range(0.0..=255.0)).collect();
        let image = Field::new(61, 38, data).unwrap();
        let run = |threads| {
            let config = CannyConfig {
                kernel_size: 5,
                sigma: 1.4,
                threads: Some(threads),
                ..CannyConfig::default()
            };
            EdgeDetector::new(config).unwrap().detect(&image).unwrap()
        };
        assert_eq!(run(1), run(4));
    }

    #[test]
    fn test_blank_image_has_no_edges() {
        let image = Field::filled(16, 9, 0.0).unwrap();
        let edges = detect_edges(&image, 50.0, 100.0, 3, 1.0).unwrap();
        assert_eq!(edges.count(0.0), 16 * 9);
    }

    #[test]
    fn test_rejects_out_of_range_samples() {
        let mut data = vec![10.0; 12];
        data[7] = 256.0;
        let image = Field::new(4, 3, data).unwrap();
        match detect_edges(&image, 50.0, 100.0, 3, 0.5) {
            Err(EdgeError::InvalidRange { x, y, value }) => {
                assert_eq!((x, y), (3, 1));
                assert_eq!(value, 256.0);
            }
            other => panic!("expected InvalidRange, got {other:?}"),
        }

        let image = Field::new(2, 1, vec![-0.5, 0.0]).unwrap();
        assert!(matches!(
            detect_edges(&image, 50.0, 100.0, 3, 0.5),
            Err(EdgeError::InvalidRange { x: 0, y: 0, .. })
        ));
        let image = Field::new(2, 1, vec![0.0, f64::NAN]).unwrap();
        assert!(detect_edges(&image, 50.0, 100.0, 3, 0.5).is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(CannyConfig::default().validate().is_ok());
        let bad = [
            CannyConfig {
                low_threshold: 200.0,
                high_threshold: 100.0,
                ..CannyConfig::default()
            },
            CannyConfig {
                kernel_size: 4,
                ..CannyConfig::default()
            },
            CannyConfig {
                sigma: 0.0,
                ..CannyConfig::default()
            },
            CannyConfig {
                threads: Some(0),
                ..CannyConfig::default()
            },
        ];
        for config in bad {
            assert!(EdgeDetector::new(config).is_err());
        }
    }
}
