//! Hysteresis edge linking.
//!
//! Linking runs on a [`LabelMap`], a typed copy of the double-threshold
//! classification, so the caller's field is never touched. A weak pixel
//! becomes strong when an 8-connected path of weak pixels joins it to a
//! strong one. Two interchangeable strategies implement [`EdgeLinker`]:
//!
//! - [`QueueLinker`]: frontier propagation, each pixel enqueued at most once
//! - [`RelaxationLinker`]: whole-field passes until nothing changes
//!
//! Both reach the same fixed point. The edge map emitted afterwards holds
//! [`edge_value`]`(high)` for strong pixels and 0 everywhere else, so
//! linking an edge map again with the same thresholds leaves it unchanged.

mod queue;
mod relaxation;

pub use queue::{FrontierOrder, QueueLinker};
pub use relaxation::RelaxationLinker;

use crate::error::{check_thresholds, EdgeError, Result};
use crate::field::Field;

/// Smallest sample value of an edge pixel in a linked edge map.
pub const EDGE_VALUE: f64 = 255.0;

/// Edge pixel value for a strong threshold of `high`.
///
/// [`EDGE_VALUE`] unless `high` is larger, in which case `high` itself, so
/// edge pixels always classify as strong again.
#[inline]
pub fn edge_value(high: f64) -> f64 {
    high.max(EDGE_VALUE)
}

/// The 8-connected neighbourhood as `(dx, dy)` offsets, raster order.
pub const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Double-threshold class of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Label {
    #[default]
    None,
    Weak,
    Strong,
}

impl Label {
    #[inline]
    pub fn from_sample(value: f64, low: f64, high: f64) -> Self {
        if value >= high {
            Label::Strong
        } else if value >= low {
            Label::Weak
        } else {
            Label::None
        }
    }
}

/// Row-major grid of [`Label`]s and the value its strong pixels map to.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    width: usize,
    height: usize,
    labels: Vec<Label>,
    edge_value: f64,
}

impl LabelMap {
    /// Label every sample of `field` against `(low, high)`.
    pub fn classify(field: &Field, low: f64, high: f64) -> Result<Self> {
        check_thresholds(low, high)?;
        let labels = field
            .as_slice()
            .iter()
            .map(|&v| Label::from_sample(v, low, high))
            .collect();
        Ok(Self {
            width: field.width(),
            height: field.height(),
            labels,
            edge_value: edge_value(high),
        })
    }

    /// Wrap existing labels; strong pixels map to [`EDGE_VALUE`].
    pub fn from_labels(width: usize, height: usize, labels: Vec<Label>) -> Result<Self> {
        if width == 0 || height == 0 || crate::field::checked_area(width, height) != Some(labels.len()) {
            return Err(EdgeError::InvalidDimensions {
                width,
                height,
                len: labels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            labels,
            edge_value: EDGE_VALUE,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Label> {
        if x < self.width && y < self.height {
            Some(self.labels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub(crate) fn labels_mut(&mut self) -> &mut [Label] {
        &mut self.labels
    }

    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    pub fn edge_value(&self) -> f64 {
        self.edge_value
    }

    /// Strong pixels become [`LabelMap::edge_value`], everything else 0.
    pub fn to_edge_map(&self) -> Field {
        let data = self
            .labels
            .iter()
            .map(|&l| if l == Label::Strong { self.edge_value } else { 0.0 })
            .collect();
        Field::from_parts(self.width, self.height, data)
    }
}

/// Promotes weak pixels connected to strong pixels, in place.
///
/// After `link` returns, no weak pixel has a strong 8-neighbour. Pixels that
/// were strong stay strong and no pixel is demoted.
pub trait EdgeLinker: Send + Sync {
    fn link(&self, labels: &mut LabelMap);
}

/// Run `linker` on `labels` and emit the edge map.
pub fn link_labels(mut labels: LabelMap, linker: &dyn EdgeLinker) -> Field {
    let strong = labels.count(Label::Strong);
    linker.link(&mut labels);
    log::trace!(
        "linked {}x{}: {} seeds, {} edge pixels",
        labels.width,
        labels.height,
        strong,
        labels.count(Label::Strong)
    );
    labels.to_edge_map()
}

/// Classify `field` against `(low, high)` and link with `linker`.
pub fn link_edges_with(field: &Field, low: f64, high: f64, linker: &dyn EdgeLinker) -> Result<Field> {
    let labels = LabelMap::classify(field, low, high)?;
    Ok(link_labels(labels, linker))
}

/// Hysteresis linking with the work-queue strategy.
///
/// # Arguments
/// * `field` - Suppressed gradient magnitude, not yet thresholded
/// * `low` - Weak threshold
/// * `high` - Strong threshold, `>= low`
///
/// # Returns
/// Edge map with [`edge_value`]`(high)` on edges and 0 elsewhere
pub fn link_edges(field: &Field, low: f64, high: f64) -> Result<Field> {
    link_edges_with(field, low, high, &QueueLinker::default())
}

/// Hysteresis linking with whole-field relaxation. Oracle for [`link_edges`].
pub fn link_edges_reference(field: &Field, low: f64, high: f64) -> Result<Field> {
    link_edges_with(field, low, high, &RelaxationLinker)
}
