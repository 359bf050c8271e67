//! Work-queue propagation.
//!
//! Every strong pixel seeds the frontier. Popping a pixel promotes its weak
//! neighbours and pushes them, so each pixel enters the frontier at most
//! once and the total work is linear in the pixel count.

use std::collections::VecDeque;

use super::{EdgeLinker, Label, LabelMap, NEIGHBOURS};
use crate::error::{EdgeError, Result};

/// Which end of the frontier the next pixel is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrontierOrder {
    /// Breadth-first.
    #[default]
    Fifo,
    /// Depth-first.
    Lifo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueLinker {
    neighbours: [(isize, isize); 8],
    order: FrontierOrder,
}

impl Default for QueueLinker {
    fn default() -> Self {
        Self {
            neighbours: NEIGHBOURS,
            order: FrontierOrder::Fifo,
        }
    }
}

impl QueueLinker {
    /// Visit neighbours in `order`, which must be a permutation of
    /// [`NEIGHBOURS`].
    pub fn with_neighbour_order(mut self, order: [(isize, isize); 8]) -> Result<Self> {
        let is_permutation = NEIGHBOURS.iter().all(|n| order.contains(n));
        if !is_permutation {
            return Err(EdgeError::InvalidParameter {
                name: "neighbour_order",
                reason: format!("not a permutation of the 8-neighbourhood: {order:?}"),
            });
        }
        self.neighbours = order;
        Ok(self)
    }

    pub fn with_frontier(mut self, order: FrontierOrder) -> Self {
        self.order = order;
        self
    }

    pub fn frontier(&self) -> FrontierOrder {
        self.order
    }

    #[inline]
    fn pop(&self, frontier: &mut VecDeque<usize>) -> Option<usize> {
        match self.order {
            FrontierOrder::Fifo => frontier.pop_front(),
            FrontierOrder::Lifo => frontier.pop_back(),
        }
    }

    /// Drain a frontier seeded with `seeds`, in the order given.
    ///
    /// Seeds that are not strong are skipped. [`EdgeLinker::link`] seeds with
    /// every strong pixel in raster order; the fixed point does not depend on
    /// that order.
    pub(crate) fn propagate(&self, labels: &mut LabelMap, seeds: impl IntoIterator<Item = usize>) {
        let (width, height) = labels.dims();
        let cells = labels.labels_mut();

        let mut frontier: VecDeque<usize> = seeds
            .into_iter()
            .filter(|&idx| cells.get(idx) == Some(&Label::Strong))
            .collect();
        let seeds = frontier.len();
        let mut promoted = 0usize;

        while let Some(idx) = self.pop(&mut frontier) {
            let x = (idx % width) as isize;
            let y = (idx / width) as isize;

            for &(dx, dy) in &self.neighbours {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || nx >= width as isize || ny < 0 || ny >= height as isize {
                    continue;
                }
                let nidx = ny as usize * width + nx as usize;
                if cells[nidx] == Label::Weak {
                    cells[nidx] = Label::Strong;
                    frontier.push_back(nidx);
                    promoted += 1;
                }
            }
        }

        log::trace!("queue linker: {seeds} seeds, {promoted} promoted");
    }
}

impl EdgeLinker for QueueLinker {
    fn link(&self, labels: &mut LabelMap) {
        let seeds: Vec<usize> = labels
            .labels()
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == Label::Strong)
            .map(|(idx, _)| idx)
            .collect();
        self.propagate(labels, seeds);
    }
}
