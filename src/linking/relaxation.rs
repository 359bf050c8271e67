//! Whole-field relaxation.
//!
//! Each generation promotes every weak pixel that has a strong neighbour in
//! the previous generation. Generations are double-buffered: rows of
//! generation `k + 1` are written in parallel while generation `k` is only
//! read, and the per-row change flags are OR-reduced before the next
//! generation starts. A chain of `n` weak pixels takes `n` generations, so
//! this strategy is kept as a cross-check for [`QueueLinker`].
//!
//! [`QueueLinker`]: super::QueueLinker

use rayon::prelude::*;

use super::{EdgeLinker, Label, LabelMap, NEIGHBOURS};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaxationLinker;

#[inline]
fn has_strong_neighbour(cells: &[Label], width: usize, height: usize, x: usize, y: usize) -> bool {
    NEIGHBOURS.iter().any(|&(dx, dy)| {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        nx >= 0
            && nx < width as isize
            && ny >= 0
            && ny < height as isize
            && cells[ny as usize * width + nx as usize] == Label::Strong
    })
}

impl EdgeLinker for RelaxationLinker {
    fn link(&self, labels: &mut LabelMap) {
        let (width, height) = labels.dims();
        let mut current = labels.labels().to_vec();
        let mut next = current.clone();
        let mut generations = 0usize;

        loop {
            let changed = next
                .par_chunks_mut(width)
                .enumerate()
                .map(|(y, row)| {
                    let mut changed = false;
                    for (x, cell) in row.iter_mut().enumerate() {
                        let label = current[y * width + x];
                        *cell = if label == Label::Weak
                            && has_strong_neighbour(&current, width, height, x, y)
                        {
                            changed = true;
                            Label::Strong
                        } else {
                            label
                        };
                    }
                    changed
                })
                .reduce(|| false, |a, b| a || b);

            std::mem::swap(&mut current, &mut next);
            generations += 1;
            if !changed {
                break;
            }
        }

        log::trace!("relaxation linker: fixed point after {generations} generations");
        labels.labels_mut().copy_from_slice(&current);
    }
}
