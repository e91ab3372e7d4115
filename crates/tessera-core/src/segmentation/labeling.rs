use std::collections::BTreeSet;

use ndarray::{Array2, Zip};

use super::union_find::UnionFind;
use super::workspace::SegmentationWorkspace;

/// Resolved connected-component labels over a grid.
#[derive(Clone, Debug)]
pub struct ComponentLabels {
    /// Root label per cell, 0 for cells that did not qualify.
    pub labels: Array2<usize>,
    /// Cell count per root label. Index 0 is always 0.
    pub areas: Vec<usize>,
}

impl ComponentLabels {
    /// Largest component as `(label, area)`, lowest label on ties.
    /// `None` when no cell qualified.
    pub fn largest(&self) -> Option<(usize, usize)> {
        let mut best = (0, 0);
        for (label, &area) in self.areas.iter().enumerate().skip(1) {
            if area > best.1 {
                best = (label, area);
            }
        }
        (best.1 > 0).then_some(best)
    }

    /// Number of distinct components.
    pub fn component_count(&self) -> usize {
        self.areas.iter().filter(|&&a| a > 0).count()
    }
}

/// Two-pass 4-connected labeling of cells for which `qualifies` holds.
///
/// Pass one walks the grid in raster order, inheriting the label of the
/// upper or left neighbor and recording an equivalence (smaller label first)
/// when both are labeled and differ. Equivalences are then unioned in a
/// disjoint-set forest and every label is replaced by its root.
pub fn label_components<F>(dim: (usize, usize), qualifies: F) -> ComponentLabels
where
    F: Fn(usize, usize) -> bool,
{
    let (h, w) = dim;
    let mut labels = Array2::<usize>::zeros((h, w));
    let mut next_label = 1usize;
    let mut equivalences = BTreeSet::new();

    for y in 0..h {
        for x in 0..w {
            if !qualifies(y, x) {
                continue;
            }

            let up = if y > 0 { labels[[y - 1, x]] } else { 0 };
            let left = if x > 0 { labels[[y, x - 1]] } else { 0 };

            labels[[y, x]] = match (up > 0, left > 0) {
                (true, true) => {
                    if up != left {
                        equivalences.insert((up.min(left), up.max(left)));
                    }
                    up
                }
                (true, false) => up,
                (false, true) => left,
                (false, false) => {
                    let label = next_label;
                    next_label += 1;
                    label
                }
            };
        }
    }

    let mut forest = UnionFind::with_len(next_label);
    for &(a, b) in &equivalences {
        forest.link(a, b);
    }

    let mut areas = vec![0usize; next_label];
    for label in labels.iter_mut().filter(|l| **l > 0) {
        *label = forest.find(*label);
        areas[*label] += 1;
    }

    ComponentLabels { labels, areas }
}

/// Label eligible cells above `threshold` and keep the largest component in
/// the workspace's primary class. Returns the primary region size in cells;
/// 0 leaves the primary class empty.
pub fn label_primary_region(ws: &mut SegmentationWorkspace, threshold: f64) -> usize {
    let components = {
        let mask = &ws.mask;
        let scaled = &ws.scaled;
        label_components(scaled.dim(), |y, x| {
            mask[[y, x]] == 1 && scaled[[y, x]] as f64 > threshold
        })
    };

    ws.primary.fill(0);
    let Some((label, area)) = components.largest() else {
        return 0;
    };

    Zip::from(&mut ws.primary)
        .and(&components.labels)
        .for_each(|cell, &l| *cell = u8::from(l == label));
    area
}
