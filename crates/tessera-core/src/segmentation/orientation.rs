use ndarray::Axis;
use serde::{Deserialize, Serialize};

use super::workspace::SegmentationWorkspace;

/// Side of the image that holds the denser half of the tissue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Laterality {
    Left,
    Right,
}

impl std::fmt::Display for Laterality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "Left"),
            Self::Right => write!(f, "Right"),
        }
    }
}

/// Compare primary-region density between the two halves of the unmasked
/// extent along the display axis.
///
/// With a horizontal axis the grid is split into columns, otherwise into
/// rows. The first window covers the lower half of the extent and the last
/// window the upper half, rounded up. Returns `None` when no orientation can
/// be determined: every cell is masked, the extent is a single lane, or a
/// window has no unmasked cells.
pub fn detect_laterality(ws: &SegmentationWorkspace, horizontal_axis: bool) -> Option<Laterality> {
    // Columns are summed over rows (Axis 0), rows over columns (Axis 1).
    let axis = if horizontal_axis { Axis(0) } else { Axis(1) };
    let primary_accum: Vec<u64> = ws
        .primary
        .map(|&v| v as u64)
        .sum_axis(axis)
        .to_vec();
    let mask_accum: Vec<u64> = ws.mask.map(|&v| v as u64).sum_axis(axis).to_vec();

    let lb = mask_accum.iter().position(|&m| m != 0)?;
    let rb = mask_accum.iter().rposition(|&m| m != 0)? + 1;
    let extent = rb - lb;
    if extent < 2 {
        return None;
    }
    // On an odd extent the middle lane belongs to the last window.
    let first_end = lb + extent / 2;
    let last_start = rb - extent.div_ceil(2);

    let density = |range: std::ops::Range<usize>| -> Option<f64> {
        let tissue: u64 = primary_accum[range.clone()].iter().sum();
        let eligible: u64 = mask_accum[range].iter().sum();
        (eligible > 0).then(|| tissue as f64 / eligible as f64)
    };

    let first = density(lb..first_end)?;
    let last = density(last_start..rb)?;

    Some(if first >= last {
        Laterality::Left
    } else {
        Laterality::Right
    })
}
