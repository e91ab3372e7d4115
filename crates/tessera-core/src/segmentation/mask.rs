use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::scan::{BorderLines, ScanData};

use super::workspace::SegmentationWorkspace;

/// Border cutoffs converted to working resolution. A cutoff that lands on
/// 0 counts as not configured.
#[derive(Clone, Copy, Debug)]
struct Cutoffs {
    top: Option<f64>,
    bottom: Option<f64>,
    left: Option<f64>,
    right: Option<f64>,
}

impl Cutoffs {
    fn new(lines: &BorderLines, factor: usize) -> Self {
        let scale = |v: Option<f64>| {
            v.map(|v| (v / factor as f64).floor())
                .filter(|&b| b != 0.0)
        };
        Self {
            top: scale(lines.top),
            bottom: scale(lines.bottom),
            left: scale(lines.left),
            right: scale(lines.right),
        }
    }

    fn excludes(&self, y: usize, x: usize) -> bool {
        let (y, x) = (y as f64, x as f64);
        self.top.is_some_and(|b| y < b)
            || self.bottom.is_some_and(|b| y > b)
            || self.left.is_some_and(|b| x < b)
            || self.right.is_some_and(|b| x > b)
    }
}

/// Even-odd ray-crossing test: cast a horizontal ray from `(x, y)` and
/// toggle on every polygon edge it crosses.
pub fn point_in_polygon(x: f64, y: f64, polygon: &[[f64; 2]]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = polygon[i];
        let [xj, yj] = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Fill the workspace mask: 0 for cells beyond a border cutoff or whose
/// source coordinate lies inside an exclusion polygon, 1 otherwise.
pub fn generate_mask(ws: &mut SegmentationWorkspace, scan: &ScanData) {
    let factor = ws.factor;
    let cutoffs = Cutoffs::new(&scan.border_lines, factor);
    let polygons = &scan.polygons;

    let classify = |y: usize, x: usize| -> u8 {
        let excluded = cutoffs.excludes(y, x) || {
            let (sx, sy) = ((x * factor) as f64, (y * factor) as f64);
            polygons.iter().any(|polygon| point_in_polygon(sx, sy, polygon))
        };
        u8::from(!excluded)
    };

    let (h, w) = ws.mask.dim();
    if ws.mask.len() >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<u8>> = (0..h)
            .into_par_iter()
            .map(|y| (0..w).map(|x| classify(y, x)).collect())
            .collect();
        for (y, row) in rows.into_iter().enumerate() {
            for (x, cell) in row.into_iter().enumerate() {
                ws.mask[[y, x]] = cell;
            }
        }
    } else {
        for y in 0..h {
            for x in 0..w {
                ws.mask[[y, x]] = classify(y, x);
            }
        }
    }
}
