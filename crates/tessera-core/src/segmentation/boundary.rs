use image::Rgba;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::{PRIMARY_BORDER_RGBA, SECONDARY_BORDER_RGBA, SECONDARY_FILL_RGBA};
use crate::scan::ScanData;

use super::workspace::SegmentationWorkspace;

/// Which secondary-region features the overlay shows. The primary boundary
/// is always drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayStyle {
    pub show_secondary_border: bool,
    pub show_secondary_region: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            show_secondary_border: true,
            show_secondary_region: false,
        }
    }
}

impl From<&ScanData> for OverlayStyle {
    fn from(scan: &ScanData) -> Self {
        Self {
            show_secondary_border: scan.show_secondary_border,
            show_secondary_region: scan.show_secondary_region,
        }
    }
}

/// In-bounds 4-neighbors of `(y, x)`.
fn neighbors(y: usize, x: usize, h: usize, w: usize) -> impl Iterator<Item = (usize, usize)> {
    let up = (y > 0).then(|| (y - 1, x));
    let down = (y + 1 < h).then(|| (y + 1, x));
    let left = (x > 0).then(|| (y, x - 1));
    let right = (x + 1 < w).then(|| (y, x + 1));
    [up, down, left, right].into_iter().flatten()
}

fn any_neighbor(grid: &Array2<u8>, y: usize, x: usize, pred: impl Fn(u8) -> bool) -> bool {
    let (h, w) = grid.dim();
    neighbors(y, x, h, w).any(|(ny, nx)| pred(grid[[ny, nx]]))
}

/// Rebuild the overlay from the primary and secondary classes.
///
/// Cells outside the primary region that touch it become the primary
/// boundary. Secondary cells inside the primary region that touch a
/// non-secondary cell become the secondary boundary; the rest of them get the
/// translucent fill when enabled. The fill is only drawn together with the
/// secondary boundary. Everything else is transparent.
pub fn extract_boundaries(ws: &mut SegmentationWorkspace, style: OverlayStyle) {
    let (h, w) = ws.primary.dim();

    for y in 0..h {
        for x in 0..w {
            let in_primary = ws.primary[[y, x]] == 1;
            let in_secondary = ws.secondary[[y, x]] == 1;

            let color = if !in_primary {
                any_neighbor(&ws.primary, y, x, |v| v == 1).then_some(PRIMARY_BORDER_RGBA)
            } else if in_secondary {
                if !style.show_secondary_border {
                    None
                } else if any_neighbor(&ws.secondary, y, x, |v| v != 1) {
                    Some(SECONDARY_BORDER_RGBA)
                } else {
                    style.show_secondary_region.then_some(SECONDARY_FILL_RGBA)
                }
            } else {
                None
            };

            ws.overlay
                .put_pixel(x as u32, y as u32, Rgba(color.unwrap_or([0, 0, 0, 0])));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `#` primary only, `s` primary and secondary, `.` neither.
    fn workspace(rows: &[&str]) -> SegmentationWorkspace {
        let h = rows.len();
        let w = rows[0].len();
        let mut ws = SegmentationWorkspace::new();
        ws.ensure_dims(h, w);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.bytes().enumerate() {
                ws.primary[[y, x]] = u8::from(c == b'#' || c == b's');
                ws.secondary[[y, x]] = u8::from(c == b's');
            }
        }
        ws
    }

    fn px(ws: &SegmentationWorkspace, y: u32, x: u32) -> [u8; 4] {
        ws.overlay().get_pixel(x, y).0
    }

    #[test]
    fn test_primary_boundary_rings_region() {
        let mut ws = workspace(&[".....", ".....", "..#..", ".....", "....."]);
        extract_boundaries(&mut ws, OverlayStyle::default());
        for &(y, x) in &[(1, 2), (3, 2), (2, 1), (2, 3)] {
            assert_eq!(px(&ws, y, x), PRIMARY_BORDER_RGBA);
        }
        assert_eq!(px(&ws, 2, 2), [0, 0, 0, 0]);
        assert_eq!(px(&ws, 1, 1), [0, 0, 0, 0], "diagonal is not adjacent");
        assert_eq!(px(&ws, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_secondary_boundary_and_fill() {
        let rows = ["#####", "#sss#", "#sss#", "#sss#", "#####"];
        let mut ws = workspace(&rows);
        let style = OverlayStyle {
            show_secondary_border: true,
            show_secondary_region: true,
        };
        extract_boundaries(&mut ws, style);
        assert_eq!(px(&ws, 1, 1), SECONDARY_BORDER_RGBA);
        assert_eq!(px(&ws, 1, 2), SECONDARY_BORDER_RGBA);
        assert_eq!(px(&ws, 2, 2), SECONDARY_FILL_RGBA);
        assert_eq!(px(&ws, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_image_edge_does_not_count_as_non_secondary() {
        let mut ws = workspace(&["ss", "ss"]);
        extract_boundaries(&mut ws, OverlayStyle::default());
        assert!(ws.overlay().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn test_hidden_secondary_border_is_transparent() {
        let mut ws = workspace(&["#s", "##"]);
        let style = OverlayStyle {
            show_secondary_border: false,
            show_secondary_region: false,
        };
        extract_boundaries(&mut ws, style);
        assert_eq!(px(&ws, 0, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn test_fill_requires_secondary_border() {
        let rows = ["#####", "#sss#", "#sss#", "#sss#", "#####"];
        let mut ws = workspace(&rows);
        let style = OverlayStyle {
            show_secondary_border: false,
            show_secondary_region: true,
        };
        extract_boundaries(&mut ws, style);
        assert_eq!(px(&ws, 2, 2), [0, 0, 0, 0]);
        assert_eq!(px(&ws, 1, 1), [0, 0, 0, 0]);
        assert_eq!(px(&ws, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_style_from_scan_data() {
        let mut scan = ScanData::new(0.0, 0.0);
        assert_eq!(OverlayStyle::from(&scan), OverlayStyle::default());
        scan.show_secondary_region = true;
        assert!(OverlayStyle::from(&scan).show_secondary_region);
    }
}
