mod common;

use std::collections::VecDeque;

use approx::assert_relative_eq;
use common::scan_image;
use ndarray::Array2;
use tessera_core::scan::{AttenuationFilter, BorderLines, ScanData, ScanImage};
use tessera_core::segmentation::mask::{generate_mask, point_in_polygon};
use tessera_core::segmentation::{
    label_components, Laterality, SegmentationWorkspace, UnionFind,
};

/// Image with `value` where `tissue(y, x)` holds and 0 elsewhere.
fn image_from(h: usize, w: usize, value: u32, tissue: impl Fn(usize, usize) -> bool) -> ScanImage {
    let pixels = Array2::from_shape_fn((h, w), |(y, x)| if tissue(y, x) { value } else { 0 });
    ScanImage::new(pixels, 12)
}

/// Deterministic pseudo-random bits.
fn lcg_grid(h: usize, w: usize, seed: u64) -> Array2<bool> {
    let mut state = seed;
    Array2::from_shape_fn((h, w), |_| {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) % 3 != 0
    })
}

/// Reference 4-connected flood fill. Returns component ids per cell
/// (0 for empty) and the component count.
fn flood_fill(grid: &Array2<bool>) -> (Array2<usize>, usize) {
    let (h, w) = grid.dim();
    let mut ids = Array2::<usize>::zeros((h, w));
    let mut count = 0;
    for y in 0..h {
        for x in 0..w {
            if !grid[[y, x]] || ids[[y, x]] != 0 {
                continue;
            }
            count += 1;
            let mut queue = VecDeque::from([(y, x)]);
            ids[[y, x]] = count;
            while let Some((cy, cx)) = queue.pop_front() {
                let mut visit = |ny: usize, nx: usize| {
                    if grid[[ny, nx]] && ids[[ny, nx]] == 0 {
                        ids[[ny, nx]] = count;
                        queue.push_back((ny, nx));
                    }
                };
                if cy > 0 {
                    visit(cy - 1, cx);
                }
                if cy + 1 < h {
                    visit(cy + 1, cx);
                }
                if cx > 0 {
                    visit(cy, cx - 1);
                }
                if cx + 1 < w {
                    visit(cy, cx + 1);
                }
            }
        }
    }
    (ids, count)
}

// ---------------------------------------------------------------------------
// Labeling
// ---------------------------------------------------------------------------

#[test]
fn test_single_block_is_primary_region() {
    let image = scan_image(&[
        &[0, 0, 0, 0],
        &[0, 900, 900, 0],
        &[0, 900, 900, 0],
        &[0, 0, 0, 0],
    ]);
    let mut ws = SegmentationWorkspace::new();
    let mut scan = ScanData::new(500.0, 4000.0);
    let summary = ws.run(&image, &mut scan).unwrap();

    assert_eq!(summary.factor, 1);
    assert_eq!(summary.primary_area, 4);
    assert_relative_eq!(scan.primary_area, 4.0);
    for ((y, x), &cell) in ws.primary().indexed_iter() {
        let inside = (1..=2).contains(&y) && (1..=2).contains(&x);
        assert_eq!(cell, u8::from(inside), "cell ({y}, {x})");
    }
}

#[test]
fn test_area_scales_with_downsample_factor() {
    // Width 800 gives factor 2; the block covers working cells (1..3, 1..3).
    let image = image_from(8, 800, 900, |y, x| (2..6).contains(&y) && (2..6).contains(&x));
    let mut ws = SegmentationWorkspace::new();
    let mut scan = ScanData::new(500.0, 4000.0);
    let summary = ws.run(&image, &mut scan).unwrap();

    assert_eq!(summary.factor, 2);
    assert_eq!(summary.working_dims, (4, 400));
    assert_eq!(summary.primary_area, 16);
    assert_relative_eq!(scan.primary_area, 16.0);
}

#[test]
fn test_largest_component_wins() {
    let image = scan_image(&[
        &[900, 0, 900, 900],
        &[0, 0, 900, 900],
        &[900, 0, 0, 0],
    ]);
    let mut ws = SegmentationWorkspace::new();
    let summary = ws.run(&image, &mut ScanData::new(500.0, 4000.0)).unwrap();
    assert_eq!(summary.primary_area, 4);
    assert_eq!(ws.primary()[[0, 0]], 0);
    assert_eq!(ws.primary()[[1, 3]], 1);
}

#[test]
fn test_labeling_matches_flood_fill() {
    for seed in [1u64, 7, 42, 2024] {
        let grid = lcg_grid(23, 31, seed);
        let labels = label_components(grid.dim(), |y, x| grid[[y, x]]);
        let (reference, count) = flood_fill(&grid);

        assert_eq!(labels.component_count(), count, "seed {seed}");
        for ((y, x), &r) in reference.indexed_iter() {
            for ((y2, x2), &r2) in reference.indexed_iter() {
                if r == 0 || r2 == 0 || (y2, x2) <= (y, x) {
                    continue;
                }
                assert_eq!(
                    labels.labels[[y, x]] == labels.labels[[y2, x2]],
                    r == r2,
                    "seed {seed}: ({y}, {x}) vs ({y2}, {x2})"
                );
            }
        }
    }
}

#[test]
fn test_union_find_links_agree_with_connectivity() {
    // Chain links in one half, pairs in the other.
    let mut uf = UnionFind::with_len(20);
    for i in 0..9 {
        uf.link(i, i + 1);
    }
    for i in (10..20).step_by(2) {
        uf.link(i, i + 1);
    }

    for a in 0..20 {
        for b in 0..20 {
            let connected = (a < 10 && b < 10) || (a >= 10 && b >= 10 && a / 2 == b / 2);
            assert_eq!(uf.find(a) == uf.find(b), connected, "{a} vs {b}");
        }
    }
}

#[test]
fn test_no_region_above_threshold_is_not_an_error() {
    let image = image_from(6, 6, 100, |_, _| true);
    let mut ws = SegmentationWorkspace::new();
    let mut scan = ScanData::new(500.0, 4000.0);
    let summary = ws.run(&image, &mut scan).unwrap();

    assert_eq!(summary.primary_area, 0);
    assert!(ws.primary().iter().all(|&v| v == 0));
    // Orientation windows have no tissue at all; both densities are 0.
    assert!(summary.orientation_determined);
    assert_eq!(summary.laterality, Laterality::Left);
    assert!(ws.overlay().pixels().all(|p| p[3] == 0));
}

// ---------------------------------------------------------------------------
// Mask
// ---------------------------------------------------------------------------

#[test]
fn test_polygon_excludes_regardless_of_borders() {
    let polygon = vec![[3.2, 2.7], [11.6, 4.1], [9.3, 12.8], [2.4, 10.2]];
    let borders = [
        BorderLines::default(),
        BorderLines {
            top: Some(1.0),
            bottom: Some(14.0),
            left: Some(0.0),
            right: Some(15.0),
        },
        BorderLines {
            top: None,
            bottom: Some(20.0),
            left: Some(5.0),
            right: None,
        },
    ];

    for lines in borders {
        let mut ws = SegmentationWorkspace::new();
        ws.ensure_dims(16, 16);
        let mut scan = ScanData::new(0.0, 0.0);
        scan.border_lines = lines;
        scan.polygons.push(polygon.clone());
        generate_mask(&mut ws, &scan);

        for ((y, x), &m) in ws.mask().indexed_iter() {
            if point_in_polygon(x as f64, y as f64, &polygon) {
                assert_eq!(m, 0, "cell ({y}, {x}) with {lines:?}");
            }
        }
    }
}

#[test]
fn test_polygon_can_hide_bright_block() {
    let image = image_from(10, 10, 900, |y, x| (3..7).contains(&y) && (3..7).contains(&x));
    let mut scan = ScanData::new(500.0, 4000.0);
    scan.polygons.push(vec![[2.5, 2.5], [7.5, 2.5], [7.5, 7.5], [2.5, 7.5]]);

    let mut ws = SegmentationWorkspace::new();
    let summary = ws.run(&image, &mut scan).unwrap();
    assert_eq!(summary.primary_area, 0);
}

#[test]
fn test_fully_masked_grid_falls_back_to_left() {
    let image = image_from(6, 6, 900, |_, _| true);
    let mut scan = ScanData::new(500.0, 4000.0);
    scan.border_lines.top = Some(100.0);

    let mut ws = SegmentationWorkspace::new();
    let summary = ws.run(&image, &mut scan).unwrap();
    assert!(!summary.orientation_determined);
    assert_eq!(summary.laterality, Laterality::Left);
    assert!(scan.left_orientation);
    assert_eq!(summary.primary_area, 0);
}

#[test]
fn test_zero_border_cutoff_is_ignored() {
    let image = image_from(4, 4, 900, |_, _| true);
    let mut scan = ScanData::new(10.0, 4000.0);
    scan.border_lines.bottom = Some(0.0);

    let mut ws = SegmentationWorkspace::new();
    let summary = ws.run(&image, &mut scan).unwrap();
    assert_eq!(summary.primary_area, 16);
    assert!(ws.mask().iter().all(|&m| m == 1));
}

// ---------------------------------------------------------------------------
// Orientation, attenuation, secondary region
// ---------------------------------------------------------------------------

fn left_tissue() -> ScanImage {
    image_from(10, 20, 1000, |_, x| x < 12)
}

#[test]
fn test_orientation_follows_tissue() {
    let mut ws = SegmentationWorkspace::new();

    let mut scan = ScanData::new(500.0, 4000.0);
    let summary = ws.run(&left_tissue(), &mut scan).unwrap();
    assert_eq!(summary.laterality, Laterality::Left);
    assert!(scan.left_orientation);

    let right = image_from(10, 20, 1000, |_, x| x >= 8);
    let summary = ws.run(&right, &mut scan).unwrap();
    assert_eq!(summary.laterality, Laterality::Right);
    assert!(!scan.left_orientation);
}

#[test]
fn test_odd_extent_counts_middle_column_as_right() {
    let image = image_from(3, 5, 900, |_, x| x == 2);
    let mut scan = ScanData::new(10.0, 4000.0);
    let mut ws = SegmentationWorkspace::new();
    let summary = ws.run(&image, &mut scan).unwrap();

    assert!(summary.orientation_determined);
    assert_eq!(summary.laterality, Laterality::Right);
    assert!(!scan.left_orientation);
}

#[test]
fn test_secondary_without_attenuation_uses_raw_intensity() {
    let mut ws = SegmentationWorkspace::new();
    let mut scan = ScanData::new(500.0, 500.0);
    let summary = ws.run(&left_tissue(), &mut scan).unwrap();
    assert_eq!(summary.secondary_area, 120);
    assert_relative_eq!(scan.secondary_area, 120.0);
    assert!(ws.attenuation().iter().all(|&a| a == 1.0));
}

#[test]
fn test_attenuation_weights_secondary_threshold() {
    let mut ws = SegmentationWorkspace::new();
    let mut scan = ScanData::new(500.0, 500.0);
    scan.attenuation = AttenuationFilter {
        baseline: 0.0,
        exponent: 1.0,
        scale: 1.0,
    };
    let summary = ws.run(&left_tissue(), &mut scan).unwrap();

    // Span is columns 0..=11, weight x / 11; 1000 * x / 11 > 500 for x >= 6.
    assert_eq!(summary.secondary_area, 60);
    for y in 0..10 {
        for x in 0..20 {
            assert_eq!(ws.secondary()[[y, x]], u8::from((6..12).contains(&x)), "cell ({y}, {x})");
        }
    }
    assert_relative_eq!(ws.attenuation()[[0, 11]], 1.0);
    assert_relative_eq!(ws.attenuation()[[0, 0]], 0.0);
    assert_eq!(ws.attenuation_overlay().get_pixel(0, 0)[3], 255);
}

#[test]
fn test_rotation_switches_to_rows() {
    // Tissue in the top rows; with a 90 degree rotation rows are compared.
    let image = image_from(20, 10, 1000, |y, _| y < 12);
    let mut scan = ScanData::new(500.0, 4000.0);
    scan.rotation = 90.0;
    let mut ws = SegmentationWorkspace::new();
    let summary = ws.run(&image, &mut scan).unwrap();
    assert_eq!(summary.laterality, Laterality::Left);

    let image = image_from(20, 10, 1000, |y, _| y >= 8);
    let summary = ws.run(&image, &mut scan).unwrap();
    assert_eq!(summary.laterality, Laterality::Right);
}

#[test]
fn test_workspace_reused_across_runs() {
    let mut ws = SegmentationWorkspace::new();
    let mut scan = ScanData::new(500.0, 4000.0);
    ws.run(&left_tissue(), &mut scan).unwrap();
    assert!(!ws.ensure_dims(10, 20));

    let small = image_from(4, 4, 1000, |y, x| y < 2 && x < 2);
    let summary = ws.run(&small, &mut scan).unwrap();
    assert_eq!(summary.working_dims, (4, 4));
    assert_eq!(summary.primary_area, 4);
}
