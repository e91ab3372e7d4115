use image::Rgba;
use ndarray::{ArrayView1, Axis};

use crate::scan::AttenuationFilter;

use super::orientation::Laterality;
use super::workspace::SegmentationWorkspace;

/// First and last primary-region cell along a lane. A span needs at least
/// two distinct cells.
fn tissue_span(lane: ArrayView1<'_, u8>) -> Option<(usize, usize)> {
    let first = lane.iter().position(|&c| c == 1)?;
    let last = lane.iter().rposition(|&c| c == 1)?;
    (first < last).then_some((first, last))
}

/// Overlay alpha for an attenuation weight: darker where the weight is low.
fn overlay_alpha(weight: f64) -> u8 {
    (255.0 - 256.0 * weight).floor().clamp(0.0, 255.0) as u8
}

/// Write radial attenuation weights across the tissue span of every row
/// (horizontal axis) or column (vertical axis).
///
/// The distance is normalized over the span and measured from the chest-wall
/// edge: the span start for left laterality, the span end for right. Cells
/// outside any span keep a weight of 1.
pub fn apply_attenuation(
    ws: &mut SegmentationWorkspace,
    filter: &AttenuationFilter,
    laterality: Laterality,
    horizontal_axis: bool,
) {
    let axis = if horizontal_axis { Axis(0) } else { Axis(1) };

    let lanes = ws.primary.axis_iter(axis).zip(ws.attenuation.axis_iter_mut(axis));
    for (lane_index, (tissue, mut weights)) in lanes.enumerate() {
        let Some((lo, hi)) = tissue_span(tissue) else {
            continue;
        };
        let extent = (hi - lo) as f64;

        for pos in lo..=hi {
            let d = match laterality {
                Laterality::Left => (pos - lo) as f64 / extent,
                Laterality::Right => (hi - pos) as f64 / extent,
            };
            let v = filter.weight(d);
            weights[pos] = v as f32;

            let (x, y) = if horizontal_axis {
                (pos, lane_index)
            } else {
                (lane_index, pos)
            };
            ws.attenuation_overlay
                .put_pixel(x as u32, y as u32, Rgba([0, 0, 0, overlay_alpha(v)]));
        }
    }
}
