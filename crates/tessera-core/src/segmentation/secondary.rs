use ndarray::Zip;

use crate::scan::AttenuationFilter;

use super::workspace::SegmentationWorkspace;

/// Mark unmasked cells whose intensity exceeds `threshold` in the secondary
/// class. When the attenuation filter is enabled the intensity is weighted by
/// the per-cell attenuation first. Returns the secondary region size in cells.
pub fn classify_secondary(
    ws: &mut SegmentationWorkspace,
    threshold: f64,
    filter: &AttenuationFilter,
) -> usize {
    let weighted = filter.is_enabled();
    let mut count = 0usize;

    Zip::from(&mut ws.secondary)
        .and(&ws.mask)
        .and(&ws.scaled)
        .and(&ws.attenuation)
        .for_each(|class, &mask, &value, &weight| {
            let intensity = if weighted {
                value as f64 * weight as f64
            } else {
                value as f64
            };
            let hit = mask == 1 && intensity > threshold;
            *class = u8::from(hit);
            count += usize::from(hit);
        });

    count
}
