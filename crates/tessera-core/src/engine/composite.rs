//! Pixel transfer from the shared buffer and overlays onto viewport surfaces.

use image::{Rgba, RgbaImage};

use crate::error::Result;
use crate::scan::{ScanData, ScanImage};
use crate::segmentation::{SegmentationSummary, SegmentationWorkspace};

use super::layout::Placement;

/// How an overlay layer is combined with the surface beneath it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    SourceOver,
    SoftLight,
}

/// Opaque RGBA for an RGB color in [0, 1], each channel `floor(255 * c)`.
pub fn background_rgba(color: [f32; 3]) -> Rgba<u8> {
    let channel = |c: f32| (255.0 * c.clamp(0.0, 1.0)).floor() as u8;
    Rgba([channel(color[0]), channel(color[1]), channel(color[2]), 255])
}

/// Fill a surface with a background color, black when none is given.
pub fn fill_with_background(surface: &mut RgbaImage, color: Option<[f32; 3]>) {
    let rgba = background_rgba(color.unwrap_or([0.0, 0.0, 0.0]));
    for px in surface.pixels_mut() {
        *px = rgba;
    }
}

/// Source coordinate for destination index `d` when stretching `src_len`
/// samples over `dst_len`.
#[inline]
fn nearest(d: u32, src_len: u32, dst_len: u32) -> u32 {
    ((d as u64 * src_len as u64) / dst_len as u64) as u32
}

/// Copy the `placement` rectangle of `source` onto the whole of `dest`,
/// stretching nearest-neighbor when sizes differ. Source pixels outside
/// `source` leave the destination untouched.
pub fn blit_region(source: &RgbaImage, placement: Placement, dest: &mut RgbaImage) {
    let (dw, dh) = dest.dimensions();
    if placement.width == 0 || placement.height == 0 || dw == 0 || dh == 0 {
        return;
    }

    for y in 0..dh {
        let sy = placement.sy + nearest(y, placement.height, dh);
        if sy >= source.height() {
            continue;
        }
        for x in 0..dw {
            let sx = placement.sx + nearest(x, placement.width, dw);
            if sx < source.width() {
                dest.put_pixel(x, y, *source.get_pixel(sx, sy));
            }
        }
    }
}

fn unit(v: u8) -> f32 {
    v as f32 / 255.0
}

fn byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn soft_light_channel(backdrop: f32, source: f32) -> f32 {
    if source <= 0.5 {
        backdrop - (1.0 - 2.0 * source) * backdrop * (1.0 - backdrop)
    } else {
        let d = if backdrop <= 0.25 {
            ((16.0 * backdrop - 12.0) * backdrop + 4.0) * backdrop
        } else {
            backdrop.sqrt()
        };
        backdrop + (2.0 * source - 1.0) * (d - backdrop)
    }
}

/// Composite one source pixel onto a destination pixel.
pub fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>, mode: BlendMode) -> Rgba<u8> {
    let sa = unit(src[3]);
    if sa == 0.0 {
        return dst;
    }
    let da = unit(dst[3]);
    let out_a = sa + da * (1.0 - sa);

    let mut out = [0u8; 4];
    for c in 0..3 {
        let cs = unit(src[c]);
        let cb = unit(dst[c]);
        let mixed = match mode {
            BlendMode::SourceOver => cs,
            // Mixed by backdrop coverage so soft light over nothing is plain paint.
            BlendMode::SoftLight => (1.0 - da) * cs + da * soft_light_channel(cb, cs),
        };
        let premultiplied = sa * mixed + (1.0 - sa) * da * cb;
        out[c] = byte(if out_a > 0.0 { premultiplied / out_a } else { 0.0 });
    }
    out[3] = byte(out_a);
    Rgba(out)
}

/// Blend `layer` over the whole of `dest`, stretched nearest-neighbor.
pub fn blend_stretched(layer: &RgbaImage, dest: &mut RgbaImage, mode: BlendMode) {
    let (lw, lh) = layer.dimensions();
    let (dw, dh) = dest.dimensions();
    if lw == 0 || lh == 0 {
        return;
    }

    for y in 0..dh {
        let ly = nearest(y, lh, dh);
        for x in 0..dw {
            let src = *layer.get_pixel(nearest(x, lw, dw), ly);
            let px = dest.get_pixel_mut(x, y);
            *px = blend_pixel(*px, src, mode);
        }
    }
}

/// Paint `image` onto `dest` as 8-bit grayscale through its display window,
/// stretched nearest-neighbor.
pub fn paint_windowed_gray(image: &ScanImage, dest: &mut RgbaImage) {
    let (ih, iw) = image.pixels.dim();
    let (dw, dh) = dest.dimensions();
    if ih == 0 || iw == 0 {
        return;
    }

    let width = image.window_width.max(1.0);
    let lower = image.window_center - width / 2.0;
    for y in 0..dh {
        let sy = nearest(y, ih as u32, dh) as usize;
        for x in 0..dw {
            let sx = nearest(x, iw as u32, dw) as usize;
            let t = ((image.pixels[[sy, sx]] as f64 - lower) / width).clamp(0.0, 1.0);
            let v = (t * 255.0).round() as u8;
            dest.put_pixel(x, y, Rgba([v, v, v, 255]));
        }
    }
}

/// Segment `image` and blend the result onto `dest`: the attenuation layer
/// with soft light when the filter is enabled, then the boundary overlay.
pub fn apply_segmentation_overlay(
    ws: &mut SegmentationWorkspace,
    image: &ScanImage,
    scan: &mut ScanData,
    dest: &mut RgbaImage,
) -> Result<SegmentationSummary> {
    let summary = ws.run(image, scan)?;
    if scan.attenuation.is_enabled() {
        blend_stretched(ws.attenuation_overlay(), dest, BlendMode::SoftLight);
    }
    blend_stretched(ws.overlay(), dest, BlendMode::SourceOver);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_rgba_floors() {
        assert_eq!(background_rgba([0.5, 1.0, 0.0]).0, [127, 255, 0, 255]);
    }

    #[test]
    fn test_fill_with_background_defaults_to_black() {
        let mut surface = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 9]));
        fill_with_background(&mut surface, None);
        assert!(surface.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_blit_region_offsets_into_source() {
        let mut source = RgbaImage::new(4, 2);
        source.put_pixel(2, 0, Rgba([1, 0, 0, 255]));
        source.put_pixel(3, 1, Rgba([2, 0, 0, 255]));
        let mut dest = RgbaImage::new(2, 2);
        blit_region(&source, Placement { sx: 2, sy: 0, width: 2, height: 2 }, &mut dest);
        assert_eq!(dest.get_pixel(0, 0).0, [1, 0, 0, 255]);
        assert_eq!(dest.get_pixel(1, 1).0, [2, 0, 0, 255]);
    }

    #[test]
    fn test_blit_region_stretches() {
        let mut source = RgbaImage::new(2, 1);
        source.put_pixel(0, 0, Rgba([10, 0, 0, 255]));
        source.put_pixel(1, 0, Rgba([20, 0, 0, 255]));
        let mut dest = RgbaImage::new(4, 2);
        blit_region(&source, Placement::whole(2, 1), &mut dest);
        let row: Vec<u8> = (0..4).map(|x| dest.get_pixel(x, 1)[0]).collect();
        assert_eq!(row, vec![10, 10, 20, 20]);
    }

    #[test]
    fn test_source_over_opaque_replaces() {
        let out = blend_pixel(Rgba([10, 20, 30, 255]), Rgba([0, 0, 255, 255]), BlendMode::SourceOver);
        assert_eq!(out.0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_transparent_layer_is_noop() {
        let dst = Rgba([10, 20, 30, 255]);
        assert_eq!(blend_pixel(dst, Rgba([0, 0, 0, 0]), BlendMode::SoftLight), dst);
        assert_eq!(blend_pixel(dst, Rgba([0, 0, 0, 0]), BlendMode::SourceOver), dst);
    }

    #[test]
    fn test_soft_light_black_darkens() {
        // Opaque black soft light squares the backdrop.
        let out = blend_pixel(Rgba([128, 255, 0, 255]), Rgba([0, 0, 0, 255]), BlendMode::SoftLight);
        assert_eq!(out.0, [64, 255, 0, 255]);
    }

    #[test]
    fn test_paint_windowed_gray_clamps() {
        let pixels = ndarray::Array2::from_shape_vec((1, 3), vec![0u32, 50, 100]).unwrap();
        let mut image = ScanImage::new(pixels, 8);
        image.window_center = 50.0;
        image.window_width = 50.0;
        let mut dest = RgbaImage::new(3, 1);
        paint_windowed_gray(&image, &mut dest);
        let row: Vec<u8> = (0..3).map(|x| dest.get_pixel(x, 0)[0]).collect();
        assert_eq!(row, vec![0, 128, 255]);
    }
}
