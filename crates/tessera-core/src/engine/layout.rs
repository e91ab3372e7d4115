use serde::{Deserialize, Serialize};

/// Rectangle in a viewport's source buffer, in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub sx: u32,
    pub sy: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Placement covering a whole surface of the given size.
    pub fn whole(width: u32, height: u32) -> Self {
        Self {
            sx: 0,
            sy: 0,
            width,
            height,
        }
    }
}

/// Placement inside the shared buffer in [0, 1] coordinates, y growing
/// upward, as consumed by the render backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// One occupant's slot in the shared buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Slot {
    pub placement: Placement,
    pub rect: NormalizedRect,
}

/// Shared buffer size and the slot of each occupant, in input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OffscreenLayout {
    pub width: u32,
    pub height: u32,
    pub slots: Vec<Slot>,
}

/// Device-pixel size of a client (CSS pixel) length.
pub fn device_pixels(client: f64, device_pixel_ratio: f64) -> u32 {
    (client * device_pixel_ratio).floor().max(0.0) as u32
}

fn ratio(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Pack occupants of the given device-pixel sizes side by side.
///
/// The buffer is as wide as all occupants together and as tall as the
/// tallest. Each occupant gets the next horizontal slice at `sy = 0`; shorter
/// occupants are bottom-aligned in normalized space.
pub fn compute_layout(sizes: &[(u32, u32)]) -> OffscreenLayout {
    let width: u32 = sizes.iter().map(|&(w, _)| w).sum();
    let height = sizes.iter().map(|&(_, h)| h).max().unwrap_or(0);

    let mut offset = 0u32;
    let slots = sizes
        .iter()
        .map(|&(w, h)| {
            let placement = Placement {
                sx: offset,
                sy: 0,
                width: w,
                height: h,
            };
            offset += w;

            let x0 = ratio(placement.sx, width);
            let y0 = ratio(height - h, height);
            let rect = NormalizedRect {
                x0,
                y0,
                x1: x0 + ratio(w, width),
                y1: y0 + ratio(h, height),
            };
            Slot { placement, rect }
        })
        .collect();

    OffscreenLayout {
        width,
        height,
        slots,
    }
}
