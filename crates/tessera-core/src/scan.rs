use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::{
    ATTENUATION_DISABLED_BASELINE, DEFAULT_ATTENUATION_EXPONENT, DEFAULT_ATTENUATION_SCALE,
};

/// A single-channel source image attached to a viewport.
///
/// Pixels are raw stored values, row-major, shape = (height, width).
#[derive(Clone, Debug)]
pub struct ScanImage {
    pub pixels: Array2<u32>,
    /// Number of significant bits per stored sample.
    pub bits_stored: u8,
    /// Whether the stored values still need to be inverted for display.
    pub invert: bool,
    pub min_pixel_value: u32,
    pub max_pixel_value: u32,
    pub window_center: f64,
    pub window_width: f64,
    /// Frame of reference this image belongs to, if known.
    pub frame_of_reference: Option<String>,
}

impl ScanImage {
    pub fn new(pixels: Array2<u32>, bits_stored: u8) -> Self {
        let min = pixels.iter().copied().min().unwrap_or(0);
        let max = pixels.iter().copied().max().unwrap_or(0);
        Self {
            pixels,
            bits_stored,
            invert: false,
            min_pixel_value: min,
            max_pixel_value: max,
            window_center: (min as f64 + max as f64) / 2.0,
            window_width: (max - min).max(1) as f64,
            frame_of_reference: None,
        }
    }

    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    /// Rewrite inverted stored values so that bright means dense.
    ///
    /// Every sample becomes `2^bits_stored - p`, the value range and window
    /// center are mirrored accordingly, and the `invert` flag is cleared.
    /// Does nothing when the image is not flagged as inverted.
    pub fn correct_if_inverted(&mut self) {
        if !self.invert {
            return;
        }
        let max_value = 1u64 << self.bits_stored.min(32);
        let flip = |p: u32| (max_value.saturating_sub(p as u64)).min(u32::MAX as u64) as u32;

        self.pixels.mapv_inplace(flip);

        let min = flip(self.max_pixel_value);
        let max = flip(self.min_pixel_value);
        self.min_pixel_value = min;
        self.max_pixel_value = max;
        self.window_center = max_value as f64 - self.window_center;
        self.invert = false;
    }
}

/// Border cutoffs in source pixels. Cells above `top`, below `bottom`,
/// left of `left` or right of `right` are excluded from analysis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BorderLinesRepr")]
pub struct BorderLines {
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
    pub right: Option<f64>,
}

/// Accepts both the positional metadata form `[top, bottom, left, right]`
/// (entries may be null) and a named table.
#[derive(Deserialize)]
#[serde(untagged)]
enum BorderLinesRepr {
    Positional(Vec<Option<f64>>),
    Named {
        #[serde(default)]
        top: Option<f64>,
        #[serde(default)]
        bottom: Option<f64>,
        #[serde(default)]
        left: Option<f64>,
        #[serde(default)]
        right: Option<f64>,
    },
}

impl From<BorderLinesRepr> for BorderLines {
    fn from(repr: BorderLinesRepr) -> Self {
        match repr {
            BorderLinesRepr::Positional(values) => {
                let at = |i: usize| values.get(i).copied().flatten();
                Self {
                    top: at(0),
                    bottom: at(1),
                    left: at(2),
                    right: at(3),
                }
            }
            BorderLinesRepr::Named {
                top,
                bottom,
                left,
                right,
            } => Self {
                top,
                bottom,
                left,
                right,
            },
        }
    }
}

/// Radial attenuation filter parameters.
///
/// `weight = baseline + (1 - baseline) * d^exponent * scale` for a normalized
/// distance `d` from the chest-wall edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttenuationFilter {
    #[serde(rename = "alpha", default = "default_baseline")]
    pub baseline: f64,
    #[serde(rename = "beta", default = "default_exponent")]
    pub exponent: f64,
    #[serde(rename = "k", default = "default_scale")]
    pub scale: f64,
}

fn default_baseline() -> f64 {
    ATTENUATION_DISABLED_BASELINE
}
fn default_exponent() -> f64 {
    DEFAULT_ATTENUATION_EXPONENT
}
fn default_scale() -> f64 {
    DEFAULT_ATTENUATION_SCALE
}
fn default_true() -> bool {
    true
}

impl Default for AttenuationFilter {
    fn default() -> Self {
        Self {
            baseline: ATTENUATION_DISABLED_BASELINE,
            exponent: DEFAULT_ATTENUATION_EXPONENT,
            scale: DEFAULT_ATTENUATION_SCALE,
        }
    }
}

impl AttenuationFilter {
    /// The filter only takes part when its baseline is below 1.
    pub fn is_enabled(&self) -> bool {
        self.baseline < ATTENUATION_DISABLED_BASELINE
    }

    pub fn weight(&self, distance: f64) -> f64 {
        self.baseline + (1.0 - self.baseline) * distance.powf(self.exponent) * self.scale
    }
}

/// Per-image analysis parameters and results.
///
/// Field names on the wire follow the image metadata form, so the same
/// structure deserializes from the metadata JSON and from TOML configs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanData {
    #[serde(default)]
    pub border_lines: BorderLines,
    /// Exclusion polygons in source-pixel `[x, y]` coordinates.
    #[serde(default)]
    pub polygons: Vec<Vec<[f64; 2]>>,
    #[serde(rename = "th1")]
    pub primary_threshold: f64,
    #[serde(rename = "th2")]
    pub secondary_threshold: f64,
    #[serde(rename = "breastFilter", default)]
    pub attenuation: AttenuationFilter,
    /// Display rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub invert: bool,
    #[serde(rename = "showFGTBorder", default = "default_true")]
    pub show_secondary_border: bool,
    #[serde(rename = "showFGTRegion", default)]
    pub show_secondary_region: bool,

    // -- Outputs, written by the segmentation run --
    #[serde(default)]
    pub left_orientation: bool,
    #[serde(rename = "breastArea", default)]
    pub primary_area: f64,
    #[serde(rename = "FGTArea", default)]
    pub secondary_area: f64,
}

impl ScanData {
    pub fn new(primary_threshold: f64, secondary_threshold: f64) -> Self {
        Self {
            border_lines: BorderLines::default(),
            polygons: Vec::new(),
            primary_threshold,
            secondary_threshold,
            attenuation: AttenuationFilter::default(),
            rotation: 0.0,
            invert: false,
            show_secondary_border: true,
            show_secondary_region: false,
            left_orientation: false,
            primary_area: 0.0,
            secondary_area: 0.0,
        }
    }

    /// Rows or columns: whether the rotation keeps the image axis-aligned
    /// with its original horizontal axis.
    pub fn is_horizontal_axis(&self) -> bool {
        self.rotation.rem_euclid(180.0) == 0.0
    }
}
