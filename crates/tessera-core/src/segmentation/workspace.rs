use image::{Rgba, RgbaImage};
use ndarray::{Array2, Zip};
use tracing::debug;

use crate::consts::{DOWNSAMPLE_WIDTH_STEP, MAX_DOWNSAMPLE_FACTOR};
use crate::error::{Result, TesseraError};
use crate::scan::{ScanData, ScanImage};

use super::attenuation::apply_attenuation;
use super::boundary::{extract_boundaries, OverlayStyle};
use super::labeling::label_primary_region;
use super::mask::generate_mask;
use super::orientation::{detect_laterality, Laterality};
use super::secondary::classify_secondary;

/// Downsample factor for a source image of the given width.
pub fn downsample_factor(width: usize) -> usize {
    MAX_DOWNSAMPLE_FACTOR.min(1 + width / DOWNSAMPLE_WIDTH_STEP)
}

/// Result of one segmentation run.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationSummary {
    pub factor: usize,
    /// Working resolution as (height, width).
    pub working_dims: (usize, usize),
    /// Primary region size in source pixels (cells x factor²).
    pub primary_area: usize,
    /// Secondary region size in source pixels (cells x factor²).
    pub secondary_area: usize,
    pub laterality: Laterality,
    /// False when the density windows were empty and `laterality` is the
    /// fallback side.
    pub orientation_determined: bool,
}

/// Owned working set for the segmentation pipeline.
///
/// Buffers live at working resolution and are reused across runs. They are
/// reallocated only when the source image dimensions change, and every run
/// overwrites them completely.
#[derive(Clone, Debug)]
pub struct SegmentationWorkspace {
    /// Source dimensions the buffers were sized for, as (height, width).
    source_dims: (usize, usize),
    pub(crate) factor: usize,
    pub(crate) scaled: Array2<u32>,
    pub(crate) mask: Array2<u8>,
    pub(crate) primary: Array2<u8>,
    pub(crate) secondary: Array2<u8>,
    pub(crate) attenuation: Array2<f32>,
    pub(crate) overlay: RgbaImage,
    pub(crate) attenuation_overlay: RgbaImage,
}

impl Default for SegmentationWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentationWorkspace {
    pub fn new() -> Self {
        Self {
            source_dims: (0, 0),
            factor: 1,
            scaled: Array2::zeros((0, 0)),
            mask: Array2::zeros((0, 0)),
            primary: Array2::zeros((0, 0)),
            secondary: Array2::zeros((0, 0)),
            attenuation: Array2::zeros((0, 0)),
            overlay: RgbaImage::new(0, 0),
            attenuation_overlay: RgbaImage::new(0, 0),
        }
    }

    /// Resize the working set for a source image of `height` x `width`.
    /// Returns true when buffers were reallocated.
    pub fn ensure_dims(&mut self, height: usize, width: usize) -> bool {
        if self.source_dims == (height, width) {
            return false;
        }

        let factor = downsample_factor(width);
        let aux_h = height.div_ceil(factor);
        let aux_w = width.div_ceil(factor);
        debug!(height, width, factor, aux_h, aux_w, "Allocating segmentation workspace");

        self.source_dims = (height, width);
        self.factor = factor;
        self.scaled = Array2::zeros((aux_h, aux_w));
        self.mask = Array2::ones((aux_h, aux_w));
        self.primary = Array2::zeros((aux_h, aux_w));
        self.secondary = Array2::zeros((aux_h, aux_w));
        self.attenuation = Array2::ones((aux_h, aux_w));
        self.overlay = RgbaImage::new(aux_w as u32, aux_h as u32);
        self.attenuation_overlay = RgbaImage::new(aux_w as u32, aux_h as u32);
        true
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    /// Working resolution as (height, width).
    pub fn working_dims(&self) -> (usize, usize) {
        self.scaled.dim()
    }

    pub fn scaled(&self) -> &Array2<u32> {
        &self.scaled
    }

    pub fn mask(&self) -> &Array2<u8> {
        &self.mask
    }

    pub fn primary(&self) -> &Array2<u8> {
        &self.primary
    }

    pub fn secondary(&self) -> &Array2<u8> {
        &self.secondary
    }

    pub fn attenuation(&self) -> &Array2<f32> {
        &self.attenuation
    }

    /// Boundary/fill overlay at working resolution.
    pub fn overlay(&self) -> &RgbaImage {
        &self.overlay
    }

    /// Attenuation weights rendered as a black alpha layer.
    pub fn attenuation_overlay(&self) -> &RgbaImage {
        &self.attenuation_overlay
    }

    /// Nearest-neighbor subsample of the source into `scaled`.
    pub fn downsample(&mut self, source: &Array2<u32>) {
        let factor = self.factor;
        Zip::indexed(&mut self.scaled).for_each(|(y, x), value| {
            *value = source[[y * factor, x * factor]];
        });
    }

    /// Run the full pipeline for one image and write the output fields of
    /// `scan` (`primary_area`, `secondary_area`, `left_orientation`).
    pub fn run(&mut self, image: &ScanImage, scan: &mut ScanData) -> Result<SegmentationSummary> {
        let (height, width) = image.pixels.dim();
        if height == 0 || width == 0 {
            return Err(TesseraError::InvalidDimensions { width, height });
        }

        self.ensure_dims(height, width);
        self.downsample(&image.pixels);
        generate_mask(self, scan);

        let primary_cells = label_primary_region(self, scan.primary_threshold);
        let horizontal = scan.is_horizontal_axis();
        let detected = detect_laterality(self, horizontal);
        let laterality = detected.unwrap_or_else(|| {
            debug!("Orientation windows empty, falling back to left");
            Laterality::Left
        });

        let area_scale = self.factor * self.factor;
        scan.primary_area = (primary_cells * area_scale) as f64;
        scan.left_orientation = laterality == Laterality::Left;

        self.reset_attenuation();
        if scan.attenuation.is_enabled() {
            apply_attenuation(self, &scan.attenuation, laterality, horizontal);
        }

        let secondary_cells = classify_secondary(self, scan.secondary_threshold, &scan.attenuation);
        scan.secondary_area = (secondary_cells * area_scale) as f64;

        extract_boundaries(self, OverlayStyle::from(&*scan));

        debug!(
            primary_cells,
            secondary_cells,
            ?laterality,
            factor = self.factor,
            "Segmentation complete"
        );

        Ok(SegmentationSummary {
            factor: self.factor,
            working_dims: self.working_dims(),
            primary_area: primary_cells * area_scale,
            secondary_area: secondary_cells * area_scale,
            laterality,
            orientation_determined: detected.is_some(),
        })
    }

    fn reset_attenuation(&mut self) {
        self.attenuation.fill(1.0);
        for px in self.attenuation_overlay.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }
}
