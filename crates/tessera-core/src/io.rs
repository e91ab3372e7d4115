use std::path::Path;

use image::{ColorType, ImageFormat, RgbaImage};
use ndarray::Array2;

use crate::error::{Result, TesseraError};
use crate::scan::ScanImage;

/// Load a single-channel scan image. Color sources are converted to luma.
///
/// 8-bit sources keep their 8-bit stored values; everything else is read as
/// 16-bit.
pub fn load_scan_image(path: &Path) -> Result<ScanImage> {
    let img = image::open(path)?;
    let eight_bit = matches!(
        img.color(),
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
    );

    let (w, h) = (img.width() as usize, img.height() as usize);
    if w == 0 || h == 0 {
        return Err(TesseraError::InvalidDimensions {
            width: w,
            height: h,
        });
    }

    let (samples, bits): (Vec<u32>, u8) = if eight_bit {
        let gray = img.to_luma8();
        (gray.into_raw().into_iter().map(u32::from).collect(), 8)
    } else {
        let gray = img.to_luma16();
        (gray.into_raw().into_iter().map(u32::from).collect(), 16)
    };

    let pixels = Array2::from_shape_vec((h, w), samples).map_err(|_| {
        TesseraError::InvalidDimensions {
            width: w,
            height: h,
        }
    })?;
    Ok(ScanImage::new(pixels, bits))
}

/// Save a composited surface as PNG.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
