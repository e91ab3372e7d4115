use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use image::RgbaImage;
use tessera_core::engine::composite::{apply_segmentation_overlay, paint_windowed_gray};
use tessera_core::io::{load_scan_image, save_png};
use tessera_core::scan::ScanData;
use tessera_core::segmentation::SegmentationWorkspace;
use tracing::info;

use crate::summary::print_segmentation_summary;

#[derive(Args)]
pub struct SegmentArgs {
    /// Input grayscale image
    pub image: PathBuf,

    /// Scan parameters (thresholds, borders, polygons, filter) as TOML
    #[arg(long)]
    pub scan: PathBuf,

    /// Save the windowed image with the segmentation overlay as PNG
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &SegmentArgs) -> Result<()> {
    let scan_str = std::fs::read_to_string(&args.scan)
        .with_context(|| format!("Failed to read scan parameters from {}", args.scan.display()))?;
    let mut scan: ScanData = toml::from_str(&scan_str)
        .with_context(|| format!("Invalid scan parameters in {}", args.scan.display()))?;

    let mut image = load_scan_image(&args.image)
        .with_context(|| format!("Failed to load {}", args.image.display()))?;
    image.invert = scan.invert;
    image.correct_if_inverted();
    info!(
        width = image.width(),
        height = image.height(),
        bits = image.bits_stored,
        "Loaded scan image"
    );

    let mut ws = SegmentationWorkspace::new();
    let summary = match args.output {
        Some(ref path) => {
            let mut canvas = RgbaImage::new(image.width() as u32, image.height() as u32);
            paint_windowed_gray(&image, &mut canvas);
            let summary = apply_segmentation_overlay(&mut ws, &image, &mut scan, &mut canvas)?;
            save_png(&canvas, path)
                .with_context(|| format!("Failed to write overlay to {}", path.display()))?;
            summary
        }
        None => ws.run(&image, &mut scan)?,
    };

    print_segmentation_summary(&args.image, &scan, &summary, args.output.as_deref());
    Ok(())
}
