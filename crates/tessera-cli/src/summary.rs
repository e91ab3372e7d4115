use std::path::Path;

use console::Style;
use tessera_core::engine::{NormalizedRect, Placement};
use tessera_core::scan::ScanData;
use tessera_core::segmentation::SegmentationSummary;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn rule(s: &Styles) {
    println!("  {}", s.title.apply_to("\u{2550}".repeat(20)));
}

pub fn print_segmentation_summary(
    image: &Path,
    scan: &ScanData,
    summary: &SegmentationSummary,
    output: Option<&Path>,
) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Tessera Segmentation"));
    rule(&s);
    println!();

    println!("  {:<14}{}", s.label.apply_to("Input"), s.path.apply_to(image.display()));
    if let Some(path) = output {
        println!("  {:<14}{}", s.label.apply_to("Overlay"), s.path.apply_to(path.display()));
    }
    let (h, w) = summary.working_dims;
    println!(
        "  {:<14}{}",
        s.label.apply_to("Working grid"),
        s.value.apply_to(format!("{w}x{h} (factor {})", summary.factor))
    );
    println!();

    println!("  {}", s.header.apply_to("Parameters"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Primary"),
        s.value.apply_to(format!("> {}", scan.primary_threshold))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Secondary"),
        s.value.apply_to(format!("> {}", scan.secondary_threshold))
    );
    if scan.attenuation.is_enabled() {
        let f = &scan.attenuation;
        println!(
            "    {:<12}{}",
            s.label.apply_to("Attenuation"),
            s.method.apply_to(format!(
                "baseline {}, exponent {}, scale {}",
                f.baseline, f.exponent, f.scale
            ))
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Attenuation"),
            s.disabled.apply_to("off")
        );
    }
    if !scan.polygons.is_empty() {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Polygons"),
            s.value.apply_to(scan.polygons.len())
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Result"));
    let side = if summary.orientation_determined {
        s.method.apply_to(summary.laterality.to_string())
    } else {
        s.disabled.apply_to(format!("{} (undetermined)", summary.laterality))
    };
    println!("    {:<12}{}", s.label.apply_to("Laterality"), side);
    println!(
        "    {:<12}{}",
        s.label.apply_to("Primary"),
        s.value.apply_to(format!("{} px", summary.primary_area))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Secondary"),
        s.value.apply_to(format!("{} px", summary.secondary_area))
    );
    if summary.primary_area > 0 {
        let ratio = summary.secondary_area as f64 / summary.primary_area as f64 * 100.0;
        println!(
            "    {:<12}{}",
            s.label.apply_to("Ratio"),
            s.value.apply_to(format!("{ratio:.1}%"))
        );
    }
    println!();
}

/// One viewport's slot in the shared buffer.
pub struct LayoutRow {
    pub id: String,
    pub placement: Placement,
    pub rect: NormalizedRect,
}

pub fn print_layout_summary(buffer: (u32, u32), dpr: f64, rows: &[LayoutRow]) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Tessera Layout"));
    rule(&s);
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Buffer"),
        s.value.apply_to(format!("{}x{}", buffer.0, buffer.1))
    );
    println!("  {:<14}{}", s.label.apply_to("Pixel ratio"), s.value.apply_to(dpr));
    println!();

    println!("  {}", s.header.apply_to("Viewports"));
    for row in rows {
        let p = row.placement;
        let r = row.rect;
        println!(
            "    {:<12}{}  {}",
            s.label.apply_to(&row.id),
            s.value.apply_to(format!("{}x{} at ({}, {})", p.width, p.height, p.sx, p.sy)),
            s.method.apply_to(format!(
                "[{:.3}, {:.3}, {:.3}, {:.3}]",
                r.x0, r.y0, r.x1, r.y1
            ))
        );
    }
    println!();
}
