use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tessera_core::engine::{HeadlessBackend, ManualFrameHost, NullSink};
use tessera_core::io::save_png;
use tessera_core::viewport::{Element, ViewportInput, ViewportKind};
use tessera_core::{EngineConfig, RenderingEngine};

use crate::summary::{print_layout_summary, LayoutRow};

#[derive(Args)]
pub struct LayoutArgs {
    /// Client sizes of the viewports, as WIDTHxHEIGHT
    #[arg(required = true, value_parser = parse_size)]
    pub sizes: Vec<(f64, f64)>,

    /// Device-pixel ratio
    #[arg(long, default_value = "1.0")]
    pub dpr: f64,

    /// Render the shared buffer once and save it as PNG
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn parse_size(s: &str) -> std::result::Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| format!("invalid dimension '{v}' in '{s}'"))
    };
    Ok((parse(w)?, parse(h)?))
}

pub fn run(args: &LayoutArgs) -> Result<()> {
    if !(args.dpr.is_finite() && args.dpr > 0.0) {
        bail!("Device-pixel ratio must be positive, got {}", args.dpr);
    }

    let mut engine = RenderingEngine::new(
        EngineConfig::default(),
        Some(Box::new(HeadlessBackend::new())),
        Box::new(ManualFrameHost::with_device_pixel_ratio(args.dpr)),
        Box::new(NullSink),
    )?;

    let inputs = args
        .sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| {
            let id = format!("viewport-{i}");
            let element = Element::new(format!("{id}-element"), w, h);
            ViewportInput::new(id, ViewportKind::Stack, element)
        })
        .collect();
    engine.set_viewports(inputs)?;

    let backend = engine
        .backend()
        .context("Engine was created without a render backend")?;
    let rows = engine
        .get_viewports()?
        .iter()
        .map(|vp| LayoutRow {
            id: vp.id().to_string(),
            placement: vp.placement(),
            rect: backend
                .renderer(vp.id())
                .map(|r| r.viewport())
                .unwrap_or_default(),
        })
        .collect::<Vec<_>>();

    print_layout_summary(engine.shared_buffer_size(), args.dpr, &rows);

    if let Some(ref path) = args.output {
        let buffer = engine.debug_render()?;
        save_png(&buffer, path)
            .with_context(|| format!("Failed to write buffer to {}", path.display()))?;
        println!("Shared buffer saved to {}", path.display());
    }

    engine.destroy();
    Ok(())
}
