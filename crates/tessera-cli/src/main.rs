mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tessera", about = "Offscreen viewport compositing and scan segmentation")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a grayscale scan and report region areas
    Segment(commands::segment::SegmentArgs),
    /// Lay out stack viewports in the shared offscreen buffer
    Layout(commands::layout::LayoutArgs),
    /// Print or save the default engine config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Segment(args) => commands::segment::run(args),
        Commands::Layout(args) => commands::layout::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
