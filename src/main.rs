use clap::Parser;
use image::ImageReader;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use trafficlight::{Detection, DetectionPipeline, DetectorConfig, Frame, Strategy};

#[derive(Parser)]
#[command(name = "trafficlight")]
#[command(about = "Detect the lit state of traffic lights in images")]
struct Cli {
    /// Input image files, processed in order
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// TOML detector configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Region proposal strategy (overrides the config file)
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Write annotated images to this directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Save per-band masks to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print one JSON object per image instead of plain text
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct RegionReport {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    color: Option<trafficlight::LightColor>,
    evidence: trafficlight::BandCounts,
}

#[derive(Serialize)]
struct FrameReport<'a> {
    image: &'a Path,
    status: trafficlight::FrameStatus,
    regions: Vec<RegionReport>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "trafficlight=debug" } else { "trafficlight=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => DetectorConfig::load(path)?,
        None => DetectorConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config = config.with_strategy(strategy);
    }
    let pipeline = DetectionPipeline::new(config)?;

    if let Some(dir) = &args.output {
        std::fs::create_dir_all(dir)?;
    }
    if let Some(dir) = &args.debug_out {
        prepare_debug_dir(dir)?;
    }

    for path in &args.images {
        // A bad frame is skipped, the loop keeps going
        if let Err(e) = process_image(&pipeline, path, &args) {
            warn!("Skipping {}: {:#}", path.display(), e);
        }
    }

    Ok(())
}

fn process_image(pipeline: &DetectionPipeline, path: &Path, args: &Cli) -> anyhow::Result<()> {
    debug!("Loading image: {}", path.display());
    let img = ImageReader::open(path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;

    // Decoding to 3-channel colour belongs to the transport side
    let frame = Frame::from_rgb(img.to_rgb8())?;
    let detection = pipeline.detect(&frame)?;

    report(path, &detection, args.json)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());

    if let Some(dir) = &args.output {
        let out = dir.join(format!("{stem}_annotated.png"));
        detection
            .annotated
            .as_rgb()
            .save(&out)
            .map_err(|e| anyhow::anyhow!("Failed to save annotated image: {}", e))?;
        debug!("Saved {}", out.display());
    }

    if let Some(dir) = &args.debug_out {
        for (color, mask) in pipeline.band_masks(&frame) {
            let out = dir.join(format!("{stem}_{color}_mask.png"));
            mask.save(&out)
                .map_err(|e| anyhow::anyhow!("Failed to save debug mask: {}", e))?;
            debug!("Debug: saved {}", out.display());
        }
    }

    Ok(())
}

fn report(path: &Path, detection: &Detection, json: bool) -> anyhow::Result<()> {
    if json {
        let report = FrameReport {
            image: path,
            status: detection.status,
            regions: detection
                .regions
                .iter()
                .map(|r| RegionReport {
                    x: r.bounds.x,
                    y: r.bounds.y,
                    width: r.bounds.width,
                    height: r.bounds.height,
                    color: r.color,
                    evidence: r.evidence,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("{}: {}", path.display(), detection.status);
    for r in &detection.regions {
        let color = r.color.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string());
        println!(
            "  {} at ({}, {}) {}x{} - red={} yellow={} green={}",
            color, r.bounds.x, r.bounds.y, r.bounds.width, r.bounds.height,
            r.evidence.red, r.evidence.yellow, r.evidence.green
        );
    }
    Ok(())
}

/// The directory must be empty or non-existent
fn prepare_debug_dir(dir: &Path) -> anyhow::Result<()> {
    if dir.exists() {
        let entries = std::fs::read_dir(dir)?;
        if entries.count() > 0 {
            return Err(anyhow::anyhow!("Debug directory is not empty: {}", dir.display()));
        }
    } else {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
