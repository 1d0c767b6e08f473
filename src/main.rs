use anyhow::{bail, Context, Result};
use clap::Parser;
use floor_overlay::{
    LabelMap, Overlay, OverlayConfig, OverlayMode, OverlayRequest, Overlayer, PrecomputedMask,
    SegmentationModel,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Room photograph
    #[arg(long)]
    room: PathBuf,

    /// Floor tile or carpet image
    #[arg(long)]
    texture: PathBuf,

    /// Overlay mode: floor, carpet-ellipse (e) or carpet-trapezoid (t)
    #[arg(short, long, default_value = "floor")]
    mode: OverlayMode,

    /// Precomputed floor mask (white = floor)
    #[arg(long, conflicts_with_all = ["labels", "model"])]
    mask: Option<PathBuf>,

    /// Precomputed per-pixel class label map (ADE20K indices)
    #[arg(long, conflicts_with = "model")]
    labels: Option<PathBuf>,

    /// Path to segmentation model (ONNX file)
    /// Requires the `onnx` feature
    #[arg(long)]
    model: Option<PathBuf>,

    /// Physical carpet size as width/height, e.g. 13/9
    #[arg(long)]
    carpet_dimensions: Option<String>,

    /// Output composite path (default: <room>_<mode>.png next to the room)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the carpet alone with an alpha channel (carpet modes)
    #[arg(long)]
    transparent_output: Option<PathBuf>,

    /// Write intermediate images into this directory
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// Gaussian kernel used to feather carpet edges
    #[arg(long, default_value_t = 15)]
    feather_kernel: u32,

    /// Mask values above this count as floor
    #[arg(long, default_value_t = 40)]
    mask_threshold: u8,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("floor-overlay starting");
    tracing::info!("Mode: {}", args.mode);

    let room = image::open(&args.room)
        .with_context(|| format!("Failed to read room image {}", args.room.display()))?
        .to_rgb8();
    let texture = image::open(&args.texture)
        .with_context(|| format!("Failed to read texture {}", args.texture.display()))?;
    tracing::info!("Room: {}x{}", room.width(), room.height());
    tracing::info!("Texture: {}x{}", texture.width(), texture.height());

    let model = load_model(&args)?;
    tracing::debug!("Segmentation input size: {:?}", model.input_size());

    if !args.mode.is_carpet() && args.carpet_dimensions.is_some() {
        tracing::warn!("--carpet-dimensions is ignored in floor mode");
    }

    let config = OverlayConfig {
        feather_kernel: args.feather_kernel,
        mask_threshold: args.mask_threshold,
        ..OverlayConfig::default()
    };

    let mut request = OverlayRequest::new(room, texture, args.mode);
    request.carpet_dimensions = args.carpet_dimensions.clone();

    let started = Instant::now();
    let overlay = Overlayer::new(model.as_ref(), config)
        .run(&request)
        .context("Overlay failed")?;
    tracing::info!(
        "Overlay finished in {:.1}ms",
        started.elapsed().as_secs_f64() * 1000.0
    );

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.room, args.mode));
    overlay
        .composite
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    tracing::info!("Wrote {}", output.display());

    if let Some(path) = &args.transparent_output {
        match &overlay.transparent {
            Some(transparent) => {
                transparent
                    .save(path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!("Wrote {}", path.display());
            }
            None => tracing::warn!("No transparent output in {} mode", args.mode),
        }
    }

    if let Some(dir) = &args.dump_dir {
        dump_artifacts(dir, &overlay)?;
    }

    Ok(())
}

fn load_model(args: &Args) -> Result<Box<dyn SegmentationModel>> {
    if let Some(path) = &args.mask {
        let mask = PrecomputedMask::open(path)?.with_threshold(args.mask_threshold);
        return Ok(Box::new(mask));
    }
    if let Some(path) = &args.labels {
        return Ok(Box::new(LabelMap::open(path)?));
    }
    if let Some(path) = &args.model {
        return load_onnx(path);
    }
    bail!("No floor source given: pass --mask, --labels or --model")
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path) -> Result<Box<dyn SegmentationModel>> {
    let model = floor_overlay::segmentation::OnnxSegmenter::new(path)
        .context("Failed to load segmentation model")?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path) -> Result<Box<dyn SegmentationModel>> {
    bail!(
        "Cannot load {}: built without the `onnx` feature",
        path.display()
    )
}

fn default_output(room: &Path, mode: OverlayMode) -> PathBuf {
    let stem = room
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "room".to_string());
    room.with_file_name(format!("{}_{}.png", stem, mode.abbreviation()))
}

fn dump_artifacts(dir: &Path, overlay: &Overlay) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let artifacts = &overlay.artifacts;
    let gray = [
        ("floor_mask.png", &artifacts.floor_mask),
        ("silhouette.png", &artifacts.silhouette),
    ];
    let color = [
        ("warped_texture.png", &artifacts.warped_texture),
        ("marked_floor.png", &artifacts.marked_floor),
        ("carpet_canvas.png", &artifacts.carpet_canvas),
    ];

    for (name, image) in gray {
        if let Some(image) = image {
            let path = dir.join(name);
            image
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::debug!("Dumped {}", path.display());
        }
    }
    for (name, image) in color {
        if let Some(image) = image {
            let path = dir.join(name);
            image
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::debug!("Dumped {}", path.display());
        }
    }

    tracing::info!("Intermediate images written to {}", dir.display());
    Ok(())
}
