use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use scenecast::{
    AssetStore, FfmpegSink, FfmpegSinkOpts, FrameIndex, FrameSampler, FrameSink, NoFonts,
    Orchestrator, RenderConfig, RenderResources, RenderThreading, SceneNode, StaticScene,
    WriterSink,
};

#[derive(Parser, Debug)]
#[command(name = "scenecast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render the whole sequence to a video (via `ffmpeg`) or a raw `.rgba` stream.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Scene tree JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Render config JSON (width, height, fps, duration, motionBlurSamples, ...).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Register an image asset, as `id=path`. Repeatable.
    #[arg(long = "asset", value_parser = parse_asset)]
    assets: Vec<(String, PathBuf)>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output path. A `.rgba` extension writes raw premultiplied frames; anything else goes
    /// through ffmpeg.
    #[arg(long)]
    out: PathBuf,

    /// Worker count (capped by SCENECAST_MAX_WORKERS, default 8).
    #[arg(long)]
    workers: Option<usize>,

    /// Overwrite output if it already exists.
    #[arg(long, default_value_t = true)]
    overwrite: bool,
}

fn parse_asset(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((id, path)) if !id.is_empty() && !path.is_empty() => {
            Ok((id.to_owned(), PathBuf::from(path)))
        }
        _ => Err(format!("expected id=path, got '{s}'")),
    }
}

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

struct Loaded {
    scene: StaticScene,
    config: RenderConfig,
    resources: RenderResources,
}

fn load(args: &SceneArgs) -> anyhow::Result<Loaded> {
    let json = std::fs::read_to_string(&args.scene)
        .with_context(|| format!("read scene '{}'", args.scene.display()))?;
    let scene = SceneNode::from_json_str(&json)
        .with_context(|| format!("parse scene '{}'", args.scene.display()))?;

    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?;
            serde_json::from_str::<RenderConfig>(&json)
                .with_context(|| format!("parse config '{}'", path.display()))?
        }
        None => RenderConfig::default(),
    };
    config.validate()?;

    let mut store = AssetStore::new();
    for (id, path) in &args.assets {
        store.load_file(id.as_str(), path)?;
    }
    tracing::info!(
        nodes = scene.node_count(),
        assets = store.image_count(),
        width = config.width,
        height = config.height,
        fps = config.fps,
        "scene loaded"
    );

    Ok(Loaded {
        scene: StaticScene(scene),
        config,
        resources: RenderResources::from_store(store, Arc::new(NoFonts)),
    })
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let loaded = load(&args.scene)?;
    let sampler = FrameSampler::new(loaded.resources);
    let frame = sampler.render_frame(&loaded.scene, &loaded.config, FrameIndex(args.frame))?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let loaded = load(&args.scene)?;
    let mut threading = RenderThreading::default();
    if let Some(n) = args.workers {
        threading = threading.with_workers(n);
    }
    let mut orch = Orchestrator::new(loaded.resources).with_threading(threading);

    let mut sink = open_sink(&args.out, args.overwrite)?;
    let stats = orch.render_sequence_with_progress(
        &loaded.scene,
        &loaded.config,
        &mut *sink,
        &mut |p| {
            if p.flushed == p.total || p.flushed.is_multiple_of(30) {
                tracing::info!(flushed = p.flushed, total = p.total, "progress");
            }
        },
    )?;

    eprintln!(
        "wrote {} ({} frames, {} workers)",
        args.out.display(),
        stats.frames_flushed,
        stats.workers
    );
    Ok(())
}

fn open_sink(out: &Path, overwrite: bool) -> anyhow::Result<Box<dyn FrameSink>> {
    if out.extension().is_some_and(|ext| ext == "rgba") {
        scenecast::encode::ffmpeg::ensure_parent_dir(out)?;
        let file = File::create(out).with_context(|| format!("create '{}'", out.display()))?;
        return Ok(Box::new(WriterSink::new(BufWriter::new(file))));
    }
    let opts = FfmpegSinkOpts {
        overwrite,
        ..FfmpegSinkOpts::new(out)
    };
    Ok(Box::new(FfmpegSink::new(opts)))
}
