use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use sketch_composer::assets::AssetSet;
use sketch_composer::assets::decode::load_image_file;
use sketch_composer::assets::media::{MediaTools, probe_video};
use sketch_composer::assets::motion::VideoLoop;
use sketch_composer::capture::session::{CaptureOptions, CaptureSession};
use sketch_composer::capture::source::{CompositorSource, FrameSource};
use sketch_composer::composition::config::CompositionConfig;
use sketch_composer::encode::ffmpeg::{FfmpegWebmSink, FfmpegWebmSinkOpts};
use sketch_composer::logging::{LoggingConfig, init_logging};
use sketch_composer::render::cpu::CpuSurface;
use sketch_composer::server::{FfmpegCli, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "sketch-composer", version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, env = "SKETCH_COMPOSER_LOG", default_value = "info")]
    log_level: String,

    /// Emit JSON log lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single preview frame as a PNG.
    Frame(FrameArgs),
    /// Record a WebM until the auto-stop timer fires (requires `ffmpeg` on PATH).
    Record(RecordArgs),
    /// Run the HTTP composition service.
    Serve(ServerConfig),
}

#[derive(clap::Args, Debug)]
struct InputArgs {
    /// Composition JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sketch image.
    #[arg(long)]
    sketch: Option<PathBuf>,

    /// Background template image.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Looping background video.
    #[arg(long)]
    video: Option<PathBuf>,

    /// Font for the label (TTF/OTF). Text is skipped without one.
    #[arg(long, env = "SKETCH_COMPOSER_FONT")]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Presentation time in seconds.
    #[arg(long, default_value_t = 0.0)]
    t: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RecordArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Override the configured duration (seconds, 3..=15).
    #[arg(long)]
    duration: Option<u32>,

    /// Output WebM path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LoggingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Record(args) => cmd_record(args),
        Command::Serve(config) => cmd_serve(config),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<CompositionConfig> {
    let cfg = match path {
        Some(p) => CompositionConfig::from_json_file(p)?,
        None => CompositionConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn load_assets(input: &InputArgs) -> anyhow::Result<AssetSet> {
    let mut assets = AssetSet::new();
    if let Some(path) = &input.sketch {
        assets = assets.with_sketch(load_image_file(path)?);
    }
    if let Some(path) = &input.template {
        assets = assets.with_template(load_image_file(path)?);
    }
    if let Some(path) = &input.video {
        let tools = MediaTools::default();
        let info = probe_video(&tools, path)
            .with_context(|| format!("probe background video '{}'", path.display()))?;
        assets = assets.with_motion(VideoLoop::new(tools, info));
    }
    Ok(assets)
}

fn make_source(input: &InputArgs, cfg: CompositionConfig) -> anyhow::Result<CompositorSource> {
    let assets = load_assets(input)?;
    let surface = CpuSurface::new(cfg.canvas.width, cfg.canvas.height)?;
    let surface = match &input.font {
        Some(font) => surface.with_font_file(font)?,
        None => surface.with_system_font(None),
    };
    Ok(CompositorSource::with_surface(surface, cfg, assets))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.input.config.as_deref())?;
    let mut source = make_source(&args.input, cfg)?;
    let frame = source.frame_at(args.t)?;
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame.write_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_record(args: RecordArgs) -> anyhow::Result<()> {
    let mut cfg = read_config(args.input.config.as_deref())?;
    if let Some(secs) = args.duration {
        cfg = cfg.with_duration_secs(secs);
        cfg.validate()?;
    }
    let duration = Duration::from_secs(u64::from(cfg.duration_secs));
    let source = make_source(&args.input, cfg)?;

    let session = CaptureSession::with_notices(|notice| {
        eprintln!("[{:?}] {}", notice.kind, notice.message);
    });
    let (tx, rx) = mpsc::channel();
    session.start(
        Box::new(source),
        Box::new(FfmpegWebmSink::new(FfmpegWebmSinkOpts::new(&args.out))),
        CaptureOptions::new(duration),
        move |result| {
            let _ = tx.send(result);
        },
    )?;

    let artifact = rx
        .recv()
        .context("capture session ended without a result")??;
    session.wait();
    eprintln!(
        "wrote {} ({} frames, {} bytes, suggested name {})",
        args.out.display(),
        artifact.frame_count,
        artifact.size,
        artifact.suggested_name
    );
    Ok(())
}

fn cmd_serve(config: ServerConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("start tokio runtime")?;
    let renderer = FfmpegCli::new(config.tools());
    runtime.block_on(sketch_composer::server::serve(config, renderer))
}
