use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use depthdrift::{
    DepthEstimator as _, FfmpegSink, FfmpegSinkOpts, Fps, FrameIndex, FrameRgb, GrayImageDepth,
    MotionParams, ParallaxSession, SessionOpts,
};

#[derive(Parser, Debug)]
#[command(name = "depthdrift", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single parallax frame as a PNG.
    Frame(FrameArgs),
    /// Render the full parallax clip as an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct MotionArgs {
    /// Clip duration in seconds.
    #[arg(long, default_value_t = 5.0)]
    duration: f64,

    /// Output frame rate (frames per second).
    #[arg(long, default_value_t = 25)]
    fps: u32,

    /// Maximum horizontal shift in pixels.
    #[arg(long, default_value_t = 12.0)]
    max_shift: f64,

    /// Motion parameter JSON file; overrides the flags above.
    #[arg(long)]
    params: Option<PathBuf>,
}

impl MotionArgs {
    fn resolve(&self) -> anyhow::Result<MotionParams> {
        if let Some(path) = &self.params {
            return Ok(MotionParams::from_json_path(path)?);
        }
        let params = MotionParams {
            duration_secs: self.duration,
            fps: Fps::new(self.fps, 1)?,
            max_shift_px: self.max_shift,
        };
        params.validate()?;
        Ok(params)
    }
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input photo.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Precomputed depth rendering (grayscale image, brighter = larger raw depth).
    #[arg(long)]
    depth: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    motion: MotionArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input photo.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Precomputed depth rendering (grayscale image, brighter = larger raw depth).
    #[arg(long)]
    depth: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Overwrite output if it already exists.
    #[arg(long, default_value_t = true)]
    overwrite: bool,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Chunk size bounding the out-of-order window (parallel mode only).
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,

    #[command(flatten)]
    motion: MotionArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn load_session(
    in_path: &PathBuf,
    depth_path: &PathBuf,
    params: MotionParams,
    opts: SessionOpts,
) -> anyhow::Result<ParallaxSession> {
    let image = FrameRgb::from_path(in_path)?;
    let raw_depth = GrayImageDepth::new(depth_path).estimate(&image)?;
    Ok(ParallaxSession::new(image, &raw_depth, params, opts)?)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let params = args.motion.resolve()?;
    let sess = load_session(&args.in_path, &args.depth, params, SessionOpts::default())?;

    let frame = sess.render_frame(FrameIndex(args.frame))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame.save_png(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let params = args.motion.resolve()?;
    let opts = SessionOpts {
        parallel: args.parallel,
        threads: args.threads,
        chunk_size: args.chunk_size,
        ..SessionOpts::default()
    };
    let sess = load_session(&args.in_path, &args.depth, params, opts)?;

    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: args.out.clone(),
        overwrite: args.overwrite,
    });
    let stats = sess.generate(&mut sink)?;

    eprintln!("wrote {} ({} frames)", args.out.display(), stats.frames_total);
    Ok(())
}
