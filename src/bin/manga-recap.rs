use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use manga_recap::{
    ApiCredentials, ContextSearch, FfmpegAudioSource, FixedDelay, GeminiClient, NoContext,
    PdftoppmRasterizer, ProjectAssembler, Providers, RecapConfig, RecapPipeline, TavilyClient,
    ThreadSleeper, is_ffmpeg_on_path, is_pdftoppm_on_path,
};

#[derive(Parser, Debug)]
#[command(
    name = "manga-recap",
    version,
    about = "Turn a manga chapter PDF into a narrated recap video"
)]
struct Cli {
    /// JSON config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    gemini_api_key: Option<String>,

    /// Tavily API key (optional web context).
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true, global = true)]
    tavily_api_key: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze, narrate, and render a chapter (requires `pdftoppm` and `ffmpeg` on PATH).
    Run(RunArgs),
    /// Re-render a saved project against a directory of recorded audio.
    Assemble(AssembleArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Chapter PDF.
    #[arg(long)]
    pdf: PathBuf,

    /// Search the web for chapter context before planning.
    #[arg(long, default_value_t = false)]
    web_context: bool,

    /// Override the output directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct AssembleArgs {
    /// Saved project state. Defaults to the configured project path.
    #[arg(long)]
    project: Option<PathBuf>,

    /// Directory of audio files, matched to batches in file-name order.
    #[arg(long)]
    audio_dir: PathBuf,

    /// Override the output directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut cfg = match cli.config.as_deref() {
        Some(path) => RecapConfig::load(path)?,
        None => RecapConfig::default(),
    };
    let creds = ApiCredentials {
        gemini_api_key: cli.gemini_api_key,
        tavily_api_key: cli.tavily_api_key,
    };

    match cli.cmd {
        Command::Run(args) => {
            cfg.providers.use_web_context |= args.web_context;
            if let Some(dir) = args.output_dir {
                cfg.paths.output_dir = dir;
            }
            cmd_run(cfg, creds, args.pdf)
        }
        Command::Assemble(args) => {
            if let Some(dir) = args.output_dir {
                cfg.paths.output_dir = dir;
            }
            let project = args.project.unwrap_or_else(|| cfg.paths.project_path.clone());
            cmd_assemble(cfg, project, args.audio_dir)
        }
    }
}

fn require_tools(needs_pdftoppm: bool) -> anyhow::Result<()> {
    if needs_pdftoppm && !is_pdftoppm_on_path() {
        anyhow::bail!("pdftoppm not found on PATH (install poppler-utils)");
    }
    if !is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg not found on PATH");
    }
    Ok(())
}

fn cmd_run(cfg: RecapConfig, creds: ApiCredentials, pdf: PathBuf) -> anyhow::Result<()> {
    require_tools(true)?;

    let gemini = GeminiClient::new(creds.gemini_api_key, &cfg.providers)?;
    let tavily;
    let search: &dyn ContextSearch = if cfg.providers.use_web_context {
        tavily = TavilyClient::new(creds.tavily_api_key, &cfg.providers)?;
        &tavily
    } else {
        &NoContext
    };
    let rasterizer = PdftoppmRasterizer::new(&cfg.raster)?;
    let limiter = FixedDelay(cfg.narration.throttle());

    let providers = Providers {
        rasterizer: &rasterizer,
        planner: &gemini,
        synthesizer: &gemini,
        search,
        audio: &FfmpegAudioSource,
        sleeper: &ThreadSleeper,
        limiter: &limiter,
    };
    let pipeline = RecapPipeline::new(cfg, providers)?;
    let report = pipeline
        .run(&pdf)
        .with_context(|| format!("recap '{}'", pdf.display()))?;

    eprintln!(
        "wrote {} ({} clips, {:.1}s, {} of {} segments narrated)",
        report.output.output_path.display(),
        report.output.clips,
        report.output.duration_secs,
        report.analysis.segments_planned - report.analysis.segments_skipped,
        report.analysis.segments_planned,
    );
    Ok(())
}

fn cmd_assemble(cfg: RecapConfig, project: PathBuf, audio_dir: PathBuf) -> anyhow::Result<()> {
    require_tools(false)?;

    let assembler = ProjectAssembler::new(&cfg, &FfmpegAudioSource)?;
    let report = assembler
        .assemble_project(&project, &audio_dir)
        .with_context(|| format!("assemble '{}'", project.display()))?;

    eprintln!(
        "wrote {} ({} clips, {:.1}s)",
        report.output_path.display(),
        report.clips,
        report.duration_secs
    );
    Ok(())
}
