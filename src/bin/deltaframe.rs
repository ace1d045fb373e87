use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use deltaframe::{
    FfmpegSink, FfmpegSinkOpts, FrameIndex, FrameSink, MergeStage, NullSink, PipelineConfig,
    PipelineController, ResidualStage, StageReport, run_pipeline,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "deltaframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the residual and merge stages concurrently.
    Run(StageArgs),
    /// Pack changed blocks into residual canvases for the upscaler.
    Residual(StageArgs),
    /// Rebuild full frames from upscaled residual canvases.
    Merge(StageArgs),
}

#[derive(Parser, Debug)]
struct StageArgs {
    /// Pipeline config JSON.
    #[arg(long)]
    config: PathBuf,

    /// Transition index to start at, instead of resuming after existing outputs.
    #[arg(long)]
    start_frame: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Residual(args) => cmd_residual(args),
        Command::Merge(args) => cmd_merge(args),
    }
}

fn load(args: &StageArgs) -> anyhow::Result<PipelineConfig> {
    let cfg = PipelineConfig::from_path(&args.config)?;
    cfg.layout().create_dirs()?;
    Ok(cfg)
}

fn sink_for(cfg: &PipelineConfig) -> Box<dyn FrameSink> {
    // Without an output path frames only land in `merged/`.
    match &cfg.output {
        Some(out) => Box::new(FfmpegSink::new(FfmpegSinkOpts::new(out.clone()))),
        None => Box::new(NullSink::new()),
    }
}

fn cmd_run(args: StageArgs) -> anyhow::Result<()> {
    let cfg = load(&args)?;
    let controller = Arc::new(PipelineController::new());
    let run = run_pipeline(
        &cfg,
        controller,
        sink_for(&cfg),
        args.start_frame.map(FrameIndex),
    )?;
    print_report(&run.residual);
    print_report(&run.merge.report);
    Ok(())
}

fn cmd_residual(args: StageArgs) -> anyhow::Result<()> {
    let cfg = load(&args)?;
    let mut stage = ResidualStage::from_config(&cfg)?;
    if let Some(start) = args.start_frame {
        stage = stage.with_start(FrameIndex(start));
    }
    let report = stage.run(&PipelineController::new())?;
    print_report(&report);
    Ok(())
}

fn cmd_merge(args: StageArgs) -> anyhow::Result<()> {
    let cfg = load(&args)?;
    let mut stage = MergeStage::from_config(&cfg)?;
    if let Some(start) = args.start_frame {
        stage = stage.with_start(FrameIndex(start));
    }
    let mut sink = sink_for(&cfg);
    let report = stage.run(&Arc::new(PipelineController::new()), &mut *sink)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &StageReport) {
    eprintln!(
        "{}: {:?}, {} processed, {} skipped (from index {})",
        report.stage,
        report.outcome,
        report.frames_processed,
        report.frames_skipped,
        report.first_index.0
    );
}
