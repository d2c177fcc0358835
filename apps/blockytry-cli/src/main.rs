use anyhow::Context as _;
use blockytry_common::{MAX_FRAME_DELTA, TICK_DURATION, TICKS_PER_SECOND};
use blockytry_kernel::{InputScript, SimulationConfig, replay};
use blockytry_persist::RunStore;
use blockytry_render::{DebugTextRenderer, RenderFrame, Renderer};
use blockytry_tools::SimulationInspector;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blockytry-cli", about = "Headless tool for the blockytry engine")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print timing constants and the desktop run record
    Info {
        /// Directory holding the run record
        #[arg(long, default_value = "./blockytry_data")]
        data_dir: PathBuf,
    },
    /// Replay a scripted input sequence and print the frames
    Simulate {
        /// Input script (YAML)
        #[arg(short, long)]
        script: PathBuf,
        /// Simulation config (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print every frame instead of only frames that ran a tick
        #[arg(long)]
        every_frame: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info { data_dir } => {
            println!("blockytry-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "tick: {} ms ({} Hz), frame clamp: {} ms",
                TICK_DURATION.as_millis(),
                TICKS_PER_SECOND,
                MAX_FRAME_DELTA.as_millis()
            );
            let record = RunStore::read_meta(&data_dir)
                .with_context(|| format!("failed to read run record in {}", data_dir.display()))?;
            match record.as_ref().and_then(|meta| meta.last_start().map(|s| (meta, s))) {
                Some((meta, start)) => {
                    let ago = start.elapsed().unwrap_or(Duration::ZERO).as_secs();
                    let unix = start
                        .duration_since(UNIX_EPOCH)
                        .unwrap_or(Duration::ZERO)
                        .as_millis();
                    println!(
                        "last desktop start: {unix} (unix ms, {ago} s ago), launches: {}",
                        meta.launch_count
                    );
                }
                None => println!("no desktop run recorded in {}", data_dir.display()),
            }
        }
        Commands::Simulate {
            script,
            config,
            every_frame,
        } => {
            let config = match &config {
                Some(path) => SimulationConfig::load(path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => SimulationConfig::default(),
            };
            let input = InputScript::load(&script)
                .with_context(|| format!("failed to load script {}", script.display()))?;
            println!(
                "Replaying {}: {} frames of {} ms, {} actions",
                script.display(),
                input.frame_count(),
                input.frame_ms,
                input.actions.len()
            );

            let result = replay(&input, &config)?;
            tracing::info!(
                frames = result.reports.len(),
                ticks = result.total_ticks(),
                "replay finished"
            );
            let mut renderer = DebugTextRenderer::new();
            for report in &result.reports {
                if every_frame || report.ticks > 0 {
                    let frame = RenderFrame::capture(&result.context, report);
                    print!("{}", renderer.render(&frame));
                }
            }

            println!("---");
            println!("{}", SimulationInspector::summary(&result.context));
        }
    }

    Ok(())
}
