use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use file_engine::{ChangeLog, DepthMode, EngineConfig, FileEngine, LogTailer};
use file_engine_directory_watcher::Decoded;
use file_engine_directory_watcher::decoder::decode_buffer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Wait bound used by the CLI monitor when the settings leave it unbounded,
/// so Ctrl-C is honored on a quiet tree.
const CLI_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Tail poll period, matching how the indexer reads the logs.
const TAIL_PERIOD: Duration = Duration::from_millis(50);

#[derive(Debug, Parser)]
#[command(name = "file-engine", version, about = "Scan and watch trees for the file-search index")]
struct Cli {
    /// Settings file (JSON).
    #[arg(long, global = true, default_value = "user/settings.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Enumerate a tree and print every path found.
    Scan {
        root: String,

        /// Only list entries matching `*.EXT`.
        #[arg(long, default_value = "")]
        ext: String,

        /// Override the configured depth limit.
        #[arg(long)]
        depth: Option<usize>,

        /// Ignore the depth limit.
        #[arg(long)]
        unbounded: bool,

        /// Extra path fragments to skip (repeatable).
        #[arg(long = "ignore")]
        ignore: Vec<String>,
    },

    /// Watch a tree and append its changes to the logs.
    Monitor {
        root: String,

        /// Log directory (defaults to the configured one).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Stop once this file exists (defaults to OUTPUT/CLOSE).
        #[arg(long)]
        stop: Option<PathBuf>,
    },

    /// Print lines appended to the change logs.
    Tail {
        /// Log directory (defaults to the configured one).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Keep polling until interrupted.
        #[arg(long)]
        follow: bool,
    },

    /// Decode a captured raw notification buffer and print its events as JSON.
    Decode { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;

    match cli.command {
        Command::Scan {
            root,
            ext,
            depth,
            unbounded,
            ignore,
        } => scan(&config, root, ext, depth, unbounded, ignore).await,
        Command::Monitor { root, output, stop } => monitor(&config, root, output, stop).await,
        Command::Tail { output, follow } => tail(&config, output, follow).await,
        Command::Decode { file } => decode(file),
    }
}

async fn scan(
    config: &EngineConfig,
    root: String,
    ext: String,
    depth: Option<usize>,
    unbounded: bool,
    ignore: Vec<String>,
) -> anyhow::Result<()> {
    let mut engine = FileEngine::from_config(config);
    if let Some(depth) = depth {
        engine.set_depth_limit(depth);
    }
    for path in &ignore {
        engine.add_ignore_path(path);
    }

    let mode = if unbounded {
        DepthMode::Unbounded
    } else {
        DepthMode::Bounded(engine.depth_limit())
    };
    let handle = engine.spawn_scan(root, ext, mode);
    while !engine.is_result_ready() && !handle.is_finished() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let summary = handle.await??;

    print!("{}", engine.pull_result_text());
    info!(
        "{} entries, {} directories listed, {} skipped",
        summary.entries, summary.directories_listed, summary.directories_skipped
    );
    Ok(())
}

async fn monitor(
    config: &EngineConfig,
    root: String,
    output: Option<PathBuf>,
    stop: Option<PathBuf>,
) -> anyhow::Result<()> {
    let engine = FileEngine::from_config(config);
    let output = output.unwrap_or_else(|| config.output_dir.clone());
    let stop = stop.unwrap_or_else(|| output.join("CLOSE"));

    let mut monitor_config = engine.monitor_config(&root, &output, &stop);
    if monitor_config.poll_interval.is_none() {
        monitor_config.poll_interval = Some(CLI_POLL_INTERVAL);
    }

    let token = monitor_config.stop.token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping monitor");
            token.cancel();
        }
    });

    let summary = FileEngine::spawn_monitor(monitor_config).await??;
    info!(
        "{} batches, {} lines written, {} filtered",
        summary.batches, summary.lines_written, summary.filtered
    );
    Ok(())
}

async fn tail(config: &EngineConfig, output: Option<PathBuf>, follow: bool) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| config.output_dir.clone());
    let mut added = LogTailer::new(output.join(ChangeLog::Added.file_name()));
    let mut removed = LogTailer::new(output.join(ChangeLog::Removed.file_name()));

    loop {
        for line in added.poll()? {
            println!("+ {line}");
        }
        for line in removed.poll()? {
            println!("- {line}");
        }
        if !follow {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = tokio::time::sleep(TAIL_PERIOD) => {}
        }
    }
}

fn decode(file: PathBuf) -> anyhow::Result<()> {
    let buf = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    for item in decode_buffer(&buf)? {
        match item {
            Decoded::Change(event) => println!("{}", serde_json::to_string(&event)?),
            Decoded::Unknown { code, name } => warn!("Unknown action {code} for {name}"),
        }
    }
    Ok(())
}
