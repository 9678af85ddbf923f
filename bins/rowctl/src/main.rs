// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rowctl
//!
//! Drive an Echo rotating row from the command line: print its order through
//! any read mode, or race concurrent rotators against the throttle.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;
use echo_future_group::FutureGroup;
use echo_row::{CancellationToken, Row, RowConfig};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

const CONFIG_FILE: &str = "row.json";

#[derive(Parser, Debug)]
#[command(name = "rowctl", author, version, about, long_about = None)]
struct Cli {
    /// Row config file (JSON). Defaults to `row.json` in the Echo config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at DEBUG instead of INFO.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct RowArgs {
    /// Comma-separated row items.
    #[arg(long, value_delimiter = ',', required = true)]
    items: Vec<String>,

    /// Minimum milliseconds between effective rotations (0 = every call).
    #[arg(long, allow_negative_numbers = true, conflicts_with = "every_nth")]
    interval_ms: Option<i64>,

    /// Every Nth rotate call is effective.
    #[arg(long)]
    every_nth: Option<u64>,
}

impl RowArgs {
    fn overrides(&self) -> RowConfig {
        RowConfig {
            interval_ms: self.interval_ms,
            every_nth: self.every_nth,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rotate a fixed number of times, then print the order.
    Show {
        #[command(flatten)]
        row: RowArgs,

        /// Rotate calls to issue before reading.
        #[arg(long, default_value_t = 0)]
        rotations: usize,

        /// How to read the row.
        #[arg(long, value_enum, default_value_t = ReadMode::Vec)]
        mode: ReadMode,
    },
    /// Race concurrent rotators against the throttle, then print the order.
    Spin {
        #[command(flatten)]
        row: RowArgs,

        /// Concurrent rotator tasks.
        #[arg(long, default_value_t = 8)]
        rotators: usize,

        /// Rotate calls per rotator.
        #[arg(long, default_value_t = 10)]
        rounds: usize,

        /// Pause between a rotator's calls, in milliseconds.
        #[arg(long, default_value_t = 0)]
        pause_ms: u64,
    },
    /// Print the effective config; optionally save it as the default.
    Config {
        /// Minimum milliseconds between effective rotations (0 = every call).
        #[arg(long, allow_negative_numbers = true, conflicts_with = "every_nth")]
        interval_ms: Option<i64>,

        /// Every Nth rotate call is effective.
        #[arg(long)]
        every_nth: Option<u64>,

        /// Write to the default config location.
        #[arg(long)]
        save: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ReadMode {
    /// Direct copy into a fresh vector.
    Vec,
    /// Owned iterator over a snapshot.
    Items,
    /// Cancellable bounded-memory stream.
    Stream,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let file_config = load_config(cli.config.as_deref())?;

    let lines = match cli.command {
        Command::Show {
            row,
            rotations,
            mode,
        } => {
            let row = build_row(&row, file_config)?;
            for _ in 0..rotations {
                row.rotate();
            }
            vec![read_all(&row, mode).await.join(" ")]
        }
        Command::Spin {
            row,
            rotators,
            rounds,
            pause_ms,
        } => {
            let row = Arc::new(build_row(&row, file_config)?);
            let shutdown = CancellationToken::new();
            let on_ctrl_c = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });
            let attempts = spin(
                Arc::clone(&row),
                rotators,
                rounds,
                Duration::from_millis(pause_ms),
                &shutdown,
            )
            .await?;
            info!(attempts, rotators, "rotators finished");
            vec![read_all(&row, ReadMode::Stream).await.join(" ")]
        }
        Command::Config {
            interval_ms,
            every_nth,
            save,
        } => {
            let config = file_config.overlay(RowConfig {
                interval_ms,
                every_nth,
            });
            // Validate before showing or persisting.
            config.options().context("invalid row configuration")?;
            let json = config.to_json()?;
            if save {
                save_config(&json)?;
            }
            vec![String::from_utf8(json).context("config is not UTF-8")?]
        }
    };

    let mut out = std::io::stdout().lock();
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "flyingrobots", "Echo")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Explicit path: must exist and parse. Default path: best-effort.
fn load_config(explicit: Option<&Path>) -> Result<RowConfig> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    let Some(path) = default_config_path() else {
        return Ok(RowConfig::default());
    };
    if !path.exists() {
        return Ok(RowConfig::default());
    }
    read_config(&path).or_else(|err| {
        warn!(?err, path = %path.display(), "ignoring unreadable default config");
        Ok(RowConfig::default())
    })
}

fn read_config(path: &Path) -> Result<RowConfig> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let config =
        RowConfig::from_json(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    debug!(path = %path.display(), ?config, "loaded row config");
    Ok(config)
}

fn save_config(json: &[u8]) -> Result<()> {
    let path = default_config_path().context("could not resolve config dir")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "saved row config");
    Ok(())
}

fn build_row(args: &RowArgs, file_config: RowConfig) -> Result<Row<String>> {
    let options = file_config
        .overlay(args.overrides())
        .options()
        .context("invalid row configuration")?;
    Ok(Row::from_slice_with(&args.items, options))
}

async fn read_all(row: &Row<String>, mode: ReadMode) -> Vec<String> {
    match mode {
        ReadMode::Vec => row.to_vec(),
        ReadMode::Items => row.items().collect(),
        ReadMode::Stream => {
            let token = CancellationToken::new();
            let mut takes = row.takes(&token);
            let mut out = Vec::with_capacity(row.len());
            while let Some(item) = takes.next().await {
                out.push(item);
            }
            takes.close().await;
            out
        }
    }
}

/// Run `rotators` tasks of `rounds` rotate calls each. Returns total calls.
async fn spin(
    row: Arc<Row<String>>,
    rotators: usize,
    rounds: usize,
    pause: Duration,
    shutdown: &CancellationToken,
) -> Result<usize> {
    let mut group = FutureGroup::<usize, anyhow::Error>::new();
    for rotator in 0..rotators {
        let row = Arc::clone(&row);
        group.go(move |cancel| async move {
            let mut attempts = 0;
            for _ in 0..rounds {
                if cancel.is_cancelled() {
                    break;
                }
                row.rotate();
                attempts += 1;
                if pause.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(pause).await;
                }
            }
            debug!(rotator, attempts, "rotator done");
            Ok(attempts)
        });
    }
    let attempts = group.wait(shutdown).await.into_result()?;
    Ok(attempts.into_iter().sum())
}
