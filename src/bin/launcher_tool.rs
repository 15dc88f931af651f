use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use launcher_sentry::{create_sink, CommandSink, LauncherCommand, SentryConfig};
use tracing::{info, warn};

/// Drive the launcher by hand, one command per line on stdin.
#[derive(Parser, Debug)]
#[command(name = "launcher-tool")]
#[command(
    about = "Send launcher commands read from stdin: up, down, left, right, fire, stop, ledon, ledoff, sleep <ms>"
)]
struct Args {
    /// Path to launcher-sentry configuration file (for the launcher settings)
    #[arg(short = 'c', long, default_value = "sentry.toml")]
    config: PathBuf,

    /// Launcher device, overriding launcher.device from the configuration
    #[arg(short, long)]
    device: Option<String>,

    /// Log commands instead of sending them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Send(LauncherCommand),
    Sleep(Duration),
}

fn parse_step(line: &str) -> Result<Option<Step>> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(None);
    };

    if first.eq_ignore_ascii_case("sleep") {
        let millis = words
            .next()
            .ok_or_else(|| anyhow!("sleep needs a duration in milliseconds"))?
            .parse::<u64>()
            .context("invalid sleep duration")?;
        return Ok(Some(Step::Sleep(Duration::from_millis(millis))));
    }

    let command = first.parse::<LauncherCommand>().map_err(|e| anyhow!(e))?;
    Ok(Some(Step::Send(command)))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args = Args::parse();

    let mut config = SentryConfig::load_from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if let Some(device) = args.device {
        config.launcher.device = device;
    }

    let mut sink = create_sink(&config.launcher, args.dry_run)?;
    info!("Sending commands through {}", sink.name());

    let stdin = io::stdin();
    for (index, line) in stdin.lock().lines().enumerate() {
        let line = line.context("failed to read stdin")?;
        match parse_step(&line) {
            Ok(Some(Step::Send(command))) => {
                if let Err(e) = sink.send(command) {
                    warn!("Line {}: {}", index + 1, e);
                }
            }
            Ok(Some(Step::Sleep(duration))) => thread::sleep(duration),
            Ok(None) => {}
            Err(e) => warn!("Line {}: {:#}", index + 1, e),
        }
    }

    Ok(())
}
