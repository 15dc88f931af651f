use anyhow::Result;
use clap::Parser;
use launcher_sentry::{create_sink, SentryConfig, SentryOrchestrator};
use std::path::Path;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "launcher-sentry")]
#[command(about = "Face-tracking sentry controller for a USB foam-missile launcher")]
#[command(version)]
#[command(long_about = "Aims a USB foam-missile launcher at faces reported by an external \
detector, fires when a face is centered in armed mode, and accepts manual control from a \
keyboard or gamepad.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "sentry.toml", help = "Path to TOML configuration file")]
    config: String,

    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    #[arg(long, help = "Validate configuration file and exit without starting the system")]
    validate_config: bool,

    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - log launcher commands instead of sending them
    #[arg(long, help = "Initialize with a logging launcher and exit without starting components")]
    dry_run: bool,

    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[arg(long, value_name = "PATH", help = "Also write logs to this file")]
    log_file: Option<String>,

    #[arg(short, long, help = "Enable terminal keyboard control")]
    keyboard: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let log_guard = init_logging(&args)?;

    info!("Starting launcher sentry v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match SentryConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let mut orchestrator = if args.dry_run {
        let sink = create_sink(&config.launcher, true)?;
        SentryOrchestrator::with_sink(config, sink)
    } else {
        SentryOrchestrator::new(config).await.map_err(|e| {
            error!("Failed to create orchestrator: {}", e);
            e
        })?
    };

    if args.keyboard {
        orchestrator.set_keyboard_enabled(true);
    }

    orchestrator.initialize().await.map_err(|e| {
        error!("Failed to initialize system: {}", e);
        e
    })?;

    if args.dry_run {
        info!("Dry run mode - components initialized but not started");
        println!("✓ Dry run completed successfully - all components initialized");
        return Ok(());
    }

    orchestrator.start().await.map_err(|e| {
        error!("Failed to start system: {}", e);
        e
    })?;

    let exit_code = orchestrator.run().await.map_err(|e| {
        error!("System error during execution: {}", e);
        e
    })?;

    info!("Launcher sentry exited with code: {}", exit_code);

    // Flush the file writer before exiting
    drop(log_guard);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("launcher_sentry={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_names(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_names(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let (file_layer, guard) = match args.log_file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Launcher Sentry Configuration File");
    println!("# Every option with its default value. Environment variables such as");
    println!("# SENTRY_LAUNCHER__MAX_SHOTS=2 override values from this file.");
    println!();
    println!("{}", SentryConfig::default().to_toml_string()?);
    Ok(())
}
