use anyhow::{Context, Result};
use clap::Parser;
use snapcam::permissions::Permission;
use snapcam::platform::{PickerScript, PlatformServices, SimulatedPlatform};
use snapcam::session::LensFacing;
use snapcam::{CameraScreen, ScreenPhase, SnapcamConfig};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

const LOG_FILE_NAME: &str = "snapcam.log";

#[derive(Parser, Debug)]
#[command(name = "snapcam")]
#[command(about = "Camera session lifecycle and capture coordinator")]
#[command(version)]
#[command(long_about = "Runs the camera screen against a simulated platform: permission gating, \
provider acquisition and use-case binding, still capture into the output directory, and routing \
of captured or gallery-picked images to the drawing screen. Routed navigation payloads are \
printed as JSON lines.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "snapcam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to a file in this directory
    #[arg(long, value_name = "DIR", help = "Write logs to snapcam.log in DIR")]
    log_dir: Option<String>,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override the configured lens facing
    #[arg(long, value_name = "LENS", help = "Camera lens: front, back or external")]
    lens: Option<LensFacing>,

    /// Number of photos to take once the preview is bound
    #[arg(long, default_value_t = 1)]
    captures: u32,

    /// Pick this URI from the gallery after capturing
    #[arg(long, value_name = "URI")]
    pick: Option<String>,

    /// Open the gallery and cancel the pick
    #[arg(long, conflicts_with = "pick")]
    pick_cancel: bool,

    /// Treat every required permission as already granted
    #[arg(long)]
    pregranted: bool,

    /// Refuse this permission in the dialog (repeatable)
    #[arg(long, value_name = "PERMISSION")]
    deny: Vec<Permission>,

    /// Simulate a camera held by another client
    #[arg(long)]
    busy: bool,

    /// Print screen events as JSON lines
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(ExitCode::SUCCESS);
    }

    // Returning, rather than exiting, lets the guard flush the log file
    let _log_guard = init_logging(&args)?;

    info!("Starting snapcam v{}", env!("CARGO_PKG_VERSION"));

    let mut config = SnapcamConfig::load_from_file(&args.config).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Some(lens) = args.lens {
        config.camera.lens_facing = lens;
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        return Ok(ExitCode::FAILURE);
    }

    if args.validate_config {
        println!("✓ Configuration is valid");
        return Ok(ExitCode::SUCCESS);
    }

    run(&args, config).await
}

async fn run(args: &Args, config: SnapcamConfig) -> Result<ExitCode> {
    let mut builder = SimulatedPlatform::builder().device_busy(args.busy);
    if args.pregranted {
        builder = builder.grant_all(config.permissions.required.iter().copied());
    }
    for permission in &args.deny {
        builder = builder.dialog_answer(*permission, false);
    }
    if let Some(uri) = &args.pick {
        builder = builder.picker(PickerScript::Pick(uri.clone()));
    }
    let platform = builder.build();

    let services = PlatformServices::from_shared(Arc::new(platform.clone()));
    let mut screen =
        CameraScreen::new(config, services).context("Failed to create camera screen")?;

    let printer = if args.watch {
        let mut events = screen.events().subscribe();
        Some(tokio::spawn(async move {
            use tokio::sync::broadcast::error::RecvError;
            loop {
                match events.recv().await {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => warn!("Failed to serialize event: {}", e),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Event printer lagged by {} events", skipped)
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    } else {
        None
    };

    screen.on_create()?;
    screen.settle().await;

    match &screen.state().phase {
        ScreenPhase::Previewing => {
            for n in 0..args.captures {
                match screen.on_capture_clicked() {
                    Ok(()) => screen.settle().await,
                    Err(e) => warn!("Capture {} not taken: {}", n + 1, e),
                }
            }
        }
        ScreenPhase::PreviewUnavailable { reason } => {
            warn!("Preview unavailable, skipping captures: {}", reason);
        }
        ScreenPhase::Closed => {}
        other => warn!("Unexpected screen phase {:?}", other),
    }

    if !screen.state().is_closed() && (args.pick.is_some() || args.pick_cancel) {
        screen.on_gallery_clicked();
        screen.settle().await;
    }

    let exit_code = if screen.state().is_closed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    };
    let routed = screen.state().routed;
    screen.on_destroy();
    drop(screen);

    if let Some(printer) = printer {
        let _ = printer.await;
    }

    for navigation in platform.navigations() {
        println!("{}", serde_json::to_string(&navigation)?);
    }
    for message in platform.messages() {
        info!("Message shown: {}", message);
    }

    info!("Session finished: {} image(s) routed", routed);
    Ok(exit_code)
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
        .unwrap_or_else(|_| EnvFilter::new(format!("snapcam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer().with_writer(std::io::stderr).boxed()
        }
    };

    let (file_layer, guard) = match &args.log_dir {
        Some(dir) => {
            let (writer, guard) = file_writer(Path::new(dir));
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

/// Non-blocking writer for `<dir>/snapcam.log`. Lines still queued are
/// written when the guard drops.
fn file_writer(dir: &Path) -> (NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    tracing_appender::non_blocking(appender)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Snapcam Configuration File");
    println!("# Environment overrides use the SNAPCAM_ prefix and '__' between keys,");
    println!("# e.g. SNAPCAM_CAMERA__LENS_FACING=back");
    println!();
    println!("{}", toml::to_string_pretty(&SnapcamConfig::default())?);
    Ok(())
}
