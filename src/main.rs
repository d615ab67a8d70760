mod cli;

use discforge::{
    backlog, config,
    coordinator::{Coordinator, CoordinatorSettings},
    drive::{DiscDrive, SystemDrive},
    encode::{Encoder, TranscodePool},
    selection::{format_catalog, ConsolePrompt, FixedSelection, TitleSelector},
    setup,
};
use discforge_av::tools::{HANDBRAKE_NAMES, MAKEMKV_NAMES};
use discforge_av::{inspect_tool, MakeMkv};
use discforge_common::console;
use discforge_common::output::LockedStderr;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "discforge=trace,discforge_av=trace,discforge_common=debug".to_string()
        } else {
            "discforge=info,discforge_av=info,discforge_common=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(LockedStderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run { select } => block_on(run_pipeline(config_path, select)),
        Commands::Scan { json } => block_on(scan_disc(config_path, json)),
        Commands::Backlog => block_on(process_backlog(config_path)),
        Commands::CheckTools => block_on(check_tools(config_path)),
        Commands::Validate {
            config: config_arg,
        } => {
            let path = config_arg.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("discforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Run a command on a fresh runtime. A selection prompt may still be
/// blocked on stdin at exit, so the runtime is not waited on.
fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(future);
    rt.shutdown_background();
    result
}

async fn run_pipeline(config_path: Option<&Path>, select: Option<String>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = setup::prepare(&config).await?;

    let handler = Arc::new(Encoder::new(tools.handbrake.clone(), &config));
    let pool = TranscodePool::start(config.encoder.workers, handler);

    let drive = Arc::new(SystemDrive::new(
        config.drive.device.clone(),
        config.drive.eject_timeout(),
    ));
    let selector: Arc<dyn TitleSelector> = match select {
        Some(expression) => Arc::new(FixedSelection::new(expression)),
        None => Arc::new(ConsolePrompt),
    };

    let coordinator = Coordinator::new(
        drive,
        tools.makemkv,
        selector,
        pool,
        CoordinatorSettings::from(&config),
    );

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    coordinator.run(cancel).await;
    Ok(())
}

async fn scan_disc(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let makemkv = setup::resolve_makemkv(&config)?;
    let drive = SystemDrive::new(config.drive.device.clone(), config.drive.eject_timeout());

    if !drive.is_present().await {
        anyhow::bail!("No disc in {}", drive.device());
    }

    let volume_label = drive.volume_label().await;
    let catalog = makemkv
        .resolve(drive.device(), &volume_label, config.catalog.min_title_length)
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
    } else if catalog.is_empty() {
        println!("No valid titles found on {}.", catalog.disc_label);
    } else {
        print!("{}", format_catalog(&catalog.disc_label, &catalog.titles));
    }

    Ok(())
}

async fn process_backlog(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let handbrake = setup::resolve_handbrake(&config)?;
    let handler = Arc::new(Encoder::new(handbrake, &config));

    backlog::run_backlog(&config, handler, backlog::CPU_CODEC_PAUSE).await?;
    Ok(())
}

async fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    println!("Checking external tools...\n");

    let makemkv = inspect_tool(MAKEMKV_NAMES, config.tools.makemkv_path.as_deref(), None);
    let handbrake = inspect_tool(
        HANDBRAKE_NAMES,
        config.tools.handbrake_path.as_deref(),
        Some("--version"),
    );

    let mut all_ok = true;
    for tool in [&makemkv, &handbrake] {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    if let Some(ref path) = makemkv.path {
        match MakeMkv::new(path.clone()).check_license().await {
            Ok(status) => {
                let version = status.version.as_deref().unwrap_or("unknown version");
                println!("\n✓ MakeMKV license OK ({version})");
                for drive in &status.drives {
                    println!("  Drive {}: {} {}", drive.index, drive.device, drive.drive_name);
                }
            }
            Err(e) => {
                all_ok = false;
                println!("\n✗ {e}");
            }
        }
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing or unusable. Install or register them before running.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config_summary(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            print_config_summary(&config);
        }
    }

    Ok(())
}

fn print_config_summary(config: &config::Config) {
    println!("  Drive: {}", config.drive.device);
    println!("  Raw dir: {}", config.paths.raw_dir.display());
    println!("  Encoded dir: {}", config.paths.encoded_dir.display());
    println!("  Minimum title length: {}s", config.catalog.min_title_length);
    println!("  Workers: {}", config.encoder.workers);
    println!(
        "  Encoder: {} q{} ({}) -> {}",
        config.encoder.video_codec,
        config.encoder.video_quality,
        config.encoder.video_preset,
        config.encoder.container
    );
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
    console("Stop requested. Finishing current work...");
    cancel.cancel();
}
