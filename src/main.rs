//! hyprstrap - main entry point
//!
//! Parses the command line, sets up logging and child-process cleanup, and
//! dispatches to the installer. Running without a subcommand is an
//! interactive install.

use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use hyprstrap::cli::{Cli, Commands};
use hyprstrap::config_file::InstallConfig;
use hyprstrap::error::InstallError;
use hyprstrap::installer::{self, InstallReport, Installer};
use hyprstrap::process_guard::{self, ProcessGuard};
use hyprstrap::runner::{CommandRunner, DryRunRunner, SystemRunner};
use hyprstrap::sanity;
use hyprstrap::types::FailurePolicy;

/// Logs go to stderr so the status lines on stdout stay readable.
/// `RUST_LOG` overrides the default `info` level.
fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_logger();
    info!("hyprstrap starting up");

    // Tools still running when a signal arrives are terminated with us
    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }
    debug!("Signal handlers initialized");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {e:#}");
            let install_error = e.downcast_ref::<InstallError>();
            if install_error.is_some_and(InstallError::is_pre_destructive) {
                eprintln!("No disk was modified.");
            }
            let code = install_error.map_or(1, InstallError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Validate { file }) => validate_config(&file),
        Some(Commands::InitConfig { output }) => {
            InstallConfig::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
            Ok(())
        }
        Some(Commands::Plan { device, size_gb }) => {
            let config = load_config(cli.config.as_deref(), cli.halt_on_error)?;
            for entry in installer::plan(&device, size_gb, config)? {
                println!("{entry}");
            }
            Ok(())
        }
        Some(Commands::Install { device }) => {
            let config = load_config(cli.config.as_deref(), cli.halt_on_error)?;
            run_install(device.as_deref(), config, cli.dry_run)
        }
        None => {
            info!("No command specified, starting interactive install");
            let config = load_config(cli.config.as_deref(), cli.halt_on_error)?;
            run_install(None, config, cli.dry_run)
        }
    }
}

/// Defaults, overlaid by the config file if given, then by flags.
fn load_config(path: Option<&Path>, halt_on_error: bool) -> Result<InstallConfig> {
    let mut config = match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            InstallConfig::load_from_file(path).map_err(config_error)?
        }
        None => InstallConfig::default(),
    };
    if halt_on_error {
        config.failure_policy = FailurePolicy::Halt;
    }
    config.validate().map_err(config_error)?;
    Ok(config)
}

fn config_error(err: anyhow::Error) -> InstallError {
    InstallError::config(format!("{err:#}"))
}

fn validate_config(path: &Path) -> Result<()> {
    info!("Validating configuration file: {}", path.display());
    let config = InstallConfig::load_from_file(path).map_err(config_error)?;
    config.validate().map_err(config_error)?;
    println!("Configuration file is valid: {}", path.display());
    Ok(())
}

fn run_install(device: Option<&Path>, config: InstallConfig, dry_run: bool) -> Result<()> {
    // Held for the whole run so an early return still stops running tools
    let _guard = ProcessGuard::new();

    sanity::run_preflight_checks();
    info!(policy = ?config.failure_policy, dry_run, "starting installation");

    let stdout = io::stdout();
    if dry_run {
        let mut installer = Installer::new(
            DryRunRunner::new(SystemRunner::new()),
            stdout.lock(),
            config,
        );
        drive(&mut installer, device)?;
        info!(
            skipped = installer.runner().skipped(),
            "[dry-run] no changes were made"
        );
    } else {
        let mut installer = Installer::new(SystemRunner::new(), stdout.lock(), config);
        drive(&mut installer, device)?;
    }
    Ok(())
}

fn drive<R: CommandRunner, W: Write>(
    installer: &mut Installer<R, W>,
    device: Option<&Path>,
) -> Result<InstallReport> {
    let report = match device {
        Some(path) => installer.run_with_device(path)?,
        None => installer.run_interactive(&mut io::stdin().lock())?,
    };
    info!(
        device = %report.device.display(),
        failures = report.failures.len(),
        "installation finished"
    );
    Ok(report)
}
