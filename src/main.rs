use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use reportd_core::logging::init_logging;
use reportd_core::AppConfig;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

mod app;

use app::Application;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("reportd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Scheduled report and task orchestration service")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to the TOML config file")
                .default_value("config/reportd.toml"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log filter, overrides the config file"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("Log format, overrides the config file")
                .value_parser(["json", "pretty"]),
        )
        .arg(
            Arg::new("run-task")
                .long("run-task")
                .value_name("ID")
                .help("Dispatch a single scheduled task and exit")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("run-report")
                .long("run-report")
                .value_name("NAME")
                .help("Run a single report and exit"),
        )
        .arg(
            Arg::new("validate-definitions")
                .long("validate-definitions")
                .help("Check stored definitions against the handler registry and exit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = AppConfig::load(Some(config_path))
        .with_context(|| format!("failed to load config from {config_path}"))?;

    let log_level = matches
        .get_one::<String>("log-level")
        .unwrap_or(&config.log.level);
    let log_format = matches
        .get_one::<String>("log-format")
        .unwrap_or(&config.log.format);
    init_logging(log_level, log_format)?;

    info!(config = %config_path, "starting reportd");

    let app = Application::new(config.clone()).await?;

    // one-shot entry points
    if let Some(task_id) = matches.get_one::<i64>("run-task") {
        let outcome = app.run_task(*task_id).await;
        info!(task_id, ?outcome, "dispatch finished");
        return Ok(());
    }
    if let Some(name) = matches.get_one::<String>("run-report") {
        let outcome = app.run_report(name).await;
        info!(report = %name, ?outcome, "report run finished");
        return Ok(());
    }
    if matches.get_flag("validate-definitions") {
        app.validate_definitions().await?;
        return Ok(());
    }

    if !config.scheduler.enabled {
        info!("scheduler is disabled in config, exiting");
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    app.run(shutdown_rx).await;

    info!("reportd stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                let _ = signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }
}
