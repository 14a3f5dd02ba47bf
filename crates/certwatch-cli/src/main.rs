use anyhow::Result;
use certwatch_notify::channels::EmailChannel;
use certwatch_notify::NotificationChannel;
use certwatch_scanner::ScanOrchestrator;
use tracing_subscriber::EnvFilter;

mod config;
mod console;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  certwatch [config.toml]            Run a certificate scan");
    eprintln!("  certwatch init-config <path>       Write a starter configuration file");
    eprintln!();
    eprintln!("Exit code is 1 when any checked domain needs attention, 0 otherwise.");
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install default CryptoProvider: {e:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("certwatch=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("init-config") => {
            let path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-config requires a <path> argument")
            })?;
            run_init_config(path)
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => {
            let config_path = args
                .get(1)
                .map(|s| s.as_str())
                .unwrap_or("config/certwatch.toml");
            run_scan(config_path).await
        }
    }
}

/// Write the starter configuration, refusing to clobber an existing file.
fn run_init_config(path: &str) -> Result<()> {
    if std::path::Path::new(path).exists() {
        anyhow::bail!("Config file '{path}' already exists, not overwriting");
    }
    std::fs::write(path, config::DEFAULT_CONFIG_TEMPLATE)
        .map_err(|e| anyhow::anyhow!("Failed to write config file '{}': {}", path, e))?;
    println!("Wrote starter configuration to {path}");
    Ok(())
}

async fn run_scan(config_path: &str) -> Result<()> {
    let cfg = config::Config::load(config_path)?;

    let orchestrator = ScanOrchestrator::new(
        cfg.connect_timeout_secs,
        cfg.thresholds.to_settings(),
        cfg.port,
        cfg.max_concurrent,
    );
    let report = orchestrator.scan(&cfg.domains).await?;

    print!("{}", console::render(&report));

    // Delivery problems are logged, never fatal: the scan already finished
    // and the console report is out.
    if let Some(email) = cfg.email.as_ref().filter(|e| e.enabled) {
        match EmailChannel::new(
            &email.smtp_host,
            email.smtp_port,
            email.smtp_username.as_deref(),
            email.smtp_password.as_deref(),
            &email.from,
            &email.locale,
        ) {
            Ok(channel) => {
                if let Err(e) = channel.send(&report, &email.recipients).await {
                    tracing::error!(error = %e, "Report email delivery failed");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build email channel");
            }
        }
    }

    std::process::exit(if report.has_issues() { 1 } else { 0 });
}
