mod asset;
mod checks;
mod config;
mod error;
mod fetch;
mod http;
mod metrics;
mod normalize;
mod scheduler;
mod state;
#[cfg(test)]
mod test_support;
mod token_cache;
mod transport;

use axum::serve;
use checks::Probe;
use clap::Parser;
use config::Config;
use metrics::Metrics;
use scheduler::{now_unix, run_round, CheckReport};
use state::State;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use transport::ReqwestTransport;

#[derive(Parser, Debug)]
#[command(name = "zfsprobe")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "./config.yaml")]
    config: String,
    #[arg(long)]
    print_default_config: bool,
    /// Run a single round, print the state as JSON and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let cfg = match Config::load_from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "failed to load config");
            std::process::exit(1);
        }
    };
    if cfg.assets.is_empty() {
        warn!("no assets configured, rounds will be empty");
    }

    let transport = match ReqwestTransport::new(cfg.request_timeout()) {
        Ok(t) => Arc::new(t),
        Err(err) => {
            error!(error = %err, "failed to build HTTP client");
            std::process::exit(1);
        }
    };
    let probe = Arc::new(Probe::new(transport));

    if cli.once {
        std::process::exit(run_once(probe, &cfg).await);
    }

    info!(
        listen = %cfg.listen,
        interval_secs = cfg.interval_secs,
        assets = cfg.assets.len(),
        "starting zfsprobe"
    );

    let shared_state = Arc::new(RwLock::new(State::new(now_unix())));
    let metrics = match Metrics::new() {
        Ok(m) => m,
        Err(err) => {
            error!(error = %err, "failed to initialize metrics");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_task = {
        let cfg = cfg.clone();
        let metrics = metrics.clone();
        let http_state = shared_state.clone();
        let mut shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let app = http::build_router(metrics, http_state);
            let addr: SocketAddr = match cfg.listen.parse() {
                Ok(addr) => addr,
                Err(err) => {
                    error!(error = %err, listen = %cfg.listen, "invalid listen address");
                    return;
                }
            };

            let listener = match TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(err) => {
                    error!(error = %err, "failed to start HTTP server");
                    return;
                }
            };

            let server = serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            });

            if let Err(err) = server.await {
                error!(error = %err, "HTTP server error");
            }
        })
    };

    let collector_task = {
        let cfg = cfg.clone();
        let metrics = metrics.clone();
        let shared_state = shared_state.clone();
        let mut shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        info!("collector received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let reports = run_round(Arc::clone(&probe), &cfg).await;
                        for report in &reports {
                            metrics.observe_report(report);
                        }

                        let snapshot = {
                            let mut guard = shared_state.write().await;
                            guard.apply_reports(now_unix(), &reports);
                            guard.clone()
                        };
                        metrics.update_from_state(&snapshot, probe.token_cache().len());
                        log_round(&reports);
                    }
                }
            }
        })
    };

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to wait for Ctrl+C");
    }
    info!("received Ctrl+C, shutting down");

    let _ = shutdown_tx.send(true);

    let _ = collector_task.await;
    let _ = http_task.await;
}

async fn run_once(probe: Arc<Probe>, cfg: &Config) -> i32 {
    let reports = run_round(probe, cfg).await;
    log_round(&reports);

    let mut state = State::new(now_unix());
    state.apply_reports(now_unix(), &reports);
    match serde_json::to_string_pretty(&state) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            error!(error = %err, "failed to encode state");
            return 1;
        }
    }
    if state.failing() > 0 {
        2
    } else {
        0
    }
}

fn log_round(reports: &[CheckReport]) {
    let failed = reports
        .iter()
        .filter(|r| r.outcome.label() != "ok")
        .count();
    info!(checks = reports.len(), failed, "round finished");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
