use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;

use handcraft_activity_server::adapter::handler::{router, AppState};
use handcraft_activity_server::infrastructure::config::Config;
use handcraft_activity_server::infrastructure::startup::ActivityPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let cfg = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;

    // Telemetry
    let telemetry_cfg = handcraft_telemetry::TelemetryConfig {
        service_name: cfg.app.name.clone(),
        version: cfg.app.version.clone(),
        environment: cfg.app.environment.clone(),
        log_level: cfg.telemetry.log_level_for(&cfg.app.environment),
        log_format: cfg.telemetry.log_format.clone(),
    };
    handcraft_telemetry::init_telemetry(&telemetry_cfg)
        .map_err(|e| anyhow::anyhow!("failed to init telemetry: {e}"))?;

    info!(port = cfg.server.port, "starting activity server");

    // --- Activity pipeline: Kafka + Schema Registry or Noop fallback ---
    let pipeline = ActivityPipeline::from_config(&cfg);
    // セッション起動はリスナーのバインドと並行して行う
    let _start = pipeline.spawn_start();

    let app = router(AppState {
        emitter: pipeline.emitter.clone(),
    });

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.server.host, cfg.server.port))?;
    info!("REST server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pipeline.emitter.close().await;
    info!("activity server exited");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
