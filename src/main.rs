use anyhow::Context;
use care_marketplace_backend::{
    config::{get_config, init_config, LogFormat},
    database::pool::{create_pool, run_migrations},
    middleware::cors::cors_layer,
    routes,
    services::{lifecycle_service::LifecycleService, notification_service::NotificationService},
    AppState,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{
    compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const MAX_BODY_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config.log_format);

    let pool = create_pool(&config.database_url)
        .await
        .context("connecting to the database")?;
    run_migrations(&pool).await?;

    let app_state = AppState::new(pool, config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let outbox_worker = tokio::spawn(run_outbox_worker(
        app_state.notification_service.clone(),
        shutdown_rx.clone(),
    ));

    let mut scheduler =
        start_sweep_scheduler(app_state.lifecycle_service.clone(), &config.sweep_cron).await?;

    let app = routes::router(app_state, config.public_rps, config.integration_rps)
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down background tasks");
    if let Err(e) = scheduler.shutdown().await {
        tracing::error!(error = ?e, "sweep scheduler did not shut down cleanly");
    }
    let _ = shutdown_tx.send(true);
    if let Err(e) = outbox_worker.await {
        tracing::error!(error = ?e, "outbox worker panicked");
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// Delivers outbox rows until shutdown is signalled.
async fn run_outbox_worker(notifications: NotificationService, mut shutdown: watch::Receiver<bool>) {
    loop {
        let idle = match notifications.run_once().await {
            Ok(true) => Duration::ZERO,
            Ok(false) => Duration::from_millis(1000),
            Err(e) => {
                tracing::error!(error = ?e, "Webhook worker error");
                Duration::from_secs(2)
            }
        };
        if *shutdown.borrow() {
            break;
        }
        if idle.is_zero() {
            continue;
        }
        tokio::select! {
            _ = tokio::time::sleep(idle) => {}
            _ = shutdown.changed() => break,
        }
    }
    info!("outbox worker stopped");
}

async fn start_sweep_scheduler(lifecycle: LifecycleService, cron: &str) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| anyhow::anyhow!("creating scheduler: {:?}", e))?;
    let job = Job::new_async(cron, move |_id, _scheduler| {
        let lifecycle = lifecycle.clone();
        Box::pin(async move {
            let swept = lifecycle.run_sweep(Utc::now()).await;
            tracing::debug!(count = swept.len(), "scheduled sweep finished");
        })
    })
    .map_err(|e| anyhow::anyhow!("invalid SWEEP_CRON '{}': {:?}", cron, e))?;
    scheduler
        .add(job)
        .await
        .map_err(|e| anyhow::anyhow!("scheduling sweep: {:?}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("starting scheduler: {:?}", e))?;
    info!(cron = %cron, "timecard sweep scheduled");
    Ok(scheduler)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", err);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => tracing::error!("failed to install SIGTERM handler: {}", err),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
