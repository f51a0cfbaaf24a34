use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use worker_pool_service::api::job_routes;
use worker_pool_service::config::{PoolConfig, ServerConfig};
use worker_pool_service::pool::WorkerPool;
use worker_pool_service::service::JobService;
use worker_pool_service::shutdown::install_shutdown_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let pool_config = PoolConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;

    eprintln!("Worker pool service v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Workers: {}, queue capacity: {}",
        pool_config.workers, pool_config.queue_capacity
    );
    eprintln!("   API: http://0.0.0.0:{}/jobs\n", server_config.port);

    let shutdown = install_shutdown_handler().context("failed to install signal handlers")?;

    // The pool outlives the HTTP drain, so it gets its own signal.
    let pool = Arc::new(WorkerPool::new(pool_config, &CancellationToken::new())?);
    pool.start();

    let service = JobService::new(Arc::clone(&pool), shutdown.clone());
    let app = job_routes(service);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", server_config.port))
        .await
        .with_context(|| format!("failed to bind port {}", server_config.port))?;
    tracing::info!(port = server_config.port, "HTTP server started");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown.clone().cancelled_owned());
    let mut server = tokio::spawn(async move { server.await });

    tokio::select! {
        result = &mut server => {
            result.context("server task panicked")?.context("server error")?;
        }
        _ = shutdown.cancelled() => {
            match tokio::time::timeout(server_config.shutdown_grace, &mut server).await {
                Ok(result) => {
                    result.context("server task panicked")?.context("server error")?;
                    tracing::info!("Server exited properly");
                }
                Err(_) => {
                    tracing::warn!(
                        grace_secs = server_config.shutdown_grace.as_secs(),
                        "Server shutdown timed out"
                    );
                    server.abort();
                }
            }
        }
    }

    pool.stop().await;
    Ok(())
}
