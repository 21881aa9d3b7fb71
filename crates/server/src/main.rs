use anyhow::Context;
use server::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    tracing::info!(
        backend = %config.backend,
        program = %config.engine.program,
        timeout_ms = config.engine_timeout.as_millis() as u64,
        "Engine configured"
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Starting server on {addr}");

    server::serve(listener, config).await.context("Server error")?;
    Ok(())
}
