use anyhow::Context;
use tokio::io::BufReader;

use wellness_tools::app::build_dispatcher;
use wellness_tools::config::AppConfig;
use wellness_tools::server::tool_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries responses, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    let dispatcher = build_dispatcher(&config).await?;

    match config.http_port {
        Some(port) => {
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
                .await
                .with_context(|| format!("binding port {port}"))?;
            tracing::info!(port, "HTTP tool server started");
            axum::serve(listener, tool_routes(dispatcher)).await?;
        }
        None => {
            tracing::info!("Stdio tool server started");
            wellness_tools::stdio::serve(
                &dispatcher,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await?;
        }
    }

    Ok(())
}
