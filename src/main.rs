use exemplar::config::Settings;
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let settings = Settings::new()?;
    info!(
        routes = settings.routes.len(),
        providers = settings.providers.len(),
        "Starting Exemplar mock server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    let app = exemplar::create_app(&settings)?;

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
