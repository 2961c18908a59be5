#[tokio::main]
async fn main() -> anyhow::Result<()> {
    clientdesk_observability::init();

    let config = clientdesk_api::config::ApiConfig::from_env();
    let app = clientdesk_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
