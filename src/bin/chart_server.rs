use sales_tax_sync::client::{a1, create_http_client, GoogleSheetsClient};
use sales_tax_sync::{api, logging, AppConfig, ChartSource};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init(None)?;

    let config = AppConfig::load()?;
    info!("Starting chart server with config: {:?}", config.server);

    let http = create_http_client()?;
    let sheets = Arc::new(GoogleSheetsClient::from_config(http, &config.sheets)?);
    let source = Arc::new(ChartSource::new(
        sheets,
        a1(&config.sheets.chart_source_sheet, "A:D"),
        config.report.chart_window_days,
    ));

    let static_dir = std::env::current_dir()?;
    let app = api::chart_router(source, &static_dir);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        tracing::error!("Error starting server: {}", e);
        tracing::error!("Make sure no other process is using {}", addr);
        e
    })?;

    info!("Server started at http://{}", addr);
    info!("Serving static files from {}", static_dir.display());
    info!("API Endpoints:");
    info!("  GET /api/chart-data  - monthly sales tax, trailing {} days", config.report.chart_window_days);

    axum::serve(listener, app).await?;
    Ok(())
}
