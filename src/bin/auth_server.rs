use sales_tax_sync::{api, logging, AppConfig};
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init(Some(Path::new("auth_server.log")))?;

    let config = AppConfig::load()?;
    let app = api::auth_router(config.sheets.credentials_file.clone());

    let addr = config.auth_server.addr();
    info!("Starting auth server on {}...", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
