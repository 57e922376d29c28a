#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use sheet_progress::{
        GoogleSheetsSource, RetryPolicy, RetryingSource, ServerConfig, TableSource, http_api,
    };
    use tracing::{info, warn};
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    if config.credentials.is_none() {
        warn!("GOOGLE_CREDENTIALS is not set; every request will fail until it is");
    }
    info!(
        spreadsheet = %config.sheet.spreadsheet_id,
        range = %config.sheet.range,
        attempts = config.fetch_attempts,
        "starting sheet-progress"
    );

    let completion_column = config.sheet.completion_column;
    let sheets = GoogleSheetsSource::new(config.sheet.clone(), config.credentials.clone())?;
    let source: Arc<dyn TableSource> = Arc::new(RetryingSource::new(
        sheets,
        RetryPolicy::with_attempts(config.fetch_attempts),
    ));
    let state = http_api::AppState::from_source(source, completion_column)
        .with_static_dir(config.static_dir.clone());
    http_api::serve(config.addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
