use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info};

use ticker_dashboard::app;
use ticker_dashboard::config::{AppConfig, ProviderKind};
use ticker_dashboard::external::csv_file::CsvFileProvider;
use ticker_dashboard::external::mock::MockProvider;
use ticker_dashboard::external::price_provider::PriceProvider;
use ticker_dashboard::external::yahoo::YahooProvider;
use ticker_dashboard::logging::{init_logging, LoggingConfig};
use ticker_dashboard::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn build_provider(config: &AppConfig) -> Arc<dyn PriceProvider> {
    match config.provider {
        ProviderKind::Yahoo => {
            info!("Using price provider: Yahoo Finance");
            Arc::new(YahooProvider::new())
        }
        ProviderKind::Csv => {
            info!("Using price provider: CSV files in {}", config.data_dir.display());
            Arc::new(CsvFileProvider::new(config.data_dir.clone()))
        }
        ProviderKind::Mock => {
            info!("Using price provider: random-walk mock");
            Arc::new(MockProvider::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    let addr = config.bind_addr;
    let provider = build_provider(&config);
    let state = AppState::new(config, provider);

    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_expired();
            if removed > 0 {
                info!("Expired {} idle sessions ({} active)", removed, sessions.len());
            }
        }
    });

    let app = app::create_app(state);

    let listener = TcpListener::bind(addr).await?;
    info!("Ticker dashboard running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
