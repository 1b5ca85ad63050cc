use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where and how the dashboard's tracing output goes.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub ansi: bool,
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
            loki_enabled: false,
            loki_url: None,
            service_name: "ticker-dashboard".to_string(),
            environment: "development".to_string(),
        }
    }
}

fn flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: std::env::var("RUST_LOG").unwrap_or(defaults.level),
            ansi: flag("LOG_ANSI", defaults.ansi),
            loki_enabled: flag("LOKI_ENABLED", defaults.loki_enabled),
            loki_url: std::env::var("LOKI_URL").ok().filter(|u| !u.trim().is_empty()),
            service_name: std::env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }
        Ok(())
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    #[cfg(feature = "loki")]
    {
        if config.loki_enabled {
            if let Some(loki_url) = config.loki_url.clone() {
                return init_with_loki(&config, &loki_url);
            }
        }
    }

    tracing_subscriber::registry()
        .with(config.filter())
        .with(tracing_subscriber::fmt::layer().with_ansi(config.ansi))
        .try_init()?;

    tracing::info!("Console logging initialized at level {}", config.level);
    Ok(())
}

#[cfg(feature = "loki")]
fn init_with_loki(config: &LoggingConfig, loki_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = url::Url::parse(loki_url)?;

    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // Ships buffered events to Loki for the life of the process
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(config.filter())
        .with(tracing_subscriber::fmt::layer().with_ansi(config.ansi))
        .with(loki_layer)
        .try_init()?;

    tracing::info!("Loki logging initialized at {}", loki_url);
    Ok(())
}
