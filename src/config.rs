use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP listen port.
    pub port: u16,
    /// External profile store. Optional: unset means mock-data mode.
    pub database_url: Option<String>,
    /// Location of the serialized model artifact. Its absence at startup is
    /// a supported condition (permanent rule-based scoring).
    pub model_path: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            database_url: match std::env::var("DATABASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
            {
                Some(url) => {
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Some(url)
                }
                None => None,
            },
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "models/credit_model.json".to_string())
                .into(),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        if let Some(ref url) = config.database_url {
            tracing::debug!("Database URL: {}...", &url[..20.min(url.len())]);
        } else {
            tracing::info!("No DATABASE_URL configured, serving mock data");
        }
        tracing::debug!("Model path: {}", config.model_path.display());
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
