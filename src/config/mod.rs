use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Result, ScrapingError};
use crate::scraper::oauth::TwitterCredentials;
use crate::storage::ExportFormat;

const MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub http: HttpConfig,
    pub playstore: PlayStoreConfig,
    pub twitter: TwitterConfig,
    pub youtube: YouTubeConfig,
    pub tiktok: TikTokConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub randomize_user_agents: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayStoreConfig {
    pub lang: String,
    pub country: String,
    pub count: usize,
    pub sort: ReviewSort,
}

/// Review ordering understood by the Play Store review RPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    MostRelevant,
    Newest,
    Rating,
}

impl ReviewSort {
    pub fn code(&self) -> u8 {
        match self {
            ReviewSort::MostRelevant => 1,
            ReviewSort::Newest => 2,
            ReviewSort::Rating => 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TwitterConfig {
    pub count: usize,
    pub credentials: Option<TwitterCredentials>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YouTubeConfig {
    pub api_key: Option<String>,
    pub max_results: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TikTokConfig {
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub format: ExportFormat,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub api_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig {
                timeout: Duration::from_secs(30),
                randomize_user_agents: true,
            },
            playstore: PlayStoreConfig {
                lang: "id".to_string(),
                country: "us".to_string(),
                count: 2000,
                sort: ReviewSort::Newest,
            },
            twitter: TwitterConfig {
                count: 10,
                credentials: None,
            },
            youtube: YouTubeConfig {
                api_key: None,
                max_results: 100,
            },
            tiktok: TikTokConfig { count: 20 },
            output: OutputConfig {
                format: ExportFormat::Csv,
                directory: PathBuf::from("./scraped_data"),
            },
            server: ServerConfig {
                port: 8080,
                api_token: None,
            },
        }
    }
}

#[async_trait::async_trait]
pub trait ConfigManager {
    async fn load_config(&self) -> Result<Config>;
    async fn save_config(&self, config: &Config) -> Result<()>;
    fn validate_config(&self, config: &Config) -> Result<()>;
}

pub struct FileConfigManager {
    config_path: PathBuf,
}

impl FileConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    async fn write_toml(&self, config: &Config) -> Result<()> {
        let content = toml::to_string_pretty(config)
            .map_err(|e| ScrapingError::ConfigError(format!("Cannot encode configuration: {}", e)))?;

        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ScrapingError::ConfigError(format!("Cannot create {}: {}", parent.display(), e)))?;
        }

        tokio::fs::write(&self.config_path, content).await.map_err(|e| {
            ScrapingError::ConfigError(format!("Cannot write {}: {}", self.config_path.display(), e))
        })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ConfigManager for FileConfigManager {
    async fn load_config(&self) -> Result<Config> {
        if !tokio::fs::try_exists(&self.config_path).await.unwrap_or(false) {
            warn!("{} not found, writing defaults", self.config_path.display());
            self.write_toml(&Config::default()).await?;
        }

        let content = tokio::fs::read_to_string(&self.config_path).await.map_err(|e| {
            ScrapingError::ConfigError(format!("Cannot read {}: {}", self.config_path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ScrapingError::ConfigError(format!("{}: {}", self.config_path.display(), e)))?;

        self.validate_config(&config)?;

        info!("Loaded configuration from {}", self.config_path.display());
        Ok(config)
    }

    fn validate_config(&self, config: &Config) -> Result<()> {
        let invalid = |message: &str| -> Result<()> { Err(ScrapingError::ConfigError(message.to_string()).into()) };

        if config.http.timeout.is_zero() || config.http.timeout > MAX_HTTP_TIMEOUT {
            return invalid("http.timeout must be between 1s and 5m");
        }

        if config.playstore.count == 0 {
            return invalid("playstore.count must be at least 1");
        }
        if config.playstore.lang.trim().is_empty() || config.playstore.country.trim().is_empty() {
            return invalid("playstore.lang and playstore.country are required");
        }

        if !(1..=100).contains(&config.twitter.count) {
            return invalid("twitter.count must be between 1 and 100");
        }
        if !(1..=100).contains(&config.youtube.max_results) {
            return invalid("youtube.max_results must be between 1 and 100");
        }
        if config.tiktok.count == 0 {
            return invalid("tiktok.count must be at least 1");
        }

        // unprivileged ports only
        if config.server.port < 1024 {
            return invalid("server.port must be 1024 or higher");
        }
        if config.server.api_token.as_deref().map_or(false, |t| t.trim().is_empty()) {
            return invalid("server.api_token is set but blank");
        }

        debug!("Configuration is valid");
        Ok(())
    }

    async fn save_config(&self, config: &Config) -> Result<()> {
        self.validate_config(config)?;
        self.write_toml(config).await?;
        info!("Saved configuration to {}", self.config_path.display());
        Ok(())
    }
}
