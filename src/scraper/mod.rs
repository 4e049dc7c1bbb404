pub mod oauth;
pub mod playstore;
pub mod tiktok;
pub mod transport;
pub mod twitter;
pub mod user_agent;
pub mod youtube;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{Result, ScrapingError};
use crate::parser::{CommentRecord, Dataset, Platform};

pub use oauth::TwitterCredentials;
pub use playstore::PlayStoreScraper;
pub use tiktok::TikTokScraper;
pub use transport::{HttpRequest, ReqwestTransport, Transport};
pub use twitter::TwitterScraper;
pub use youtube::YouTubeScraper;

/// What the user asked for: a platform and that platform's inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform", rename_all = "lowercase")]
pub enum ScrapeRequest {
    PlayStore {
        #[serde(default)]
        app_url: String,
        #[serde(default)]
        count: Option<usize>,
    },
    Twitter {
        #[serde(default)]
        credentials: TwitterCredentials,
        #[serde(default)]
        query: String,
        #[serde(default)]
        count: Option<usize>,
    },
    YouTube {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        video: String,
    },
    TikTok {
        #[serde(default)]
        video_url: String,
        #[serde(default)]
        count: Option<usize>,
    },
}

impl ScrapeRequest {
    pub fn platform(&self) -> Platform {
        match self {
            ScrapeRequest::PlayStore { .. } => Platform::PlayStore,
            ScrapeRequest::Twitter { .. } => Platform::Twitter,
            ScrapeRequest::YouTube { .. } => Platform::YouTube,
            ScrapeRequest::TikTok { .. } => Platform::TikTok,
        }
    }

    /// Names of required inputs that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self {
            ScrapeRequest::PlayStore { app_url, .. } => {
                if app_url.trim().is_empty() {
                    missing.push("app_url");
                }
            }
            ScrapeRequest::Twitter { credentials, query, .. } => {
                missing.extend(credentials.missing_fields());
                if query.trim().is_empty() {
                    missing.push("query");
                }
            }
            ScrapeRequest::YouTube { api_key, video } => {
                if api_key.trim().is_empty() {
                    missing.push("api_key");
                }
                if video.trim().is_empty() {
                    missing.push("video");
                }
            }
            ScrapeRequest::TikTok { video_url, .. } => {
                if video_url.trim().is_empty() {
                    missing.push("video_url");
                }
            }
        }
        missing
    }

    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ScrapingError::MissingInput(format!(
                "please provide {} for {}",
                missing.join(", "),
                self.platform()
            ))
            .into());
        }

        let count = match self {
            ScrapeRequest::PlayStore { count, .. }
            | ScrapeRequest::Twitter { count, .. }
            | ScrapeRequest::TikTok { count, .. } => *count,
            ScrapeRequest::YouTube { .. } => None,
        };
        if count == Some(0) {
            return Err(ScrapingError::MissingInput("count must be at least 1".to_string()).into());
        }

        Ok(())
    }
}

/// Result of one scrape: always a dataset, plus the message when it failed
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub platform: Platform,
    pub dataset: Dataset,
    pub error: Option<String>,
}

impl ScrapeOutcome {
    pub fn success(platform: Platform, dataset: Dataset) -> Self {
        Self {
            platform,
            dataset,
            error: None,
        }
    }

    pub fn failure(platform: Platform, message: String) -> Self {
        Self {
            platform,
            dataset: Dataset::empty(),
            error: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Routes a request to its platform adapter
pub struct Scraper {
    config: Config,
    playstore: PlayStoreScraper,
    twitter: TwitterScraper,
    youtube: YouTubeScraper,
    tiktok: TikTokScraper,
}

impl Scraper {
    pub fn new(config: &Config) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.http)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: config.clone(),
            playstore: PlayStoreScraper::new(transport.clone(), config.playstore.clone()),
            twitter: TwitterScraper::new(transport.clone()),
            youtube: YouTubeScraper::new(transport.clone(), config.youtube.clone()),
            tiktok: TikTokScraper::new(transport),
        }
    }

    /// Run the request; failures come back as an empty dataset with a message
    pub async fn scrape(&self, request: &ScrapeRequest) -> ScrapeOutcome {
        let platform = request.platform();
        let request = self.with_defaults(request);

        let result = match request.validate() {
            Ok(()) => self.fetch(&request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(records) => {
                info!("{}: {} records", platform, records.len());
                ScrapeOutcome::success(platform, Dataset::from_records(platform, &records))
            }
            Err(e) => {
                let message = format!("Error scraping {}: {}", platform, e);
                match e.downcast_ref::<ScrapingError>() {
                    Some(ScrapingError::MissingInput(_)) => warn!("{}", message),
                    _ => error!("{}", message),
                }
                ScrapeOutcome::failure(platform, message)
            }
        }
    }

    async fn fetch(&self, request: &ScrapeRequest) -> Result<Vec<CommentRecord>> {
        match request {
            ScrapeRequest::PlayStore { app_url, count } => {
                let count = count.unwrap_or(self.config.playstore.count);
                self.playstore.fetch_reviews(app_url, count).await
            }
            ScrapeRequest::Twitter {
                credentials,
                query,
                count,
            } => {
                let count = count.unwrap_or(self.config.twitter.count);
                self.twitter.search(credentials, query, count).await
            }
            ScrapeRequest::YouTube { api_key, video } => self.youtube.fetch_comments(api_key, video).await,
            ScrapeRequest::TikTok { video_url, count } => {
                let count = count.unwrap_or(self.config.tiktok.count);
                self.tiktok.fetch_comments(video_url, count).await
            }
        }
    }

    // blank credentials fall back to the ones in the config file
    fn with_defaults(&self, request: &ScrapeRequest) -> ScrapeRequest {
        let mut request = request.clone();
        match &mut request {
            ScrapeRequest::Twitter { credentials, .. } => {
                if let Some(ref configured) = self.config.twitter.credentials {
                    if credentials.missing_fields().len() == 4 {
                        *credentials = configured.clone();
                    }
                }
            }
            ScrapeRequest::YouTube { api_key, .. } => {
                if api_key.trim().is_empty() {
                    if let Some(ref configured) = self.config.youtube.api_key {
                        *api_key = configured.clone();
                    }
                }
            }
            ScrapeRequest::PlayStore { .. } | ScrapeRequest::TikTok { .. } => {}
        }
        request
    }
}
