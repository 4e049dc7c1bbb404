use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::PlayStoreConfig;
use crate::error::{Result, ScrapingError};
use crate::parser::{extract_app_id, format_epoch_seconds, CommentRecord};
use crate::scraper::transport::{HttpRequest, Transport};

pub const BATCH_EXECUTE_URL: &str = "https://play.google.com/_/PlayStoreUi/data/batchexecute";

// the review rpc refuses larger pages
pub const MAX_REVIEWS_PER_PAGE: usize = 199;

const REVIEWS_RPC_ID: &str = "UsvDTd";
const RESPONSE_PREFIX: &str = ")]}'";

/// One decoded page of the review rpc
#[derive(Debug, Default, PartialEq)]
pub struct ReviewPage {
    pub reviews: Vec<CommentRecord>,
    pub next_token: Option<String>,
}

pub struct PlayStoreScraper {
    transport: Arc<dyn Transport>,
    config: PlayStoreConfig,
}

impl PlayStoreScraper {
    pub fn new(transport: Arc<dyn Transport>, config: PlayStoreConfig) -> Self {
        Self { transport, config }
    }

    /// Up to `count` reviews of the app linked by `app_url`, newest first by default
    pub async fn fetch_reviews(&self, app_url: &str, count: usize) -> Result<Vec<CommentRecord>> {
        let app_id = extract_app_id(app_url).ok_or_else(|| {
            ScrapingError::InvalidTarget("Play Store URL is invalid or has no app ID".to_string())
        })?;

        info!("Fetching up to {} Play Store reviews for {}", count, app_id);

        let mut records: Vec<CommentRecord> = Vec::new();
        let mut token: Option<String> = None;

        while records.len() < count {
            let batch_size = (count - records.len()).min(MAX_REVIEWS_PER_PAGE);
            let request = HttpRequest::post(BATCH_EXECUTE_URL)
                .query("hl", self.config.lang.as_str())
                .query("gl", self.config.country.as_str())
                .form(
                    "f.req",
                    build_request_payload(&app_id, self.config.sort.code(), batch_size, token.as_deref()),
                );

            let body = self.transport.send(request).await?;
            let page = parse_review_page(&body)?;
            debug!("Play Store page returned {} reviews", page.reviews.len());

            if page.reviews.is_empty() {
                break;
            }

            let remaining = count - records.len();
            records.extend(page.reviews.into_iter().take(remaining));

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        info!("Collected {} Play Store reviews for {}", records.len(), app_id);
        Ok(records)
    }
}

/// `f.req` form value for one page of the review rpc
pub fn build_request_payload(app_id: &str, sort: u8, count: usize, token: Option<&str>) -> String {
    let token = token.map_or(Value::Null, |t| Value::String(t.to_string()));
    let inner = json!([
        null,
        null,
        [2, sort, [count, null, token], null, [null, null]],
        [app_id, 7]
    ]);

    json!([[[REVIEWS_RPC_ID, inner.to_string(), null, "generic"]]]).to_string()
}

/// Decode a batchexecute response body into reviews and the continuation token
pub fn parse_review_page(body: &str) -> Result<ReviewPage> {
    let payload = body
        .trim_start()
        .strip_prefix(RESPONSE_PREFIX)
        .ok_or_else(|| ScrapingError::ParseError("Play Store response is missing the rpc prefix".to_string()))?;

    // the envelope may be preceded by a chunk length, so take the first array
    let envelope = serde_json::Deserializer::from_str(payload)
        .into_iter::<Value>()
        .filter_map(|value| value.ok())
        .find(|value| value.is_array())
        .ok_or_else(|| ScrapingError::ParseError("Play Store response has no rpc envelope".to_string()))?;

    let data = envelope
        .as_array()
        .and_then(|entries| {
            entries
                .iter()
                .find(|entry| entry[0] == "wrb.fr" && entry[1] == REVIEWS_RPC_ID)
        })
        .map(|entry| &entry[2]);

    // a null payload means the app has no (more) reviews
    let data = match data.and_then(Value::as_str) {
        Some(text) => text,
        None => return Ok(ReviewPage::default()),
    };

    let inner: Value = serde_json::from_str(data)
        .map_err(|e| ScrapingError::ParseError(format!("Play Store review payload is not JSON: {}", e)))?;

    let reviews = inner[0]
        .as_array()
        .map(|items| items.iter().map(review_to_record).collect())
        .unwrap_or_default();

    let next_token = inner
        .as_array()
        .and_then(|parts| parts.len().checked_sub(2).and_then(|i| parts.get(i)))
        .and_then(Value::as_array)
        .and_then(|pagination| pagination.last())
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ReviewPage { reviews, next_token })
}

// positional fields of one review entry: [1][0] user, [2] score, [4] text, [5][0] epoch seconds
fn review_to_record(review: &Value) -> CommentRecord {
    let date = review[5][0]
        .as_i64()
        .map(format_epoch_seconds)
        .unwrap_or_default();
    let user = review[1][0].as_str().unwrap_or_default().to_string();
    let content = review[4].as_str().unwrap_or_default().to_string();
    let score = review[2].as_i64().unwrap_or(0);

    CommentRecord::new(date, user, content, vec![score])
}
