use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, ScrapingError};
use crate::parser::{format_twitter_date, CommentRecord};
use crate::scraper::oauth::{self, TwitterCredentials};
use crate::scraper::transport::{HttpRequest, Transport};

pub const SEARCH_URL: &str = "https://api.twitter.com/1.1/search/tweets.json";

// standard search caps a single call at 100 tweets
pub const MAX_SEARCH_COUNT: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    statuses: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    #[serde(default)]
    created_at: String,
    user: TweetUser,
    full_text: Option<String>,
    text: Option<String>,
    #[serde(default)]
    favorite_count: i64,
    #[serde(default)]
    retweet_count: i64,
}

#[derive(Debug, Deserialize)]
struct TweetUser {
    #[serde(default)]
    screen_name: String,
}

pub struct TwitterScraper {
    transport: Arc<dyn Transport>,
}

impl TwitterScraper {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// One signed search call for `query`, returning at most `count` tweets
    pub async fn search(
        &self,
        credentials: &TwitterCredentials,
        query: &str,
        count: usize,
    ) -> Result<Vec<CommentRecord>> {
        let count = if count > MAX_SEARCH_COUNT {
            warn!("Twitter search count {} exceeds {}, clamping", count, MAX_SEARCH_COUNT);
            MAX_SEARCH_COUNT
        } else {
            count.max(1)
        };

        info!("Searching Twitter for {:?} (count {})", query, count);

        let params = vec![
            ("q".to_string(), query.to_string()),
            ("count".to_string(), count.to_string()),
            ("tweet_mode".to_string(), "extended".to_string()),
        ];
        let nonce = Uuid::new_v4().simple().to_string();
        let authorization = oauth::authorization_header(
            "GET",
            SEARCH_URL,
            &params,
            credentials,
            &nonce,
            Utc::now().timestamp(),
        )?;

        // the query is pre-encoded so the signed bytes are the sent bytes
        let url = format!("{}?{}", SEARCH_URL, oauth::encode_query(&params));
        let request = HttpRequest::get(url).header("Authorization", authorization);

        let body = self.transport.send(request).await?;
        let records = parse_search_response(&body)?;

        info!("Collected {} tweets", records.len());
        Ok(records)
    }
}

pub fn parse_search_response(body: &str) -> Result<Vec<CommentRecord>> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| ScrapingError::ParseError(format!("Unexpected Twitter search response: {}", e)))?;

    Ok(response
        .statuses
        .into_iter()
        .map(|tweet| {
            let text = tweet.full_text.or(tweet.text).unwrap_or_default();
            CommentRecord::new(
                format_twitter_date(&tweet.created_at),
                tweet.user.screen_name,
                text,
                vec![tweet.favorite_count, tweet.retweet_count],
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::transport::{Method, MockTransport};

    const SEARCH_BODY: &str = r#"{
        "statuses": [
            {
                "created_at": "Wed Oct 10 20:19:24 +0000 2018",
                "id_str": "1050118621198921728",
                "full_text": "To make room for more expression, we will now count all emojis as equal",
                "user": {"screen_name": "TwitterDev", "name": "Twitter Dev"},
                "favorite_count": 120,
                "retweet_count": 31
            },
            {
                "created_at": "Thu Oct 11 08:00:00 +0000 2018",
                "text": "short form only",
                "user": {"screen_name": "someone"}
            }
        ],
        "search_metadata": {"count": 2}
    }"#;

    fn credentials() -> TwitterCredentials {
        TwitterCredentials {
            api_key: "ck".to_string(),
            api_secret: "cs".to_string(),
            access_token: "at".to_string(),
            access_token_secret: "ats".to_string(),
        }
    }

    #[test]
    fn test_parse_search_response() {
        let records = parse_search_response(SEARCH_BODY).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2018-10-10 20:19:24");
        assert_eq!(records[0].user, "TwitterDev");
        assert!(records[0].text.starts_with("To make room"));
        assert_eq!(records[0].engagement, vec![120, 31]);

        assert_eq!(records[1].text, "short form only");
        assert_eq!(records[1].engagement, vec![0, 0]);
    }

    #[test]
    fn test_parse_search_response_empty() {
        assert!(parse_search_response(r#"{"statuses": []}"#).unwrap().is_empty());
        assert!(parse_search_response("not json").is_err());
    }

    #[tokio::test]
    async fn test_search_sends_signed_request() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .withf(|req: &HttpRequest| {
                req.method == Method::Get
                    && req.url.starts_with(SEARCH_URL)
                    && req.url.contains("q=rust%20lang")
                    && req.url.contains("count=100")
                    && req.url.contains("tweet_mode=extended")
                    && req
                        .headers
                        .iter()
                        .any(|(k, v)| k == "Authorization" && v.starts_with("OAuth oauth_consumer_key=\"ck\""))
            })
            .returning(|_| Ok(SEARCH_BODY.to_string()));

        let scraper = TwitterScraper::new(Arc::new(transport));
        let records = scraper.search(&credentials(), "rust lang", 500).await.unwrap();
        assert_eq!(records.len(), 2);
    }
}
