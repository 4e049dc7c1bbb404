use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Result, ScrapingError};
use crate::parser::{extract_tiktok_video_id, format_epoch_seconds, CommentRecord};
use crate::scraper::transport::{HttpRequest, Transport};

pub const COMMENT_LIST_URL: &str = "https://www.tiktok.com/api/comment/list/";

// the web endpoint never returns more than this per call
pub const MAX_COMMENTS_PER_PAGE: usize = 50;

const WEB_APP_ID: &str = "1988";

#[derive(Debug, Deserialize)]
struct CommentListResponse {
    #[serde(default)]
    status_code: i64,
    status_msg: Option<String>,
    // null when the video has no comments
    comments: Option<Vec<TikTokComment>>,
    #[serde(default)]
    cursor: i64,
    #[serde(default)]
    has_more: i64,
}

#[derive(Debug, Deserialize)]
struct TikTokComment {
    #[serde(default)]
    create_time: i64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    digg_count: i64,
    user: Option<TikTokUser>,
}

#[derive(Debug, Deserialize)]
struct TikTokUser {
    #[serde(default)]
    unique_id: String,
}

#[derive(Debug, Default, PartialEq)]
pub struct CommentPage {
    pub comments: Vec<CommentRecord>,
    pub cursor: i64,
    pub has_more: bool,
}

pub struct TikTokScraper {
    transport: Arc<dyn Transport>,
}

impl TikTokScraper {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Up to `count` comments of the video linked by `video_url`
    pub async fn fetch_comments(&self, video_url: &str, count: usize) -> Result<Vec<CommentRecord>> {
        let video_id = extract_tiktok_video_id(video_url).ok_or_else(|| {
            ScrapingError::InvalidTarget("TikTok URL is invalid or has no video ID".to_string())
        })?;

        info!("Fetching up to {} TikTok comments for video {}", count, video_id);

        let mut records: Vec<CommentRecord> = Vec::new();
        let mut cursor = 0i64;

        while records.len() < count {
            let page_size = (count - records.len()).min(MAX_COMMENTS_PER_PAGE);
            let request = HttpRequest::get(COMMENT_LIST_URL)
                .query("aid", WEB_APP_ID)
                .query("aweme_id", video_id.as_str())
                .query("count", page_size.to_string())
                .query("cursor", cursor.to_string())
                .header("Referer", format!("https://www.tiktok.com/video/{}", video_id));

            let body = self.transport.send(request).await?;
            let page = parse_comment_page(&body)?;
            debug!("TikTok page at cursor {} returned {} comments", cursor, page.comments.len());

            if page.comments.is_empty() {
                break;
            }

            let remaining = count - records.len();
            records.extend(page.comments.into_iter().take(remaining));

            if !page.has_more || page.cursor <= cursor {
                break;
            }
            cursor = page.cursor;
        }

        info!("Collected {} TikTok comments for video {}", records.len(), video_id);
        Ok(records)
    }
}

pub fn parse_comment_page(body: &str) -> Result<CommentPage> {
    if body.trim().is_empty() {
        return Err(ScrapingError::ApiError(
            "TikTok returned an empty body; the request was likely blocked".to_string(),
        )
        .into());
    }

    let response: CommentListResponse = serde_json::from_str(body)
        .map_err(|e| ScrapingError::ParseError(format!("Unexpected TikTok response: {}", e)))?;

    if response.status_code != 0 {
        return Err(ScrapingError::ApiError(format!(
            "TikTok status {}: {}",
            response.status_code,
            response.status_msg.unwrap_or_default()
        ))
        .into());
    }

    let comments = response
        .comments
        .unwrap_or_default()
        .into_iter()
        .map(|comment| {
            CommentRecord::new(
                format_epoch_seconds(comment.create_time),
                comment.user.map(|u| u.unique_id).unwrap_or_default(),
                comment.text,
                vec![comment.digg_count],
            )
        })
        .collect();

    Ok(CommentPage {
        comments,
        cursor: response.cursor,
        has_more: response.has_more != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::transport::MockTransport;
    use mockall::Sequence;
    use serde_json::json;

    const VIDEO_URL: &str = "https://www.tiktok.com/@creator/video/7301234567890123456";

    fn page(users: &[&str], cursor: i64, has_more: bool) -> String {
        let comments: Vec<_> = users
            .iter()
            .map(|u| {
                json!({
                    "cid": "1",
                    "create_time": 1_700_000_000,
                    "text": format!("hi from {}", u),
                    "digg_count": 4,
                    "user": { "unique_id": u, "nickname": "Nick" }
                })
            })
            .collect();
        let has_more = i64::from(has_more);
        json!({
            "status_code": 0,
            "comments": comments,
            "cursor": cursor,
            "has_more": has_more,
            "total": 99
        })
        .to_string()
    }

    fn scraper(transport: MockTransport) -> TikTokScraper {
        TikTokScraper::new(Arc::new(transport))
    }

    #[test]
    fn test_parse_comment_page() {
        let parsed = parse_comment_page(&page(&["alpha", "beta"], 20, true)).unwrap();
        assert_eq!(parsed.comments.len(), 2);
        assert_eq!(parsed.comments[0].user, "alpha");
        assert_eq!(parsed.comments[0].text, "hi from alpha");
        assert_eq!(parsed.comments[0].date, "2023-11-14 22:13:20");
        assert_eq!(parsed.comments[0].engagement, vec![4]);
        assert_eq!(parsed.cursor, 20);
        assert!(parsed.has_more);
    }

    #[test]
    fn test_parse_comment_page_null_comments() {
        let body = r#"{"status_code":0,"comments":null,"cursor":0,"has_more":0}"#;
        let parsed = parse_comment_page(body).unwrap();
        assert!(parsed.comments.is_empty());
        assert!(!parsed.has_more);
    }

    #[test]
    fn test_parse_comment_page_errors() {
        let blocked = r#"{"status_code":10201,"status_msg":"video not found"}"#;
        assert!(parse_comment_page(blocked).unwrap_err().to_string().contains("video not found"));
        assert!(parse_comment_page("").is_err());
    }

    #[tokio::test]
    async fn test_fetch_comments_follows_cursor_until_count() {
        let mut transport = MockTransport::new();
        let mut seq = Sequence::new();

        let first = page(&["a", "b", "c"], 3, true);
        let second = page(&["d", "e", "f"], 6, true);

        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req: &HttpRequest| {
                req.query_value("aweme_id") == Some("7301234567890123456")
                    && req.query_value("cursor") == Some("0")
                    && req.query_value("count") == Some("5")
            })
            .returning(move |_| Ok(first.clone()));
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|req: &HttpRequest| {
                req.query_value("cursor") == Some("3") && req.query_value("count") == Some("2")
            })
            .returning(move |_| Ok(second.clone()));

        let records = scraper(transport).fetch_comments(VIDEO_URL, 5).await.unwrap();
        let users: Vec<&str> = records.iter().map(|c| c.user.as_str()).collect();
        assert_eq!(users, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_fetch_comments_stops_when_no_more() {
        let mut transport = MockTransport::new();
        let only = page(&["solo"], 1, false);
        transport
            .expect_send()
            .times(1)
            .returning(move |_| Ok(only.clone()));

        let records = scraper(transport).fetch_comments(VIDEO_URL, 20).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_comments_invalid_url() {
        let transport = MockTransport::new();
        let err = scraper(transport)
            .fetch_comments("https://vm.tiktok.com/ZMabc/", 20)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("TikTok URL is invalid"));
    }
}
