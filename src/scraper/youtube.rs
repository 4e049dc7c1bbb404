use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::YouTubeConfig;
use crate::error::{Result, ScrapingError};
use crate::parser::{extract_youtube_video_id, format_rfc3339, CommentRecord};
use crate::scraper::transport::{HttpRequest, Transport};

pub const COMMENT_THREADS_URL: &str = "https://www.googleapis.com/youtube/v3/commentThreads";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadListResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: ThreadSnippet,
    replies: Option<ThreadReplies>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadSnippet {
    top_level_comment: Comment,
    #[serde(default)]
    total_reply_count: u64,
}

#[derive(Debug, Deserialize)]
struct ThreadReplies {
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Debug, Deserialize)]
struct Comment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    author_display_name: String,
    #[serde(default)]
    text_display: String,
    #[serde(default)]
    like_count: i64,
}

impl From<CommentSnippet> for CommentRecord {
    fn from(snippet: CommentSnippet) -> Self {
        CommentRecord::new(
            format_rfc3339(&snippet.published_at),
            snippet.author_display_name,
            snippet.text_display,
            vec![snippet.like_count],
        )
    }
}

/// Comments of one `commentThreads.list` page plus the cursor to the next
#[derive(Debug, Default, PartialEq)]
pub struct CommentThreadPage {
    pub comments: Vec<CommentRecord>,
    pub next_page_token: Option<String>,
}

pub struct YouTubeScraper {
    transport: Arc<dyn Transport>,
    config: YouTubeConfig,
}

impl YouTubeScraper {
    pub fn new(transport: Arc<dyn Transport>, config: YouTubeConfig) -> Self {
        Self { transport, config }
    }

    /// Every top-level comment and reply on the video, following page tokens to the end
    pub async fn fetch_comments(&self, api_key: &str, video: &str) -> Result<Vec<CommentRecord>> {
        let video_id = extract_youtube_video_id(video)
            .ok_or_else(|| ScrapingError::InvalidTarget(format!("No YouTube video ID in {:?}", video)))?;

        info!("Fetching YouTube comments for video {}", video_id);

        let mut records = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let mut request = HttpRequest::get(COMMENT_THREADS_URL)
                .query("part", "snippet,replies")
                .query("videoId", video_id.as_str())
                .query("maxResults", self.config.max_results.to_string())
                .query("key", api_key);
            if let Some(ref token) = page_token {
                request = request.query("pageToken", token.as_str());
            }

            let body = self.transport.send(request).await?;
            let page = parse_comment_threads(&body)?;
            pages += 1;
            debug!("YouTube page {} returned {} comments", pages, page.comments.len());

            records.extend(page.comments);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!("Collected {} YouTube comments over {} pages", records.len(), pages);
        Ok(records)
    }
}

/// Flatten one page: each top-level comment followed by its replies
pub fn parse_comment_threads(body: &str) -> Result<CommentThreadPage> {
    let response: CommentThreadListResponse = serde_json::from_str(body)
        .map_err(|e| ScrapingError::ParseError(format!("Unexpected YouTube response: {}", e)))?;

    let mut comments = Vec::new();
    for thread in response.items {
        let has_replies = thread.snippet.total_reply_count > 0;
        comments.push(thread.snippet.top_level_comment.snippet.into());

        if has_replies {
            if let Some(replies) = thread.replies {
                comments.extend(replies.comments.into_iter().map(|reply| reply.snippet.into()));
            }
        }
    }

    Ok(CommentThreadPage {
        comments,
        next_page_token: response.next_page_token,
    })
}
