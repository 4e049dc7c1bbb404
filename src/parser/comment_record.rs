use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout every timestamp is rendered with, in UTC
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Platform a comment was fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    PlayStore,
    Twitter,
    YouTube,
    TikTok,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::PlayStore,
        Platform::Twitter,
        Platform::YouTube,
        Platform::TikTok,
    ];

    // name shown to users
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::PlayStore => "Google Play Store",
            Platform::Twitter => "Twitter",
            Platform::YouTube => "YouTube",
            Platform::TikTok => "TikTok",
        }
    }

    // short lowercase name used for files and routes
    pub fn slug(&self) -> &'static str {
        match self {
            Platform::PlayStore => "playstore",
            Platform::Twitter => "twitter",
            Platform::YouTube => "youtube",
            Platform::TikTok => "tiktok",
        }
    }

    /// Column holding the text body
    pub fn text_column(&self) -> &'static str {
        match self {
            Platform::PlayStore => "Content",
            Platform::Twitter => "Tweet",
            Platform::YouTube | Platform::TikTok => "Comment",
        }
    }

    /// Engagement counter columns, in output order
    pub fn metric_columns(&self) -> &'static [&'static str] {
        match self {
            Platform::PlayStore => &["Score"],
            Platform::Twitter => &["Likes", "Retweets"],
            Platform::YouTube | Platform::TikTok => &["Likes"],
        }
    }

    /// Full ordered column set: Date, User, text, then metrics
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![
            "Date".to_string(),
            "User".to_string(),
            self.text_column().to_string(),
        ];
        columns.extend(self.metric_columns().iter().map(|c| c.to_string()));
        columns
    }

    /// Whether a column holds free text on any platform, even when its values look numeric
    pub fn is_text_column(name: &str) -> bool {
        name == "Date" || name == "User" || Platform::ALL.iter().any(|p| p.text_column() == name)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One flattened piece of platform feedback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentRecord {
    pub date: String,
    pub user: String,
    pub text: String,
    /// Counters in the order of `Platform::metric_columns`
    pub engagement: Vec<i64>,
}

impl CommentRecord {
    pub fn new(date: String, user: String, text: String, engagement: Vec<i64>) -> Self {
        Self {
            date,
            user,
            text,
            engagement,
        }
    }
}

// render a utc timestamp the way every platform column shows it
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(DATE_FORMAT).to_string()
}

/// Epoch seconds to display form; out-of-range values are kept as digits
pub fn format_epoch_seconds(seconds: i64) -> String {
    match DateTime::<Utc>::from_timestamp(seconds, 0) {
        Some(ts) => format_timestamp(ts),
        None => seconds.to_string(),
    }
}

/// RFC 3339 (YouTube `publishedAt`) to display form, raw value on failure
pub fn format_rfc3339(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => format_timestamp(ts.with_timezone(&Utc)),
        Err(_) => raw.to_string(),
    }
}

/// Twitter `created_at` ("Wed Oct 10 20:19:24 +0000 2018") to display form
pub fn format_twitter_date(raw: &str) -> String {
    match DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y") {
        Ok(ts) => format_timestamp(ts.with_timezone(&Utc)),
        Err(_) => raw.to_string(),
    }
}
