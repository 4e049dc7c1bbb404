use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{Result, ScrapingError};
use crate::scraper::user_agent::UserAgentGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Everything an adapter needs to describe one call
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn form(mut self, key: &str, value: impl Into<String>) -> Self {
        self.form.push((key.to_string(), value.into()));
        self
    }

    // first query value under a key
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Sends a request and hands back the body of a successful response
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<String>;
}

pub struct ReqwestTransport {
    client: Client,
    user_agents: Option<UserAgentGenerator>,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(UserAgentGenerator::DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| ScrapingError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        let user_agents = config.randomize_user_agents.then(UserAgentGenerator::new);

        Ok(Self { client, user_agents })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<String> {
        debug!("{:?} {}", request.method, request.url);

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref generator) = self.user_agents {
            builder = builder.header(reqwest::header::USER_AGENT, generator.random_user_agent());
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ScrapingError::NetworkError(format!("Request to {} failed: {}", request.url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScrapingError::NetworkError(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(ScrapingError::ApiError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                api_error_message(&body)
            ))
            .into());
        }

        Ok(body)
    }
}

/// Best human-readable message from an error body
pub fn api_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        // google apis: {"error": {"message": ...}}
        if let Some(message) = value["error"]["message"].as_str() {
            return message.to_string();
        }
        // twitter: {"errors": [{"message": ...}]}
        if let Some(message) = value["errors"][0]["message"].as_str() {
            return message.to_string();
        }
        if let Some(message) = value["status_msg"].as_str() {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::get("https://example.com/api")
            .query("videoId", "abc")
            .query("pageToken", "next")
            .header("Referer", "https://example.com/");

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.query_value("videoId"), Some("abc"));
        assert_eq!(request.query_value("pageToken"), Some("next"));
        assert_eq!(request.query_value("missing"), None);
        assert_eq!(request.headers.len(), 1);
        assert!(request.form.is_empty());
    }

    #[test]
    fn test_api_error_message_google() {
        let body = r#"{"error":{"code":403,"message":"The request cannot be completed because you have exceeded your quota."}}"#;
        assert_eq!(
            api_error_message(body),
            "The request cannot be completed because you have exceeded your quota."
        );
    }

    #[test]
    fn test_api_error_message_twitter() {
        let body = r#"{"errors":[{"code":32,"message":"Could not authenticate you."}]}"#;
        assert_eq!(api_error_message(body), "Could not authenticate you.");
    }

    #[test]
    fn test_api_error_message_plain_text() {
        assert_eq!(api_error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(api_error_message(""), "empty response body");
        let long = "x".repeat(500);
        assert_eq!(api_error_message(&long).len(), 200);
    }
}
