//! OAuth 1.0a request signing (HMAC-SHA1) for the Twitter v1.1 API.
//!
//! The four keys are passed through exactly as the user supplied them; there
//! is no token exchange.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use std::fmt;

use crate::error::{Result, ScrapingError};

type HmacSha1 = Hmac<Sha1>;

// RFC 3986 unreserved characters stay as-is, everything else is escaped
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl TwitterCredentials {
    /// Names of the keys left blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.trim().is_empty() {
            missing.push("api_key");
        }
        if self.api_secret.trim().is_empty() {
            missing.push("api_secret");
        }
        if self.access_token.trim().is_empty() {
            missing.push("access_token");
        }
        if self.access_token_secret.trim().is_empty() {
            missing.push("access_token_secret");
        }
        missing
    }
}

impl fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// `k=v&k=v` with OAuth escaping, in the order given
pub fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn oauth_params(credentials: &TwitterCredentials, nonce: &str, timestamp: i64) -> Vec<(String, String)> {
    vec![
        ("oauth_consumer_key".to_string(), credentials.api_key.clone()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_token".to_string(), credentials.access_token.clone()),
        ("oauth_version".to_string(), "1.0".to_string()),
    ]
}

/// Base64 HMAC-SHA1 signature over the request
///
/// `params` holds every query and form parameter of the request; the OAuth
/// protocol parameters are added here.
pub fn signature(
    method: &str,
    url: &str,
    params: &[(String, String)],
    credentials: &TwitterCredentials,
    nonce: &str,
    timestamp: i64,
) -> Result<String> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .cloned()
        .chain(oauth_params(credentials, nonce, timestamp))
        .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&parameter_string)
    );
    let signing_key = format!(
        "{}&{}",
        percent_encode(&credentials.api_secret),
        percent_encode(&credentials.access_token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|e| ScrapingError::ApiError(format!("Failed to initialise request signer: {}", e)))?;
    mac.update(base_string.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Value for the `Authorization` header of a signed request
pub fn authorization_header(
    method: &str,
    url: &str,
    params: &[(String, String)],
    credentials: &TwitterCredentials,
    nonce: &str,
    timestamp: i64,
) -> Result<String> {
    let signature = signature(method, url, params, credentials, nonce, timestamp)?;

    let mut header_params = oauth_params(credentials, nonce, timestamp);
    header_params.push(("oauth_signature".to_string(), signature));
    header_params.sort();

    let fields = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", fields))
}
