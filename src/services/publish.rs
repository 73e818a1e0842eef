// src/services/publish.rs

//! Publishing formatted posts.
//!
//! [`XPublisher`] creates a single text post through the X API v2
//! (`POST /2/tweets`), authenticated either with an OAuth 1.0a user-context
//! signature or an OAuth 2.0 user bearer token. There is no idempotency key
//! and no retry: running twice in one day posts the same text twice.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::{AuthMode, Credentials, ENV_BEARER_TOKEN, PostConfig};
use crate::utils::console;

/// RFC 3986 unreserved characters stay as they are.
const OAUTH_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Destination for finished post texts.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Send one post.
    async fn publish(&self, text: &str) -> Result<()>;
}

/// Logs post texts instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct DryRunPublisher;

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, text: &str) -> Result<()> {
        log::info!("[dry-run] would post:\n{}", text);
        Ok(())
    }
}

#[derive(Serialize)]
struct CreatePost<'a> {
    text: &'a str,
}

/// Publisher for the X API.
pub struct XPublisher {
    client: Client,
    endpoint: String,
    auth: AuthMode,
    credentials: Credentials,
}

impl XPublisher {
    /// Build a publisher from posting settings and startup credentials.
    pub fn new(client: Client, config: &PostConfig, credentials: Credentials) -> Result<Self> {
        if config.auth == AuthMode::Bearer && credentials.bearer_token.is_none() {
            return Err(AppError::credentials(ENV_BEARER_TOKEN));
        }
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            auth: config.auth,
            credentials,
        })
    }

    fn authorization(&self, text: &str) -> Result<String> {
        match self.auth {
            AuthMode::Bearer => self
                .credentials
                .bearer_token
                .as_ref()
                .map(|token| format!("Bearer {token}"))
                .ok_or_else(|| AppError::credentials(ENV_BEARER_TOKEN)),
            AuthMode::Oauth1 => {
                let timestamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_err(AppError::publish)?;
                let nonce = make_nonce(timestamp.as_nanos(), text);
                oauth1_header(
                    "POST",
                    &self.endpoint,
                    &[],
                    &self.credentials,
                    timestamp.as_secs(),
                    &nonce,
                )
            }
        }
    }
}

#[async_trait]
impl Publisher for XPublisher {
    async fn publish(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, self.authorization(text)?)
            .json(&CreatePost { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::publish(format!(
                "{status}: {}",
                console::preview(&body, 200)
            )));
        }
        Ok(())
    }
}

fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE).to_string()
}

/// 32 hex characters derived from the clock and the post text.
fn make_nonce(nanos: u128, text: &str) -> String {
    let digest = Sha256::digest(format!("{nanos}:{text}").as_bytes());
    hex::encode(digest)[..32].to_string()
}

/// Build an OAuth 1.0a `Authorization` header value (HMAC-SHA1).
///
/// `params` are query or form parameters that take part in the signature.
/// JSON bodies do not, so posting passes an empty slice.
pub fn oauth1_header(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    credentials: &Credentials,
    timestamp: u64,
    nonce: &str,
) -> Result<String> {
    let timestamp = timestamp.to_string();
    let mut oauth: BTreeMap<&str, &str> = BTreeMap::new();
    oauth.insert("oauth_consumer_key", &credentials.api_key);
    oauth.insert("oauth_nonce", nonce);
    oauth.insert("oauth_signature_method", "HMAC-SHA1");
    oauth.insert("oauth_timestamp", &timestamp);
    oauth.insert("oauth_token", &credentials.access_token);
    oauth.insert("oauth_version", "1.0");

    let mut encoded: Vec<(String, String)> = oauth
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .chain(
            params
                .iter()
                .map(|(k, v)| (percent_encode(k), percent_encode(v))),
        )
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let base = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    );
    let key = format!(
        "{}&{}",
        percent_encode(&credentials.api_secret),
        percent_encode(&credentials.access_secret)
    );

    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| AppError::publish(format!("signing key rejected: {e}")))?;
    mac.update(base.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    let header = oauth
        .iter()
        .map(|(k, v)| (*k, *v))
        .chain(std::iter::once(("oauth_signature", signature.as_str())))
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {header}"))
}
