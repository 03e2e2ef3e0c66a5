//! HTTP client for the inventory service.

use super::error::InventoryError;
use super::retry::RetryPolicy;
use crate::record::AssetRecord;
use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Bound on every individual HTTP call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// How much response body is worth carrying around in an error.
const BODY_EXCERPT_LEN: usize = 200;

/// Request authentication. Bearer takes precedence when both a token and
/// basic credentials are configured.
#[derive(Debug, Clone)]
pub enum AuthScheme {
    Anonymous,
    Bearer(String),
    Basic {
        username: String,
        password: Option<String>,
    },
}

impl AuthScheme {
    /// Resolve the scheme from the flag/config surface.
    pub fn from_parts(
        bearer: Option<String>,
        basic_user: Option<String>,
        basic_pass: Option<String>,
    ) -> Self {
        if let Some(token) = bearer.filter(|t| !t.is_empty()) {
            return AuthScheme::Bearer(token);
        }
        if let Some(username) = basic_user.filter(|u| !u.is_empty()) {
            return AuthScheme::Basic {
                username,
                password: basic_pass,
            };
        }
        AuthScheme::Anonymous
    }
}

/// The slice of an inventory record the dedup cache cares about.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnownAsset {
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NextIdResponse {
    id: String,
}

#[derive(Debug, Clone)]
pub struct InventoryClient {
    http: reqwest::Client,
    api_root: String,
    auth: AuthScheme,
}

impl InventoryClient {
    pub fn new(api_root: &str, auth: AuthScheme) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_root: api_root.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            AuthScheme::Anonymous => request,
            AuthScheme::Bearer(token) => request.bearer_auth(token),
            AuthScheme::Basic { username, password } => {
                request.basic_auth(username, password.as_deref())
            }
        }
    }

    /// List every asset the inventory knows, reduced to the dedup columns.
    pub async fn list_assets(&self) -> Result<Vec<KnownAsset>, InventoryError> {
        let url = format!("{}/assets", self.api_root);
        let resp = self.authorize(self.http.get(&url)).send().await?;

        match resp.status() {
            StatusCode::OK => Ok(resp.json::<Vec<KnownAsset>>().await?),
            StatusCode::UNAUTHORIZED => Err(InventoryError::Unauthorized),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(InventoryError::Rejected {
                    status: status.as_u16(),
                    body: excerpt(&body),
                })
            }
        }
    }

    /// Ask the inventory for the next sequential ID of an asset type.
    ///
    /// Best effort by contract: any failure is logged and reported as
    /// `None`, letting the allocator synthesize a local series instead.
    pub async fn next_asset_id(&self, asset_type: &str) -> Option<String> {
        let url = match self.next_id_url(asset_type) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Next-ID request not built: {:#}", e);
                return None;
            }
        };

        match self.authorize(self.http.get(url)).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => {
                match resp.json::<NextIdResponse>().await {
                    Ok(next) => Some(next.id),
                    Err(e) => {
                        tracing::warn!("Next-ID response unreadable for {}: {}", asset_type, e);
                        None
                    }
                }
            }
            Ok(resp) if resp.status() == StatusCode::UNAUTHORIZED => {
                tracing::warn!(
                    "Next-ID 401 Unauthorized for {}; using a local series (pass --bearer or --basic-user)",
                    asset_type
                );
                None
            }
            Ok(resp) => {
                tracing::warn!("Next-ID failed for {}: HTTP {}", asset_type, resp.status());
                None
            }
            Err(e) => {
                tracing::warn!("Next-ID error for {}: {}", asset_type, e);
                None
            }
        }
    }

    /// POST one asset record, riding out transient contention.
    ///
    /// 200/201 succeed; 401 is fatal immediately (credentials will not fix
    /// themselves by waiting); 409/429/503 or a lock hint in the body back
    /// off and try again; anything else is terminal for this record.
    pub async fn register_asset(
        &self,
        record: &AssetRecord,
        policy: &RetryPolicy,
    ) -> Result<(), InventoryError> {
        let url = format!("{}/assets", self.api_root);
        let tries = policy.max_tries.max(1);
        let mut last: Option<InventoryError> = None;

        for attempt in 1..=tries {
            match self.authorize(self.http.post(&url)).json(record).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status == StatusCode::OK || status == StatusCode::CREATED {
                        return Ok(());
                    }
                    if status == StatusCode::UNAUTHORIZED {
                        return Err(InventoryError::Unauthorized);
                    }

                    let body = resp.text().await.unwrap_or_default();
                    let rejection = InventoryError::Rejected {
                        status: status.as_u16(),
                        body: excerpt(&body),
                    };

                    if !policy.is_retryable(status, &body) {
                        return Err(rejection);
                    }

                    tracing::warn!(
                        "Inventory busy (HTTP {}), attempt {}/{}",
                        status,
                        attempt,
                        tries
                    );
                    last = Some(rejection);
                }
                Err(e) => {
                    tracing::warn!("POST to inventory failed, attempt {}/{}: {}", attempt, tries, e);
                    last = Some(InventoryError::Transport(e));
                }
            }

            if attempt < tries {
                tokio::time::sleep(policy.delay_for(attempt)).await;
            }
        }

        let cause = last
            .map(Box::new)
            .unwrap_or_else(|| Box::new(InventoryError::Offline));
        Err(InventoryError::RetriesExhausted { tries, source: cause })
    }

    /// Build the next-ID URL with the asset type percent-encoded as one
    /// path segment.
    fn next_id_url(&self, asset_type: &str) -> Result<reqwest::Url> {
        let mut url =
            reqwest::Url::parse(&self.api_root).context("invalid inventory API root")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("inventory API root cannot be a base URL"))?
            .extend(["assets", "next-id", asset_type]);
        Ok(url)
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_EXCERPT_LEN {
        trimmed.to_string()
    } else {
        let cut = trimmed
            .char_indices()
            .take_while(|(i, _)| *i < BODY_EXCERPT_LEN)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}…", &trimmed[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_wins_over_basic() {
        let auth = AuthScheme::from_parts(
            Some("tok".to_string()),
            Some("user".to_string()),
            Some("pass".to_string()),
        );
        assert!(matches!(auth, AuthScheme::Bearer(t) if t == "tok"));
    }

    #[test]
    fn empty_flags_mean_anonymous() {
        let auth = AuthScheme::from_parts(Some(String::new()), None, None);
        assert!(matches!(auth, AuthScheme::Anonymous));
    }

    #[test]
    fn next_id_url_percent_encodes_the_type() {
        let client = InventoryClient::new("http://inventory:4000", AuthScheme::Anonymous).unwrap();
        let url = client.next_id_url("Mobile Phones").unwrap();
        assert_eq!(
            url.as_str(),
            "http://inventory:4000/assets/next-id/Mobile%20Phones"
        );
    }

    #[test]
    fn trailing_slash_is_trimmed_from_the_root() {
        let client = InventoryClient::new("http://inventory:4000/", AuthScheme::Anonymous).unwrap();
        assert_eq!(client.api_root(), "http://inventory:4000");
    }

    #[test]
    fn long_bodies_are_excerpted() {
        let body = "x".repeat(500);
        let cut = excerpt(&body);
        assert!(cut.chars().count() <= BODY_EXCERPT_LEN + 1);
        assert!(cut.ends_with('…'));
    }
}
