use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

const MAX_RETRIES: u32 = 3;

/// Envelope every Web API response carries.
#[derive(Debug, Deserialize)]
struct SlackEnvelope {
    ok: bool,
    error: Option<String>,
    needed: Option<String>,
    provided: Option<String>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("token is not a valid header value")]
    InvalidToken,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request failed with status {0}")]
    Status(u16),

    #[error("rate limit exceeded after {0} retries")]
    RateLimited(u32),

    #[error("failed to parse API response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Slack API error: {code}")]
    Slack {
        code: String,
        needed: Option<String>,
        provided: Option<String>,
    },
}

impl ApiError {
    /// Operator-facing advice for the Slack error codes people actually hit.
    pub fn help(&self) -> Option<&'static str> {
        let ApiError::Slack { code, needed, .. } = self else {
            return None;
        };
        let text = match code.as_str() {
            "invalid_auth" => "The Slack token may be expired or invalid. Check it at https://api.slack.com/apps",
            "not_authed" => "No token was sent. Set SLACK_API_TOKEN_BOT and SLACK_API_TOKEN_USER.",
            "missing_scope" if needed.as_deref().is_some_and(|n| n.contains("history")) => {
                "*:read scopes only cover metadata; *:history scopes are required to read message content."
            }
            "missing_scope" => "Add the required OAuth scope to the Slack app and reinstall it.",
            "not_in_channel" => "The bot is not a member of this channel.",
            "token_revoked" => "The token has been revoked.",
            "account_inactive" => "The Slack account behind the token is inactive.",
            "ratelimited" => "Rate limited. Wait a moment and try again.",
            _ => return None,
        };
        Some(text)
    }
}

/// Thin authenticated client for the Slack Web API. One instance per token.
#[derive(Clone)]
pub struct SlackClient {
    client: reqwest::Client,
    base_url: String,
}

impl SlackClient {
    pub fn with_base_url(base_url: &str, token: &str) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.send_with_retry(Method::GET, endpoint, query).await
    }

    /// Form-encoded POST, used by write methods such as conversations.join.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.send_with_retry(Method::POST, endpoint, form).await
    }

    async fn send_with_retry<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut retry_count = 0;

        loop {
            debug!(%method, %url, params = ?params, "slack request");

            let request = self.client.request(method.clone(), &url);
            let request = if method == Method::GET {
                request.query(params)
            } else {
                request.form(params)
            };

            let start = std::time::Instant::now();
            let response = request.send().await?;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            let status = response.status();

            if status.as_u16() == 429 {
                if retry_count >= MAX_RETRIES {
                    return Err(ApiError::RateLimited(MAX_RETRIES));
                }

                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);

                warn!(
                    endpoint,
                    retry_after,
                    attempt = retry_count + 1,
                    max = MAX_RETRIES,
                    "rate limited, waiting before retry"
                );

                tokio::time::sleep(Duration::from_secs(retry_after)).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                debug!(endpoint, status = status.as_u16(), elapsed_ms, "slack request failed");
                return Err(ApiError::Status(status.as_u16()));
            }

            let body = response.text().await?;
            debug!(endpoint, status = status.as_u16(), elapsed_ms, bytes = body.len(), "slack response");

            let envelope: SlackEnvelope =
                serde_json::from_str(&body).map_err(|source| ApiError::Decode {
                    endpoint: endpoint.to_string(),
                    source,
                })?;

            if !envelope.ok {
                return Err(ApiError::Slack {
                    code: envelope.error.unwrap_or_else(|| "unknown_error".to_string()),
                    needed: envelope.needed,
                    provided: envelope.provided,
                });
            }

            return serde_json::from_str::<T>(&body).map_err(|source| ApiError::Decode {
                endpoint: endpoint.to_string(),
                source,
            });
        }
    }
}
