//! Error types for roster and history synchronization.

use thiserror::Error;

use crate::api::client::ApiError;

/// Result type for orchestrator and store operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Per-message timestamp failures. These never abort a sync; the offending
/// message is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    EmptyTimestamp,

    #[error("malformed timestamp seconds '{0}'")]
    MalformedTimestamp(String),
}

/// Errors surfaced to callers of the sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Missing or malformed required input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Slack rejected the token or its scopes. Needs operator action.
    #[error("{operation}: authorization failed{}: {code}{}",
        .channel.as_deref().map(|c| format!(" for channel {c}")).unwrap_or_default(),
        .needed.as_deref().map(|n| format!(" (needed scope: {n})")).unwrap_or_default())]
    AuthorizationFailed {
        operation: &'static str,
        channel: Option<String>,
        code: String,
        needed: Option<String>,
    },

    /// History fetch failed mid-pagination; accumulated pages were discarded.
    #[error("failed to fetch history for channel {channel}: {cause}")]
    FetchFailed {
        channel: String,
        #[source]
        cause: ApiError,
    },

    /// A single-shot roster fetch (users.list, conversations.list) failed.
    #[error("{operation}: {cause}")]
    Upstream {
        operation: &'static str,
        #[source]
        cause: ApiError,
    },

    #[error("history fetch for channel {channel} was cancelled")]
    Cancelled { channel: String },

    #[error("history fetch for channel {channel} exceeded its deadline")]
    DeadlineExceeded { channel: String },

    #[error("{operation} failed for {key}: {source}")]
    Storage {
        operation: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("no user found with id {id}")]
    NotFound { id: i32 },
}

impl SyncError {
    pub(crate) fn storage(operation: &'static str, key: impl Into<String>, source: StoreError) -> Self {
        SyncError::Storage {
            operation,
            key: key.into(),
            source,
        }
    }

    /// Classifies a history/join failure for `channel`.
    pub(crate) fn from_channel_api(operation: &'static str, channel: &str, err: ApiError) -> Self {
        match err {
            ApiError::Slack { code, needed, .. } if is_authorization_code(&code) => {
                SyncError::AuthorizationFailed {
                    operation,
                    channel: Some(channel.to_string()),
                    code,
                    needed,
                }
            }
            cause => SyncError::FetchFailed {
                channel: channel.to_string(),
                cause,
            },
        }
    }

    /// Classifies a failure of a roster-wide call.
    pub(crate) fn from_roster_api(operation: &'static str, err: ApiError) -> Self {
        match err {
            ApiError::Slack { code, needed, .. } if is_authorization_code(&code) => {
                SyncError::AuthorizationFailed {
                    operation,
                    channel: None,
                    code,
                    needed,
                }
            }
            cause => SyncError::Upstream { operation, cause },
        }
    }

    /// True for conditions the caller caused (bad input, unknown id).
    pub fn is_client_error(&self) -> bool {
        matches!(self, SyncError::Validation(_) | SyncError::NotFound { .. })
    }
}

/// Slack error codes that mean the token or its grants are insufficient.
pub fn is_authorization_code(code: &str) -> bool {
    matches!(
        code,
        "missing_scope"
            | "not_authed"
            | "invalid_auth"
            | "account_inactive"
            | "token_revoked"
            | "token_expired"
            | "no_permission"
            | "not_in_channel"
            | "method_not_supported_for_channel_type"
            | "ekm_access_denied"
            | "org_login_required"
    )
}

/// Failures of the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error(transparent)]
    Query(#[from] diesel::result::Error),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
