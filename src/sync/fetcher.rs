//! Cursor-paginated history retrieval for a single channel.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::client::ApiError;
use crate::error::{SyncError, SyncResult};
use crate::models::message::{HistoryPage, RawMessage};

pub const DEFAULT_PAGE_LIMIT: u32 = 1000;

/// Minimum gap between one history call returning and the next being sent.
/// conversations.history is a tier 3 method; going faster gets throttled.
pub const DEFAULT_PACING: Duration = Duration::from_millis(1200);

/// Anything that can serve pages of a channel's history.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_page(
        &self,
        channel: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, ApiError>;
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub page_limit: u32,
    pub pacing: Duration,
    /// Upper bound on the whole pagination run.
    pub deadline: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            pacing: DEFAULT_PACING,
            deadline: None,
        }
    }
}

/// Reads every page of `channel` and returns the messages in upstream order
/// (newest first). Any failure discards what was read so far.
pub async fn fetch_channel_history<S: HistorySource + ?Sized>(
    source: &S,
    channel: &str,
    options: &FetchOptions,
    cancel: &CancellationToken,
) -> SyncResult<Vec<RawMessage>> {
    let deadline = options.deadline.map(|d| Instant::now() + d);
    let mut messages = Vec::new();
    let mut cursor: Option<String> = None;
    let mut last_returned: Option<Instant> = None;
    let mut pages = 0u32;

    loop {
        if let Some(prev) = last_returned {
            guarded(sleep_until(prev + options.pacing), channel, cancel, deadline).await?;
        }

        let fetch = source.fetch_page(channel, options.page_limit, cursor.as_deref());
        let page = guarded(fetch, channel, cancel, deadline)
            .await?
            .map_err(|e| SyncError::from_channel_api("conversations.history", channel, e))?;
        last_returned = Some(Instant::now());
        pages += 1;

        debug!(
            channel,
            page = pages,
            messages = page.messages.len(),
            more = page.next_cursor.is_some(),
            "history page fetched"
        );

        messages.extend(page.messages);

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    info!(channel, pages, messages = messages.len(), "history fetch complete");
    Ok(messages)
}

/// Runs `fut` unless the token fires or the deadline passes first.
async fn guarded<F: Future>(
    fut: F,
    channel: &str,
    cancel: &CancellationToken,
    deadline: Option<Instant>,
) -> SyncResult<F::Output> {
    let expiry = async {
        match deadline {
            Some(at) => sleep_until(at).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SyncError::Cancelled { channel: channel.to_string() }),
        _ = expiry => Err(SyncError::DeadlineExceeded { channel: channel.to_string() }),
        out = fut => Ok(out),
    }
}
