use async_trait::async_trait;

use super::client::{ApiError, SlackClient};
use crate::models::message::{HistoryPage, HistoryResponse};
use crate::sync::fetcher::HistorySource;

/// Fetches one page of conversations.history.
pub async fn history_page(
    client: &SlackClient,
    channel: &str,
    limit: u32,
    cursor: Option<&str>,
) -> Result<HistoryPage, ApiError> {
    let mut query = vec![
        ("channel", channel.to_string()),
        ("limit", limit.to_string()),
    ];

    if let Some(c) = cursor {
        query.push(("cursor", c.to_string()));
    }

    let response: HistoryResponse = client.get("conversations.history", &query).await?;
    Ok(response.into())
}

#[async_trait]
impl HistorySource for SlackClient {
    async fn fetch_page(
        &self,
        channel: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, ApiError> {
        history_page(self, channel, limit, cursor).await
    }
}
