use super::client::{ApiError, SlackClient};
use crate::models::channel::{ChannelsListResponse, JoinResponse, SlackChannel};
use tracing::debug;

/// Public channels visible to the token, one page.
pub async fn list_public_channels(client: &SlackClient) -> Result<Vec<SlackChannel>, ApiError> {
    let query = vec![("types", "public_channel".to_string())];
    let response: ChannelsListResponse = client.get("conversations.list", &query).await?;
    Ok(response.channels)
}

/// Adds the bot to `channel` so its history becomes readable.
/// Joining a channel the bot is already in succeeds with a warning.
pub async fn join_channel(client: &SlackClient, channel: &str) -> Result<(), ApiError> {
    let form = vec![("channel", channel.to_string())];
    let response: JoinResponse = client.post_form("conversations.join", &form).await?;

    if let Some(warning) = response.warning {
        debug!(channel, warning, "conversations.join warning");
    }
    Ok(())
}
