use super::client::{ApiError, SlackClient};
use crate::models::user::{SlackUser, UsersListResponse};

/// Single page of users.list. Slack returns the whole roster for small
/// workspaces when no limit is given.
pub async fn list_users(client: &SlackClient) -> Result<Vec<SlackUser>, ApiError> {
    let response: UsersListResponse = client.get("users.list", &[]).await?;
    Ok(response.members)
}
