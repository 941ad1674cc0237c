use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct SlackChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChannelsListResponse {
    #[serde(default)]
    pub channels: Vec<SlackChannel>,
}

/// conversations.join reply; only the warning is of interest.
#[derive(Debug, Deserialize)]
pub struct JoinResponse {
    pub warning: Option<String>,
}
