use serde::{Deserialize, Serialize};

/// One entry of a conversations.history page. Only the fields the sync reads
/// are kept; `ts` defaults to empty so a missing timestamp is skipped later
/// instead of failing the whole page.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RawMessage {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
    pub team: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<RawMessage>,
    #[serde(default)]
    pub has_more: bool,
    pub response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMetadata {
    pub next_cursor: Option<String>,
}

/// A decoded history page with the continuation already resolved.
#[derive(Debug, Clone, Default)]
pub struct HistoryPage {
    pub messages: Vec<RawMessage>,
    /// `None` once the upstream says there is nothing more to read.
    pub next_cursor: Option<String>,
}

impl From<HistoryResponse> for HistoryPage {
    fn from(response: HistoryResponse) -> Self {
        let cursor = response
            .response_metadata
            .and_then(|m| m.next_cursor)
            .filter(|c| !c.is_empty());

        Self {
            messages: response.messages,
            next_cursor: if response.has_more { cursor } else { None },
        }
    }
}
