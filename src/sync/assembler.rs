use tracing::warn;

use super::timestamp::normalize_timestamp;
use crate::models::message::RawMessage;
use crate::store::models::ConversationRecord;

/// Turns fetched messages into conversation records for `channel_id`,
/// dropping any message whose timestamp cannot be normalized.
pub fn assemble_conversations(channel_id: &str, messages: Vec<RawMessage>) -> Vec<ConversationRecord> {
    let total = messages.len();

    let records: Vec<ConversationRecord> = messages
        .into_iter()
        .filter_map(|message| match normalize_timestamp(&message.ts) {
            Ok(timestamp) => Some(ConversationRecord {
                channel_id: channel_id.to_string(),
                user_id: message.user,
                workspace_id: message.team.unwrap_or_default(),
                text: message.text,
                timestamp,
                ts: message.ts,
            }),
            Err(e) => {
                warn!(channel = channel_id, ts = %message.ts, error = %e, "skipping message");
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!(channel = channel_id, skipped = total - records.len(), "messages dropped during normalization");
    }

    records
}
