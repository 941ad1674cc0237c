//! Coordinates Slack fetches, normalization and storage.

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::assembler::assemble_conversations;
use super::fetcher::{fetch_channel_history, FetchOptions};
use crate::api::channels::{join_channel, list_public_channels};
use crate::api::client::SlackClient;
use crate::api::users::list_users;
use crate::error::{SyncError, SyncResult};
use crate::store::{
    ConversationRecord, NewTeam, NewUser, Store, StoredConversation, Team, User, UserUpdate,
};

#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// A channel is mirrored when its name contains any of these.
    pub channel_filters: Vec<String>,
    pub fetch: FetchOptions,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            channel_filters: vec!["develop".to_string(), "team".to_string()],
            fetch: FetchOptions::default(),
        }
    }
}

impl SyncSettings {
    pub fn channel_matches(&self, name: &str) -> bool {
        self.channel_filters
            .iter()
            .any(|filter| !filter.is_empty() && name.contains(filter.as_str()))
    }
}

/// Entry point for every sync and read operation.
///
/// Holds one client per token: users.list needs the user token, channel
/// listing, joining and history use the bot token.
pub struct Syncer {
    bot: SlackClient,
    user: SlackClient,
    store: Store,
    settings: SyncSettings,
}

impl Syncer {
    pub fn new(bot: SlackClient, user: SlackClient, store: Store, settings: SyncSettings) -> Self {
        Self {
            bot,
            user,
            store,
            settings,
        }
    }

    /// Mirrors users.list into the users table. Stops at the first storage failure.
    #[instrument(skip(self))]
    pub async fn initialize_users(&self) -> SyncResult<usize> {
        let members = list_users(&self.user)
            .await
            .map_err(|e| SyncError::from_roster_api("users.list", e))?;

        for member in &members {
            let user = NewUser::from_slack(member);
            let name = user.user_name.clone();
            self.store.upsert_user(user).await.map_err(|e| match e {
                SyncError::Storage { operation, source, .. } => SyncError::Storage {
                    operation,
                    key: format!("user {} ({})", name, member.id),
                    source,
                },
                other => other,
            })?;
        }

        info!(users = members.len(), "users initialized");
        Ok(members.len())
    }

    /// Mirrors the public channels whose names match the configured filters.
    #[instrument(skip(self))]
    pub async fn initialize_channels(&self) -> SyncResult<usize> {
        let channels = list_public_channels(&self.bot)
            .await
            .map_err(|e| SyncError::from_roster_api("conversations.list", e))?;

        let mut saved = 0;
        for channel in channels.iter().filter(|c| self.settings.channel_matches(&c.name)) {
            self.store
                .upsert_team(NewTeam::from_slack(channel))
                .await
                .map_err(|e| match e {
                    SyncError::Storage { operation, source, .. } => SyncError::Storage {
                        operation,
                        key: format!("channel {} ({})", channel.name, channel.id),
                        source,
                    },
                    other => other,
                })?;
            saved += 1;
        }

        info!(listed = channels.len(), saved, "channels initialized");
        Ok(saved)
    }

    /// Joins `channel_id`, reads its full history and returns it normalized.
    /// Nothing is written to the store.
    #[instrument(skip(self, cancel))]
    pub async fn initialize_channel_conversations(
        &self,
        channel_id: &str,
        cancel: &CancellationToken,
    ) -> SyncResult<Vec<ConversationRecord>> {
        let channel_id = channel_id.trim();
        if channel_id.is_empty() {
            return Err(SyncError::Validation("channel_id is required".to_string()));
        }

        join_channel(&self.bot, channel_id)
            .await
            .map_err(|e| SyncError::from_channel_api("conversations.join", channel_id, e))?;

        let messages =
            fetch_channel_history(&self.bot, channel_id, &self.settings.fetch, cancel).await?;
        let fetched = messages.len();
        let records = assemble_conversations(channel_id, messages);

        info!(channel = channel_id, fetched, records = records.len(), "channel conversations assembled");
        Ok(records)
    }

    /// Same as [`Self::initialize_channel_conversations`], then stores every record.
    pub async fn save_channel_conversations(
        &self,
        channel_id: &str,
        cancel: &CancellationToken,
    ) -> SyncResult<Vec<ConversationRecord>> {
        let records = self.initialize_channel_conversations(channel_id, cancel).await?;

        for record in &records {
            self.store.upsert_conversation(record.clone()).await?;
        }

        info!(channel = channel_id.trim(), saved = records.len(), "channel conversations stored");
        Ok(records)
    }

    pub async fn stored_conversations(&self, channel_id: &str) -> SyncResult<Vec<StoredConversation>> {
        if channel_id.trim().is_empty() {
            return Err(SyncError::Validation("channel_id is required".to_string()));
        }
        self.store.read_conversations(channel_id.trim()).await
    }

    pub async fn get_all_users(&self) -> SyncResult<Vec<User>> {
        self.store.read_all_users().await
    }

    pub async fn get_all_channels(&self) -> SyncResult<Vec<Team>> {
        self.store.read_all_teams().await
    }

    pub async fn update_user(&self, id: i32, user: UserUpdate) -> SyncResult<()> {
        if user.user_key.trim().is_empty() {
            return Err(SyncError::Validation("user_key is required".to_string()));
        }
        self.store.update_user_by_id(id, user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Harness {
        server: mockito::ServerGuard,
        syncer: Syncer,
        _dir: TempDir,
    }

    async fn setup() -> Harness {
        let server = mockito::Server::new_async().await;
        let bot = SlackClient::with_base_url(&server.url(), "xoxb-bot").unwrap();
        let user = SlackClient::with_base_url(&server.url(), "xoxp-user").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("roster.db")).unwrap();

        let settings = SyncSettings {
            fetch: FetchOptions {
                pacing: Duration::from_millis(20),
                ..FetchOptions::default()
            },
            ..SyncSettings::default()
        };

        Harness {
            server,
            syncer: Syncer::new(bot, user, store, settings),
            _dir: dir,
        }
    }

    async fn mock_join(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/conversations.join")
            .match_header("authorization", "Bearer xoxb-bot")
            .with_status(200)
            .with_body(r#"{"ok": true, "channel": {"id": "C123", "name": "develop"}}"#)
            .create_async()
            .await
    }

    #[test]
    fn test_channel_filter() {
        let settings = SyncSettings::default();
        assert!(settings.channel_matches("develop-backend"));
        assert!(settings.channel_matches("team-a"));
        assert!(settings.channel_matches("myteam"));
        assert!(!settings.channel_matches("general"));
        assert!(!settings.channel_matches("Develop"));
    }

    #[tokio::test]
    async fn test_initialize_users_maps_and_upserts() {
        let mut h = setup().await;

        let _mock = h
            .server
            .mock("GET", "/users.list")
            .match_header("authorization", "Bearer xoxp-user")
            .with_status(200)
            .with_body(
                r#"{"ok": true, "members": [
                    {"id": "U1", "name": "alice", "profile": {"display_name": "", "real_name": "Alice Liddell"}},
                    {"id": "U2", "name": "bob", "profile": {"display_name": "bobby", "real_name": "Bob"}}
                ]}"#,
            )
            .expect(2)
            .create_async()
            .await;

        assert_eq!(h.syncer.initialize_users().await.unwrap(), 2);
        // A second run updates in place.
        assert_eq!(h.syncer.initialize_users().await.unwrap(), 2);

        let users = h.syncer.get_all_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_key, "U1");
        assert_eq!(users[0].user_name, "Alice Liddell");
        assert_eq!(users[0].grade, 1);
        assert_eq!(users[0].team_key, 1);
        assert_eq!(users[1].user_name, "bobby");
    }

    #[tokio::test]
    async fn test_initialize_users_upstream_failure() {
        let mut h = setup().await;

        let _mock = h
            .server
            .mock("GET", "/users.list")
            .with_status(200)
            .with_body(r#"{"ok": false, "error": "missing_scope", "needed": "users:read"}"#)
            .create_async()
            .await;

        let err = h.syncer.initialize_users().await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::AuthorizationFailed { operation: "users.list", channel: None, .. }
        ));
        assert!(h.syncer.get_all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_channels_filters_names() {
        let mut h = setup().await;

        let _mock = h
            .server
            .mock("GET", "/conversations.list")
            .match_query(mockito::Matcher::UrlEncoded("types".into(), "public_channel".into()))
            .with_status(200)
            .with_body(
                r#"{"ok": true, "channels": [
                    {"id": "C1", "name": "general"},
                    {"id": "C2", "name": "develop-api"},
                    {"id": "C3", "name": "random"},
                    {"id": "C4", "name": "team-design"}
                ]}"#,
            )
            .create_async()
            .await;

        assert_eq!(h.syncer.initialize_channels().await.unwrap(), 2);

        let teams = h.syncer.get_all_channels().await.unwrap();
        let ids: Vec<&str> = teams.iter().map(|t| t.channel_id.as_str()).collect();
        assert_eq!(ids, vec!["C2", "C4"]);
    }

    #[tokio::test]
    async fn test_conversations_end_to_end() {
        let mut h = setup().await;
        let _join = mock_join(&mut h.server).await;

        let _page = h
            .server
            .mock("GET", "/conversations.history")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("channel".into(), "C123".into()),
                mockito::Matcher::UrlEncoded("limit".into(), "1000".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"ok": true, "has_more": false, "messages": [
                    {"type": "message", "user": "U1", "text": "first", "ts": "1601055549.0001", "team": "T1"},
                    {"type": "message", "user": "U2", "text": "second", "ts": "", "team": "T1"}
                ]}"#,
            )
            .create_async()
            .await;

        let cancel = CancellationToken::new();
        let records = h
            .syncer
            .initialize_channel_conversations("C123", &cancel)
            .await
            .unwrap();

        assert_eq!(
            records,
            vec![ConversationRecord {
                channel_id: "C123".into(),
                user_id: "U1".into(),
                workspace_id: "T1".into(),
                text: "first".into(),
                timestamp: "2020/09/25 17:39:09".into(),
                ts: "1601055549.0001".into(),
            }]
        );
        // Not persisted unless asked.
        assert!(h.syncer.stored_conversations("C123").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conversations_follow_cursor() {
        let mut h = setup().await;
        let _join = mock_join(&mut h.server).await;

        let first = h
            .server
            .mock("GET", "/conversations.history")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("channel".into(), "C123".into()),
                mockito::Matcher::UrlEncoded("limit".into(), "1000".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"ok": true, "has_more": true,
                    "messages": [{"user": "U1", "text": "newest", "ts": "1601055549.0002"}],
                    "response_metadata": {"next_cursor": "bmV4dF90czox"}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let second = h
            .server
            .mock("GET", "/conversations.history")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("channel".into(), "C123".into()),
                mockito::Matcher::UrlEncoded("cursor".into(), "bmV4dF90czox".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"ok": true, "has_more": false,
                    "messages": [{"user": "U2", "text": "oldest", "ts": "1601055000.0001"}],
                    "response_metadata": {"next_cursor": ""}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let cancel = CancellationToken::new();
        let records = h
            .syncer
            .save_channel_conversations("C123", &cancel)
            .await
            .unwrap();

        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["newest", "oldest"]);
        first.assert_async().await;
        second.assert_async().await;

        let stored = h.syncer.stored_conversations("C123").await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].text, "newest");
    }

    #[tokio::test]
    async fn test_save_keeps_messages_from_the_same_second() {
        let mut h = setup().await;
        let _join = mock_join(&mut h.server).await;

        let _page = h
            .server
            .mock("GET", "/conversations.history")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"ok": true, "has_more": false, "messages": [
                    {"user": "U1", "text": "second msg", "ts": "1601055549.000200", "team": "T1"},
                    {"user": "U1", "text": "first msg", "ts": "1601055549.000100", "team": "T1"}
                ]}"#,
            )
            .create_async()
            .await;

        let cancel = CancellationToken::new();
        let saved = h
            .syncer
            .save_channel_conversations("C123", &cancel)
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);

        let stored = h.syncer.stored_conversations("C123").await.unwrap();
        let texts: Vec<&str> = stored.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["second msg", "first msg"]);
        assert!(stored.iter().all(|m| m.timestamp == "2020/09/25 17:39:09"));
    }

    #[tokio::test]
    async fn test_join_missing_scope_is_authorization() {
        let mut h = setup().await;

        let _join = h
            .server
            .mock("POST", "/conversations.join")
            .with_status(200)
            .with_body(r#"{"ok": false, "error": "missing_scope", "needed": "channels:join"}"#)
            .create_async()
            .await;

        let history = h
            .server
            .mock("GET", "/conversations.history")
            .match_query(mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let cancel = CancellationToken::new();
        let err = h
            .syncer
            .initialize_channel_conversations("C123", &cancel)
            .await
            .unwrap_err();

        match err {
            SyncError::AuthorizationFailed { operation, channel, needed, .. } => {
                assert_eq!(operation, "conversations.join");
                assert_eq!(channel.as_deref(), Some("C123"));
                assert_eq!(needed.as_deref(), Some("channels:join"));
            }
            other => panic!("unexpected {other:?}"),
        }
        history.assert_async().await;
    }

    #[tokio::test]
    async fn test_transport_failure_is_fetch_failed() {
        let mut h = setup().await;
        let _join = mock_join(&mut h.server).await;

        let _page = h
            .server
            .mock("GET", "/conversations.history")
            .match_query(mockito::Matcher::Any)
            .with_status(502)
            .create_async()
            .await;

        let cancel = CancellationToken::new();
        let err = h
            .syncer
            .initialize_channel_conversations("C123", &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::FetchFailed { ref channel, .. } if channel == "C123"));
    }

    #[tokio::test]
    async fn test_blank_channel_is_validation_error() {
        let h = setup().await;
        let cancel = CancellationToken::new();

        let err = h
            .syncer
            .initialize_channel_conversations("  ", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_update_user_not_found() {
        let h = setup().await;

        let err = h
            .syncer
            .update_user(
                42,
                NewUser {
                    user_key: "U42".into(),
                    user_name: "nobody".into(),
                    grade: 1,
                    team_key: 1,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::NotFound { id: 42 }));
    }
}
