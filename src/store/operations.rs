use diesel::prelude::*;
use diesel::upsert::excluded;
use tracing::debug;

use super::db::Store;
use super::models::{ConversationRecord, NewTeam, NewUser, StoredConversation, Team, User};
use super::schema::{conversations, teams, users};
use crate::error::{SyncError, SyncResult};

impl Store {
    // User operations

    /// Inserts `user`, or overwrites name, grade and team of the row with the same `user_key`.
    pub async fn upsert_user(&self, user: NewUser) -> SyncResult<()> {
        let key = user.user_key.clone();

        self.with_connection(move |conn| {
            diesel::insert_into(users::table)
                .values(&user)
                .on_conflict(users::user_key)
                .do_update()
                .set((
                    users::user_name.eq(excluded(users::user_name)),
                    users::grade.eq(excluded(users::grade)),
                    users::team_key.eq(excluded(users::team_key)),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
        .map_err(|e| SyncError::storage("upsert_user", format!("user_key {key}"), e))?;

        debug!(user_key = %key, "user upserted");
        Ok(())
    }

    pub async fn read_all_users(&self) -> SyncResult<Vec<User>> {
        self.with_connection(|conn| {
            let rows = users::table
                .select(User::as_select())
                .order(users::id.asc())
                .load(conn)?;
            Ok(rows)
        })
        .await
        .map_err(|e| SyncError::storage("read_all_users", "users", e))
    }

    /// Replaces every column of the user with internal id `id`.
    pub async fn update_user_by_id(&self, id: i32, user: NewUser) -> SyncResult<()> {
        let affected = self
            .with_connection(move |conn| {
                let n = diesel::update(users::table.find(id))
                    .set(&user)
                    .execute(conn)?;
                Ok(n)
            })
            .await
            .map_err(|e| SyncError::storage("update_user", format!("id {id}"), e))?;

        if affected == 0 {
            return Err(SyncError::NotFound { id });
        }

        debug!(id, "user updated");
        Ok(())
    }

    // Team operations

    /// Inserts `team`, or renames the row with the same `channel_id`.
    pub async fn upsert_team(&self, team: NewTeam) -> SyncResult<()> {
        let key = team.channel_id.clone();

        self.with_connection(move |conn| {
            diesel::insert_into(teams::table)
                .values(&team)
                .on_conflict(teams::channel_id)
                .do_update()
                .set(teams::channel_name.eq(excluded(teams::channel_name)))
                .execute(conn)?;
            Ok(())
        })
        .await
        .map_err(|e| SyncError::storage("upsert_team", format!("channel_id {key}"), e))?;

        debug!(channel_id = %key, "team upserted");
        Ok(())
    }

    pub async fn read_all_teams(&self) -> SyncResult<Vec<Team>> {
        self.with_connection(|conn| {
            let rows = teams::table
                .select(Team::as_select())
                .order(teams::id.asc())
                .load(conn)?;
            Ok(rows)
        })
        .await
        .map_err(|e| SyncError::storage("read_all_teams", "teams", e))
    }

    // Conversation operations

    /// Keyed on (channel_id, ts); a repeat overwrites the other columns.
    pub async fn upsert_conversation(&self, record: ConversationRecord) -> SyncResult<()> {
        let key = format!("{}/{}", record.channel_id, record.ts);

        self.with_connection(move |conn| {
            diesel::insert_into(conversations::table)
                .values(&record)
                .on_conflict((conversations::channel_id, conversations::ts))
                .do_update()
                .set((
                    conversations::user_id.eq(excluded(conversations::user_id)),
                    conversations::workspace_id.eq(excluded(conversations::workspace_id)),
                    conversations::text.eq(excluded(conversations::text)),
                    conversations::timestamp.eq(excluded(conversations::timestamp)),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
        .map_err(|e| SyncError::storage("upsert_conversation", key, e))
    }

    pub async fn read_conversations(&self, channel_id: &str) -> SyncResult<Vec<StoredConversation>> {
        let channel = channel_id.to_string();

        self.with_connection(move |conn| {
            let rows = conversations::table
                .filter(conversations::channel_id.eq(&channel))
                .select(StoredConversation::as_select())
                .order(conversations::id.asc())
                .load(conn)?;
            Ok(rows)
        })
        .await
        .map_err(|e| SyncError::storage("read_conversations", format!("channel_id {channel_id}"), e))
    }
}
