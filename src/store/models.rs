use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::schema::{conversations, teams, users};
use crate::models::channel::SlackChannel;
use crate::models::user::SlackUser;

/// Classification given to users the first time they are synced.
pub const DEFAULT_GRADE: i32 = 1;
/// Grouping given to users the first time they are synced.
pub const DEFAULT_TEAM_KEY: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub user_key: String,
    pub user_name: String,
    pub grade: i32,
    pub team_key: i32,
}

/// Row contents without the surrogate id; used for upserts and full-row updates.
#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub user_key: String,
    pub user_name: String,
    pub grade: i32,
    pub team_key: i32,
}

/// Body of a full-row user update; same columns as an insert.
pub type UserUpdate = NewUser;

impl NewUser {
    pub fn from_slack(user: &SlackUser) -> Self {
        Self {
            user_key: user.id.clone(),
            user_name: user.preferred_name().to_string(),
            grade: DEFAULT_GRADE,
            team_key: DEFAULT_TEAM_KEY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Team {
    pub id: i32,
    pub channel_id: String,
    pub channel_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = teams)]
pub struct NewTeam {
    pub channel_id: String,
    pub channel_name: String,
}

impl NewTeam {
    pub fn from_slack(channel: &SlackChannel) -> Self {
        Self {
            channel_id: channel.id.clone(),
            channel_name: channel.name.clone(),
        }
    }
}

/// A normalized history entry, as returned to callers and as stored.
///
/// `timestamp` is only second-precise; `ts` is Slack's message id within the
/// channel and is what identifies the row.
#[derive(Debug, Clone, PartialEq, Eq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = conversations)]
pub struct ConversationRecord {
    pub channel_id: String,
    pub user_id: String,
    pub workspace_id: String,
    pub text: String,
    pub timestamp: String,
    pub ts: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize)]
#[diesel(table_name = conversations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StoredConversation {
    pub id: i32,
    pub channel_id: String,
    pub user_id: String,
    pub workspace_id: String,
    pub text: String,
    pub timestamp: String,
    pub ts: String,
}
