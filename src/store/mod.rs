pub mod db;
pub mod models;
pub mod operations;
pub mod schema;

pub use db::{default_db_path, Store};
pub use models::{ConversationRecord, NewTeam, NewUser, StoredConversation, Team, User, UserUpdate};
