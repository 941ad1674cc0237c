pub mod channels;
pub mod client;
pub mod history;
pub mod users;

pub use client::{ApiError, SlackClient};
