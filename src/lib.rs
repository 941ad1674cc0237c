pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod server;
pub mod shutdown;
pub mod store;
pub mod sync;
