//! Microsoft.DBforMySQL flexible servers

pub mod client;
pub mod configuration;
pub mod data_source;
pub mod flexible_server;
pub mod ids;
pub mod models;
pub mod validate;
