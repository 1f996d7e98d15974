//! Microsoft.AppPlatform (Azure Spring Apps) services

pub mod client;
pub mod data_source;
pub mod ids;
pub mod models;
pub mod service;
pub mod validate;
