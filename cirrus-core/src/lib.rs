//! Cirrus Core
//!
//! Core library for declarative Azure resources: the resource and state model,
//! attribute schemas, the provider trait and the ARM resource ID codec

pub mod commonids;
pub mod data;
pub mod provider;
pub mod resource;
pub mod resourceids;
pub mod schema;
