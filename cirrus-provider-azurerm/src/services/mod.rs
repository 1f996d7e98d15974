//! Azure service packages, one module per resource provider namespace

pub mod mysql;
pub mod springcloud;
