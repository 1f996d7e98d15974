//! MySQL Flexible Server API client

use std::sync::Arc;

use async_trait::async_trait;
use cirrus_core::resourceids::ResourceIdentifier;

use super::ids::{FlexibleServerConfigurationId, FlexibleServerId};
use super::models::{Configuration, Server, ServerForUpdate};
use crate::clients::arm::ArmClient;
use crate::clients::error::ApiError;

pub const API_VERSION: &str = "2023-12-30";

/// Operations used by the MySQL handlers
#[async_trait]
pub trait MySqlClient: Send + Sync {
    async fn get_server(&self, id: &FlexibleServerId) -> Result<Server, ApiError>;

    /// PUT the server and wait for provisioning
    async fn create_server(&self, id: &FlexibleServerId, server: &Server) -> Result<(), ApiError>;

    /// PATCH the server and wait for the update
    async fn update_server(
        &self,
        id: &FlexibleServerId,
        update: &ServerForUpdate,
    ) -> Result<(), ApiError>;

    async fn delete_server(&self, id: &FlexibleServerId) -> Result<(), ApiError>;

    /// Swap the primary and standby zones of a highly available server
    async fn failover_server(&self, id: &FlexibleServerId) -> Result<(), ApiError>;

    async fn get_configuration(
        &self,
        id: &FlexibleServerConfigurationId,
    ) -> Result<Configuration, ApiError>;

    async fn update_configuration(
        &self,
        id: &FlexibleServerConfigurationId,
        configuration: &Configuration,
    ) -> Result<(), ApiError>;
}

/// [`MySqlClient`] over the ARM REST API
pub struct ArmMySqlClient {
    arm: Arc<ArmClient>,
}

impl ArmMySqlClient {
    pub fn new(arm: Arc<ArmClient>) -> Self {
        Self { arm }
    }
}

#[async_trait]
impl MySqlClient for ArmMySqlClient {
    async fn get_server(&self, id: &FlexibleServerId) -> Result<Server, ApiError> {
        self.arm.get(&id.id(), API_VERSION).await
    }

    async fn create_server(&self, id: &FlexibleServerId, server: &Server) -> Result<(), ApiError> {
        self.arm.put_then_poll(&id.id(), API_VERSION, server).await
    }

    async fn update_server(
        &self,
        id: &FlexibleServerId,
        update: &ServerForUpdate,
    ) -> Result<(), ApiError> {
        self.arm.patch_then_poll(&id.id(), API_VERSION, update).await
    }

    async fn delete_server(&self, id: &FlexibleServerId) -> Result<(), ApiError> {
        self.arm.delete_then_poll(&id.id(), API_VERSION).await
    }

    async fn failover_server(&self, id: &FlexibleServerId) -> Result<(), ApiError> {
        let path = format!("{}/failover", id.id());
        self.arm.post_then_poll(&path, API_VERSION).await
    }

    async fn get_configuration(
        &self,
        id: &FlexibleServerConfigurationId,
    ) -> Result<Configuration, ApiError> {
        self.arm.get(&id.id(), API_VERSION).await
    }

    async fn update_configuration(
        &self,
        id: &FlexibleServerConfigurationId,
        configuration: &Configuration,
    ) -> Result<(), ApiError> {
        self.arm
            .put_then_poll(&id.id(), API_VERSION, configuration)
            .await
    }
}
