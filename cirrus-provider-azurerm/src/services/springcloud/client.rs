//! Spring Cloud (App Platform) API client

use std::sync::Arc;

use async_trait::async_trait;
use cirrus_core::resourceids::ResourceIdentifier;

use super::ids::{
    SpringCloudBuildServiceAgentPoolId, SpringCloudBuildServiceId, SpringCloudContainerRegistryId,
    SpringCloudServiceId, SpringCloudServiceRegistryId,
};
use super::models::*;
use crate::clients::arm::ArmClient;
use crate::clients::error::ApiError;

pub const API_VERSION: &str = "2023-05-01-preview";

/// Operations used by the Spring Cloud handlers
///
/// Every mutating call waits for the long-running operation to finish.
#[async_trait]
pub trait SpringCloudClient: Send + Sync {
    async fn get_service(&self, id: &SpringCloudServiceId) -> Result<ServiceResource, ApiError>;

    async fn create_service(
        &self,
        id: &SpringCloudServiceId,
        service: &ServiceResource,
    ) -> Result<(), ApiError>;

    async fn update_service(
        &self,
        id: &SpringCloudServiceId,
        service: &ServiceResource,
    ) -> Result<(), ApiError>;

    async fn delete_service(&self, id: &SpringCloudServiceId) -> Result<(), ApiError>;

    async fn get_config_server(&self, id: &SpringCloudServiceId) -> Result<ConfigServerResource, ApiError>;

    async fn update_config_server(
        &self,
        id: &SpringCloudServiceId,
        config_server: &ConfigServerResource,
    ) -> Result<(), ApiError>;

    async fn get_monitoring_settings(
        &self,
        id: &SpringCloudServiceId,
    ) -> Result<MonitoringSettingResource, ApiError>;

    async fn update_monitoring_settings(
        &self,
        id: &SpringCloudServiceId,
        settings: &MonitoringSettingResource,
    ) -> Result<(), ApiError>;

    async fn get_service_registry(
        &self,
        id: &SpringCloudServiceRegistryId,
    ) -> Result<ServiceRegistryResource, ApiError>;

    async fn create_service_registry(&self, id: &SpringCloudServiceRegistryId) -> Result<(), ApiError>;

    async fn delete_service_registry(&self, id: &SpringCloudServiceRegistryId) -> Result<(), ApiError>;

    async fn list_container_registries(
        &self,
        id: &SpringCloudServiceId,
    ) -> Result<Vec<ContainerRegistryResource>, ApiError>;

    async fn create_container_registry(
        &self,
        id: &SpringCloudContainerRegistryId,
        registry: &ContainerRegistryResource,
    ) -> Result<(), ApiError>;

    async fn delete_container_registry(&self, id: &SpringCloudContainerRegistryId) -> Result<(), ApiError>;

    async fn get_build_service(&self, id: &SpringCloudBuildServiceId) -> Result<BuildService, ApiError>;

    async fn create_build_service(
        &self,
        id: &SpringCloudBuildServiceId,
        build_service: &BuildService,
    ) -> Result<(), ApiError>;

    async fn get_agent_pool(
        &self,
        id: &SpringCloudBuildServiceAgentPoolId,
    ) -> Result<AgentPoolResource, ApiError>;

    async fn update_agent_pool(
        &self,
        id: &SpringCloudBuildServiceAgentPoolId,
        agent_pool: &AgentPoolResource,
    ) -> Result<(), ApiError>;
}

/// [`SpringCloudClient`] over the ARM REST API
pub struct ArmSpringCloudClient {
    arm: Arc<ArmClient>,
}

impl ArmSpringCloudClient {
    pub fn new(arm: Arc<ArmClient>) -> Self {
        Self { arm }
    }
}

#[async_trait]
impl SpringCloudClient for ArmSpringCloudClient {
    async fn get_service(&self, id: &SpringCloudServiceId) -> Result<ServiceResource, ApiError> {
        self.arm.get(&id.id(), API_VERSION).await
    }

    async fn create_service(
        &self,
        id: &SpringCloudServiceId,
        service: &ServiceResource,
    ) -> Result<(), ApiError> {
        self.arm.put_then_poll(&id.id(), API_VERSION, service).await
    }

    async fn update_service(
        &self,
        id: &SpringCloudServiceId,
        service: &ServiceResource,
    ) -> Result<(), ApiError> {
        self.arm.patch_then_poll(&id.id(), API_VERSION, service).await
    }

    async fn delete_service(&self, id: &SpringCloudServiceId) -> Result<(), ApiError> {
        self.arm.delete_until_gone(&id.id(), API_VERSION).await
    }

    async fn get_config_server(&self, id: &SpringCloudServiceId) -> Result<ConfigServerResource, ApiError> {
        self.arm.get(&id.config_server().id(), API_VERSION).await
    }

    async fn update_config_server(
        &self,
        id: &SpringCloudServiceId,
        config_server: &ConfigServerResource,
    ) -> Result<(), ApiError> {
        self.arm
            .put_then_poll(&id.config_server().id(), API_VERSION, config_server)
            .await
    }

    async fn get_monitoring_settings(
        &self,
        id: &SpringCloudServiceId,
    ) -> Result<MonitoringSettingResource, ApiError> {
        self.arm.get(&id.monitoring_setting().id(), API_VERSION).await
    }

    async fn update_monitoring_settings(
        &self,
        id: &SpringCloudServiceId,
        settings: &MonitoringSettingResource,
    ) -> Result<(), ApiError> {
        self.arm
            .put_then_poll(&id.monitoring_setting().id(), API_VERSION, settings)
            .await
    }

    async fn get_service_registry(
        &self,
        id: &SpringCloudServiceRegistryId,
    ) -> Result<ServiceRegistryResource, ApiError> {
        self.arm.get(&id.id(), API_VERSION).await
    }

    async fn create_service_registry(&self, id: &SpringCloudServiceRegistryId) -> Result<(), ApiError> {
        self.arm
            .put_then_poll(&id.id(), API_VERSION, &serde_json::json!({}))
            .await
    }

    async fn delete_service_registry(&self, id: &SpringCloudServiceRegistryId) -> Result<(), ApiError> {
        self.arm.delete_then_poll(&id.id(), API_VERSION).await
    }

    async fn list_container_registries(
        &self,
        id: &SpringCloudServiceId,
    ) -> Result<Vec<ContainerRegistryResource>, ApiError> {
        let path = format!("{}/containerRegistries", id.id());
        self.arm.list(&path, API_VERSION).await
    }

    async fn create_container_registry(
        &self,
        id: &SpringCloudContainerRegistryId,
        registry: &ContainerRegistryResource,
    ) -> Result<(), ApiError> {
        self.arm.put_then_poll(&id.id(), API_VERSION, registry).await
    }

    async fn delete_container_registry(&self, id: &SpringCloudContainerRegistryId) -> Result<(), ApiError> {
        self.arm.delete_then_poll(&id.id(), API_VERSION).await
    }

    async fn get_build_service(&self, id: &SpringCloudBuildServiceId) -> Result<BuildService, ApiError> {
        self.arm.get(&id.id(), API_VERSION).await
    }

    async fn create_build_service(
        &self,
        id: &SpringCloudBuildServiceId,
        build_service: &BuildService,
    ) -> Result<(), ApiError> {
        self.arm.put_then_poll(&id.id(), API_VERSION, build_service).await
    }

    async fn get_agent_pool(
        &self,
        id: &SpringCloudBuildServiceAgentPoolId,
    ) -> Result<AgentPoolResource, ApiError> {
        self.arm.get(&id.id(), API_VERSION).await
    }

    async fn update_agent_pool(
        &self,
        id: &SpringCloudBuildServiceAgentPoolId,
        agent_pool: &AgentPoolResource,
    ) -> Result<(), ApiError> {
        self.arm.put_then_poll(&id.id(), API_VERSION, agent_pool).await
    }
}
