//! In-memory API fakes for handler tests

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use cirrus_core::resourceids::ResourceIdentifier;

use crate::clients::Clients;
use crate::clients::error::{ApiError, ErrorDetail};
use crate::services::mysql::client::MySqlClient;
use crate::services::mysql::ids::{FlexibleServerConfigurationId, FlexibleServerId};
use crate::services::mysql::models::{Configuration, ConfigurationProperties, Server, ServerForUpdate};
use crate::services::springcloud::client::SpringCloudClient;
use crate::services::springcloud::ids::{
    SpringCloudBuildServiceAgentPoolId, SpringCloudBuildServiceId, SpringCloudContainerRegistryId,
    SpringCloudServiceId, SpringCloudServiceRegistryId,
};
use crate::services::springcloud::models::*;

const SUBSCRIPTION: &str = "12345678-1234-9876-4563-123456789012";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn not_found(description: String) -> ApiError {
    ApiError::not_found(format!("{} was not found", description))
}

// =============================================================================
// MySQL
// =============================================================================

#[derive(Debug, Clone)]
pub enum MySqlCall {
    Get(FlexibleServerId),
    Create(Box<Server>),
    Update(Box<ServerForUpdate>),
    Delete(FlexibleServerId),
    Failover(FlexibleServerId),
    GetConfiguration(FlexibleServerConfigurationId),
    UpdateConfiguration(Configuration),
}

#[derive(Default)]
struct MySqlState {
    servers: HashMap<String, Server>,
    configurations: HashMap<String, Configuration>,
    defaults: HashMap<String, String>,
    get_failure: Option<u16>,
    calls: Vec<MySqlCall>,
}

/// Records every call and keeps servers and configurations in memory
#[derive(Default)]
pub struct FakeMySqlClient {
    state: Mutex<MySqlState>,
}

impl FakeMySqlClient {
    pub fn with_server(id: &FlexibleServerId, server: Server) -> Self {
        let fake = Self::default();
        lock(&fake.state).servers.insert(id.id(), server);
        fake
    }

    /// Make every server GET fail with `status`
    pub fn fail_gets_with(&self, status: u16) {
        lock(&self.state).get_failure = Some(status);
    }

    /// Server default for the configuration `name`
    pub fn set_configuration_default(&self, name: &str, value: &str) {
        lock(&self.state).defaults.insert(name.to_string(), value.to_string());
    }

    pub fn calls(&self) -> Vec<MySqlCall> {
        lock(&self.state).calls.clone()
    }

    /// PATCH bodies in the order they were sent
    pub fn updates(&self) -> Vec<ServerForUpdate> {
        lock(&self.state)
            .calls
            .iter()
            .filter_map(|c| match c {
                MySqlCall::Update(update) => Some(update.as_ref().clone()),
                _ => None,
            })
            .collect()
    }
}

fn apply_update(server: &mut Server, update: &ServerForUpdate) {
    if let Some(sku) = &update.sku {
        server.sku = Some(sku.clone());
    }
    if let Some(tags) = &update.tags {
        server.tags = Some(tags.clone());
    }
    if let Some(identity) = &update.identity {
        server.identity = Some(identity.clone());
    }

    let patch = &update.properties;
    let props = server.properties.get_or_insert_with(Default::default);
    macro_rules! merge {
        ($($field:ident),*) => {
            $(if let Some(value) = &patch.$field {
                props.$field = Some(value.clone());
            })*
        };
    }
    merge!(
        administrator_login_password,
        backup,
        data_encryption,
        high_availability,
        maintenance_window,
        network,
        replication_role,
        storage
    );
}

#[async_trait]
impl MySqlClient for FakeMySqlClient {
    async fn get_server(&self, id: &FlexibleServerId) -> Result<Server, ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(MySqlCall::Get(id.clone()));
        if let Some(status) = state.get_failure {
            return Err(ApiError::from_response(status, "injected failure"));
        }
        state
            .servers
            .get(&id.id())
            .cloned()
            .ok_or_else(|| not_found(id.description()))
    }

    async fn create_server(&self, id: &FlexibleServerId, server: &Server) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(MySqlCall::Create(Box::new(server.clone())));
        let mut stored = server.clone();
        stored.id = Some(id.id());
        stored.name = Some(id.flexible_server_name.clone());
        state.servers.insert(id.id(), stored);
        Ok(())
    }

    async fn update_server(&self, id: &FlexibleServerId, update: &ServerForUpdate) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(MySqlCall::Update(Box::new(update.clone())));
        let server = state
            .servers
            .get_mut(&id.id())
            .ok_or_else(|| not_found(id.description()))?;
        apply_update(server, update);
        Ok(())
    }

    async fn delete_server(&self, id: &FlexibleServerId) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(MySqlCall::Delete(id.clone()));
        state
            .servers
            .remove(&id.id())
            .map(|_| ())
            .ok_or_else(|| not_found(id.description()))
    }

    async fn failover_server(&self, id: &FlexibleServerId) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(MySqlCall::Failover(id.clone()));
        let server = state
            .servers
            .get_mut(&id.id())
            .ok_or_else(|| not_found(id.description()))?;
        if let Some(props) = server.properties.as_mut()
            && let Some(ha) = props.high_availability.as_mut()
        {
            std::mem::swap(&mut props.availability_zone, &mut ha.standby_availability_zone);
        }
        Ok(())
    }

    async fn get_configuration(
        &self,
        id: &FlexibleServerConfigurationId,
    ) -> Result<Configuration, ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(MySqlCall::GetConfiguration(id.clone()));
        let default_value = state.defaults.get(&id.configuration_name).cloned();
        match (state.configurations.get(&id.id()), default_value) {
            (Some(stored), default_value) => {
                let mut configuration = stored.clone();
                configuration.properties.default_value = default_value;
                Ok(configuration)
            }
            (None, Some(default_value)) => Ok(Configuration {
                id: Some(id.id()),
                name: Some(id.configuration_name.clone()),
                properties: ConfigurationProperties {
                    value: Some(default_value.clone()),
                    source: Some("system-default".to_string()),
                    default_value: Some(default_value),
                    ..Default::default()
                },
            }),
            (None, None) => Err(not_found(id.description())),
        }
    }

    async fn update_configuration(
        &self,
        id: &FlexibleServerConfigurationId,
        configuration: &Configuration,
    ) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(MySqlCall::UpdateConfiguration(configuration.clone()));
        state.configurations.insert(id.id(), configuration.clone());
        Ok(())
    }
}

pub fn clients_with_mysql(mysql: Arc<FakeMySqlClient>) -> Clients {
    Clients::new(SUBSCRIPTION, mysql, Arc::new(FakeSpringCloudClient::default()))
        .with_poll_interval(Duration::from_millis(1))
}

// =============================================================================
// Spring Cloud
// =============================================================================

#[derive(Debug, Clone)]
pub enum SpringCall {
    GetService(SpringCloudServiceId),
    CreateService(Box<ServiceResource>),
    UpdateService(Box<ServiceResource>),
    DeleteService(SpringCloudServiceId),
    GetConfigServer(SpringCloudServiceId),
    UpdateConfigServer(Box<ConfigServerResource>),
    GetMonitoringSettings(SpringCloudServiceId),
    UpdateMonitoringSettings(MonitoringSettingResource),
    GetServiceRegistry(SpringCloudServiceRegistryId),
    CreateServiceRegistry(SpringCloudServiceRegistryId),
    DeleteServiceRegistry(SpringCloudServiceRegistryId),
    ListContainerRegistries(SpringCloudServiceId),
    CreateContainerRegistry(SpringCloudContainerRegistryId),
    DeleteContainerRegistry(SpringCloudContainerRegistryId),
    GetBuildService(SpringCloudBuildServiceId),
    CreateBuildService(BuildService),
    GetAgentPool(SpringCloudBuildServiceAgentPoolId),
    UpdateAgentPool(AgentPoolResource),
}

impl SpringCall {
    /// Name of the client method that was called
    pub fn name(&self) -> &'static str {
        match self {
            SpringCall::GetService(_) => "get_service",
            SpringCall::CreateService(_) => "create_service",
            SpringCall::UpdateService(_) => "update_service",
            SpringCall::DeleteService(_) => "delete_service",
            SpringCall::GetConfigServer(_) => "get_config_server",
            SpringCall::UpdateConfigServer(_) => "update_config_server",
            SpringCall::GetMonitoringSettings(_) => "get_monitoring_settings",
            SpringCall::UpdateMonitoringSettings(_) => "update_monitoring_settings",
            SpringCall::GetServiceRegistry(_) => "get_service_registry",
            SpringCall::CreateServiceRegistry(_) => "create_service_registry",
            SpringCall::DeleteServiceRegistry(_) => "delete_service_registry",
            SpringCall::ListContainerRegistries(_) => "list_container_registries",
            SpringCall::CreateContainerRegistry(_) => "create_container_registry",
            SpringCall::DeleteContainerRegistry(_) => "delete_container_registry",
            SpringCall::GetBuildService(_) => "get_build_service",
            SpringCall::CreateBuildService(_) => "create_build_service",
            SpringCall::GetAgentPool(_) => "get_agent_pool",
            SpringCall::UpdateAgentPool(_) => "update_agent_pool",
        }
    }
}

#[derive(Default)]
struct SpringState {
    services: HashMap<String, ServiceResource>,
    config_servers: HashMap<String, ConfigServerResource>,
    monitoring: HashMap<String, MonitoringSettingResource>,
    service_registries: HashSet<String>,
    container_registries: BTreeMap<String, ContainerRegistryResource>,
    build_services: HashMap<String, BuildService>,
    agent_pools: HashMap<String, AgentPoolResource>,
    config_server_error: Option<String>,
    enterprise_read_failure: Option<u16>,
    calls: Vec<SpringCall>,
}

impl SpringState {
    fn enterprise_read(&self) -> Result<(), ApiError> {
        match self.enterprise_read_failure {
            Some(status) => Err(ApiError::from_response(status, "injected failure")),
            None => Ok(()),
        }
    }
}

/// Records every call and keeps a Spring Cloud service and its children in memory
#[derive(Default)]
pub struct FakeSpringCloudClient {
    state: Mutex<SpringState>,
}

impl FakeSpringCloudClient {
    /// Report `message` as the config server error after the next update
    pub fn fail_config_server(&self, message: &str) {
        lock(&self.state).config_server_error = Some(message.to_string());
    }

    /// Make container registry, build service and agent pool reads fail with `status`
    pub fn fail_enterprise_reads(&self, status: u16) {
        lock(&self.state).enterprise_read_failure = Some(status);
    }

    pub fn calls(&self) -> Vec<SpringCall> {
        lock(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.state).calls.clear();
    }
}

#[async_trait]
impl SpringCloudClient for FakeSpringCloudClient {
    async fn get_service(&self, id: &SpringCloudServiceId) -> Result<ServiceResource, ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::GetService(id.clone()));
        state
            .services
            .get(&id.id())
            .cloned()
            .ok_or_else(|| not_found(id.description()))
    }

    async fn create_service(&self, id: &SpringCloudServiceId, service: &ServiceResource) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::CreateService(Box::new(service.clone())));
        let mut stored = service.clone();
        stored.id = Some(id.id());
        stored.name = Some(id.spring_name.clone());
        state.services.insert(id.id(), stored);
        Ok(())
    }

    async fn update_service(&self, id: &SpringCloudServiceId, service: &ServiceResource) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::UpdateService(Box::new(service.clone())));
        let stored = state
            .services
            .get_mut(&id.id())
            .ok_or_else(|| not_found(id.description()))?;
        if service.tags.is_some() {
            stored.tags = service.tags.clone();
        }
        Ok(())
    }

    async fn delete_service(&self, id: &SpringCloudServiceId) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::DeleteService(id.clone()));
        state
            .services
            .remove(&id.id())
            .map(|_| ())
            .ok_or_else(|| not_found(id.description()))
    }

    async fn get_config_server(&self, id: &SpringCloudServiceId) -> Result<ConfigServerResource, ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::GetConfigServer(id.clone()));
        let mut config_server = state.config_servers.get(&id.id()).cloned().unwrap_or_default();
        if let Some(message) = &state.config_server_error {
            config_server.properties.get_or_insert_with(Default::default).error = Some(ErrorDetail {
                code: Some("BadRequest".to_string()),
                message: Some(message.clone()),
            });
        }
        Ok(config_server)
    }

    async fn update_config_server(
        &self,
        id: &SpringCloudServiceId,
        config_server: &ConfigServerResource,
    ) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::UpdateConfigServer(Box::new(config_server.clone())));
        state.config_servers.insert(id.id(), config_server.clone());
        Ok(())
    }

    async fn get_monitoring_settings(
        &self,
        id: &SpringCloudServiceId,
    ) -> Result<MonitoringSettingResource, ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::GetMonitoringSettings(id.clone()));
        Ok(state.monitoring.get(&id.id()).cloned().unwrap_or_default())
    }

    async fn update_monitoring_settings(
        &self,
        id: &SpringCloudServiceId,
        settings: &MonitoringSettingResource,
    ) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::UpdateMonitoringSettings(settings.clone()));
        state.monitoring.insert(id.id(), settings.clone());
        Ok(())
    }

    async fn get_service_registry(
        &self,
        id: &SpringCloudServiceRegistryId,
    ) -> Result<ServiceRegistryResource, ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::GetServiceRegistry(id.clone()));
        if !state.service_registries.contains(&id.id()) {
            return Err(not_found(id.description()));
        }
        Ok(ServiceRegistryResource {
            id: Some(id.id()),
            name: Some(id.service_registry_name.clone()),
        })
    }

    async fn create_service_registry(&self, id: &SpringCloudServiceRegistryId) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::CreateServiceRegistry(id.clone()));
        state.service_registries.insert(id.id());
        Ok(())
    }

    async fn delete_service_registry(&self, id: &SpringCloudServiceRegistryId) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::DeleteServiceRegistry(id.clone()));
        state.service_registries.remove(&id.id());
        Ok(())
    }

    async fn list_container_registries(
        &self,
        id: &SpringCloudServiceId,
    ) -> Result<Vec<ContainerRegistryResource>, ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::ListContainerRegistries(id.clone()));
        state.enterprise_read()?;
        let prefix = format!("{}/containerRegistries/", id.id());
        Ok(state
            .container_registries
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, registry)| registry.clone())
            .collect())
    }

    async fn create_container_registry(
        &self,
        id: &SpringCloudContainerRegistryId,
        registry: &ContainerRegistryResource,
    ) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::CreateContainerRegistry(id.clone()));
        let mut stored = registry.clone();
        stored.id = Some(id.id());
        state.container_registries.insert(id.id(), stored);
        Ok(())
    }

    async fn delete_container_registry(&self, id: &SpringCloudContainerRegistryId) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::DeleteContainerRegistry(id.clone()));
        state.container_registries.remove(&id.id());
        Ok(())
    }

    async fn get_build_service(&self, id: &SpringCloudBuildServiceId) -> Result<BuildService, ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::GetBuildService(id.clone()));
        state.enterprise_read()?;
        state
            .build_services
            .get(&id.id())
            .cloned()
            .ok_or_else(|| not_found(id.description()))
    }

    async fn create_build_service(
        &self,
        id: &SpringCloudBuildServiceId,
        build_service: &BuildService,
    ) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::CreateBuildService(build_service.clone()));
        state.build_services.insert(id.id(), build_service.clone());
        Ok(())
    }

    async fn get_agent_pool(
        &self,
        id: &SpringCloudBuildServiceAgentPoolId,
    ) -> Result<AgentPoolResource, ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::GetAgentPool(id.clone()));
        state.enterprise_read()?;
        state
            .agent_pools
            .get(&id.id())
            .cloned()
            .ok_or_else(|| not_found(id.description()))
    }

    async fn update_agent_pool(
        &self,
        id: &SpringCloudBuildServiceAgentPoolId,
        agent_pool: &AgentPoolResource,
    ) -> Result<(), ApiError> {
        let mut state = lock(&self.state);
        state.calls.push(SpringCall::UpdateAgentPool(agent_pool.clone()));
        state.agent_pools.insert(id.id(), agent_pool.clone());
        Ok(())
    }
}

pub fn clients_with_spring_cloud(spring_cloud: Arc<FakeSpringCloudClient>) -> Clients {
    Clients::new(SUBSCRIPTION, Arc::new(FakeMySqlClient::default()), spring_cloud)
        .with_poll_interval(Duration::from_millis(1))
}
