//! Spring Cloud (Azure Spring Apps) IDs

use cirrus_core::define_resource_id;
use cirrus_core::resourceids::{ResourceIdentifier, Segment};

define_resource_id! {
    /// A Spring Cloud Service ID
    pub struct SpringCloudServiceId("Spring Cloud Service") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        spring_name: "springName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.AppPlatform"),
        Segment::Static("spring"),
        Segment::user("springName", "Spring Name"),
    ];
}

define_resource_id! {
    /// A Spring Cloud Service Registry ID
    pub struct SpringCloudServiceRegistryId("Spring Cloud Service Registry") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        spring_name: "springName",
        service_registry_name: "serviceRegistryName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.AppPlatform"),
        Segment::Static("spring"),
        Segment::user("springName", "Spring Name"),
        Segment::Static("serviceRegistries"),
        Segment::user("serviceRegistryName", "Service Registry Name"),
    ];
}

define_resource_id! {
    /// A Spring Cloud Container Registry ID
    pub struct SpringCloudContainerRegistryId("Spring Cloud Container Registry") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        spring_name: "springName",
        container_registry_name: "containerRegistryName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.AppPlatform"),
        Segment::Static("spring"),
        Segment::user("springName", "Spring Name"),
        Segment::Static("containerRegistries"),
        Segment::user("containerRegistryName", "Container Registry Name"),
    ];
}

define_resource_id! {
    /// A Spring Cloud Build Service ID
    pub struct SpringCloudBuildServiceId("Spring Cloud Build Service") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        spring_name: "springName",
        build_service_name: "buildServiceName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.AppPlatform"),
        Segment::Static("spring"),
        Segment::user("springName", "Spring Name"),
        Segment::Static("buildServices"),
        Segment::user("buildServiceName", "Build Service Name"),
    ];
}

define_resource_id! {
    /// A Spring Cloud Build Service Agent Pool ID
    pub struct SpringCloudBuildServiceAgentPoolId("Spring Cloud Build Service Agent Pool") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        spring_name: "springName",
        build_service_name: "buildServiceName",
        agent_pool_name: "agentPoolName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.AppPlatform"),
        Segment::Static("spring"),
        Segment::user("springName", "Spring Name"),
        Segment::Static("buildServices"),
        Segment::user("buildServiceName", "Build Service Name"),
        Segment::Static("agentPools"),
        Segment::user("agentPoolName", "Agent Pool Name"),
    ];
}

define_resource_id! {
    /// A Spring Cloud Config Server ID
    pub struct SpringCloudConfigServerId("Spring Cloud Config Server") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        spring_name: "springName",
        config_server_name: "configServerName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.AppPlatform"),
        Segment::Static("spring"),
        Segment::user("springName", "Spring Name"),
        Segment::Static("configServers"),
        Segment::user("configServerName", "Config Server Name"),
    ];
}

define_resource_id! {
    /// A Spring Cloud Monitoring Setting ID
    pub struct SpringCloudMonitoringSettingId("Spring Cloud Monitoring Setting") {
        subscription_id: "subscriptionId",
        resource_group_name: "resourceGroupName",
        spring_name: "springName",
        monitoring_setting_name: "monitoringSettingName",
    }
    segments = [
        Segment::Static("subscriptions"),
        Segment::user("subscriptionId", "Subscription"),
        Segment::Static("resourceGroups"),
        Segment::user("resourceGroupName", "Resource Group Name"),
        Segment::Static("providers"),
        Segment::Provider("Microsoft.AppPlatform"),
        Segment::Static("spring"),
        Segment::user("springName", "Spring Name"),
        Segment::Static("monitoringSettings"),
        Segment::user("monitoringSettingName", "Monitoring Setting Name"),
    ];
}

/// Name of the singleton children (service registry, build service, agent pool, config server, monitoring setting)
pub const DEFAULT: &str = "default";

impl SpringCloudServiceId {
    pub fn service_registry(&self) -> SpringCloudServiceRegistryId {
        SpringCloudServiceRegistryId::new(&self.subscription_id, &self.resource_group_name, &self.spring_name, DEFAULT)
    }

    pub fn container_registry(&self, name: &str) -> SpringCloudContainerRegistryId {
        SpringCloudContainerRegistryId::new(&self.subscription_id, &self.resource_group_name, &self.spring_name, name)
    }

    pub fn build_service(&self) -> SpringCloudBuildServiceId {
        SpringCloudBuildServiceId::new(&self.subscription_id, &self.resource_group_name, &self.spring_name, DEFAULT)
    }

    pub fn agent_pool(&self) -> SpringCloudBuildServiceAgentPoolId {
        SpringCloudBuildServiceAgentPoolId::new(
            &self.subscription_id,
            &self.resource_group_name,
            &self.spring_name,
            DEFAULT,
            DEFAULT,
        )
    }

    pub fn config_server(&self) -> SpringCloudConfigServerId {
        SpringCloudConfigServerId::new(&self.subscription_id, &self.resource_group_name, &self.spring_name, DEFAULT)
    }

    pub fn monitoring_setting(&self) -> SpringCloudMonitoringSettingId {
        SpringCloudMonitoringSettingId::new(&self.subscription_id, &self.resource_group_name, &self.spring_name, DEFAULT)
    }
}
