//! azurerm_spring_cloud_service
//!
//! The service itself is one PUT, but its config server, monitoring settings,
//! service registry, container registries, build service and agent pool are
//! separate child resources applied one after another.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use cirrus_core::commonids::SubnetId;
use cirrus_core::data::ResourceData;
use cirrus_core::provider::{ProviderError, ProviderResult, Timeouts};
use cirrus_core::resource::Value;
use cirrus_core::resourceids::{ResourceIdError, ResourceIdentifier};
use cirrus_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::ids::{SpringCloudContainerRegistryId, SpringCloudServiceId};
use super::models::*;
use super::validate;
use crate::clients::Clients;
use crate::resources::{Attributes, ResourceHandler, ensure_absent, parse_id, wrap};
use crate::utils::{expand_string_list, expand_tags, flatten_tags, normalize_location};

pub const RESOURCE_TYPE: &str = "azurerm_spring_cloud_service";

const DEFAULT_OUTBOUND_TYPE: &str = "loadBalancer";

pub struct SpringCloudServiceResource;

fn http_basic_auth_schema() -> AttributeSchema {
    AttributeSchema::block(
        "http_basic_auth",
        BlockSchema::single()
            .attribute(AttributeSchema::new("username", types::non_empty_string()).required())
            .attribute(AttributeSchema::new("password", types::non_empty_string()).required().sensitive()),
    )
    .conflicts_with("ssh_auth")
}

fn ssh_auth_schema() -> AttributeSchema {
    AttributeSchema::block(
        "ssh_auth",
        BlockSchema::single()
            .attribute(AttributeSchema::new("private_key", types::non_empty_string()).required().sensitive())
            .attribute(AttributeSchema::new("host_key", types::non_empty_string()).sensitive())
            .attribute(AttributeSchema::new("host_key_algorithm", AttributeType::enum_of(&[
                "ssh-dss",
                "ssh-rsa",
                "ecdsa-sha2-nistp256",
                "ecdsa-sha2-nistp384",
                "ecdsa-sha2-nistp521",
            ])))
            .attribute(AttributeSchema::new("strict_host_key_checking_enabled", AttributeType::Bool).with_default(true)),
    )
    .conflicts_with("http_basic_auth")
}

fn config_server_uri() -> AttributeType {
    types::string_with("ConfigServerURI", validate::config_server_uri)
}

pub(crate) fn schema() -> ResourceSchema {
    let repository = BlockSchema::new()
        .attribute(AttributeSchema::new("name", types::non_empty_string()).required())
        .attribute(AttributeSchema::new("uri", config_server_uri()).required())
        .attribute(AttributeSchema::new("label", AttributeType::String))
        .attribute(AttributeSchema::new("pattern", AttributeType::list_of(types::non_empty_string())))
        .attribute(AttributeSchema::new("search_paths", AttributeType::list_of(types::non_empty_string())))
        .attribute(http_basic_auth_schema())
        .attribute(ssh_auth_schema());

    let git_setting = BlockSchema::single()
        .attribute(AttributeSchema::new("uri", config_server_uri()).required())
        .attribute(AttributeSchema::new("label", AttributeType::String))
        .attribute(AttributeSchema::new("search_paths", AttributeType::list_of(types::non_empty_string())))
        .attribute(http_basic_auth_schema())
        .attribute(ssh_auth_schema())
        .attribute(AttributeSchema::block("repository", repository));

    let network = BlockSchema::single()
        .attribute(AttributeSchema::new("app_subnet_id", types::resource_id::<SubnetId>()).required().force_new())
        .attribute(
            AttributeSchema::new("service_runtime_subnet_id", types::resource_id::<SubnetId>())
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("cidr_ranges", types::string_list_min(3)).required().force_new())
        .attribute(AttributeSchema::new("app_network_resource_group", AttributeType::String).computed().force_new())
        .attribute(
            AttributeSchema::new(
                "outbound_type",
                AttributeType::enum_of(&[DEFAULT_OUTBOUND_TYPE, "userDefinedRouting"]),
            )
            .with_default(DEFAULT_OUTBOUND_TYPE)
            .force_new(),
        )
        .attribute(AttributeSchema::new("read_timeout_seconds", types::int_at_least(0)))
        .attribute(
            AttributeSchema::new("service_runtime_network_resource_group", AttributeType::String)
                .computed()
                .force_new(),
        );

    let traffic_rule = BlockSchema::new()
        .attribute(AttributeSchema::new("protocol", AttributeType::String).computed())
        .attribute(AttributeSchema::new("port", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("ip_addresses", AttributeType::list_of(AttributeType::String)).computed())
        .attribute(AttributeSchema::new("fqdns", AttributeType::list_of(AttributeType::String)).computed())
        .attribute(AttributeSchema::new("direction", AttributeType::String).computed());

    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Manages an Azure Spring Cloud Service")
        .attribute(
            AttributeSchema::new(
                "name",
                types::string_with("SpringCloudServiceName", validate::spring_cloud_service_name),
            )
            .required()
            .force_new(),
        )
        .attribute(AttributeSchema::new("location", types::non_empty_string()).required().force_new())
        .attribute(AttributeSchema::new("resource_group_name", types::non_empty_string()).required().force_new())
        .attribute(
            AttributeSchema::new("sku_name", AttributeType::enum_of(&["B0", "S0", SKU_ENTERPRISE]))
                .with_default("S0")
                .force_new(),
        )
        .attribute(
            AttributeSchema::new(
                "sku_tier",
                AttributeType::enum_of(&["Basic", "Enterprise", "Standard", "StandardGen2"]),
            )
            .computed()
            .force_new(),
        )
        .attribute(AttributeSchema::new("managed_environment_id", types::arm_resource_id()))
        .attribute(AttributeSchema::new(
            "build_agent_pool_size",
            AttributeType::enum_of(&["S1", "S2", "S3", "S4", "S5"]),
        ))
        .attribute(AttributeSchema::block(
            "container_registry",
            BlockSchema::new()
                .attribute(AttributeSchema::new("name", types::non_empty_string()).required())
                .attribute(AttributeSchema::new("password", types::non_empty_string()).required().sensitive())
                .attribute(AttributeSchema::new("server", types::non_empty_string()).required())
                .attribute(AttributeSchema::new("username", types::non_empty_string()).required()),
        ))
        .attribute(AttributeSchema::block(
            "default_build_service",
            BlockSchema::single().attribute(AttributeSchema::new("container_registry_name", types::non_empty_string())),
        ))
        .attribute(AttributeSchema::new("log_stream_public_endpoint_enabled", AttributeType::Bool))
        .attribute(
            AttributeSchema::block(
                "marketplace",
                BlockSchema::single()
                    .attribute(AttributeSchema::new("plan", types::non_empty_string()).required())
                    .attribute(AttributeSchema::new("publisher", types::non_empty_string()).required())
                    .attribute(AttributeSchema::new("product", types::non_empty_string()).required()),
            )
            .computed(),
        )
        .attribute(AttributeSchema::block("network", network).force_new())
        .attribute(AttributeSchema::block("config_server_git_setting", git_setting))
        .attribute(AttributeSchema::block(
            "trace",
            BlockSchema::single()
                .attribute(AttributeSchema::new("connection_string", types::non_empty_string()))
                .attribute(AttributeSchema::new("sample_rate", types::float_between(0.0, 100.0)).with_default(10.0)),
        ))
        .attribute(AttributeSchema::new("service_registry_enabled", AttributeType::Bool))
        .attribute(
            AttributeSchema::new("outbound_public_ip_addresses", AttributeType::list_of(AttributeType::String))
                .computed(),
        )
        .attribute(AttributeSchema::block("required_network_traffic_rules", traffic_rule).computed())
        .attribute(AttributeSchema::new("zone_redundant", AttributeType::Bool).with_default(false))
        .attribute(AttributeSchema::new("tags", types::tags()))
        .attribute(AttributeSchema::new("service_registry_id", AttributeType::String).computed())
}

fn sku_name<'a>(data: &ResourceData<'a>) -> &'a str {
    data.get_str("sku_name").unwrap_or("S0")
}

#[async_trait]
impl ResourceHandler for SpringCloudServiceResource {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::from_minutes(60, 5, 30, 30)
    }

    fn validate_id(&self, identifier: &str) -> Result<(), ResourceIdError> {
        SpringCloudServiceId::validate(identifier)
    }

    async fn create(&self, clients: &Clients, data: ResourceData<'_>) -> ProviderResult<String> {
        let id = SpringCloudServiceId::new(
            &clients.subscription_id,
            data.string("resource_group_name"),
            data.string("name"),
        );
        let description = id.description();

        let existing = clients.spring_cloud.get_service(&id).await;
        ensure_absent(RESOURCE_TYPE, &id.id(), &description, existing)?;

        let git_property = expand_git_property(data.get_block("config_server_git_setting"))?;
        let enterprise = sku_name(&data) == SKU_ENTERPRISE;
        if enterprise && git_property.is_some() {
            return Err(ProviderError::new(
                "`config_server_git_setting` is not supported for sku `E0`",
            ));
        }

        // The config server cannot be set on the initial PUT
        clients
            .spring_cloud
            .create_service(&id, &expand_service(&data))
            .await
            .map_err(wrap(format!("creating {}", description)))?;

        if !enterprise {
            update_config_server(clients, &id, git_property).await?;
        }

        update_monitoring_settings(clients, &id, &data).await?;

        if data.bool("service_registry_enabled") {
            clients
                .spring_cloud
                .create_service_registry(&id.service_registry())
                .await
                .map_err(wrap(format!("creating service registry of {}", description)))?;
        }

        if enterprise {
            apply_enterprise_settings(clients, &id, &[], &data).await?;
        }

        update_agent_pool(clients, &id, &data).await?;

        Ok(id.id())
    }

    async fn read(
        &self,
        clients: &Clients,
        identifier: &str,
        data: ResourceData<'_>,
    ) -> ProviderResult<Option<Attributes>> {
        let id: SpringCloudServiceId = parse_id(identifier)?;
        let description = id.description();
        let spring = &clients.spring_cloud;

        let service = match spring.get_service(&id).await {
            Ok(service) => service,
            Err(e) if e.is_not_found() => {
                log::info!("Spring Cloud Service {:?} does not exist - removing from state", identifier);
                return Ok(None);
            }
            Err(e) => return Err(wrap(format!("retrieving {}", description))(e)),
        };

        let monitoring = spring
            .get_monitoring_settings(&id)
            .await
            .map_err(wrap(format!("retrieving monitoring settings for {}", description)))?;

        let service_registry_enabled = match spring.get_service_registry(&id.service_registry()).await {
            Ok(_) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(wrap(format!("retrieving service registry of {}", description))(e)),
        };

        let mut attrs = flatten_service(&id, &service);

        match spring.list_container_registries(&id).await {
            Ok(registries) => {
                attrs.insert(
                    "container_registry".to_string(),
                    flatten_container_registries(data.get_list("container_registry"), &registries),
                );
            }
            Err(e) => {
                log::warn!("unable to list container registries for {}: {}", description, e);
                if let Some(value) = data.get("container_registry") {
                    attrs.insert("container_registry".to_string(), value.clone());
                }
            }
        }

        match spring.get_build_service(&id.build_service()).await {
            Ok(build_service) => {
                attrs.insert(
                    "default_build_service".to_string(),
                    flatten_build_service(build_service.properties.as_ref()),
                );
            }
            Err(e) => {
                log::warn!("unable to get build service for {}: {}", description, e);
                if let Some(value) = data.get("default_build_service") {
                    attrs.insert("default_build_service".to_string(), value.clone());
                }
            }
        }

        let pool_size = match spring.get_agent_pool(&id.agent_pool()).await {
            Ok(pool) => pool
                .properties
                .and_then(|p| p.pool_size)
                .and_then(|s| s.name)
                .unwrap_or_default(),
            Err(e) => {
                log::warn!("error retrieving build agent pool of {}: {}", description, e);
                String::new()
            }
        };
        attrs.insert("build_agent_pool_size".to_string(), Value::String(pool_size));

        attrs.insert("service_registry_enabled".to_string(), Value::Bool(service_registry_enabled));
        let registry_id = if service_registry_enabled {
            id.service_registry().id()
        } else {
            String::new()
        };
        attrs.insert("service_registry_id".to_string(), Value::String(registry_id));

        let sku = service.sku.as_ref().and_then(|s| s.name.as_deref());
        if sku.is_some_and(|name| name != SKU_ENTERPRISE) {
            let config_server = spring
                .get_config_server(&id)
                .await
                .map_err(wrap(format!("retrieving config server configuration for {}", description)))?;
            attrs.insert(
                "config_server_git_setting".to_string(),
                flatten_git_property(
                    config_server.properties.as_ref(),
                    data.get_block("config_server_git_setting"),
                ),
            );
        }

        attrs.insert("trace".to_string(), flatten_trace(monitoring.properties.as_ref()));

        Ok(Some(attrs))
    }

    async fn update(
        &self,
        clients: &Clients,
        identifier: &str,
        data: ResourceData<'_>,
    ) -> ProviderResult<()> {
        let id: SpringCloudServiceId = parse_id(identifier)?;
        let description = id.description();
        let enterprise = sku_name(&data) == SKU_ENTERPRISE;

        if data.has_change("tags") {
            let patch = ServiceResource {
                sku: Some(Sku {
                    name: Some(sku_name(&data).to_string()),
                    tier: None,
                }),
                tags: Some(expand_tags(data.get_map("tags"))),
                ..Default::default()
            };
            clients
                .spring_cloud
                .update_service(&id, &patch)
                .await
                .map_err(wrap(format!("updating {}", description)))?;
        }

        if data.has_change("config_server_git_setting") {
            let git_property = expand_git_property(data.get_block("config_server_git_setting"))?;
            if enterprise && git_property.is_some() {
                return Err(ProviderError::new(
                    "`config_server_git_setting` is not supported for sku `E0`",
                ));
            }
            if !enterprise {
                update_config_server(clients, &id, git_property).await?;
            }
        }

        if data.has_change("trace") {
            update_monitoring_settings(clients, &id, &data).await?;
        }

        if data.has_change("service_registry_enabled") {
            let registry = id.service_registry();
            if data.bool("service_registry_enabled") {
                clients
                    .spring_cloud
                    .create_service_registry(&registry)
                    .await
                    .map_err(wrap(format!("creating service registry of {}", description)))?;
            } else {
                clients
                    .spring_cloud
                    .delete_service_registry(&registry)
                    .await
                    .map_err(wrap(format!("deleting service registry of {}", description)))?;
            }
        }

        if enterprise {
            let previous = expand_container_registries(
                data.get_prior("container_registry")
                    .and_then(Value::as_list)
                    .unwrap_or(&[]),
            );
            apply_enterprise_settings(clients, &id, &previous, &data).await?;
        }

        update_agent_pool(clients, &id, &data).await
    }

    async fn delete(&self, clients: &Clients, identifier: &str) -> ProviderResult<()> {
        let id: SpringCloudServiceId = parse_id(identifier)?;
        clients
            .spring_cloud
            .delete_service(&id)
            .await
            .map_err(wrap(format!("deleting {}", id.description())))
    }
}

// =============================================================================
// Child resources
// =============================================================================

/// PUT the git settings, then fail if the service could not apply them
async fn update_config_server(
    clients: &Clients,
    id: &SpringCloudServiceId,
    git_property: Option<ConfigServerGitProperty>,
) -> ProviderResult<()> {
    let description = id.description();
    log::debug!("Updating Config Server Settings for {}..", description);

    let config_server = ConfigServerResource {
        properties: Some(ConfigServerProperties {
            config_server: Some(ConfigServerSettings { git_property }),
            ..Default::default()
        }),
    };
    clients
        .spring_cloud
        .update_config_server(id, &config_server)
        .await
        .map_err(wrap(format!("updating config server for {}", description)))?;

    let current = clients
        .spring_cloud
        .get_config_server(id)
        .await
        .map_err(wrap(format!("retrieving config server for {}", description)))?;
    if let Some(error) = current.properties.and_then(|p| p.error) {
        return Err(ProviderError::new(format!(
            "setting config server for {}: {}: {}",
            description,
            error.code.unwrap_or_default(),
            error.message.unwrap_or_default()
        )));
    }

    log::debug!("Updated Config Server Settings for {}.", description);
    Ok(())
}

async fn update_monitoring_settings(
    clients: &Clients,
    id: &SpringCloudServiceId,
    data: &ResourceData<'_>,
) -> ProviderResult<()> {
    log::debug!("Updating Monitor Settings for {}..", id.description());
    let settings = MonitoringSettingResource {
        properties: Some(expand_trace(data.get_block("trace"))),
    };
    clients
        .spring_cloud
        .update_monitoring_settings(id, &settings)
        .await
        .map_err(wrap(format!("updating monitor settings for {}", id.description())))
}

/// Container registries and the default build service (Enterprise only)
async fn apply_enterprise_settings(
    clients: &Clients,
    id: &SpringCloudServiceId,
    previous: &[ContainerRegistryResource],
    data: &ResourceData<'_>,
) -> ProviderResult<()> {
    let desired = expand_container_registries(data.get_list("container_registry"));
    apply_container_registries(clients, id, previous, &desired)
        .await
        .map_err(|e| {
            ProviderError::new(format!("applying container registries for {}", id.description())).with_cause(e)
        })?;

    let build_service = BuildService {
        properties: Some(expand_build_service(data.get_block("default_build_service"), id)),
    };
    clients
        .spring_cloud
        .create_build_service(&id.build_service(), &build_service)
        .await
        .map_err(wrap(format!("creating build service {}", id.description())))
}

/// Delete registries that are no longer configured, then PUT every desired one
async fn apply_container_registries(
    clients: &Clients,
    id: &SpringCloudServiceId,
    previous: &[ContainerRegistryResource],
    desired: &[ContainerRegistryResource],
) -> ProviderResult<()> {
    let keep: BTreeSet<&str> = desired.iter().filter_map(|r| r.name.as_deref()).collect();
    let remove: BTreeSet<&str> = previous
        .iter()
        .filter_map(|r| r.name.as_deref())
        .filter(|name| !keep.contains(name))
        .collect();

    for name in remove {
        let registry_id = id.container_registry(name);
        clients
            .spring_cloud
            .delete_container_registry(&registry_id)
            .await
            .map_err(wrap(format!("removing {}", registry_id.description())))?;
    }

    for registry in desired {
        let registry_id = id.container_registry(registry.name.as_deref().unwrap_or_default());
        clients
            .spring_cloud
            .create_container_registry(&registry_id, registry)
            .await
            .map_err(wrap(format!("creating {}", registry_id.description())))?;
    }
    Ok(())
}

async fn update_agent_pool(
    clients: &Clients,
    id: &SpringCloudServiceId,
    data: &ResourceData<'_>,
) -> ProviderResult<()> {
    let Some(size) = data.get_str("build_agent_pool_size") else {
        return Ok(());
    };
    let pool = AgentPoolResource {
        properties: Some(AgentPoolProperties {
            pool_size: Some(AgentPoolSize {
                name: Some(size.to_string()),
            }),
        }),
    };
    clients
        .spring_cloud
        .update_agent_pool(&id.agent_pool(), &pool)
        .await
        .map_err(wrap(format!("creating default build agent of {}", id.description())))
}

// =============================================================================
// Expand
// =============================================================================

fn string_of(block: &HashMap<String, Value>, key: &str) -> Option<String> {
    block
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn strings_of(block: &HashMap<String, Value>, key: &str) -> Vec<String> {
    block
        .get(key)
        .and_then(Value::as_list)
        .map(expand_string_list)
        .unwrap_or_default()
}

fn first_block<'a>(block: &'a HashMap<String, Value>, key: &str) -> Option<&'a HashMap<String, Value>> {
    block
        .get(key)
        .and_then(Value::as_list)
        .and_then(|items| items.first())
        .and_then(Value::as_map)
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}

fn expand_service(data: &ResourceData<'_>) -> ServiceResource {
    let mut properties = ClusterResourceProperties {
        network_profile: expand_network(data.get_block("network")),
        zone_redundant: Some(data.bool("zone_redundant")),
        marketplace_resource: data.get_block("marketplace").map(|m| MarketplaceResource {
            plan: string_of(m, "plan"),
            publisher: string_of(m, "publisher"),
            product: string_of(m, "product"),
        }),
        ..Default::default()
    };
    if data.bool("log_stream_public_endpoint_enabled") {
        properties.vnet_addons = Some(ServiceVNetAddons {
            log_stream_public_endpoint: Some(true),
        });
    }

    let mut sku = Sku {
        name: Some(sku_name(data).to_string()),
        tier: None,
    };
    // The tier is only sent for managed environments; other SKUs derive it from the name
    if let Some(environment) = data.get_str("managed_environment_id") {
        properties.managed_environment_id = Some(environment.to_string());
        sku.tier = data.get_str("sku_tier").map(str::to_string);
    }

    ServiceResource {
        location: Some(normalize_location(&data.string("location"))),
        sku: Some(sku),
        properties: Some(properties),
        tags: Some(expand_tags(data.get_map("tags"))),
        ..Default::default()
    }
}

fn expand_network(block: Option<&HashMap<String, Value>>) -> Option<NetworkProfile> {
    let block = block?;
    let read_timeout = block
        .get("read_timeout_seconds")
        .and_then(Value::as_int)
        .filter(|v| *v != 0);
    Some(NetworkProfile {
        service_runtime_subnet_id: string_of(block, "service_runtime_subnet_id"),
        app_subnet_id: string_of(block, "app_subnet_id"),
        service_cidr: Some(strings_of(block, "cidr_ranges").join(",")),
        service_runtime_network_resource_group: string_of(block, "service_runtime_network_resource_group"),
        app_network_resource_group: string_of(block, "app_network_resource_group"),
        ingress_config: read_timeout.map(|seconds| IngressConfig {
            read_timeout_in_seconds: Some(seconds),
        }),
        outbound_type: Some(string_of(block, "outbound_type").unwrap_or_else(|| DEFAULT_OUTBOUND_TYPE.to_string())),
        ..Default::default()
    })
}

fn expand_git_credentials(block: &HashMap<String, Value>, conflict: &str) -> ProviderResult<GitCredentials> {
    let http = first_block(block, "http_basic_auth");
    let ssh = first_block(block, "ssh_auth");

    match (http, ssh) {
        (Some(_), Some(_)) => Err(ProviderError::new(conflict)),
        (Some(http), None) => Ok(GitCredentials {
            username: Some(string_of(http, "username").unwrap_or_default()),
            password: Some(string_of(http, "password").unwrap_or_default()),
            ..Default::default()
        }),
        (None, Some(ssh)) => Ok(GitCredentials {
            private_key: Some(string_of(ssh, "private_key").unwrap_or_default()),
            host_key: string_of(ssh, "host_key"),
            host_key_algorithm: string_of(ssh, "host_key_algorithm"),
            strict_host_key_checking: Some(
                ssh.get("strict_host_key_checking_enabled")
                    .and_then(Value::as_bool)
                    .unwrap_or(true),
            ),
            ..Default::default()
        }),
        (None, None) => Ok(GitCredentials::default()),
    }
}

pub(crate) fn expand_git_property(
    block: Option<&HashMap<String, Value>>,
) -> ProviderResult<Option<ConfigServerGitProperty>> {
    let Some(block) = block else {
        return Ok(None);
    };

    let repositories = block
        .get("repository")
        .and_then(Value::as_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(Value::as_map)
        .map(|repo| -> ProviderResult<GitPatternRepository> {
            Ok(GitPatternRepository {
                name: string_of(repo, "name").unwrap_or_default(),
                uri: string_of(repo, "uri").unwrap_or_default(),
                label: string_of(repo, "label"),
                pattern: non_empty(strings_of(repo, "pattern")),
                search_paths: non_empty(strings_of(repo, "search_paths")),
                credentials: expand_git_credentials(
                    repo,
                    "can not set both `http_basic_auth` and `ssh_auth` for the same repository",
                )?,
            })
        })
        .collect::<ProviderResult<Vec<_>>>()?;

    Ok(Some(ConfigServerGitProperty {
        repositories: Some(repositories),
        uri: string_of(block, "uri").unwrap_or_default(),
        label: string_of(block, "label"),
        search_paths: non_empty(strings_of(block, "search_paths")),
        credentials: expand_git_credentials(block, "can not set both `http_basic_auth` and `ssh_auth`")?,
    }))
}

fn expand_trace(block: Option<&HashMap<String, Value>>) -> MonitoringSettingProperties {
    let Some(block) = block else {
        return MonitoringSettingProperties {
            trace_enabled: Some(false),
            ..Default::default()
        };
    };
    MonitoringSettingProperties {
        trace_enabled: Some(true),
        app_insights_instrumentation_key: Some(string_of(block, "connection_string").unwrap_or_default()),
        app_insights_sampling_rate: Some(block.get("sample_rate").and_then(Value::as_float).unwrap_or(10.0)),
    }
}

fn expand_container_registries(items: &[Value]) -> Vec<ContainerRegistryResource> {
    items
        .iter()
        .filter_map(Value::as_map)
        .map(|item| ContainerRegistryResource {
            name: string_of(item, "name"),
            properties: Some(ContainerRegistryProperties {
                credentials: Some(ContainerRegistryCredentials {
                    credential_type: CREDENTIALS_BASIC_AUTH.to_string(),
                    server: string_of(item, "server"),
                    username: string_of(item, "username"),
                    password: string_of(item, "password"),
                }),
                provisioning_state: None,
            }),
            ..Default::default()
        })
        .collect()
}

fn expand_build_service(block: Option<&HashMap<String, Value>>, id: &SpringCloudServiceId) -> BuildServiceProperties {
    BuildServiceProperties {
        container_registry: block
            .and_then(|b| string_of(b, "container_registry_name"))
            .map(|name| id.container_registry(&name).id()),
    }
}

// =============================================================================
// Flatten
// =============================================================================

/// Attributes read from the service resource itself
pub(crate) fn flatten_service(id: &SpringCloudServiceId, service: &ServiceResource) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("name".to_string(), Value::from(id.spring_name.as_str()));
    attrs.insert("resource_group_name".to_string(), Value::from(id.resource_group_name.as_str()));
    attrs.insert(
        "location".to_string(),
        Value::String(normalize_location(service.location.as_deref().unwrap_or_default())),
    );

    if let Some(sku) = &service.sku {
        attrs.insert("sku_name".to_string(), Value::String(sku.name.clone().unwrap_or_default()));
        attrs.insert("sku_tier".to_string(), Value::String(sku.tier.clone().unwrap_or_default()));
    }

    if let Some(props) = &service.properties {
        let network = props.network_profile.as_ref();
        attrs.insert("network".to_string(), flatten_network(network));
        attrs.insert(
            "outbound_public_ip_addresses".to_string(),
            Value::string_list(
                network
                    .and_then(|n| n.outbound_ips.as_ref())
                    .and_then(|o| o.public_ips.clone())
                    .unwrap_or_default(),
            ),
        );
        attrs.insert("required_network_traffic_rules".to_string(), flatten_required_traffic(network));
        attrs.insert(
            "marketplace".to_string(),
            match &props.marketplace_resource {
                Some(m) => Value::block([
                    ("plan", Value::String(m.plan.clone().unwrap_or_default())),
                    ("publisher", Value::String(m.publisher.clone().unwrap_or_default())),
                    ("product", Value::String(m.product.clone().unwrap_or_default())),
                ]),
                None => Value::empty_list(),
            },
        );
        if let Some(addons) = &props.vnet_addons {
            attrs.insert(
                "log_stream_public_endpoint_enabled".to_string(),
                Value::Bool(addons.log_stream_public_endpoint.unwrap_or(false)),
            );
        }
        if let Some(environment) = &props.managed_environment_id {
            attrs.insert("managed_environment_id".to_string(), Value::from(environment.as_str()));
        }
        attrs.insert("zone_redundant".to_string(), Value::Bool(props.zone_redundant.unwrap_or(false)));
    }

    attrs.insert("tags".to_string(), flatten_tags(service.tags.as_ref()));
    attrs
}

fn flatten_network(network: Option<&NetworkProfile>) -> Value {
    let Some(network) = network else {
        return Value::empty_list();
    };
    let string = |value: &Option<String>| value.clone().unwrap_or_default();

    let cidr_ranges: Vec<String> = network
        .service_cidr
        .as_deref()
        .map(|cidr| cidr.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    let app_subnet_id = string(&network.app_subnet_id);
    let runtime_subnet_id = string(&network.service_runtime_subnet_id);
    let app_group = string(&network.app_network_resource_group);
    let runtime_group = string(&network.service_runtime_network_resource_group);

    if app_subnet_id.is_empty()
        && runtime_subnet_id.is_empty()
        && app_group.is_empty()
        && runtime_group.is_empty()
        && cidr_ranges.is_empty()
    {
        return Value::empty_list();
    }

    Value::block([
        ("app_subnet_id", Value::String(app_subnet_id)),
        ("service_runtime_subnet_id", Value::String(runtime_subnet_id)),
        ("cidr_ranges", Value::string_list(cidr_ranges)),
        ("app_network_resource_group", Value::String(app_group)),
        ("service_runtime_network_resource_group", Value::String(runtime_group)),
        (
            "read_timeout_seconds",
            Value::Int(
                network
                    .ingress_config
                    .as_ref()
                    .and_then(|c| c.read_timeout_in_seconds)
                    .unwrap_or(0),
            ),
        ),
        (
            "outbound_type",
            Value::String(
                network
                    .outbound_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OUTBOUND_TYPE.to_string()),
            ),
        ),
    ])
}

fn flatten_required_traffic(network: Option<&NetworkProfile>) -> Value {
    let rules = network
        .and_then(|n| n.required_traffics.as_ref())
        .map(|rules| {
            rules
                .iter()
                .map(|rule| {
                    Value::map([
                        ("protocol", Value::String(rule.protocol.clone().unwrap_or_default())),
                        ("port", Value::Int(rule.port.unwrap_or(0))),
                        ("ip_addresses", Value::string_list(rule.ips.clone().unwrap_or_default())),
                        ("fqdns", Value::string_list(rule.fqdns.clone().unwrap_or_default())),
                        ("direction", Value::String(rule.direction.clone().unwrap_or_default())),
                    ])
                })
                .collect()
        })
        .unwrap_or_default();
    Value::List(rules)
}

/// Credentials the API masks are taken from `prior`
fn flatten_git_credentials(credentials: &GitCredentials, prior: Option<&HashMap<String, Value>>) -> (Value, Value) {
    let prior_string = |block: &str, key: &str| {
        prior
            .and_then(|p| first_block(p, block))
            .and_then(|b| b.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let http = if credentials.username.is_some() && credentials.password.is_some() {
        Value::block([
            ("username", Value::String(prior_string("http_basic_auth", "username"))),
            ("password", Value::String(prior_string("http_basic_auth", "password"))),
        ])
    } else {
        Value::empty_list()
    };

    let ssh = if credentials.private_key.is_some() {
        Value::block([
            ("private_key", Value::String(prior_string("ssh_auth", "private_key"))),
            ("host_key", Value::String(prior_string("ssh_auth", "host_key"))),
            ("host_key_algorithm", Value::String(prior_string("ssh_auth", "host_key_algorithm"))),
            (
                "strict_host_key_checking_enabled",
                Value::Bool(credentials.strict_host_key_checking.unwrap_or(false)),
            ),
        ])
    } else {
        Value::empty_list()
    };

    (http, ssh)
}

pub(crate) fn flatten_git_property(
    properties: Option<&ConfigServerProperties>,
    prior: Option<&HashMap<String, Value>>,
) -> Value {
    let Some(git) = properties
        .and_then(|p| p.config_server.as_ref())
        .and_then(|c| c.git_property.as_ref())
    else {
        return Value::empty_list();
    };

    let prior_repositories: HashMap<&str, &HashMap<String, Value>> = prior
        .and_then(|p| p.get("repository"))
        .and_then(Value::as_list)
        .unwrap_or(&[])
        .iter()
        .filter_map(Value::as_map)
        .filter_map(|repo| repo.get("name").and_then(Value::as_str).map(|name| (name, repo)))
        .collect();

    let repositories = git
        .repositories
        .iter()
        .flatten()
        .map(|repo| {
            let (http, ssh) =
                flatten_git_credentials(&repo.credentials, prior_repositories.get(repo.name.as_str()).copied());
            Value::map([
                ("name", Value::from(repo.name.as_str())),
                ("uri", Value::from(repo.uri.as_str())),
                ("label", Value::String(repo.label.clone().unwrap_or_default())),
                ("pattern", Value::string_list(repo.pattern.clone().unwrap_or_default())),
                ("search_paths", Value::string_list(repo.search_paths.clone().unwrap_or_default())),
                ("http_basic_auth", http),
                ("ssh_auth", ssh),
            ])
        })
        .collect();

    let (http, ssh) = flatten_git_credentials(&git.credentials, prior);
    Value::block([
        ("uri", Value::from(git.uri.as_str())),
        ("label", Value::String(git.label.clone().unwrap_or_default())),
        ("search_paths", Value::string_list(git.search_paths.clone().unwrap_or_default())),
        ("http_basic_auth", http),
        ("ssh_auth", ssh),
        ("repository", Value::List(repositories)),
    ])
}

pub(crate) fn flatten_trace(properties: Option<&MonitoringSettingProperties>) -> Value {
    match properties {
        Some(p) if p.trace_enabled.unwrap_or(false) => Value::block([
            (
                "connection_string",
                Value::String(p.app_insights_instrumentation_key.clone().unwrap_or_default()),
            ),
            ("sample_rate", Value::Float(p.app_insights_sampling_rate.unwrap_or(0.0))),
        ]),
        _ => Value::empty_list(),
    }
}

/// Registry passwords are never returned and come from `state`
fn flatten_container_registries(state: &[Value], registries: &[ContainerRegistryResource]) -> Value {
    let passwords: HashMap<&str, &str> = state
        .iter()
        .filter_map(Value::as_map)
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?;
            let password = item.get("password")?.as_str()?;
            Some((name, password))
        })
        .collect();

    let items = registries
        .iter()
        .map(|registry| {
            let name = registry.name.clone().unwrap_or_default();
            let credentials = registry.properties.as_ref().and_then(|p| p.credentials.as_ref());
            let username = credentials.and_then(|c| c.username.clone()).unwrap_or_default();
            let server = credentials.and_then(|c| c.server.clone()).unwrap_or_default();
            Value::map([
                ("password", Value::from(passwords.get(name.as_str()).copied().unwrap_or_default())),
                ("username", Value::String(username)),
                ("server", Value::String(server)),
                ("name", Value::String(name)),
            ])
        })
        .collect();
    Value::List(items)
}

fn flatten_build_service(properties: Option<&BuildServiceProperties>) -> Value {
    properties
        .and_then(|p| p.container_registry.as_deref())
        .and_then(|id| SpringCloudContainerRegistryId::parse_insensitively(id).ok())
        .map(|id| Value::block([("container_registry_name", Value::String(id.container_registry_name))]))
        .unwrap_or_else(Value::empty_list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSpringCloudClient, SpringCall, clients_with_spring_cloud};
    use serde_json::json;
    use std::sync::Arc;

    const SERVICE_ID: &str = "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/example-rg/providers/Microsoft.AppPlatform/spring/example-spring";

    fn attrs(value: serde_json::Value) -> Attributes {
        let mut attributes: Attributes = serde_json::from_value(value).unwrap();
        schema().apply_defaults(&mut attributes);
        attributes
    }

    fn base(extra: serde_json::Value) -> Attributes {
        let mut value = json!({
            "name": "example-spring",
            "resource_group_name": "example-rg",
            "location": "West Europe",
        });
        if let (Some(target), serde_json::Value::Object(extra)) = (value.as_object_mut(), extra) {
            target.extend(extra);
        }
        attrs(value)
    }

    #[test]
    fn test_git_auth_is_exclusive() {
        let both = attrs(json!({
            "config_server_git_setting": [{
                "uri": "https://github.com/Azure-Samples/piggymetrics",
                "http_basic_auth": [{"username": "u", "password": "p"}],
                "ssh_auth": [{"private_key": "key"}]
            }]
        }));
        let err = expand_git_property(ResourceData::new(&both).get_block("config_server_git_setting")).unwrap_err();
        assert_eq!(err.message, "can not set both `http_basic_auth` and `ssh_auth`");

        let repository = attrs(json!({
            "config_server_git_setting": [{
                "uri": "https://github.com/Azure-Samples/piggymetrics",
                "repository": [{
                    "name": "repo",
                    "uri": "git@github.com:Azure-Samples/repo.git",
                    "http_basic_auth": [{"username": "u", "password": "p"}],
                    "ssh_auth": [{"private_key": "key"}]
                }]
            }]
        }));
        let err =
            expand_git_property(ResourceData::new(&repository).get_block("config_server_git_setting")).unwrap_err();
        assert!(err.message.ends_with("for the same repository"));

        let errors = schema().validate(&both).unwrap_err();
        assert!(errors.iter().any(|e| e.to_string().contains("conflicts with")));
    }

    #[test]
    fn test_git_secrets_come_from_prior_state() {
        let configured = attrs(json!({
            "config_server_git_setting": [{
                "uri": "https://github.com/Azure-Samples/piggymetrics",
                "label": "config",
                "http_basic_auth": [{"username": "user", "password": "secret"}],
                "repository": [{
                    "name": "repo",
                    "uri": "git@github.com:Azure-Samples/repo.git",
                    "pattern": ["app/*"],
                    "ssh_auth": [{"private_key": "KEY", "host_key": "HOST", "host_key_algorithm": "ssh-rsa"}]
                }]
            }]
        }));
        let prior = ResourceData::new(&configured).get_block("config_server_git_setting");
        let mut git = expand_git_property(prior).unwrap().unwrap();

        // Masked as the API returns them
        git.credentials.username = Some("*".to_string());
        git.credentials.password = Some("*".to_string());
        if let Some(repo) = git.repositories.as_mut().and_then(|r| r.first_mut()) {
            repo.credentials.private_key = Some("*".to_string());
            repo.credentials.host_key = Some("*".to_string());
        }
        let properties = ConfigServerProperties {
            config_server: Some(ConfigServerSettings {
                git_property: Some(git),
            }),
            ..Default::default()
        };

        let flattened = flatten_git_property(Some(&properties), prior);
        let setting = flattened.as_list().unwrap()[0].as_map().unwrap();
        let expected = prior.unwrap();
        assert_eq!(setting["http_basic_auth"], expected["http_basic_auth"]);
        assert_eq!(setting["label"], Value::from("config"));
        assert_eq!(setting["ssh_auth"], Value::empty_list());

        let repository = setting["repository"].as_list().unwrap()[0].as_map().unwrap();
        let ssh = repository["ssh_auth"].as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(ssh["private_key"], Value::from("KEY"));
        assert_eq!(ssh["host_key"], Value::from("HOST"));
        assert_eq!(ssh["host_key_algorithm"], Value::from("ssh-rsa"));
        assert_eq!(ssh["strict_host_key_checking_enabled"], Value::Bool(true));
        assert_eq!(repository["pattern"], Value::string_list(["app/*"]));
    }

    #[test]
    fn test_network_expansion() {
        let configured = attrs(json!({
            "network": [{
                "app_subnet_id": "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet/subnets/app",
                "service_runtime_subnet_id": "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet/subnets/runtime",
                "cidr_ranges": ["10.4.0.0/16", "10.5.0.0/16", "10.3.0.1/16"],
                "read_timeout_seconds": 300
            }]
        }));
        let profile = expand_network(ResourceData::new(&configured).get_block("network")).unwrap();
        assert_eq!(profile.service_cidr.as_deref(), Some("10.4.0.0/16,10.5.0.0/16,10.3.0.1/16"));
        assert_eq!(profile.outbound_type.as_deref(), Some("loadBalancer"));
        assert_eq!(profile.ingress_config.as_ref().unwrap().read_timeout_in_seconds, Some(300));

        let flattened = flatten_network(Some(&profile));
        let item = flattened.as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(item["cidr_ranges"].as_list().unwrap().len(), 3);
        assert_eq!(item["read_timeout_seconds"], Value::Int(300));
        assert_eq!(flatten_network(Some(&NetworkProfile::default())), Value::empty_list());
    }

    #[test]
    fn test_trace_expansion() {
        let disabled = expand_trace(None);
        assert_eq!(disabled.trace_enabled, Some(false));
        assert_eq!(flatten_trace(Some(&disabled)), Value::empty_list());

        let configured = attrs(json!({"trace": [{"connection_string": "InstrumentationKey=abc"}]}));
        let enabled = expand_trace(ResourceData::new(&configured).get_block("trace"));
        assert_eq!(enabled.app_insights_sampling_rate, Some(10.0));
        assert_eq!(flatten_trace(Some(&enabled)), configured["trace"]);
    }

    #[tokio::test]
    async fn test_create_standard_then_read() {
        let fake = Arc::new(FakeSpringCloudClient::default());
        let clients = clients_with_spring_cloud(fake.clone());

        let desired = base(json!({
            "service_registry_enabled": true,
            "config_server_git_setting": [{
                "uri": "https://github.com/Azure-Samples/piggymetrics",
                "http_basic_auth": [{"username": "user", "password": "secret"}]
            }],
            "tags": {"env": "test"}
        }));
        let data = ResourceData::new(&desired);

        let identifier = SpringCloudServiceResource.create(&clients, data).await.unwrap();
        assert_eq!(identifier, SERVICE_ID);

        let calls = fake.calls();
        let names: Vec<&str> = calls.iter().map(SpringCall::name).collect();
        assert_eq!(
            names,
            vec![
                "get_service",
                "create_service",
                "update_config_server",
                "get_config_server",
                "update_monitoring_settings",
                "create_service_registry",
            ]
        );

        let state = SpringCloudServiceResource
            .read(&clients, &identifier, data)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state["location"], Value::from("westeurope"));
        assert_eq!(state["sku_name"], Value::from("S0"));
        assert_eq!(state["service_registry_enabled"], Value::Bool(true));
        assert_eq!(
            state["service_registry_id"],
            Value::String(format!("{}/serviceRegistries/default", SERVICE_ID))
        );
        let setting = state["config_server_git_setting"].as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(setting["uri"], Value::from("https://github.com/Azure-Samples/piggymetrics"));
        assert_eq!(
            setting["http_basic_auth"],
            Value::block([("username", Value::from("user")), ("password", Value::from("secret"))])
        );
        assert_eq!(state["trace"], Value::empty_list());
        assert_eq!(state["build_agent_pool_size"], Value::from(""));
    }

    #[tokio::test]
    async fn test_create_fails_when_config_server_reports_error() {
        let fake = Arc::new(FakeSpringCloudClient::default());
        fake.fail_config_server("Failed to clone repository");
        let clients = clients_with_spring_cloud(fake);

        let desired = base(json!({
            "config_server_git_setting": [{"uri": "https://github.com/Azure-Samples/missing"}]
        }));
        let err = SpringCloudServiceResource
            .create(&clients, ResourceData::new(&desired))
            .await
            .unwrap_err();
        assert!(err.message.starts_with("setting config server for Spring Cloud Service"));
        assert!(err.message.ends_with("Failed to clone repository"));
    }

    #[tokio::test]
    async fn test_enterprise_rejects_git_settings() {
        let fake = Arc::new(FakeSpringCloudClient::default());
        let clients = clients_with_spring_cloud(fake.clone());
        let desired = base(json!({
            "sku_name": "E0",
            "config_server_git_setting": [{"uri": "https://github.com/Azure-Samples/piggymetrics"}]
        }));
        let err = SpringCloudServiceResource
            .create(&clients, ResourceData::new(&desired))
            .await
            .unwrap_err();
        assert_eq!(err.message, "`config_server_git_setting` is not supported for sku `E0`");
        assert!(!fake.calls().iter().any(|c| c.name() == "create_service"));
    }

    #[tokio::test]
    async fn test_create_enterprise() {
        let fake = Arc::new(FakeSpringCloudClient::default());
        let clients = clients_with_spring_cloud(fake.clone());
        let desired = base(json!({
            "sku_name": "E0",
            "build_agent_pool_size": "S2",
            "container_registry": [
                {"name": "acr", "server": "acr.azurecr.io", "username": "user", "password": "secret"}
            ],
            "default_build_service": [{"container_registry_name": "acr"}]
        }));
        let data = ResourceData::new(&desired);
        SpringCloudServiceResource.create(&clients, data).await.unwrap();

        let names: Vec<&str> = fake.calls().iter().map(SpringCall::name).collect();
        assert_eq!(
            names,
            vec![
                "get_service",
                "create_service",
                "update_monitoring_settings",
                "create_container_registry",
                "create_build_service",
                "update_agent_pool",
            ]
        );

        let state = SpringCloudServiceResource
            .read(&clients, SERVICE_ID, data)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state["container_registry"], desired["container_registry"]);
        assert_eq!(state["default_build_service"], desired["default_build_service"]);
        assert_eq!(state["build_agent_pool_size"], Value::from("S2"));
        assert!(!state.contains_key("config_server_git_setting"));
    }

    #[tokio::test]
    async fn test_update_only_touches_changed_children() {
        let fake = Arc::new(FakeSpringCloudClient::default());
        let clients = clients_with_spring_cloud(fake.clone());

        let prior = base(json!({"service_registry_enabled": true}));
        SpringCloudServiceResource
            .create(&clients, ResourceData::new(&prior))
            .await
            .unwrap();
        fake.clear_calls();

        let desired = base(json!({
            "service_registry_enabled": false,
            "trace": [{"connection_string": "InstrumentationKey=abc", "sample_rate": 20.0}]
        }));
        SpringCloudServiceResource
            .update(&clients, SERVICE_ID, ResourceData::new(&desired).with_prior(&prior))
            .await
            .unwrap();

        let names: Vec<&str> = fake.calls().iter().map(SpringCall::name).collect();
        assert_eq!(names, vec!["update_monitoring_settings", "delete_service_registry"]);
    }

    #[tokio::test]
    async fn test_update_enterprise_removes_dropped_registries() {
        let fake = Arc::new(FakeSpringCloudClient::default());
        let clients = clients_with_spring_cloud(fake.clone());

        let prior = base(json!({
            "sku_name": "E0",
            "container_registry": [
                {"name": "old", "server": "old.azurecr.io", "username": "user", "password": "secret"}
            ]
        }));
        let desired = base(json!({
            "sku_name": "E0",
            "container_registry": [
                {"name": "new", "server": "new.azurecr.io", "username": "user", "password": "secret"}
            ]
        }));
        SpringCloudServiceResource
            .update(&clients, SERVICE_ID, ResourceData::new(&desired).with_prior(&prior))
            .await
            .unwrap();

        let calls = fake.calls();
        let registry_calls: Vec<String> = calls
            .iter()
            .filter_map(|c| match c {
                SpringCall::DeleteContainerRegistry(id) => Some(format!("delete {}", id.container_registry_name)),
                SpringCall::CreateContainerRegistry(id) => Some(format!("create {}", id.container_registry_name)),
                _ => None,
            })
            .collect();
        assert_eq!(registry_calls, vec!["delete old", "create new"]);
    }

    #[tokio::test]
    async fn test_read_tolerates_enterprise_child_failures() {
        let fake = Arc::new(FakeSpringCloudClient::default());
        let clients = clients_with_spring_cloud(fake.clone());
        let desired = base(json!({}));
        SpringCloudServiceResource
            .create(&clients, ResourceData::new(&desired))
            .await
            .unwrap();

        fake.fail_enterprise_reads(500);
        let state = SpringCloudServiceResource
            .read(&clients, SERVICE_ID, ResourceData::new(&desired))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state["build_agent_pool_size"], Value::from(""));
        assert!(!state.contains_key("default_build_service"));
        assert!(!state.contains_key("container_registry"));
    }

    #[tokio::test]
    async fn test_read_and_delete_missing_service() {
        let clients = clients_with_spring_cloud(Arc::new(FakeSpringCloudClient::default()));
        let state = SpringCloudServiceResource
            .read(&clients, SERVICE_ID, ResourceData::empty())
            .await
            .unwrap();
        assert!(state.is_none());

        let err = SpringCloudServiceResource.delete(&clients, SERVICE_ID).await.unwrap_err();
        assert!(err.message.starts_with("deleting Spring Cloud Service"), "{}", err.message);
    }

    #[test]
    fn test_expand_service_payload() {
        let desired = base(json!({
            "log_stream_public_endpoint_enabled": true,
            "managed_environment_id": "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.App/managedEnvironments/env",
            "sku_tier": "StandardGen2",
            "tags": {"env": "test"}
        }));
        let body = serde_json::to_value(expand_service(&ResourceData::new(&desired))).unwrap();
        assert_eq!(
            body,
            json!({
                "location": "westeurope",
                "sku": {"name": "S0", "tier": "StandardGen2"},
                "properties": {
                    "zoneRedundant": false,
                    "vnetAddons": {"logStreamPublicEndpoint": true},
                    "managedEnvironmentId": "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.App/managedEnvironments/env"
                },
                "tags": {"env": "test"}
            })
        );
    }
}
