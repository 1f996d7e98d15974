//! azurerm_spring_cloud_service data source

use async_trait::async_trait;
use cirrus_core::data::ResourceData;
use cirrus_core::provider::{ProviderError, ProviderResult};
use cirrus_core::resource::Value;
use cirrus_core::resourceids::ResourceIdentifier;
use cirrus_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::ids::SpringCloudServiceId;
use super::models::SKU_ENTERPRISE;
use super::service::{RESOURCE_TYPE, flatten_git_property, flatten_service};
use super::validate;
use crate::clients::Clients;
use crate::resources::{Attributes, DataSourceHandler, wrap};

/// Attributes of the resource exposed by the lookup
const EXPOSED: &[&str] = &[
    "name",
    "resource_group_name",
    "location",
    "sku_name",
    "outbound_public_ip_addresses",
    "required_network_traffic_rules",
    "tags",
];

pub struct SpringCloudServiceDataSource;

fn computed_strings(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::list_of(AttributeType::String)).computed()
}

fn schema() -> ResourceSchema {
    let repository = BlockSchema::new()
        .attribute(AttributeSchema::new("name", AttributeType::String).computed())
        .attribute(AttributeSchema::new("uri", AttributeType::String).computed())
        .attribute(AttributeSchema::new("label", AttributeType::String).computed())
        .attribute(computed_strings("pattern"))
        .attribute(computed_strings("search_paths"));
    let git_setting = BlockSchema::new()
        .attribute(AttributeSchema::new("uri", AttributeType::String).computed())
        .attribute(AttributeSchema::new("label", AttributeType::String).computed())
        .attribute(computed_strings("search_paths"))
        .attribute(AttributeSchema::block("repository", repository).computed());
    let traffic_rule = BlockSchema::new()
        .attribute(AttributeSchema::new("protocol", AttributeType::String).computed())
        .attribute(AttributeSchema::new("port", AttributeType::Int).computed())
        .attribute(computed_strings("ip_addresses"))
        .attribute(computed_strings("fqdns"))
        .attribute(AttributeSchema::new("direction", AttributeType::String).computed());

    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Looks up an existing Spring Cloud Service")
        .attribute(
            AttributeSchema::new(
                "name",
                types::string_with("SpringCloudServiceName", validate::spring_cloud_service_name),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("resource_group_name", AttributeType::String).required())
        .attribute(AttributeSchema::new("location", AttributeType::String).computed())
        .attribute(AttributeSchema::new("sku_name", AttributeType::String).computed())
        .attribute(AttributeSchema::block("config_server_git_setting", git_setting).computed())
        .attribute(computed_strings("outbound_public_ip_addresses"))
        .attribute(AttributeSchema::block("required_network_traffic_rules", traffic_rule).computed())
        .attribute(AttributeSchema::new("tags", AttributeType::map_of(AttributeType::String)).computed())
}

/// Git settings without any credential blocks
fn without_credentials(value: Value) -> Value {
    match value {
        Value::List(items) => Value::List(items.into_iter().map(without_credentials).collect()),
        Value::Map(map) => Value::Map(
            map.into_iter()
                .filter(|(key, _)| key != "http_basic_auth" && key != "ssh_auth")
                .map(|(key, value)| (key, without_credentials(value)))
                .collect(),
        ),
        other => other,
    }
}

#[async_trait]
impl DataSourceHandler for SpringCloudServiceDataSource {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    async fn read(
        &self,
        clients: &Clients,
        data: ResourceData<'_>,
    ) -> ProviderResult<(String, Attributes)> {
        let id = SpringCloudServiceId::new(
            &clients.subscription_id,
            data.string("resource_group_name"),
            data.string("name"),
        );
        let description = id.description();

        let service = clients.spring_cloud.get_service(&id).await.map_err(|e| {
            if e.is_not_found() {
                ProviderError::new(format!("{} was not found", description)).with_cause(e)
            } else {
                wrap(format!("retrieving {}", description))(e)
            }
        })?;

        let mut attributes: Attributes = flatten_service(&id, &service)
            .into_iter()
            .filter(|(key, _)| EXPOSED.contains(&key.as_str()))
            .collect();

        let enterprise = service
            .sku
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .is_some_and(|name| name == SKU_ENTERPRISE);
        let git_setting = if enterprise {
            Value::empty_list()
        } else {
            let config_server = clients
                .spring_cloud
                .get_config_server(&id)
                .await
                .map_err(wrap(format!("retrieving config server configuration for {}", description)))?;
            without_credentials(flatten_git_property(config_server.properties.as_ref(), None))
        };
        attributes.insert("config_server_git_setting".to_string(), git_setting);

        Ok((id.id(), attributes))
    }
}
