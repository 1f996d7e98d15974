//! azurerm_mysql_flexible_server_configuration
//!
//! Server parameters cannot be deleted; removing the resource resets the
//! parameter to the value the server reports as its default.

use async_trait::async_trait;
use cirrus_core::data::ResourceData;
use cirrus_core::provider::{ProviderResult, Timeouts};
use cirrus_core::resource::Value;
use cirrus_core::resourceids::{ResourceIdError, ResourceIdentifier};
use cirrus_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::ids::FlexibleServerConfigurationId;
use super::models::{Configuration, ConfigurationProperties};
use super::validate;
use crate::clients::Clients;
use crate::resources::{Attributes, ResourceHandler, parse_id, wrap};

pub const RESOURCE_TYPE: &str = "azurerm_mysql_flexible_server_configuration";

const SOURCE_USER_OVERRIDE: &str = "user-override";
const SOURCE_SYSTEM_DEFAULT: &str = "system-default";

pub struct FlexibleServerConfigurationResource;

fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Sets a MySQL Flexible Server parameter")
        .attribute(
            AttributeSchema::new("name", types::string_with("ConfigurationName", validate::configuration_name))
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new(
                "server_name",
                types::string_with("FlexibleServerName", validate::flexible_server_name),
            )
            .required()
            .force_new(),
        )
        .attribute(AttributeSchema::new("resource_group_name", types::non_empty_string()).required().force_new())
        .attribute(AttributeSchema::new("value", AttributeType::String).required())
}

impl FlexibleServerConfigurationResource {
    async fn put_value(
        clients: &Clients,
        id: &FlexibleServerConfigurationId,
        value: String,
        source: &str,
    ) -> Result<(), crate::clients::error::ApiError> {
        let configuration = Configuration {
            properties: ConfigurationProperties {
                value: Some(value),
                source: Some(source.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        clients.mysql.update_configuration(id, &configuration).await
    }
}

#[async_trait]
impl ResourceHandler for FlexibleServerConfigurationResource {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::from_minutes(30, 5, 30, 30)
    }

    fn validate_id(&self, identifier: &str) -> Result<(), ResourceIdError> {
        FlexibleServerConfigurationId::validate(identifier)
    }

    async fn create(&self, clients: &Clients, data: ResourceData<'_>) -> ProviderResult<String> {
        let id = FlexibleServerConfigurationId::new(
            &clients.subscription_id,
            data.string("resource_group_name"),
            data.string("server_name"),
            data.string("name"),
        );

        Self::put_value(clients, &id, data.string("value"), SOURCE_USER_OVERRIDE)
            .await
            .map_err(wrap(format!("creating {}", id.description())))?;
        Ok(id.id())
    }

    async fn read(
        &self,
        clients: &Clients,
        identifier: &str,
        _data: ResourceData<'_>,
    ) -> ProviderResult<Option<Attributes>> {
        let id: FlexibleServerConfigurationId = parse_id(identifier)?;

        let configuration = match clients.mysql.get_configuration(&id).await {
            Ok(configuration) => configuration,
            Err(e) if e.is_not_found() => {
                log::info!("{} was not found - removing from state", id.description());
                return Ok(None);
            }
            Err(e) => return Err(wrap(format!("retrieving {}", id.description()))(e)),
        };

        let mut attributes = Attributes::new();
        attributes.insert("name".to_string(), Value::from(id.configuration_name.as_str()));
        attributes.insert("server_name".to_string(), Value::from(id.flexible_server_name.as_str()));
        attributes.insert("resource_group_name".to_string(), Value::from(id.resource_group_name.as_str()));
        attributes.insert(
            "value".to_string(),
            Value::String(configuration.properties.value.unwrap_or_default()),
        );
        Ok(Some(attributes))
    }

    async fn update(
        &self,
        clients: &Clients,
        identifier: &str,
        data: ResourceData<'_>,
    ) -> ProviderResult<()> {
        let id: FlexibleServerConfigurationId = parse_id(identifier)?;
        Self::put_value(clients, &id, data.string("value"), SOURCE_USER_OVERRIDE)
            .await
            .map_err(wrap(format!("updating {}", id.description())))
    }

    async fn delete(&self, clients: &Clients, identifier: &str) -> ProviderResult<()> {
        let id: FlexibleServerConfigurationId = parse_id(identifier)?;

        let current = clients
            .mysql
            .get_configuration(&id)
            .await
            .map_err(wrap(format!("retrieving {}", id.description())))?;

        let default_value = current.properties.default_value.unwrap_or_default();
        log::debug!("resetting {} to {:?}", id.description(), default_value);
        Self::put_value(clients, &id, default_value, SOURCE_SYSTEM_DEFAULT)
            .await
            .map_err(wrap(format!("deleting {}", id.description())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeMySqlClient, MySqlCall, clients_with_mysql};
    use std::sync::Arc;

    const CONFIG_ID: &str = "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/example-rg/providers/Microsoft.DBforMySQL/flexibleServers/example-server/configurations/max_connections";

    fn desired(value: &str) -> Attributes {
        [
            ("name", "max_connections"),
            ("server_name", "example-server"),
            ("resource_group_name", "example-rg"),
            ("value", value),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::from(v)))
        .collect()
    }

    #[tokio::test]
    async fn test_create_update_read() {
        let fake = Arc::new(FakeMySqlClient::default());
        let clients = clients_with_mysql(fake.clone());

        let attributes = desired("200");
        let identifier = FlexibleServerConfigurationResource
            .create(&clients, ResourceData::new(&attributes))
            .await
            .unwrap();
        assert_eq!(identifier, CONFIG_ID);

        let state = FlexibleServerConfigurationResource
            .read(&clients, &identifier, ResourceData::empty())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state, attributes);

        let attributes = desired("300");
        FlexibleServerConfigurationResource
            .update(&clients, &identifier, ResourceData::new(&attributes))
            .await
            .unwrap();
        let state = FlexibleServerConfigurationResource
            .read(&clients, &identifier, ResourceData::empty())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state["value"], Value::from("300"));
    }

    #[tokio::test]
    async fn test_delete_resets_to_default() {
        let fake = Arc::new(FakeMySqlClient::default());
        fake.set_configuration_default("max_connections", "151");
        let clients = clients_with_mysql(fake.clone());

        let attributes = desired("200");
        FlexibleServerConfigurationResource
            .create(&clients, ResourceData::new(&attributes))
            .await
            .unwrap();
        FlexibleServerConfigurationResource.delete(&clients, CONFIG_ID).await.unwrap();

        let Some(MySqlCall::UpdateConfiguration(configuration)) = fake.calls().pop() else {
            panic!("expected a configuration reset");
        };
        assert_eq!(configuration.properties.value.as_deref(), Some("151"));
        assert_eq!(configuration.properties.source.as_deref(), Some("system-default"));
    }

    #[tokio::test]
    async fn test_read_missing_configuration() {
        let clients = clients_with_mysql(Arc::new(FakeMySqlClient::default()));
        let state = FlexibleServerConfigurationResource
            .read(&clients, CONFIG_ID, ResourceData::empty())
            .await
            .unwrap();
        assert!(state.is_none());
    }

    #[test]
    fn test_rejects_server_id_on_import() {
        let server = CONFIG_ID.trim_end_matches("/configurations/max_connections");
        assert!(FlexibleServerConfigurationResource.validate_id(server).is_err());
        assert!(FlexibleServerConfigurationResource.validate_id(CONFIG_ID).is_ok());
    }
}
