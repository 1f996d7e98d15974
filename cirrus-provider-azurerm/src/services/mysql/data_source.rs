//! azurerm_mysql_flexible_server data source

use async_trait::async_trait;
use cirrus_core::data::ResourceData;
use cirrus_core::provider::{ProviderError, ProviderResult};
use cirrus_core::resourceids::ResourceIdentifier;
use cirrus_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::flexible_server::{self, RESOURCE_TYPE, flatten_server};
use super::ids::FlexibleServerId;
use super::validate;
use crate::clients::Clients;
use crate::resources::{Attributes, DataSourceHandler, wrap};

pub struct FlexibleServerDataSource;

/// Lookup keys plus every attribute of the resource, all computed
fn schema() -> ResourceSchema {
    let mut schema = ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Looks up an existing MySQL Flexible Server");
    for (name, mut attribute) in flexible_server::schema().attributes {
        if matches!(name.as_str(), "name" | "resource_group_name") {
            continue;
        }
        attribute.required = false;
        attribute.force_new = false;
        attribute.default = None;
        attribute.computed = true;
        schema = schema.attribute(attribute);
    }
    schema
        .attribute(
            AttributeSchema::new("name", types::string_with("FlexibleServerName", validate::flexible_server_name))
                .required(),
        )
        .attribute(AttributeSchema::new("resource_group_name", AttributeType::String).required())
}

#[async_trait]
impl DataSourceHandler for FlexibleServerDataSource {
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
        let id = FlexibleServerId::new(
            &clients.subscription_id,
            data.string("resource_group_name"),
            data.string("name"),
        );

        let server = clients.mysql.get_server(&id).await.map_err(|e| {
            if e.is_not_found() {
                ProviderError::new(format!("{} was not found", id.description())).with_cause(e)
            } else {
                wrap(format!("retrieving {}", id.description()))(e)
            }
        })?;

        let mut attributes = flatten_server(&id, &server)?;
        // Never read back from the API
        attributes.remove("administrator_password");
        Ok((id.id(), attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mysql::models::{Server, ServerProperties, Sku};
    use crate::testing::{FakeMySqlClient, clients_with_mysql};
    use cirrus_core::resource::Value;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn lookup(name: &str) -> HashMap<String, Value> {
        HashMap::from([
            ("name".to_string(), Value::from(name)),
            ("resource_group_name".to_string(), Value::from("example-rg")),
        ])
    }

    #[test]
    fn test_schema_only_requires_lookup_keys() {
        let schema = schema();
        let required: Vec<&str> = {
            let mut names: Vec<&str> = schema
                .attributes
                .values()
                .filter(|a| a.required)
                .map(|a| a.name.as_str())
                .collect();
            names.sort();
            names
        };
        assert_eq!(required, vec!["name", "resource_group_name"]);
        assert!(schema.attributes["sku_name"].computed);
        assert!(schema.force_new_attributes().is_empty());
    }

    #[tokio::test]
    async fn test_read_existing_server() {
        let id = FlexibleServerId::new("12345678-1234-9876-4563-123456789012", "example-rg", "example-server");
        let server = Server {
            location: "westeurope".to_string(),
            sku: Some(Sku {
                name: "Standard_B1s".to_string(),
                tier: "Burstable".to_string(),
            }),
            properties: Some(ServerProperties {
                version: Some("8.0.21".to_string()),
                fully_qualified_domain_name: Some("example-server.mysql.database.azure.com".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let clients = clients_with_mysql(Arc::new(FakeMySqlClient::with_server(&id, server)));

        let attributes = lookup("example-server");
        let (identifier, state) = FlexibleServerDataSource
            .read(&clients, ResourceData::new(&attributes))
            .await
            .unwrap();
        assert_eq!(identifier, id.id());
        assert_eq!(state["sku_name"], Value::from("B_Standard_B1s"));
        assert_eq!(state["fqdn"], Value::from("example-server.mysql.database.azure.com"));
        assert!(!state.contains_key("administrator_password"));
    }

    #[tokio::test]
    async fn test_missing_server_is_an_error() {
        let clients = clients_with_mysql(Arc::new(FakeMySqlClient::default()));
        let attributes = lookup("missing");
        let err = FlexibleServerDataSource
            .read(&clients, ResourceData::new(&attributes))
            .await
            .unwrap_err();
        assert!(err.message.ends_with("was not found"), "{}", err.message);
    }
}
