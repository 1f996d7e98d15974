//! Request and response models for `Microsoft.DBforMySQL/flexibleServers`

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const ENABLED: &str = "Enabled";
pub const DISABLED: &str = "Disabled";

pub const CREATE_MODE_DEFAULT: &str = "Default";
pub const CREATE_MODE_GEO_RESTORE: &str = "GeoRestore";
pub const CREATE_MODE_POINT_IN_TIME_RESTORE: &str = "PointInTimeRestore";
pub const CREATE_MODE_REPLICA: &str = "Replica";

pub const HA_MODE_DISABLED: &str = "Disabled";
pub const HA_MODE_SAME_ZONE: &str = "SameZone";
pub const HA_MODE_ZONE_REDUNDANT: &str = "ZoneRedundant";

pub const DATA_ENCRYPTION_SYSTEM_MANAGED: &str = "SystemManaged";
pub const DATA_ENCRYPTION_AZURE_KEY_VAULT: &str = "AzureKeyVault";

pub const IDENTITY_NONE: &str = "None";
pub const IDENTITY_USER_ASSIGNED: &str = "UserAssigned";

pub const REPLICATION_ROLE_NONE: &str = "None";
pub const REPLICATION_ROLE_REPLICA: &str = "Replica";

pub const SKU_TIER_BURSTABLE: &str = "Burstable";
pub const SKU_TIER_GENERAL_PURPOSE: &str = "GeneralPurpose";
pub const SKU_TIER_MEMORY_OPTIMIZED: &str = "MemoryOptimized";

/// A flexible server as sent on create and returned by GET
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ServerProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrator_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrator_login_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<Backup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_encryption: Option<DataEncryption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fully_qualified_domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_availability: Option<HighAvailability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_window: Option<MaintenanceWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_capacity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_point_in_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_server_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// PATCH body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerForUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    pub properties: ServerPropertiesForUpdate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPropertiesForUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub administrator_login_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<Backup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_encryption: Option<DataEncryption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_availability: Option<HighAvailability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_window: Option<MaintenanceWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,
    pub tier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Storage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_grow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_io_scaling: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iops: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_on_disk: Option<String>,
    #[serde(rename = "storageSizeGB", skip_serializing_if = "Option::is_none")]
    pub storage_size_gb: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_retention_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_redundant_backup: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighAvailability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standby_availability_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegated_subnet_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_dns_zone_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_network_access: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_window: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_hour: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_minute: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataEncryption {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub encryption_type: Option<String>,
    #[serde(rename = "primaryKeyURI", skip_serializing_if = "Option::is_none")]
    pub primary_key_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_user_assigned_identity_id: Option<String>,
    #[serde(rename = "geoBackupKeyURI", skip_serializing_if = "Option::is_none")]
    pub geo_backup_key_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_backup_user_assigned_identity_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(rename = "type")]
    pub identity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_assigned_identities: Option<HashMap<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// A server parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: ConfigurationProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read_only: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_storage_uses_api_field_names() {
        let storage = Storage {
            auto_grow: Some(ENABLED.to_string()),
            storage_size_gb: Some(64),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&storage).unwrap(),
            json!({"autoGrow": "Enabled", "storageSizeGB": 64})
        );
    }

    #[test]
    fn test_data_encryption_uses_uri_casing() {
        let de = DataEncryption {
            encryption_type: Some(DATA_ENCRYPTION_AZURE_KEY_VAULT.to_string()),
            primary_key_uri: Some("https://vault.vault.azure.net/keys/k/1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&de).unwrap(),
            json!({"type": "AzureKeyVault", "primaryKeyURI": "https://vault.vault.azure.net/keys/k/1"})
        );
    }

    #[test]
    fn test_server_deserializes_partial_response() {
        let server: Server = serde_json::from_value(json!({
            "id": "/subscriptions/0000/resourceGroups/rg/providers/Microsoft.DBforMySQL/flexibleServers/db",
            "location": "westeurope",
            "sku": {"name": "Standard_B1s", "tier": "Burstable"},
            "properties": {
                "version": "8.0.21",
                "replicaCapacity": 10,
                "storage": {"storageSizeGB": 20, "autoGrow": "Enabled"}
            }
        }))
        .unwrap();
        let props = server.properties.unwrap();
        assert_eq!(props.version.as_deref(), Some("8.0.21"));
        assert_eq!(props.storage.unwrap().storage_size_gb, Some(20));
        assert!(server.tags.is_none());
    }
}
