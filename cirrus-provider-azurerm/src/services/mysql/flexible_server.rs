//! azurerm_mysql_flexible_server
//!
//! Create, read, update and delete for MySQL Flexible Servers, including the
//! multi-step update sequence the service requires (zone failover, storage
//! before high availability, log-on-disk before auto-grow).

use std::collections::HashMap;

use async_trait::async_trait;
use cirrus_core::commonids::{PrivateDnsZoneId, SubnetId, UserAssignedIdentityId};
use cirrus_core::data::ResourceData;
use cirrus_core::provider::{ProviderError, ProviderResult, Timeouts};
use cirrus_core::resource::Value;
use cirrus_core::resourceids::{ResourceIdError, ResourceIdentifier};
use cirrus_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};

use super::ids::FlexibleServerId;
use super::models::*;
use super::validate;
use crate::clients::Clients;
use crate::resources::{Attributes, ResourceHandler, ensure_absent, parse_id, wrap};
use crate::utils::{enabled_string, expand_string_list, expand_tags, flatten_tags, is_enabled, normalize_location};

pub const RESOURCE_TYPE: &str = "azurerm_mysql_flexible_server";

/// Attributes the API never returns; kept from configuration or prior state
const CARRIED_ATTRIBUTES: &[&str] = &[
    "administrator_password",
    "create_mode",
    "point_in_time_restore_time_in_utc",
];

pub struct FlexibleServerResource;

pub(crate) fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .with_description("Manages a MySQL Flexible Server")
        .attribute(
            AttributeSchema::new("name", types::string_with("FlexibleServerName", validate::flexible_server_name))
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("resource_group_name", types::non_empty_string()).required().force_new())
        .attribute(AttributeSchema::new("location", types::non_empty_string()).required().force_new())
        .attribute(
            AttributeSchema::new(
                "administrator_login",
                types::string_with("AdministratorLogin", validate::administrator_login),
            )
            .computed()
            .force_new(),
        )
        .attribute(
            AttributeSchema::new(
                "administrator_password",
                types::string_with("AdministratorPassword", validate::administrator_password),
            )
            .sensitive(),
        )
        .attribute(AttributeSchema::new("backup_retention_days", types::int_between(1, 35)).with_default(7i64))
        .attribute(
            AttributeSchema::new(
                "create_mode",
                AttributeType::enum_of(&[
                    CREATE_MODE_DEFAULT,
                    CREATE_MODE_GEO_RESTORE,
                    CREATE_MODE_POINT_IN_TIME_RESTORE,
                    CREATE_MODE_REPLICA,
                ]),
            )
            .force_new(),
        )
        .attribute(AttributeSchema::block(
            "customer_managed_key",
            BlockSchema::single()
                .attribute(AttributeSchema::new("key_vault_key_id", types::non_empty_string()))
                .attribute(AttributeSchema::new(
                    "primary_user_assigned_identity_id",
                    types::resource_id::<UserAssignedIdentityId>(),
                ))
                .attribute(AttributeSchema::new("geo_backup_key_vault_key_id", types::non_empty_string()))
                .attribute(AttributeSchema::new(
                    "geo_backup_user_assigned_identity_id",
                    types::resource_id::<UserAssignedIdentityId>(),
                )),
        ))
        .attribute(AttributeSchema::new("delegated_subnet_id", types::resource_id::<SubnetId>()).force_new())
        .attribute(
            AttributeSchema::new("geo_redundant_backup_enabled", AttributeType::Bool)
                .with_default(false)
                .force_new(),
        )
        .attribute(AttributeSchema::block(
            "high_availability",
            BlockSchema::single()
                .attribute(
                    AttributeSchema::new(
                        "mode",
                        AttributeType::enum_of(&[HA_MODE_ZONE_REDUNDANT, HA_MODE_SAME_ZONE]),
                    )
                    .required(),
                )
                .attribute(AttributeSchema::new("standby_availability_zone", AttributeType::String).computed()),
        ))
        .attribute(AttributeSchema::block(
            "identity",
            BlockSchema::single()
                .attribute(
                    AttributeSchema::new("type", AttributeType::enum_of(&[IDENTITY_USER_ASSIGNED])).required(),
                )
                .attribute(
                    AttributeSchema::new(
                        "identity_ids",
                        AttributeType::list_of(types::resource_id::<UserAssignedIdentityId>()),
                    )
                    .required(),
                ),
        ))
        .attribute(AttributeSchema::block(
            "maintenance_window",
            BlockSchema::single()
                .attribute(AttributeSchema::new("day_of_week", types::int_between(0, 6)).with_default(0i64))
                .attribute(AttributeSchema::new("start_hour", types::int_between(0, 23)).with_default(0i64))
                .attribute(AttributeSchema::new("start_minute", types::int_between(0, 59)).with_default(0i64)),
        ))
        .attribute(AttributeSchema::new("point_in_time_restore_time_in_utc", types::rfc3339_time()).force_new())
        .attribute(AttributeSchema::new("private_dns_zone_id", types::resource_id::<PrivateDnsZoneId>()).force_new())
        .attribute(AttributeSchema::new("public_network_access", AttributeType::enum_of(&[ENABLED, DISABLED])).computed())
        .attribute(
            AttributeSchema::new("replication_role", AttributeType::enum_of(&[REPLICATION_ROLE_NONE])).computed(),
        )
        .attribute(AttributeSchema::new("sku_name", types::string_with("SkuName", validate::sku_name)).computed())
        .attribute(
            AttributeSchema::new("source_server_id", types::resource_id::<FlexibleServerId>()).force_new(),
        )
        .attribute(
            AttributeSchema::block(
                "storage",
                BlockSchema::single()
                    .attribute(AttributeSchema::new("auto_grow_enabled", AttributeType::Bool).with_default(true))
                    .attribute(AttributeSchema::new("io_scaling_enabled", AttributeType::Bool).with_default(false))
                    .attribute(AttributeSchema::new("iops", types::int_between(360, 48000)).computed())
                    .attribute(AttributeSchema::new("log_on_disk_enabled", AttributeType::Bool).with_default(false))
                    .attribute(AttributeSchema::new("size_gb", types::int_between(20, 16384)).computed()),
            )
            .computed(),
        )
        .attribute(
            AttributeSchema::new("version", AttributeType::enum_of(&["5.7", "8.0.21"]))
                .computed()
                .force_new(),
        )
        .attribute(AttributeSchema::new("zone", AttributeType::String).computed())
        .attribute(AttributeSchema::new("fqdn", AttributeType::String).computed())
        .attribute(AttributeSchema::new("replica_capacity", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("tags", types::tags()))
}

#[async_trait]
impl ResourceHandler for FlexibleServerResource {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::from_minutes(120, 5, 120, 60)
    }

    fn validate_id(&self, identifier: &str) -> Result<(), ResourceIdError> {
        FlexibleServerId::validate(identifier)
    }

    async fn create(&self, clients: &Clients, data: ResourceData<'_>) -> ProviderResult<String> {
        let id = FlexibleServerId::new(
            &clients.subscription_id,
            data.string("resource_group_name"),
            data.string("name"),
        );

        let existing = clients.mysql.get_server(&id).await;
        ensure_absent(RESOURCE_TYPE, &id.id(), &id.description(), existing)?;

        validate_create(&data)?;

        let server = expand_server(&id, &data)?;
        clients
            .mysql
            .create_server(&id, &server)
            .await
            .map_err(wrap(format!("creating {}", id.description())))?;

        wait_for_creation(clients, &id).await?;

        // The maintenance window can only be set once the server exists
        if let Some(window) = data.get_block("maintenance_window") {
            let update = ServerForUpdate {
                properties: ServerPropertiesForUpdate {
                    maintenance_window: Some(expand_maintenance_window(Some(window))),
                    ..Default::default()
                },
                ..Default::default()
            };
            clients
                .mysql
                .update_server(&id, &update)
                .await
                .map_err(wrap(format!("updating Maintenance Window for {}", id.description())))?;
        }

        Ok(id.id())
    }

    async fn read(
        &self,
        clients: &Clients,
        identifier: &str,
        data: ResourceData<'_>,
    ) -> ProviderResult<Option<Attributes>> {
        let id: FlexibleServerId = parse_id(identifier)?;

        let server = match clients.mysql.get_server(&id).await {
            Ok(server) => server,
            Err(e) if e.is_not_found() => {
                log::info!("Mysql Flexible Server {:?} does not exist - removing from state", identifier);
                return Ok(None);
            }
            Err(e) => return Err(wrap(format!("retrieving {}", id.description()))(e)),
        };

        let mut attributes = flatten_server(&id, &server)?;
        for name in CARRIED_ATTRIBUTES {
            if let Some(value) = data.get(name) {
                attributes.insert(name.to_string(), value.clone());
            }
        }
        Ok(Some(attributes))
    }

    async fn update(
        &self,
        clients: &Clients,
        identifier: &str,
        data: ResourceData<'_>,
    ) -> ProviderResult<()> {
        let id: FlexibleServerId = parse_id(identifier)?;
        let description = id.description();

        let require_failover = check_failover(clients, &id, &data).await?;

        if data.has_change("replication_role") {
            let (old, new) = data.get_change("replication_role");
            let old = old.and_then(Value::as_str).unwrap_or_default();
            let new = new.and_then(Value::as_str).unwrap_or_default();
            if old != REPLICATION_ROLE_REPLICA || new != REPLICATION_ROLE_NONE {
                return Err(ProviderError::new(
                    "`replication_role` only can be updated from `Replica` to `None`",
                ));
            }
            let update = ServerForUpdate {
                properties: ServerPropertiesForUpdate {
                    replication_role: Some(REPLICATION_ROLE_NONE.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            };
            clients
                .mysql
                .update_server(&id, &update)
                .await
                .map_err(wrap(format!("updating `replication_role` for {}", description)))?;
        }

        // High availability depends on auto-grow, and both cannot be enabled in one request
        let auto_grow = data.get_bool("storage.0.auto_grow_enabled").unwrap_or(true);
        if data.has_change("storage") && auto_grow {
            let update = storage_update(expand_storage(&data));
            clients
                .mysql
                .update_server(&id, &update)
                .await
                .map_err(wrap(format!("enabling `auto_grow_enabled` for {}", description)))?;
        }

        if require_failover {
            clients
                .mysql
                .failover_server(&id)
                .await
                .map_err(wrap(format!("failing over {}", description)))?;
        } else if data.has_change("high_availability") {
            let mut update = ServerForUpdate {
                properties: ServerPropertiesForUpdate {
                    high_availability: Some(HighAvailability {
                        mode: Some(HA_MODE_DISABLED.to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                ..Default::default()
            };
            clients
                .mysql
                .update_server(&id, &update)
                .await
                .map_err(wrap(format!("disabling `high_availability` for {}", description)))?;

            let high_availability = expand_high_availability(&data);
            if high_availability.mode.as_deref() != Some(HA_MODE_DISABLED) {
                update.properties.high_availability = Some(high_availability);
                clients
                    .mysql
                    .update_server(&id, &update)
                    .await
                    .map_err(wrap(format!("updating `high_availability` for {}", description)))?;
            }
        }

        let update = expand_server_update(&id, &data)?;
        clients
            .mysql
            .update_server(&id, &update)
            .await
            .map_err(wrap(format!("updating {}", description)))?;

        if data.has_change("storage") && !auto_grow {
            let was = |path: &str| data.get_prior(path).and_then(Value::as_bool).unwrap_or(false);
            let log_on_disk_disabled = was("storage.0.log_on_disk_enabled")
                && !data.bool("storage.0.log_on_disk_enabled");
            let auto_grow_disabled = was("storage.0.auto_grow_enabled");

            // Log-on-disk must be turned off before auto-grow when both go from true to false
            if log_on_disk_disabled && auto_grow_disabled {
                let update = storage_update(Some(Storage {
                    log_on_disk: Some(DISABLED.to_string()),
                    ..Default::default()
                }));
                clients
                    .mysql
                    .update_server(&id, &update)
                    .await
                    .map_err(wrap(format!("disabling `log_on_disk_enabled` for {}", description)))?;
            }

            let update = storage_update(expand_storage(&data));
            clients
                .mysql
                .update_server(&id, &update)
                .await
                .map_err(wrap(format!("disabling `auto_grow_enabled` for {}", description)))?;
        }

        Ok(())
    }

    async fn delete(&self, clients: &Clients, identifier: &str) -> ProviderResult<()> {
        let id: FlexibleServerId = parse_id(identifier)?;
        clients
            .mysql
            .delete_server(&id)
            .await
            .map_err(wrap(format!("deleting {}", id.description())))
    }
}

/// Cross-field rules that depend on `create_mode`
fn validate_create(data: &ResourceData<'_>) -> ProviderResult<()> {
    if data.get_str("replication_role").is_some() {
        return Err(ProviderError::new("`replication_role` cannot be set while creating"));
    }

    let create_mode = data.get_str("create_mode").unwrap_or_default();
    let needs_source = matches!(
        create_mode,
        CREATE_MODE_POINT_IN_TIME_RESTORE | CREATE_MODE_REPLICA | CREATE_MODE_GEO_RESTORE
    );
    if needs_source && data.get_str("source_server_id").is_none() {
        return Err(ProviderError::new(
            "`source_server_id` is required when `create_mode` is `PointInTimeRestore`, `GeoRestore`, or `Replica`",
        ));
    }

    if create_mode == CREATE_MODE_POINT_IN_TIME_RESTORE
        && data.get_str("point_in_time_restore_time_in_utc").is_none()
    {
        return Err(ProviderError::new(
            "`point_in_time_restore_time_in_utc` is required when `create_mode` is `PointInTimeRestore`",
        ));
    }

    if create_mode.is_empty() || create_mode == CREATE_MODE_DEFAULT {
        for attribute in ["administrator_login", "administrator_password", "sku_name"] {
            if data.get_str(attribute).is_none() {
                return Err(ProviderError::new(format!(
                    "`{}` is required when `create_mode` is `Default`",
                    attribute
                )));
            }
        }
    }

    if let Some(storage) = expand_storage(data)
        && storage.iops.is_some()
        && storage.auto_io_scaling.as_deref() == Some(ENABLED)
    {
        return Err(ProviderError::new(
            "`iops` can not be set if `io_scaling_enabled` is set to true",
        ));
    }

    Ok(())
}

/// A failover is the only way to swap `zone` and the standby zone
async fn check_failover(
    clients: &Clients,
    id: &FlexibleServerId,
    data: &ResourceData<'_>,
) -> ProviderResult<bool> {
    let zone_changed = data.has_change("zone");
    let standby_changed = data.has_change("high_availability.0.standby_availability_zone");

    match (zone_changed, standby_changed) {
        (true, true) => {
            let server = clients
                .mysql
                .get_server(id)
                .await
                .map_err(wrap(format!("retrieving {}", id.description())))?;
            let Some(props) = server.properties else {
                return Ok(false);
            };

            let current_zone = props.availability_zone.as_deref();
            let current_standby = props
                .high_availability
                .as_ref()
                .and_then(|ha| ha.standby_availability_zone.as_deref());
            match (current_zone, current_standby) {
                (Some(current_zone), Some(current_standby)) => {
                    let zone = data.string("zone");
                    let standby = data.string("high_availability.0.standby_availability_zone");
                    if zone == current_standby && standby == current_zone {
                        Ok(true)
                    } else {
                        Err(ProviderError::new(
                            "failover only supports exchange between `zone` and `standby_availability_zone`",
                        ))
                    }
                }
                _ => Err(ProviderError::new(
                    "`standby_availability_zone` cannot be added while changing `zone`",
                )),
            }
        }
        (true, false) => Err(ProviderError::new("`zone` cannot be changed independently")),
        _ => Ok(false),
    }
}

async fn wait_for_creation(clients: &Clients, id: &FlexibleServerId) -> ProviderResult<()> {
    loop {
        match clients.mysql.get_server(id).await {
            Ok(_) => return Ok(()),
            Err(e) if e.is_not_found() => {
                log::debug!("{} is not visible yet, waiting", id.description());
                tokio::time::sleep(clients.poll_interval).await;
            }
            Err(e) => {
                return Err(wrap(format!(
                    "waiting for creation of Mysql Flexible Server {}",
                    id.description()
                ))(e));
            }
        }
    }
}

fn storage_update(storage: Option<Storage>) -> ServerForUpdate {
    ServerForUpdate {
        properties: ServerPropertiesForUpdate {
            storage,
            ..Default::default()
        },
        ..Default::default()
    }
}

// =============================================================================
// Expand (configuration -> request)
// =============================================================================

fn expand_server(id: &FlexibleServerId, data: &ResourceData<'_>) -> ProviderResult<Server> {
    let sku = expand_sku(data.get_str("sku_name").unwrap_or_default()).map_err(|e| {
        ProviderError::new(format!("expanding `sku_name` for {}: {}", id.description(), e))
    })?;

    let restore_point_in_time = data
        .get_str("point_in_time_restore_time_in_utc")
        .map(|value| {
            chrono::DateTime::parse_from_rfc3339(value)
                .map(|t| t.with_timezone(&chrono::Utc).to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
                .map_err(|_| ProviderError::new("unable to parse `point_in_time_restore_time_in_utc` value"))
        })
        .transpose()?;

    let properties = ServerProperties {
        administrator_login: data.get_str("administrator_login").map(str::to_string),
        administrator_login_password: data.get_str("administrator_password").map(str::to_string),
        availability_zone: data.get_str("zone").map(str::to_string),
        backup: Some(expand_backup(data)),
        create_mode: data.get_str("create_mode").map(str::to_string),
        data_encryption: Some(expand_data_encryption(data.get_block("customer_managed_key"))),
        high_availability: Some(expand_high_availability(data)),
        network: Some(expand_network(data)),
        restore_point_in_time,
        source_server_resource_id: data.get_str("source_server_id").map(str::to_string),
        storage: expand_storage(data),
        version: data.get_str("version").map(str::to_string),
        ..Default::default()
    };

    Ok(Server {
        location: normalize_location(&data.string("location")),
        identity: Some(expand_identity(data.get_block("identity"))),
        sku,
        properties: Some(properties),
        tags: Some(expand_tags(data.get_map("tags"))),
        ..Default::default()
    })
}

/// The main PATCH: each part is sent only when its input changed
fn expand_server_update(id: &FlexibleServerId, data: &ResourceData<'_>) -> ProviderResult<ServerForUpdate> {
    let mut update = ServerForUpdate::default();
    let props = &mut update.properties;

    if data.has_change("administrator_password") {
        props.administrator_login_password = Some(data.string("administrator_password"));
    }
    if data.has_change("backup_retention_days") || data.has_change("geo_redundant_backup_enabled") {
        props.backup = Some(expand_backup(data));
    }
    if data.has_change("customer_managed_key") {
        props.data_encryption = Some(expand_data_encryption(data.get_block("customer_managed_key")));
    }
    if data.has_change("maintenance_window") {
        props.maintenance_window = Some(expand_maintenance_window(data.get_block("maintenance_window")));
    }
    if data.has_change("public_network_access") {
        props.network = Some(Network {
            public_network_access: Some(data.string("public_network_access")),
            ..Default::default()
        });
    }

    if identity_changed(data) {
        update.identity = Some(expand_identity(data.get_block("identity")));
    }
    if data.has_change("sku_name") {
        update.sku = expand_sku(data.get_str("sku_name").unwrap_or_default()).map_err(|e| {
            ProviderError::new(format!("expanding `sku_name` for {}: {}", id.description(), e))
        })?;
    }
    if data.has_change("tags") {
        update.tags = Some(expand_tags(data.get_map("tags")));
    }

    Ok(update)
}

/// `identity_ids` is a set, so reordering it is not a change
fn identity_changed(data: &ResourceData<'_>) -> bool {
    fn canonical(value: Option<&Value>) -> Option<(String, Vec<String>)> {
        let block = value.and_then(Value::as_list)?.first()?.as_map()?;
        let kind = block.get("type").and_then(Value::as_str).unwrap_or_default();
        let mut ids: Vec<String> = block
            .get("identity_ids")
            .and_then(Value::as_list)
            .unwrap_or(&[])
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        ids.sort();
        Some((kind.to_string(), ids))
    }
    let (old, new) = data.get_change("identity");
    canonical(old) != canonical(new)
}

/// `GP_Standard_D2ds_v4` -> name `Standard_D2ds_v4`, tier `GeneralPurpose`
pub(crate) fn expand_sku(name: &str) -> Result<Option<Sku>, String> {
    if name.is_empty() {
        return Ok(None);
    }
    let (prefix, sku) = name.split_once('_').unwrap_or((name, ""));
    let tier = match prefix {
        "B" => SKU_TIER_BURSTABLE,
        "GP" => SKU_TIER_GENERAL_PURPOSE,
        "MO" => SKU_TIER_MEMORY_OPTIMIZED,
        _ => return Err(format!("sku_name {} has unknown sku tier {}", name, prefix)),
    };
    Ok(Some(Sku {
        name: sku.to_string(),
        tier: tier.to_string(),
    }))
}

pub(crate) fn flatten_sku(sku: Option<&Sku>) -> Result<String, String> {
    let Some(sku) = sku.filter(|s| !s.name.is_empty() && !s.tier.is_empty()) else {
        return Ok(String::new());
    };
    let prefix = match sku.tier.as_str() {
        SKU_TIER_BURSTABLE => "B",
        SKU_TIER_GENERAL_PURPOSE => "GP",
        SKU_TIER_MEMORY_OPTIMIZED => "MO",
        other => return Err(format!("sku_name has unknown sku tier {}", other)),
    };
    Ok(format!("{}_{}", prefix, sku.name))
}

fn expand_storage(data: &ResourceData<'_>) -> Option<Storage> {
    data.get_block("storage")?;

    let non_zero = |path: &str| data.get_int(path).filter(|v| *v != 0);
    Some(Storage {
        auto_grow: Some(enabled_string(
            data.get_bool("storage.0.auto_grow_enabled").unwrap_or(true),
        )),
        auto_io_scaling: Some(enabled_string(data.bool("storage.0.io_scaling_enabled"))),
        log_on_disk: Some(enabled_string(data.bool("storage.0.log_on_disk_enabled"))),
        storage_size_gb: non_zero("storage.0.size_gb"),
        iops: non_zero("storage.0.iops"),
    })
}

fn expand_backup(data: &ResourceData<'_>) -> Backup {
    Backup {
        backup_retention_days: data.get_int("backup_retention_days").filter(|v| *v != 0),
        geo_redundant_backup: Some(enabled_string(data.bool("geo_redundant_backup_enabled"))),
    }
}

fn expand_network(data: &ResourceData<'_>) -> Network {
    Network {
        delegated_subnet_resource_id: data.get_str("delegated_subnet_id").map(str::to_string),
        private_dns_zone_resource_id: data.get_str("private_dns_zone_id").map(str::to_string),
        public_network_access: data.get_str("public_network_access").map(str::to_string),
    }
}

fn expand_maintenance_window(block: Option<&HashMap<String, Value>>) -> MaintenanceWindow {
    let Some(block) = block else {
        return MaintenanceWindow {
            custom_window: Some(DISABLED.to_string()),
            ..Default::default()
        };
    };
    let int = |key: &str| Some(block.get(key).and_then(Value::as_int).unwrap_or(0));
    MaintenanceWindow {
        custom_window: Some(ENABLED.to_string()),
        day_of_week: int("day_of_week"),
        start_hour: int("start_hour"),
        start_minute: int("start_minute"),
    }
}

fn expand_high_availability(data: &ResourceData<'_>) -> HighAvailability {
    let Some(mode) = data.get_str("high_availability.0.mode") else {
        return HighAvailability {
            mode: Some(HA_MODE_DISABLED.to_string()),
            ..Default::default()
        };
    };

    // Keeping the old standby zone would block a switch from ZoneRedundant to SameZone
    let standby_availability_zone = if mode == HA_MODE_SAME_ZONE {
        None
    } else {
        data.get_str("high_availability.0.standby_availability_zone")
            .map(str::to_string)
    };

    HighAvailability {
        mode: Some(mode.to_string()),
        standby_availability_zone,
        state: None,
    }
}

fn expand_data_encryption(block: Option<&HashMap<String, Value>>) -> DataEncryption {
    let Some(block) = block else {
        return DataEncryption {
            encryption_type: Some(DATA_ENCRYPTION_SYSTEM_MANAGED.to_string()),
            ..Default::default()
        };
    };
    let string = |key: &str| {
        block
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    DataEncryption {
        encryption_type: Some(DATA_ENCRYPTION_AZURE_KEY_VAULT.to_string()),
        primary_key_uri: string("key_vault_key_id"),
        primary_user_assigned_identity_id: string("primary_user_assigned_identity_id"),
        geo_backup_key_uri: string("geo_backup_key_vault_key_id"),
        geo_backup_user_assigned_identity_id: string("geo_backup_user_assigned_identity_id"),
    }
}

fn expand_identity(block: Option<&HashMap<String, Value>>) -> Identity {
    let Some(block) = block else {
        return Identity {
            identity_type: IDENTITY_NONE.to_string(),
            ..Default::default()
        };
    };
    let ids = block
        .get("identity_ids")
        .and_then(Value::as_list)
        .map(expand_string_list)
        .unwrap_or_default();
    Identity {
        identity_type: IDENTITY_USER_ASSIGNED.to_string(),
        user_assigned_identities: Some(
            ids.into_iter()
                .map(|id| (id, serde_json::json!({})))
                .collect(),
        ),
        ..Default::default()
    }
}

// =============================================================================
// Flatten (response -> state)
// =============================================================================

/// State attributes of a server as returned by the API
pub(crate) fn flatten_server(id: &FlexibleServerId, server: &Server) -> ProviderResult<Attributes> {
    let mut attrs = Attributes::new();
    let mut set = |key: &str, value: Value| {
        attrs.insert(key.to_string(), value);
    };
    let string = |value: &Option<String>| Value::String(value.clone().unwrap_or_default());

    set("name", Value::from(id.flexible_server_name.as_str()));
    set("resource_group_name", Value::from(id.resource_group_name.as_str()));
    set("location", Value::String(normalize_location(&server.location)));

    let props = server.properties.clone().unwrap_or_default();
    set("administrator_login", string(&props.administrator_login));
    set("zone", string(&props.availability_zone));
    set("version", string(&props.version));
    set("fqdn", string(&props.fully_qualified_domain_name));
    set("source_server_id", string(&props.source_server_resource_id));

    if let Some(network) = &props.network {
        set("delegated_subnet_id", string(&network.delegated_subnet_resource_id));
        set("private_dns_zone_id", string(&network.private_dns_zone_resource_id));
        set("public_network_access", string(&network.public_network_access));
    }

    let cmk = flatten_data_encryption(props.data_encryption.as_ref())
        .map_err(|e| ProviderError::new("flattening `customer_managed_key`").with_cause(e))?;
    set("customer_managed_key", cmk);

    let identity = flatten_identity(server.identity.as_ref())
        .map_err(|e| ProviderError::new("flattening `identity`").with_cause(e))?;
    set("identity", identity);

    set("maintenance_window", flatten_maintenance_window(props.maintenance_window.as_ref()));
    set("storage", flatten_storage(props.storage.as_ref()));

    if let Some(backup) = &props.backup {
        set("backup_retention_days", Value::Int(backup.backup_retention_days.unwrap_or(0)));
        set(
            "geo_redundant_backup_enabled",
            Value::Bool(is_enabled(backup.geo_redundant_backup.as_deref())),
        );
    }

    set("high_availability", flatten_high_availability(props.high_availability.as_ref()));
    set("replication_role", string(&props.replication_role));
    set("replica_capacity", Value::Int(props.replica_capacity.unwrap_or(0)));

    let sku = flatten_sku(server.sku.as_ref())
        .map_err(|e| ProviderError::new(format!("flattening `sku_name`: {}", e)))?;
    set("sku_name", Value::String(sku));
    set("tags", flatten_tags(server.tags.as_ref()));

    Ok(attrs)
}

fn flatten_storage(storage: Option<&Storage>) -> Value {
    let Some(storage) = storage else {
        return Value::empty_list();
    };
    Value::block([
        ("size_gb", Value::Int(storage.storage_size_gb.unwrap_or(0))),
        ("iops", Value::Int(storage.iops.unwrap_or(0))),
        ("auto_grow_enabled", Value::Bool(is_enabled(storage.auto_grow.as_deref()))),
        ("io_scaling_enabled", Value::Bool(is_enabled(storage.auto_io_scaling.as_deref()))),
        ("log_on_disk_enabled", Value::Bool(is_enabled(storage.log_on_disk.as_deref()))),
    ])
}

fn flatten_maintenance_window(window: Option<&MaintenanceWindow>) -> Value {
    match window {
        Some(window) if window.custom_window.as_deref().is_some_and(|w| w != DISABLED) => Value::block([
            ("day_of_week", Value::Int(window.day_of_week.unwrap_or(0))),
            ("start_hour", Value::Int(window.start_hour.unwrap_or(0))),
            ("start_minute", Value::Int(window.start_minute.unwrap_or(0))),
        ]),
        _ => Value::empty_list(),
    }
}

fn flatten_high_availability(ha: Option<&HighAvailability>) -> Value {
    match ha {
        Some(ha) if ha.mode.as_deref().is_some_and(|m| m != HA_MODE_DISABLED) => Value::block([
            ("mode", Value::String(ha.mode.clone().unwrap_or_default())),
            (
                "standby_availability_zone",
                Value::String(ha.standby_availability_zone.clone().unwrap_or_default()),
            ),
        ]),
        _ => Value::empty_list(),
    }
}

/// Identity IDs come back with altered casing and are normalized
fn flatten_data_encryption(de: Option<&DataEncryption>) -> Result<Value, ResourceIdError> {
    let Some(de) = de.filter(|de| {
        de.encryption_type
            .as_deref()
            .is_some_and(|t| t != DATA_ENCRYPTION_SYSTEM_MANAGED)
    }) else {
        return Ok(Value::empty_list());
    };

    let mut item = HashMap::new();
    if let Some(uri) = &de.primary_key_uri {
        item.insert("key_vault_key_id".to_string(), Value::from(uri.as_str()));
    }
    if let Some(identity) = &de.primary_user_assigned_identity_id {
        let parsed = UserAssignedIdentityId::parse_insensitively(identity)?;
        item.insert("primary_user_assigned_identity_id".to_string(), Value::String(parsed.id()));
    }
    if let Some(uri) = &de.geo_backup_key_uri {
        item.insert("geo_backup_key_vault_key_id".to_string(), Value::from(uri.as_str()));
    }
    if let Some(identity) = &de.geo_backup_user_assigned_identity_id {
        let parsed = UserAssignedIdentityId::parse_insensitively(identity)?;
        item.insert("geo_backup_user_assigned_identity_id".to_string(), Value::String(parsed.id()));
    }
    Ok(Value::List(vec![Value::Map(item)]))
}

fn flatten_identity(identity: Option<&Identity>) -> Result<Value, ResourceIdError> {
    let Some(identity) = identity.filter(|i| i.identity_type == IDENTITY_USER_ASSIGNED) else {
        return Ok(Value::empty_list());
    };
    let mut ids = identity
        .user_assigned_identities
        .iter()
        .flat_map(|m| m.keys())
        .map(|id| UserAssignedIdentityId::parse_insensitively(id).map(|parsed| parsed.id()))
        .collect::<Result<Vec<_>, _>>()?;
    ids.sort();
    Ok(Value::block([
        ("type", Value::from(IDENTITY_USER_ASSIGNED)),
        ("identity_ids", Value::string_list(ids)),
    ]))
}
