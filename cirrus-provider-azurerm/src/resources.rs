//! Resource handlers and the registry of supported types

use std::collections::HashMap;

use async_trait::async_trait;
use cirrus_core::data::ResourceData;
use cirrus_core::provider::{ProviderError, ProviderResult, ResourceType, Timeouts};
use cirrus_core::resource::Value;
use cirrus_core::resourceids::{ResourceIdError, ResourceIdentifier};
use cirrus_core::schema::ResourceSchema;

use crate::clients::Clients;
use crate::clients::error::ApiError;
use crate::services::{mysql, springcloud};

/// Attributes written back to state
pub type Attributes = HashMap<String, Value>;

/// CRUD glue for one managed resource type
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn resource_type(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    fn timeouts(&self) -> Timeouts {
        Timeouts::default()
    }

    /// Check that an identifier is an ID of this type (used on import)
    fn validate_id(&self, identifier: &str) -> Result<(), ResourceIdError>;

    /// Create the resource and return its ARM ID
    async fn create(&self, clients: &Clients, data: ResourceData<'_>) -> ProviderResult<String>;

    /// Current attributes, or `None` when the resource is gone
    ///
    /// Values the API never returns are taken from `data`.
    async fn read(
        &self,
        clients: &Clients,
        identifier: &str,
        data: ResourceData<'_>,
    ) -> ProviderResult<Option<Attributes>>;

    async fn update(
        &self,
        clients: &Clients,
        identifier: &str,
        data: ResourceData<'_>,
    ) -> ProviderResult<()>;

    async fn delete(&self, clients: &Clients, identifier: &str) -> ProviderResult<()>;
}

/// Read-only lookup of an existing resource
#[async_trait]
pub trait DataSourceHandler: Send + Sync {
    fn resource_type(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    fn timeouts(&self) -> Timeouts {
        Timeouts::read_only(5)
    }

    /// ARM ID and attributes of the resource; absence is an error
    async fn read(
        &self,
        clients: &Clients,
        data: ResourceData<'_>,
    ) -> ProviderResult<(String, Attributes)>;
}

/// All managed resource types
pub fn handlers() -> Vec<Box<dyn ResourceHandler>> {
    vec![
        Box::new(mysql::flexible_server::FlexibleServerResource),
        Box::new(mysql::configuration::FlexibleServerConfigurationResource),
        Box::new(springcloud::service::SpringCloudServiceResource),
    ]
}

/// All data sources
pub fn data_sources() -> Vec<Box<dyn DataSourceHandler>> {
    vec![
        Box::new(mysql::data_source::FlexibleServerDataSource),
        Box::new(springcloud::data_source::SpringCloudServiceDataSource),
    ]
}

/// Schema, timeouts and kind of a registered type
struct RegisteredType {
    name: &'static str,
    schema: ResourceSchema,
    timeouts: Timeouts,
    data_source: bool,
}

impl ResourceType for RegisteredType {
    fn name(&self) -> &'static str {
        self.name
    }

    fn schema(&self) -> ResourceSchema {
        self.schema.clone()
    }

    fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    fn is_data_source(&self) -> bool {
        self.data_source
    }
}

/// Every resource type and data source of this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    let resources = handlers().into_iter().map(|h| {
        Box::new(RegisteredType {
            name: h.resource_type(),
            schema: h.schema(),
            timeouts: h.timeouts(),
            data_source: false,
        }) as Box<dyn ResourceType>
    });
    let data_sources = data_sources().into_iter().map(|d| {
        Box::new(RegisteredType {
            name: d.resource_type(),
            schema: d.schema(),
            timeouts: d.timeouts(),
            data_source: true,
        }) as Box<dyn ResourceType>
    });
    resources.chain(data_sources).collect()
}

// =============================================================================
// Helpers shared by handlers
// =============================================================================

/// Parse an identifier held in state
pub(crate) fn parse_id<T: ResourceIdentifier>(identifier: &str) -> ProviderResult<T> {
    T::parse(identifier).map_err(|e| ProviderError::new("invalid resource ID").with_cause(e))
}

/// Wrap an API error with what was being done
pub(crate) fn wrap(context: impl Into<String>) -> impl FnOnce(ApiError) -> ProviderError {
    let context = context.into();
    move |err| ProviderError::new(context).with_cause(err)
}

/// Fail when the resource already exists; a 404 means it is free to create
pub(crate) fn ensure_absent<T>(
    resource_type: &str,
    identifier: &str,
    description: &str,
    existing: Result<T, ApiError>,
) -> ProviderResult<()> {
    match existing {
        Ok(_) => Err(ProviderError::already_exists(resource_type, identifier)),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(wrap(format!("checking for presence of existing {}", description))(e)),
    }
}
