//! Azure Resource Manager Provider implementation
//!
//! Dispatches lifecycle operations to the handler registered for the
//! resource type, validates configuration against its schema and enforces
//! the per-operation timeouts.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use cirrus_core::data::ResourceData;
use cirrus_core::provider::{Operation, ProviderError, ProviderResult, format_duration};
use cirrus_core::resource::{Resource, ResourceId, State, Value};
use cirrus_core::schema::ResourceSchema;

use crate::clients::Clients;
use crate::config::ProviderConfig;
use crate::resources::{DataSourceHandler, ResourceHandler, data_sources, handlers};

/// Azure Resource Manager Provider
pub struct AzurermProvider {
    clients: Clients,
    handlers: HashMap<&'static str, Box<dyn ResourceHandler>>,
    data_sources: HashMap<&'static str, Box<dyn DataSourceHandler>>,
}

impl AzurermProvider {
    /// Create a provider over already-built clients
    pub fn new(clients: Clients) -> Self {
        Self {
            clients,
            handlers: handlers().into_iter().map(|h| (h.resource_type(), h)).collect(),
            data_sources: data_sources()
                .into_iter()
                .map(|d| (d.resource_type(), d))
                .collect(),
        }
    }

    /// Create a provider authenticating with the configured client secret
    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        Ok(Self::new(Clients::from_config(config)?))
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    fn handler(&self, id: &ResourceId) -> ProviderResult<&dyn ResourceHandler> {
        self.handlers
            .get(id.resource_type.as_str())
            .map(|h| h.as_ref())
            .ok_or_else(|| {
                ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
                    .for_resource(id.clone())
            })
    }

    fn data_source(&self, id: &ResourceId) -> ProviderResult<&dyn DataSourceHandler> {
        self.data_sources
            .get(id.resource_type.as_str())
            .map(|d| d.as_ref())
            .ok_or_else(|| {
                ProviderError::new(format!("Unknown data source: {}", id.resource_type))
                    .for_resource(id.clone())
            })
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Read a resource by its ARM ID
    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
        prior: Option<&State>,
    ) -> ProviderResult<State> {
        let handler = self.handler(id)?;
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id.clone()));
        };

        let data = match prior {
            Some(prior) => ResourceData::from_prior(&prior.attributes),
            None => ResourceData::empty(),
        };
        let limit = handler.timeouts().read;
        let found = with_timeout(limit, Operation::Read, id, handler.read(&self.clients, identifier, data))
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

        Ok(match found {
            Some(attributes) => State::existing(id.clone(), attributes).with_identifier(identifier),
            None => State::not_found(id.clone()),
        })
    }

    /// Create a resource and read it back
    pub async fn create_resource(&self, resource: Resource) -> ProviderResult<State> {
        let id = resource.id.clone();
        let handler = self.handler(&id)?;
        let desired = prepare(&handler.schema(), resource.attributes, None).map_err(|e| e.for_resource(id.clone()))?;

        log::info!("creating {}", id);
        let limit = handler.timeouts().create;
        let create_then_read = async {
            let data = ResourceData::new(&desired);
            let identifier = handler.create(&self.clients, data).await?;
            let attributes = handler.read(&self.clients, &identifier, data).await?;
            Ok::<_, ProviderError>((identifier, attributes))
        };
        let (identifier, attributes) = with_timeout(limit, Operation::Create, &id, create_then_read)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

        read_back(id, identifier, attributes, Operation::Create)
    }

    /// Update a resource in place and read it back
    pub async fn update_resource(
        &self,
        id: ResourceId,
        identifier: &str,
        from: &State,
        to: Resource,
    ) -> ProviderResult<State> {
        let handler = self.handler(&id)?;
        let desired = prepare(&handler.schema(), to.attributes, Some(&from.attributes))
            .map_err(|e| e.for_resource(id.clone()))?;

        log::info!("updating {} ({})", id, identifier);
        let limit = handler.timeouts().update;
        let update_then_read = async {
            let data = ResourceData::new(&desired).with_prior(&from.attributes);
            handler.update(&self.clients, identifier, data).await?;
            handler.read(&self.clients, identifier, data).await
        };
        let attributes = with_timeout(limit, Operation::Update, &id, update_then_read)
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

        read_back(id, identifier.to_string(), attributes, Operation::Update)
    }

    /// Delete a resource
    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        let handler = self.handler(id)?;
        log::info!("deleting {} ({})", id, identifier);
        let limit = handler.timeouts().delete;
        with_timeout(limit, Operation::Delete, id, handler.delete(&self.clients, identifier))
            .await
            .map_err(|e| e.for_resource(id.clone()))
    }

    /// Bring an existing resource under management
    pub async fn import_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        let handler = self.handler(id)?;
        handler.validate_id(identifier).map_err(|e| {
            ProviderError::new(format!("parsing {:?} for import of {}", identifier, id.resource_type))
                .with_cause(e)
                .for_resource(id.clone())
        })?;

        let state = self.read_resource(id, Some(identifier), None).await?;
        if !state.exists {
            return Err(ProviderError::new(format!(
                "Cannot import non-existent remote object {:?}",
                identifier
            ))
            .for_resource(id.clone()));
        }
        Ok(state)
    }

    /// Look up a data source
    pub async fn read_data_source(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let data_source = self.data_source(id)?;
        let lookup = prepare(&data_source.schema(), resource.attributes.clone(), None)
            .map_err(|e| e.for_resource(id.clone()))?;

        let limit = data_source.timeouts().read;
        let (identifier, attributes) = with_timeout(
            limit,
            Operation::Read,
            id,
            data_source.read(&self.clients, ResourceData::new(&lookup)),
        )
        .await
        .map_err(|e| e.for_resource(id.clone()))?;

        Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
    }
}

/// Apply defaults, validate, then carry computed values over from prior state
fn prepare(
    schema: &ResourceSchema,
    mut attributes: HashMap<String, Value>,
    prior: Option<&HashMap<String, Value>>,
) -> ProviderResult<HashMap<String, Value>> {
    schema.apply_defaults(&mut attributes);
    if let Err(errors) = schema.validate(&attributes) {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(ProviderError::new(format!("invalid configuration: {}", details.join("; "))));
    }
    if let Some(prior) = prior {
        schema.merge_computed(&mut attributes, prior);
    }
    Ok(attributes)
}

fn read_back(
    id: ResourceId,
    identifier: String,
    attributes: Option<HashMap<String, Value>>,
    operation: Operation,
) -> ProviderResult<State> {
    match attributes {
        Some(attributes) => Ok(State::existing(id, attributes).with_identifier(identifier)),
        None => Err(ProviderError::new(format!(
            "{:?} was not found when reading it back after {}",
            identifier, operation
        ))
        .for_resource(id)),
    }
}

async fn with_timeout<T>(
    limit: Duration,
    operation: Operation,
    id: &ResourceId,
    fut: impl Future<Output = ProviderResult<T>>,
) -> ProviderResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::new(format!(
            "timed out after {} waiting for {} of {}",
            format_duration(limit),
            operation,
            id
        ))),
    }
}
