//! Cirrus Azure Resource Manager Provider
//!
//! Manages MySQL Flexible Servers, their server parameters and Spring Cloud
//! services through the ARM REST API.
//!
//! ## Module Structure
//!
//! - `clients` - Authentication, ARM transport and per-service API clients
//! - `config` - Provider block and `ARM_*` environment configuration
//! - `provider` - AzurermProvider implementation
//! - `resources` - Handler traits and the registry of supported types
//! - `services` - Models, IDs and handlers per Azure service
//! - `utils` - Location and tag normalization

pub mod clients;
pub mod config;
pub mod provider;
pub mod resources;
pub mod services;
pub mod utils;

#[cfg(test)]
mod testing;

// Re-export main types
pub use config::{CloudEnvironment, ConfigError, ProviderBlock, ProviderConfig};
pub use provider::AzurermProvider;
pub use utils::normalize_location;

use cirrus_core::provider::{BoxFuture, Provider, ProviderResult};
use cirrus_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

impl Provider for AzurermProvider {
    fn name(&self) -> &'static str {
        "azurerm"
    }

    fn resource_types(&self) -> Vec<Box<dyn cirrus_core::provider::ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
        prior: Option<&State>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        let prior = prior.cloned();
        Box::pin(async move {
            self.read_resource(&id, identifier.as_deref(), prior.as_ref())
                .await
        })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { AzurermProvider::read_data_source(self, &resource).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(id, &identifier, &from, to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }

    fn import(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.import_resource(&id, &identifier).await })
    }
}
