//! Client factory - Authenticated per-service API clients
//!
//! - `auth` - Access tokens (client credentials)
//! - `arm` - ARM REST transport and long-running operation polling
//! - `error` - API error type

pub mod arm;
pub mod auth;
pub mod error;

use std::sync::Arc;
use std::time::Duration;

use cirrus_core::provider::ProviderError;

use crate::config::{ConfigError, ProviderConfig};
use crate::services::mysql::client::{ArmMySqlClient, MySqlClient};
use crate::services::springcloud::client::{ArmSpringCloudClient, SpringCloudClient};
use arm::ArmClient;
use auth::{ClientSecretCredential, TokenCredential};

/// Clients shared by every handler of one provider instance
#[derive(Clone)]
pub struct Clients {
    pub subscription_id: String,
    pub mysql: Arc<dyn MySqlClient>,
    pub spring_cloud: Arc<dyn SpringCloudClient>,
    /// Delay between refreshes when waiting for a resource to appear or disappear
    pub poll_interval: Duration,
}

impl Clients {
    pub fn new(
        subscription_id: impl Into<String>,
        mysql: Arc<dyn MySqlClient>,
        spring_cloud: Arc<dyn SpringCloudClient>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            mysql,
            spring_cloud,
            poll_interval: Duration::from_secs(10),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build clients for the configured cloud using a client secret
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let config_error = |e: ConfigError| ProviderError::new("invalid provider configuration").with_cause(e);
        let endpoint = config.resource_manager_endpoint().map_err(config_error)?;
        let authority = config.authority_host().map_err(config_error)?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("cirrus-provider-azurerm/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::new("building HTTP client").with_cause(e))?;

        let credential = ClientSecretCredential::new(
            http.clone(),
            &authority,
            &config.tenant_id,
            &config.client_id,
            &config.client_secret,
            &endpoint,
        )
        .map_err(|e| ProviderError::new("building credential").with_cause(e))?;

        log::debug!(
            "building clients for subscription {} in the {} cloud",
            config.subscription_id,
            config.environment
        );
        Ok(Self::with_credential(
            &config.subscription_id,
            http,
            endpoint,
            Arc::new(credential),
        ))
    }

    /// Build clients against an arbitrary endpoint
    pub fn with_credential(
        subscription_id: &str,
        http: reqwest::Client,
        endpoint: url::Url,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        let arm = Arc::new(ArmClient::new(http, endpoint, credential));
        Self::new(
            subscription_id,
            Arc::new(ArmMySqlClient::new(arm.clone())),
            Arc::new(ArmSpringCloudClient::new(arm)),
        )
    }
}
