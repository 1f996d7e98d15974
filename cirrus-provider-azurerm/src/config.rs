//! Provider configuration
//!
//! Values come from the provider block first and fall back to the `ARM_*`
//! environment variables.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use cirrus_core::resource::Value;
use thiserror::Error;
use url::Url;

/// Errors raised while building the provider configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting has neither an attribute nor an environment variable
    #[error("`{attribute}` must be set in the provider block or via the {env} environment variable")]
    Missing {
        attribute: &'static str,
        env: &'static str,
    },

    #[error("unknown environment {0:?}, expected one of: public, usgovernment, china")]
    UnknownEnvironment(String),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Azure cloud the provider talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudEnvironment {
    #[default]
    Public,
    UsGovernment,
    China,
}

impl CloudEnvironment {
    pub fn resource_manager_endpoint(&self) -> &'static str {
        match self {
            CloudEnvironment::Public => "https://management.azure.com/",
            CloudEnvironment::UsGovernment => "https://management.usgovcloudapi.net/",
            CloudEnvironment::China => "https://management.chinacloudapi.cn/",
        }
    }

    pub fn authority_host(&self) -> &'static str {
        match self {
            CloudEnvironment::Public => "https://login.microsoftonline.com/",
            CloudEnvironment::UsGovernment => "https://login.microsoftonline.us/",
            CloudEnvironment::China => "https://login.chinacloudapi.cn/",
        }
    }
}

impl FromStr for CloudEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(CloudEnvironment::Public),
            "usgovernment" => Ok(CloudEnvironment::UsGovernment),
            "china" => Ok(CloudEnvironment::China),
            _ => Err(ConfigError::UnknownEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for CloudEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CloudEnvironment::Public => "public",
            CloudEnvironment::UsGovernment => "usgovernment",
            CloudEnvironment::China => "china",
        };
        f.write_str(name)
    }
}

/// Settings needed to build authenticated clients
#[derive(Clone)]
pub struct ProviderConfig {
    pub subscription_id: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub environment: CloudEnvironment,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("environment", &self.environment)
            .finish()
    }
}

/// Provider block attributes
#[derive(Debug, Clone, Default)]
pub struct ProviderBlock {
    pub attributes: HashMap<String, Value>,
}

impl ProviderBlock {
    pub fn new(attributes: HashMap<String, Value>) -> Self {
        Self { attributes }
    }

    /// Get a non-empty string attribute value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

impl ProviderConfig {
    /// Build from a provider block, falling back to the process environment
    pub fn from_block(block: &ProviderBlock) -> Result<Self, ConfigError> {
        Self::from_block_with_env(block, |key| std::env::var(key).ok())
    }

    /// Build from a provider block with an explicit environment lookup
    pub fn from_block_with_env(
        block: &ProviderBlock,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |attribute: &'static str, var: &'static str| -> Option<String> {
            block
                .get_string(attribute)
                .map(str::to_string)
                .or_else(|| env(var).filter(|v| !v.is_empty()))
        };
        let required = |attribute: &'static str, var: &'static str| {
            lookup(attribute, var).ok_or(ConfigError::Missing {
                attribute,
                env: var,
            })
        };

        let environment = match lookup("environment", "ARM_ENVIRONMENT") {
            Some(name) => name.parse()?,
            None => CloudEnvironment::default(),
        };

        Ok(Self {
            subscription_id: required("subscription_id", "ARM_SUBSCRIPTION_ID")?,
            tenant_id: required("tenant_id", "ARM_TENANT_ID")?,
            client_id: required("client_id", "ARM_CLIENT_ID")?,
            client_secret: required("client_secret", "ARM_CLIENT_SECRET")?,
            environment,
        })
    }

    pub fn resource_manager_endpoint(&self) -> Result<Url, ConfigError> {
        Ok(Url::parse(self.environment.resource_manager_endpoint())?)
    }

    pub fn authority_host(&self) -> Result<Url, ConfigError> {
        Ok(Url::parse(self.environment.authority_host())?)
    }
}
