//! Registry lookup
//!
//! The registry answers one question: what is the latest published descriptor
//! for a package id. The resolver only talks to the [`RegistryClient`] trait;
//! [`HttpRegistryClient`] is the production implementation and issues
//! `GET <registry_url>/packages/<id>/latest`, expecting the package's
//! [`Config`] as JSON.
//!
//! Failures are split so the resolver can treat them differently:
//! [`RegistryError::Network`] is a soft failure (the lookup yields nothing),
//! the other variants are hard errors.

use crate::config::ResolverSettings;
use crate::models::Config;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Registry lookup failure
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The registry could not be reached or answered with a server error
    #[error("registry unreachable: {0}")]
    Network(String),

    /// The registry has no package with this id
    #[error("package '{0}' not found in registry")]
    NotFound(String),

    /// The registry answered with something that is not a package descriptor
    #[error("invalid registry response for '{id}': {reason}")]
    InvalidResponse {
        /// Package id that was looked up
        id: String,
        /// Decoding failure
        reason: String,
    },
}

impl RegistryError {
    /// Whether this failure is a transport problem rather than an answer
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Source of published package descriptors
pub trait RegistryClient: Send + Sync {
    /// Latest published descriptor for `id`
    fn fetch_latest(&self, id: &str) -> impl Future<Output = Result<Config, RegistryError>> + Send;
}

impl<T: RegistryClient> RegistryClient for Arc<T> {
    fn fetch_latest(&self, id: &str) -> impl Future<Output = Result<Config, RegistryError>> + Send {
        (**self).fetch_latest(id)
    }
}

/// Registry client over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRegistryClient {
    /// Client for `settings.registry_url` with the configured timeout and user agent
    pub fn new(settings: &ResolverSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(settings.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(client, &settings.registry_url))
    }

    /// Reuse an existing client
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Lookup endpoint for `id`
    #[must_use]
    pub fn endpoint(&self, id: &str) -> String {
        format!("{}/packages/{}/latest", self.base_url, id)
    }
}

impl RegistryClient for HttpRegistryClient {
    async fn fetch_latest(&self, id: &str) -> Result<Config, RegistryError> {
        let url = self.endpoint(id);
        debug!("Registry lookup {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RegistryError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(RegistryError::NotFound(id.to_string())),
            status if !status.is_success() => {
                return Err(RegistryError::Network(format!("HTTP {} from {}", status.as_u16(), url)));
            }
            _ => {}
        }

        response.json::<Config>().await.map_err(|e| {
            if e.is_decode() {
                RegistryError::InvalidResponse {
                    id: id.to_string(),
                    reason: e.to_string(),
                }
            } else {
                RegistryError::Network(e.to_string())
            }
        })
    }
}
