//! GCP Client
//!
//! Compute Engine client for a single action: credentials, HTTP and the
//! project the action targets.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use crate::error::Result;
use serde_json::Value;

/// Public Compute Engine v1 endpoint
pub const DEFAULT_COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com/compute/v1";

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub project_id: String,
    endpoint: String,
}

impl GcpClient {
    /// Build a client around already-resolved credentials
    pub fn with_credentials(
        credentials: GcpCredentials,
        project_id: &str,
        endpoint: &str,
    ) -> Result<Self> {
        let http = GcpHttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            project_id: project_id.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Make a POST request to a GCP API
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.post(url, &token, body).await
    }

    /// Make a DELETE request to a GCP API
    pub async fn delete(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.delete(url, &token).await
    }

    // =========================================================================
    // Compute Engine API helpers
    // =========================================================================

    /// Build Compute Engine API URL
    pub fn compute_url(&self, path: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            self.endpoint,
            urlencoding::encode(&self.project_id),
            path
        )
    }

    /// Build zonal Compute Engine API URL
    pub fn compute_zonal_url(&self, zone: &str, resource: &str) -> String {
        self.compute_url(&format!("zones/{}/{}", urlencoding::encode(zone), resource))
    }

    /// Build regional Compute Engine API URL
    pub fn compute_regional_url(&self, region: &str, resource: &str) -> String {
        self.compute_url(&format!("regions/{}/{}", urlencoding::encode(region), resource))
    }

    /// Build global Compute Engine API URL
    pub fn compute_global_url(&self, resource: &str) -> String {
        self.compute_url(&format!("global/{}", resource))
    }

    /// Zonal URL for a named instance, optionally with a verb (`stop`, `reset`, ...)
    pub fn instance_url(&self, zone: &str, name: &str, verb: Option<&str>) -> String {
        let instance = format!("instances/{}", urlencoding::encode(name));
        match verb {
            Some(verb) => self.compute_zonal_url(zone, &format!("{}/{}", instance, verb)),
            None => self.compute_zonal_url(zone, &instance),
        }
    }
}

/// Region a zone belongs to: `us-central1-a` -> `us-central1`
pub fn region_of_zone(zone: &str) -> &str {
    match zone.rsplit_once('-') {
        Some((region, _)) => region,
        None => zone,
    }
}
