//! Action Dispatch
//!
//! Maps method names to handlers and resolves the pieces every handler
//! needs: credentials, project, zone and region.

use super::params::{self, Params};
use super::{instance, network, Action, ActionMethod, Handler};
use crate::error::{ActionError, Result};
use crate::gcp::auth::{AuthStrategy, GcpCredentials};
use crate::gcp::client::{region_of_zone, GcpClient, DEFAULT_COMPUTE_ENDPOINT};
use crate::gcp::operation::{OperationCallback, DEFAULT_POLL_INTERVAL};
use serde_json::Value;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// Knobs that apply to every dispatched action
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Compute Engine API root
    pub endpoint: String,
    /// Interval between long-running operation polls
    pub poll_interval: Duration,
    /// Project used when the action has no PROJECT and the credentials carry none
    pub default_project: Option<String>,
    /// Zone used when the action has no ZONE
    pub default_zone: Option<String>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_COMPUTE_ENDPOINT.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            default_project: None,
            default_zone: None,
        }
    }
}

/// Routes actions to their handlers
pub struct Dispatcher {
    options: DispatchOptions,
    on_event: Option<OperationCallback>,
}

impl Dispatcher {
    pub fn new(options: DispatchOptions) -> Self {
        Self {
            options,
            on_event: None,
        }
    }

    /// Receive progress events while launches wait on their operation
    pub fn with_progress(mut self, callback: OperationCallback) -> Self {
        self.on_event = Some(callback);
        self
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub(crate) fn progress(&self) -> Option<&OperationCallback> {
        self.on_event.as_ref()
    }

    /// Run one action and return the provider's response.
    ///
    /// Unknown method names fail before any credentials are resolved.
    pub async fn dispatch(&self, action: &Action) -> Result<Value> {
        let method: ActionMethod = action.method.name.parse()?;
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("dispatch", method = %method, %request_id);

        async move {
            tracing::info!("Dispatching {}", method);

            let result = match method.handler() {
                Handler::LaunchInstance => instance::launch_instance(self, action).await,
                Handler::InstanceLifecycle => instance::change_instance_state(self, action).await,
                Handler::ExternalIp => instance::get_external_ip(self, action)
                    .await
                    .map(Value::String),
                Handler::CreateNetwork => network::create_network(self, action).await,
                Handler::CreateSubnet => network::create_subnet(self, action).await,
                Handler::ReserveInternalAddress => {
                    network::reserve_internal_address(self, action).await
                },
            };

            if let Err(e) = &result {
                tracing::warn!("{} failed: {}", method, e);
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Resolve credentials and project for one call
    pub(crate) async fn authenticate(&self, params: &Params) -> Result<GcpClient> {
        let strategy = AuthStrategy::from_params(
            params.str(params::ACCESS_TOKEN),
            params.get(params::CREDENTIALS),
            params.str(params::KEYFILE),
        )?;

        let credentials = GcpCredentials::new(&strategy).await?;

        let project = match params.str(params::PROJECT) {
            Some(project) => project.to_string(),
            None => self.fallback_project(&credentials).await?,
        };

        tracing::debug!("Using project {}", project);
        GcpClient::with_credentials(credentials, &project, &self.options.endpoint)
    }

    /// Key project, then the configured default, then whatever ADC reports
    async fn fallback_project(&self, credentials: &GcpCredentials) -> Result<String> {
        if let Some(project) = credentials.key_project_id() {
            return Ok(project);
        }
        if let Some(project) = &self.options.default_project {
            return Ok(project.clone());
        }
        credentials
            .ambient_project_id()
            .await
            .ok_or(ActionError::MissingParam(params::PROJECT))
    }

    pub(crate) fn zone<'a>(&'a self, params: &'a Params) -> Result<&'a str> {
        params
            .str(params::ZONE)
            .or(self.options.default_zone.as_deref())
            .ok_or(ActionError::MissingParam(params::ZONE))
    }

    /// REGION, or the region of the action's zone
    pub(crate) fn region<'a>(&'a self, params: &'a Params) -> Result<&'a str> {
        if let Some(region) = params.str(params::REGION) {
            return Ok(region);
        }
        self.zone(params)
            .map(region_of_zone)
            .map_err(|_| ActionError::MissingParam(params::REGION))
    }
}
