//! Instance handlers
//!
//! Launch, stop/delete/reset and external IP lookup for VM instances.

use super::dispatch::Dispatcher;
use super::params::{self, Params};
use super::Action;
use crate::error::{ActionError, Result};
use crate::gcp::images::resolve_os_image;
use crate::gcp::operation::{wait_for_operation, Operation};
use serde::Serialize;
use serde_json::Value;

/// Machine type used when the action names none
pub const DEFAULT_MACHINE_TYPE: &str = "n1-standard-1";

/// Network attached when the action names none
pub const DEFAULT_NETWORK: &str = "global/networks/default";

// =============================================================================
// Launch
// =============================================================================

/// Creation config built from launch params
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<AttachedDisk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<NetworkInterface>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDisk {
    pub boot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    pub initialize_params: InitializeParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub source_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,
    #[serde(rename = "networkIP", skip_serializing_if = "Option::is_none")]
    pub network_ip: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_configs: Vec<AccessConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl AccessConfig {
    fn external_nat() -> Self {
        Self {
            name: "External NAT".to_string(),
            kind: "ONE_TO_ONE_NAT".to_string(),
        }
    }
}

/// `instances.insert` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRequest {
    pub name: String,
    pub machine_type: String,
    pub disks: Vec<AttachedDisk>,
    pub network_interfaces: Vec<NetworkInterface>,
}

impl LaunchConfig {
    /// OS, IMAGE, MACHINE_TYPE, NETWORK, SUBNET and NETIP from action params
    pub fn from_params(params: &Params) -> Self {
        let mut config = LaunchConfig {
            os: params.str(params::OS).map(str::to_string),
            machine_type: params.str(params::MACHINE_TYPE).map(str::to_string),
            ..Default::default()
        };

        if let Some(image) = params.str(params::IMAGE) {
            config.disks.push(AttachedDisk {
                boot: true,
                auto_delete: None,
                initialize_params: InitializeParams {
                    source_image: image.to_string(),
                },
            });
        }

        if let Some(network) = params.str(params::NETWORK) {
            config.network_interfaces.push(NetworkInterface {
                network: network.to_string(),
                subnetwork: params.str(params::SUBNET).map(str::to_string),
                network_ip: params.str(params::NETIP).map(str::to_string),
                access_configs: Vec::new(),
            });
        }

        config
    }

    /// Fill in machine type, boot disk and network defaults for `zone`
    pub fn into_request(self, name: &str, zone: &str) -> Result<InstanceRequest> {
        let machine_type = match self.machine_type {
            Some(t) if t.contains('/') => t,
            Some(t) => format!("zones/{}/machineTypes/{}", zone, t),
            None => format!("zones/{}/machineTypes/{}", zone, DEFAULT_MACHINE_TYPE),
        };

        let disks = if self.disks.is_empty() {
            let os = self.os.as_deref().ok_or(ActionError::MissingParam(params::OS))?;
            vec![AttachedDisk {
                boot: true,
                auto_delete: Some(true),
                initialize_params: InitializeParams {
                    source_image: resolve_os_image(os)?,
                },
            }]
        } else {
            self.disks
        };

        let network_interfaces = if self.network_interfaces.is_empty() {
            vec![NetworkInterface {
                network: DEFAULT_NETWORK.to_string(),
                subnetwork: None,
                network_ip: None,
                access_configs: vec![AccessConfig::external_nat()],
            }]
        } else {
            self.network_interfaces
        };

        Ok(InstanceRequest {
            name: name.to_string(),
            machine_type,
            disks,
            network_interfaces,
        })
    }
}

/// Create an instance and wait for the creation operation to finish
pub async fn launch_instance(dispatcher: &Dispatcher, action: &Action) -> Result<Value> {
    let params = &action.params;
    let name = params.require(params::NAME)?;
    let zone = dispatcher.zone(params)?;

    let config = LaunchConfig::from_params(params);
    tracing::debug!("Launch config: {:?}", config);
    let request = config.into_request(name, zone)?;

    let client = dispatcher.authenticate(params).await?;
    let body = serde_json::to_value(&request)?;
    let operation = client
        .post(&client.compute_zonal_url(zone, "instances"), Some(&body))
        .await?;

    let metadata = wait_for_operation(
        &client,
        operation,
        dispatcher.options().poll_interval,
        dispatcher.progress(),
    )
    .await?;

    tracing::info!("Virtual machine {} created", name);
    Ok(metadata)
}

// =============================================================================
// Stop / Delete / Reset
// =============================================================================

/// Single-shot state change on an existing instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceLifecycle {
    Stop,
    Delete,
    Reset,
}

impl InstanceLifecycle {
    pub fn from_method(name: &str) -> Result<Self> {
        match name {
            "STOP_INSTANCE" => Ok(Self::Stop),
            "DELETE_INSTANCE" => Ok(Self::Delete),
            "RESET_INSTANCE" | "RESTART_INSTANCE" => Ok(Self::Reset),
            other => Err(ActionError::UnknownMethod(other.to_string())),
        }
    }
}

/// Provider reply to a single-shot call: the operation handle and the raw API response
#[derive(Debug)]
pub struct ProviderReply {
    pub operation: Option<Operation>,
    pub response: Value,
}

impl ProviderReply {
    fn new(response: Value) -> Self {
        Self {
            operation: Operation::from_value(&response).ok(),
            response,
        }
    }
}

/// Stop, delete or reset an instance. Returns the raw API response without
/// waiting for the operation.
pub async fn change_instance_state(dispatcher: &Dispatcher, action: &Action) -> Result<Value> {
    let lifecycle = InstanceLifecycle::from_method(&action.method.name)?;
    let params = &action.params;
    let name = params.require(params::NAME)?;
    let zone = dispatcher.zone(params)?;

    let client = dispatcher.authenticate(params).await?;
    let response = match lifecycle {
        InstanceLifecycle::Stop => {
            client.post(&client.instance_url(zone, name, Some("stop")), None).await?
        },
        InstanceLifecycle::Reset => {
            client.post(&client.instance_url(zone, name, Some("reset")), None).await?
        },
        InstanceLifecycle::Delete => client.delete(&client.instance_url(zone, name, None)).await?,
    };

    let reply = ProviderReply::new(response);
    tracing::debug!("{:?} {}: operation {:?}", lifecycle, name, reply.operation);
    Ok(reply.response)
}

// =============================================================================
// External IP
// =============================================================================

/// NAT IP of the first access config on the first network interface
pub fn external_ip(instance: &Value) -> Option<&str> {
    instance
        .pointer("/networkInterfaces/0/accessConfigs/0/natIP")
        .and_then(Value::as_str)
        .filter(|ip| !ip.is_empty())
}

pub async fn get_external_ip(dispatcher: &Dispatcher, action: &Action) -> Result<String> {
    let params = &action.params;
    let name = params.require(params::NAME)?;
    let zone = dispatcher.zone(params)?;

    let client = dispatcher.authenticate(params).await?;
    let instance = client.get(&client.instance_url(zone, name, None)).await?;

    external_ip(&instance)
        .map(str::to_string)
        .ok_or(ActionError::NoExternalIp)
}
