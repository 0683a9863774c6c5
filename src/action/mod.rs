//! Actions
//!
//! An action names a method and carries a bag of parameters. The
//! [`Dispatcher`] maps method names to handlers that each make one
//! Compute Engine call.

pub mod dispatch;
pub mod instance;
pub mod network;
pub mod params;

pub use dispatch::{DispatchOptions, Dispatcher};
pub use params::Params;

use crate::error::ActionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-supplied instruction: a method name plus parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub method: Method,
    #[serde(default)]
    pub params: Params,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
}

impl Action {
    pub fn new(method: &str, params: Params) -> Self {
        Self {
            method: Method {
                name: method.to_string(),
            },
            params,
        }
    }
}

/// Supported method names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionMethod {
    LaunchInstance,
    StopInstance,
    DeleteInstance,
    ResetInstance,
    RestartInstance,
    GetInstanceExternalIp,
    CreateNetwork,
    CreateSubnet,
    ReserveInternalAddress,
}

/// Handler a method routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    LaunchInstance,
    InstanceLifecycle,
    ExternalIp,
    CreateNetwork,
    CreateSubnet,
    ReserveInternalAddress,
}

impl ActionMethod {
    pub const ALL: &'static [ActionMethod] = &[
        ActionMethod::LaunchInstance,
        ActionMethod::StopInstance,
        ActionMethod::DeleteInstance,
        ActionMethod::ResetInstance,
        ActionMethod::RestartInstance,
        ActionMethod::GetInstanceExternalIp,
        ActionMethod::CreateNetwork,
        ActionMethod::CreateSubnet,
        ActionMethod::ReserveInternalAddress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionMethod::LaunchInstance => "LAUNCH_INSTANCE",
            ActionMethod::StopInstance => "STOP_INSTANCE",
            ActionMethod::DeleteInstance => "DELETE_INSTANCE",
            ActionMethod::ResetInstance => "RESET_INSTANCE",
            ActionMethod::RestartInstance => "RESTART_INSTANCE",
            ActionMethod::GetInstanceExternalIp => "GET_INSTANCE_EXTERNAL_IP",
            ActionMethod::CreateNetwork => "CREATE_NETWORK",
            ActionMethod::CreateSubnet => "CREATE_SUBNET",
            ActionMethod::ReserveInternalAddress => "RESERVE_INTERNAL_ADDRESS",
        }
    }

    pub fn handler(&self) -> Handler {
        match self {
            ActionMethod::LaunchInstance => Handler::LaunchInstance,
            ActionMethod::StopInstance
            | ActionMethod::DeleteInstance
            | ActionMethod::ResetInstance
            | ActionMethod::RestartInstance => Handler::InstanceLifecycle,
            ActionMethod::GetInstanceExternalIp => Handler::ExternalIp,
            ActionMethod::CreateNetwork => Handler::CreateNetwork,
            ActionMethod::CreateSubnet => Handler::CreateSubnet,
            ActionMethod::ReserveInternalAddress => Handler::ReserveInternalAddress,
        }
    }
}

impl FromStr for ActionMethod {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ActionError::UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for ActionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
