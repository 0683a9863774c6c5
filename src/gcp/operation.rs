//! Long-running operation tracking
//!
//! Compute Engine mutations return a `compute#operation`. [`wait_for_operation`]
//! polls it until it reaches `DONE` and reports progress through an optional
//! callback. There is no timeout and no cancellation.

use super::client::GcpClient;
use crate::error::{ActionError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Default interval between operation polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Typed view of a `compute#operation` resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Where an operation lives, which decides the URL it is polled at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationScope {
    Zone(String),
    Region(String),
    Global,
}

/// State of an operation as of the last poll
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
    /// Finished with errors; carries the operation's `error` object
    Failed(Value),
    Unknown(String),
}

/// Progress events emitted while waiting
#[derive(Debug, Clone)]
pub enum OperationEvent {
    Running {
        name: String,
        status: String,
        progress: Option<u32>,
        elapsed: Duration,
    },
    Completed {
        name: String,
    },
    Failed {
        name: String,
        error: Value,
    },
}

/// Callback type for progress updates
pub type OperationCallback = Box<dyn Fn(&OperationEvent) + Send + Sync>;

impl Operation {
    /// Parse an operation out of a raw API response
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Operation::deserialize(value)?)
    }

    pub fn scope(&self) -> OperationScope {
        if let Some(zone) = self.zone.as_deref().and_then(last_segment) {
            return OperationScope::Zone(zone.to_string());
        }
        if let Some(region) = self.region.as_deref().and_then(last_segment) {
            return OperationScope::Region(region.to_string());
        }
        OperationScope::Global
    }

    pub fn status(&self) -> OperationStatus {
        match self.status.as_str() {
            "PENDING" => OperationStatus::Pending,
            "RUNNING" => OperationStatus::Running,
            "DONE" => match &self.error {
                Some(error) if !error.is_null() => OperationStatus::Failed(error.clone()),
                _ => OperationStatus::Done,
            },
            other => OperationStatus::Unknown(other.to_string()),
        }
    }

    /// URL this operation is read back from
    pub fn poll_url(&self, client: &GcpClient) -> String {
        let resource = format!("operations/{}", urlencoding::encode(&self.name));
        match self.scope() {
            OperationScope::Zone(zone) => client.compute_zonal_url(&zone, &resource),
            OperationScope::Region(region) => client.compute_regional_url(&region, &resource),
            OperationScope::Global => client.compute_global_url(&resource),
        }
    }
}

/// Zone and region fields are full resource URLs; keep the name at the end
fn last_segment(link: &str) -> Option<&str> {
    link.rsplit('/').next().filter(|s| !s.is_empty())
}

/// Read the current state of an operation
pub async fn poll_operation(
    client: &GcpClient,
    operation: &Operation,
) -> Result<(OperationStatus, Value)> {
    let metadata = client.get(&operation.poll_url(client)).await?;
    let status = Operation::from_value(&metadata)?.status();
    Ok((status, metadata))
}

/// Poll `initial` until it finishes.
///
/// Resolves with the final operation metadata, or fails with
/// [`ActionError::OperationFailed`] carrying the operation's error object.
pub async fn wait_for_operation(
    client: &GcpClient,
    initial: Value,
    interval: Duration,
    on_event: Option<&OperationCallback>,
) -> Result<Value> {
    let start = Instant::now();
    let mut metadata = initial;

    loop {
        let operation = Operation::from_value(&metadata)?;

        match operation.status() {
            OperationStatus::Done => {
                tracing::info!("Operation {} complete", operation.name);
                emit(on_event, OperationEvent::Completed { name: operation.name });
                return Ok(metadata);
            },
            OperationStatus::Failed(error) => {
                tracing::warn!("Operation {} failed: {}", operation.name, error);
                emit(
                    on_event,
                    OperationEvent::Failed {
                        name: operation.name,
                        error: error.clone(),
                    },
                );
                return Err(ActionError::OperationFailed(error));
            },
            OperationStatus::Unknown(status) => {
                tracing::warn!("Unknown operation status: {}", status);
            },
            OperationStatus::Pending | OperationStatus::Running => {
                tracing::info!(
                    "Operation {} {} ({}%)",
                    operation.name,
                    operation.status,
                    operation.progress.unwrap_or(0)
                );
            },
        }

        emit(
            on_event,
            OperationEvent::Running {
                name: operation.name.clone(),
                status: operation.status.clone(),
                progress: operation.progress,
                elapsed: start.elapsed(),
            },
        );

        tokio::time::sleep(interval).await;
        metadata = poll_operation(client, &operation).await?.1;
    }
}

fn emit(callback: Option<&OperationCallback>, event: OperationEvent) {
    if let Some(cb) = callback {
        cb(&event);
    }
}
