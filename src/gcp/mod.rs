//! GCP API interaction module
//!
//! Authentication, HTTP plumbing and long-running operation tracking for
//! the Compute Engine REST API.
//!
//! # Module Structure
//!
//! - [`auth`] - Credential strategies (access token, key JSON, key file, ADC)
//! - [`client`] - Compute Engine client and URL builders
//! - [`http`] - HTTP utilities for REST API calls
//! - [`images`] - OS name to public image family lookup
//! - [`operation`] - Polling of `compute#operation` resources
//!
//! # Example
//!
//! ```ignore
//! use gce_actions::gcp::auth::{AuthStrategy, GcpCredentials};
//! use gce_actions::gcp::client::{GcpClient, DEFAULT_COMPUTE_ENDPOINT};
//!
//! async fn fetch_vm() -> gce_actions::Result<()> {
//!     let strategy = AuthStrategy::KeyFile("key.json".into());
//!     let credentials = GcpCredentials::new(&strategy).await?;
//!     let client = GcpClient::with_credentials(credentials, "my-project", DEFAULT_COMPUTE_ENDPOINT)?;
//!     let vm = client.get(&client.instance_url("us-central1-a", "vm-1", None)).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod images;
pub mod operation;
