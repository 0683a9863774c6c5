//! Named actions for Google Compute Engine.
//!
//! An [`Action`] carries a method name (`LAUNCH_INSTANCE`, `STOP_INSTANCE`,
//! `CREATE_NETWORK`, ...) and a parameter bag. [`Dispatcher::dispatch`]
//! authenticates, issues the matching Compute Engine call and returns the
//! provider's response.
//!
//! ```ignore
//! use gce_actions::{Action, DispatchOptions, Dispatcher, Params};
//!
//! let action = Action::new(
//!     "GET_INSTANCE_EXTERNAL_IP",
//!     Params::new()
//!         .with("PROJECT", "my-project")
//!         .with("KEYFILE", "/etc/gce/key.json")
//!         .with("ZONE", "us-central1-a")
//!         .with("NAME", "web-1"),
//! );
//! let ip = Dispatcher::new(DispatchOptions::default()).dispatch(&action).await?;
//! ```

pub mod action;
pub mod config;
pub mod error;
pub mod gcp;

pub use action::{Action, ActionMethod, DispatchOptions, Dispatcher, Params};
pub use error::{ActionError, Result};
