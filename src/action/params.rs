//! Action parameters
//!
//! Parameter names are upper-case keys; values are strings, except
//! `CREDENTIALS` which may also be a key object.

use crate::error::{ActionError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const PROJECT: &str = "PROJECT";
pub const CREDENTIALS: &str = "CREDENTIALS";
pub const KEYFILE: &str = "KEYFILE";
pub const ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const ZONE: &str = "ZONE";
pub const REGION: &str = "REGION";
pub const NAME: &str = "NAME";
pub const OS: &str = "OS";
pub const IMAGE: &str = "IMAGE";
pub const MACHINE_TYPE: &str = "MACHINE_TYPE";
pub const NETWORK: &str = "NETWORK";
pub const SUBNET: &str = "SUBNET";
pub const NETIP: &str = "NETIP";
pub const NETID: &str = "NETID";
pub const SUBNAME: &str = "SUBNAME";
pub const IPRANGE: &str = "IPRANGE";
pub const RESNAME: &str = "RESNAME";
pub const RESIP: &str = "RESIP";

/// Parameter bag of an action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Non-empty string value; empty strings count as absent
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn require(&self, key: &'static str) -> Result<&str> {
        self.str(key).ok_or(ActionError::MissingParam(key))
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
