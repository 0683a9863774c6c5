//! Network handlers
//!
//! Create a VPC network, create a subnet in it, and reserve an internal
//! address. Each issues one insert call and returns the provider's response
//! as is.

use super::dispatch::Dispatcher;
use super::params::{self, Params};
use super::Action;
use crate::error::Result;
use serde_json::{json, Value};

/// `networks.insert` body: custom-mode network named NETID
pub fn network_body(params: &Params) -> Result<Value> {
    Ok(json!({
        "name": params.require(params::NETID)?,
        "autoCreateSubnetworks": false,
    }))
}

/// `subnetworks.insert` body for SUBNAME in network NETID
pub fn subnet_body(project: &str, region: &str, params: &Params) -> Result<Value> {
    let network = params.require(params::NETID)?;
    Ok(json!({
        "name": params.require(params::SUBNAME)?,
        "network": format!("projects/{}/global/networks/{}", project, network),
        "ipCidrRange": params.require(params::IPRANGE)?,
        "region": region,
    }))
}

/// `addresses.insert` body reserving RESIP as RESNAME
pub fn address_body(project: &str, region: &str, params: &Params) -> Result<Value> {
    let mut body = json!({
        "name": params.require(params::RESNAME)?,
        "address": params.require(params::RESIP)?,
        "addressType": "INTERNAL",
    });

    if let Some(subnet) = params.str(params::SUBNAME) {
        body["subnetwork"] = Value::String(format!(
            "projects/{}/regions/{}/subnetworks/{}",
            project, region, subnet
        ));
    }

    Ok(body)
}

pub async fn create_network(dispatcher: &Dispatcher, action: &Action) -> Result<Value> {
    let body = network_body(&action.params)?;

    let client = dispatcher.authenticate(&action.params).await?;
    tracing::info!("Creating network {}", body["name"]);
    client
        .post(&client.compute_global_url("networks"), Some(&body))
        .await
}

pub async fn create_subnet(dispatcher: &Dispatcher, action: &Action) -> Result<Value> {
    let region = dispatcher.region(&action.params)?;

    let client = dispatcher.authenticate(&action.params).await?;
    let body = subnet_body(&client.project_id, region, &action.params)?;
    tracing::info!("Creating subnet {} in {}", body["name"], region);
    client
        .post(&client.compute_regional_url(region, "subnetworks"), Some(&body))
        .await
}

pub async fn reserve_internal_address(dispatcher: &Dispatcher, action: &Action) -> Result<Value> {
    let region = dispatcher.region(&action.params)?;

    let client = dispatcher.authenticate(&action.params).await?;
    let body = address_body(&client.project_id, region, &action.params)?;
    tracing::info!("Reserving {} as {}", body["address"], body["name"]);
    client
        .post(&client.compute_regional_url(region, "addresses"), Some(&body))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;

    #[test]
    fn test_network_body() {
        let params = Params::new().with(params::NETID, "prod-vpc");
        assert_eq!(
            network_body(&params).unwrap(),
            json!({"name": "prod-vpc", "autoCreateSubnetworks": false})
        );
        assert!(matches!(
            network_body(&Params::new()),
            Err(ActionError::MissingParam("NETID"))
        ));
    }

    #[test]
    fn test_subnet_body() {
        let params = Params::new()
            .with(params::NETID, "prod-vpc")
            .with(params::SUBNAME, "app")
            .with(params::IPRANGE, "10.10.0.0/24");
        assert_eq!(
            subnet_body("my-project", "us-east1", &params).unwrap(),
            json!({
                "name": "app",
                "network": "projects/my-project/global/networks/prod-vpc",
                "ipCidrRange": "10.10.0.0/24",
                "region": "us-east1"
            })
        );
    }

    #[test]
    fn test_address_body_with_and_without_subnet() {
        let params = Params::new()
            .with(params::RESNAME, "db-ip")
            .with(params::RESIP, "10.10.0.5");
        assert_eq!(
            address_body("my-project", "us-east1", &params).unwrap(),
            json!({"name": "db-ip", "address": "10.10.0.5", "addressType": "INTERNAL"})
        );

        let params = params.with(params::SUBNAME, "app");
        assert_eq!(
            address_body("my-project", "us-east1", &params).unwrap()["subnetwork"],
            "projects/my-project/regions/us-east1/subnetworks/app"
        );
        assert!(matches!(
            address_body("p", "r", &Params::new().with(params::RESNAME, "x")),
            Err(ActionError::MissingParam("RESIP"))
        ));
    }
}
