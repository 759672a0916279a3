//! Azure DNS publisher — authenticates via OAuth2 client credentials and
//! PUTs an A record through the Azure Resource Manager DNS REST API.
//!
//! New relative to the original source, which only published to PowerDNS
//! and CoreDNS; the `AZURE_*` environment variables are named in §6 but
//! had no reference implementation, so this follows Azure's public REST
//! contract directly (see DESIGN.md).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conf::model::KubernetesConfig;

#[derive(Error, Debug)]
pub enum AzureDnsError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("requesting OAuth2 token: {0}")]
    Token(#[source] reqwest::Error),
    #[error("updating DNS record: {0}")]
    Update(#[source] reqwest::Error),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct ARecordSet {
    properties: ARecordSetProperties,
}

#[derive(Serialize)]
struct ARecordSetProperties {
    #[serde(rename = "TTL")]
    ttl: i64,
    #[serde(rename = "ARecords")]
    a_records: Vec<ARecord>,
}

#[derive(Serialize)]
struct ARecord {
    #[serde(rename = "ipv4Address")]
    ipv4_address: String,
}

pub async fn publish(client: &reqwest::Client, config: &KubernetesConfig, pod_ip: &str) -> Result<(), AzureDnsError> {
    let tenant_id = require_env("AZURE_TENANT_ID")?;
    let client_id = require_env("AZURE_CLIENT_ID")?;
    let client_secret = require_env("AZURE_CLIENT_SECRET")?;
    let subscription_id = require_env("AZURE_SUBSCRIPTION_ID")?;
    let resource_group = require_env("AZURE_RESOURCE_GROUP")?;

    let token = fetch_token(client, &tenant_id, &client_id, &client_secret).await?;

    let url = format!(
        "https://management.azure.com/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/Microsoft.Network/dnsZones/{zone}/A/{name}?api-version=2018-05-01",
        zone = config.domainzone,
        name = config.domainprefix,
    );

    let body = ARecordSet {
        properties: ARecordSetProperties { ttl: 60, a_records: vec![ARecord { ipv4_address: pod_ip.to_string() }] },
    };

    let response = client
        .put(&url)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .map_err(AzureDnsError::Update)?;

    tracing::info!(status = %response.status(), "Azure DNS update response");
    Ok(())
}

async fn fetch_token(
    client: &reqwest::Client,
    tenant_id: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, AzureDnsError> {
    let url = format!("https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0/token");
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("grant_type", "client_credentials"),
        ("scope", "https://management.azure.com/.default"),
    ];

    let response: TokenResponse = client
        .post(&url)
        .form(&params)
        .send()
        .await
        .map_err(AzureDnsError::Token)?
        .json()
        .await
        .map_err(AzureDnsError::Token)?;

    Ok(response.access_token)
}

fn require_env(name: &'static str) -> Result<String, AzureDnsError> {
    std::env::var(name).map_err(|_| AzureDnsError::MissingEnv(name))
}
