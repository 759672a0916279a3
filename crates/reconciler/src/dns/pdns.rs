//! PowerDNS publisher — PATCHes a REPLACE recordset at the configured API,
//! called once at startup only (§4.2 / original source `updatepdns`).

use serde::Serialize;
use thiserror::Error;

use crate::conf::model::PdnsConfig;

#[derive(Error, Debug)]
pub enum PdnsError {
    #[error("building request: {0}")]
    Request(#[source] reqwest::Error),
}

#[derive(Serialize)]
struct Recordsets {
    rrsets: Vec<Recordset>,
}

#[derive(Serialize)]
struct Recordset {
    name: String,
    #[serde(rename = "type")]
    rtype: String,
    ttl: i64,
    changetype: String,
    records: Vec<Record>,
}

#[derive(Serialize)]
struct Record {
    content: String,
    disabled: bool,
}

pub async fn publish(client: &reqwest::Client, config: &PdnsConfig) -> Result<(), PdnsError> {
    let rrset = Recordsets {
        rrsets: vec![Recordset {
            name: format!("{}.{}.", config.domainprefix, config.domainzone),
            rtype: "A".to_string(),
            ttl: 10,
            changetype: "REPLACE".to_string(),
            records: vec![Record { content: config.ipaddress.clone(), disabled: false }],
        }],
    };

    let url = format!("{}/{}.", config.apiurl, config.domainzone);
    let response = client
        .patch(&url)
        .header("X-API-Key", &config.apikey)
        .json(&rrset)
        .send()
        .await
        .map_err(PdnsError::Request)?;

    tracing::info!(status = %response.status(), "PDNS update response");
    Ok(())
}
