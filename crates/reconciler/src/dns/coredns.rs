//! CoreDNS publisher — writes a JSON `{"host", "ttl"}` record to etcd at a
//! key built from the reversed dot-labels of the configured A record.
//!
//! Unlike the other publishers, a CoreDNS setup failure is fatal at
//! startup (§7 MisconfigurationError: "startup-time misconfig of DNS
//! publishers is fatal at startup only").

use etcd_client::{Client, ConnectOptions, Identity, TlsOptions};
use serde::Serialize;
use thiserror::Error;

use crate::conf::model::CoreDnsConfig;

#[derive(Error, Debug)]
pub enum CoreDnsError {
    #[error("coredns.path is not set")]
    MissingPath,
    #[error("coredns.arecord is not set")]
    MissingARecord,
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("reading {label} from {path}: {source}")]
    ReadFile { label: &'static str, path: String, #[source] source: std::io::Error },
    #[error("connecting to etcd: {0}")]
    Connect(#[source] etcd_client::Error),
    #[error("writing record to etcd: {0}")]
    Put(#[source] etcd_client::Error),
}

#[derive(Serialize)]
struct Record {
    host: String,
    ttl: i64,
}

/// `<coredns.path>/<reversed dot-labels of the A record>`.
fn etcd_key(config: &CoreDnsConfig) -> String {
    let mut key = config.path.clone();
    for label in config.arecord.split('.').rev() {
        key.push('/');
        key.push_str(label);
    }
    key
}

pub async fn publish(config: &CoreDnsConfig, pod_ip: &str) -> Result<(), CoreDnsError> {
    if config.path.is_empty() {
        return Err(CoreDnsError::MissingPath);
    }
    if config.arecord.is_empty() {
        return Err(CoreDnsError::MissingARecord);
    }

    let cert_path = require_env("COREDNS_ETCD_CERT")?;
    let key_path = require_env("COREDNS_ETCD_CERTKEY")?;
    let ca_path = require_env("COREDNS_ETCD_CA")?;

    let cert = read_file(&cert_path, "client certificate")?;
    let key = read_file(&key_path, "client key")?;
    let ca = read_file(&ca_path, "CA certificate")?;

    let tls_options = TlsOptions::new()
        .ca_certificate(etcd_client::Certificate::from_pem(ca))
        .identity(Identity::from_pem(cert, key));

    let options = ConnectOptions::new().with_tls(tls_options);
    let mut client = Client::connect(&config.etcd, Some(options))
        .await
        .map_err(CoreDnsError::Connect)?;

    let ttl = if config.ttl == 0 { 60 } else { config.ttl };
    let record = Record { host: pod_ip.to_string(), ttl };
    let value = serde_json::to_string(&record).expect("Record serialization cannot fail");

    client
        .put(etcd_key(config), value, None)
        .await
        .map_err(CoreDnsError::Put)?;

    Ok(())
}

fn require_env(name: &'static str) -> Result<String, CoreDnsError> {
    std::env::var(name).map_err(|_| CoreDnsError::MissingEnv(name))
}

fn read_file(path: &str, label: &'static str) -> Result<Vec<u8>, CoreDnsError> {
    std::fs::read(path).map_err(|source| CoreDnsError::ReadFile { label, path: path.to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etcd_key_reverses_labels() {
        let config = CoreDnsConfig {
            arecord: "lb.example.com".to_string(),
            path: "/skydns".to_string(),
            ttl: 0,
            etcd: vec![],
        };
        assert_eq!(etcd_key(&config), "/skydns/com/example/lb");
    }
}
