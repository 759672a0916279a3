//! Runtime — logging init and the one-shot startup sequence (DNS
//! publishing, initial Docker connection).

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::model::Config;

pub fn init_logging(debug: bool) {
    let default_filter = if debug { "reconciler=debug" } else { "reconciler=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Publish DNS records that are only ever set once, at startup.
///
/// CoreDNS failures are fatal at startup (`anyhow::Error` propagates up to
/// `main`); PowerDNS failures are logged and otherwise ignored (§7
/// MisconfigurationError: "except for startup-time misconfig of DNS
/// publishers, which is fatal at startup only" — CoreDNS's own upstream
/// behavior of `log.Panic` on etcd client setup failure is preserved here,
/// while PowerDNS keeps the non-fatal posture spec.md assigns it).
pub async fn publish_startup_dns(config: &Config) -> anyhow::Result<()> {
    if config.coredns_enabled() {
        let pod_ip = pod_ip()?;
        crate::dns::coredns::publish(&config.coredns, &pod_ip).await?;
    }

    if config.pdns_enabled() {
        let http = reqwest::Client::new();
        if let Err(e) = crate::dns::pdns::publish(&http, &config.pdns).await {
            tracing::warn!(error = %e, "PowerDNS update failed");
        }
    }

    if config.kubernetes.updateazuredns {
        let http = reqwest::Client::new();
        let pod_ip = pod_ip()?;
        if let Err(e) = crate::dns::azure::publish(&http, &config.kubernetes, &pod_ip).await {
            tracing::warn!(error = %e, "Azure DNS update failed");
        }
    }

    Ok(())
}

fn pod_ip() -> anyhow::Result<String> {
    std::env::var("MY_POD_IP")
        .or_else(|_| std::env::var("KUBE_BOSND_POD_IP"))
        .map_err(|_| anyhow::anyhow!("neither MY_POD_IP nor KUBE_BOSND_POD_IP is set"))
}
