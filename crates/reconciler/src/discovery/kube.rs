//! Kubernetes discovery adapter — lists pods in the configured namespace,
//! buckets them by their grouping label, producing a deterministically
//! ordered `Snapshot::Kubernetes` (spec §4.4).

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod as KubePod;
use kube::api::{Api, ListParams};
use kube::Client;
use thiserror::Error;
use tracing::warn;

use crate::conf::model::KubernetesConfig;
use crate::model::{Pod, Snapshot};

#[derive(Error, Debug)]
pub enum KubeDiscoveryError {
    #[error("building kube client: {0}")]
    Client(#[source] kube::Error),
    #[error("listing pods: {0}")]
    List(#[source] kube::Error),
}

/// Discover the Kubernetes snapshot. Pods missing the configured grouping
/// label are skipped, as are pods with no assigned IP yet.
pub async fn discover(config: &KubernetesConfig) -> Result<Snapshot, KubeDiscoveryError> {
    let client = build_client(config).await?;
    let pods: Api<KubePod> = Api::namespaced(client, &config.namespace);

    let mut list_params = ListParams::default();
    if !config.labelselector.is_empty() {
        list_params = list_params.labels(&config.labelselector);
    }

    let pod_list = pods.list(&list_params).await.map_err(KubeDiscoveryError::List)?;

    let mut buckets: BTreeMap<String, Vec<Pod>> = BTreeMap::new();
    for item in pod_list.items {
        let Some(name) = item.metadata.name.clone() else { continue };
        let labels = item.metadata.labels.clone().unwrap_or_default();

        let Some(group) = labels.get(&config.groupinglabel).or_else(|| labels.get("kbds")) else {
            warn!(pod = %name, label = %config.groupinglabel, "pod missing grouping label, skipping");
            continue;
        };

        let Some(address) = item.status.as_ref().and_then(|s| s.pod_ip.clone()) else {
            warn!(pod = %name, "pod has no assigned IP yet, skipping");
            continue;
        };

        buckets.entry(group.clone()).or_default().push(Pod { hostname: name, address, labels });
    }

    Ok(Snapshot::from_kubernetes(buckets))
}

async fn build_client(config: &KubernetesConfig) -> Result<Client, KubeDiscoveryError> {
    if !config.kubeconfig.is_empty() {
        let kubeconfig = kube::config::Kubeconfig::read_from(&config.kubeconfig)
            .map_err(|e| KubeDiscoveryError::Client(kube::Error::KubeConfig(e)))?;
        let options = kube::config::KubeConfigOptions::default();
        let conf = kube::Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| KubeDiscoveryError::Client(kube::Error::KubeConfig(e)))?;
        return Client::try_from(conf).map_err(KubeDiscoveryError::Client);
    }

    Client::try_default().await.map_err(KubeDiscoveryError::Client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_grouping_is_deterministic() {
        let mut buckets: BTreeMap<String, Vec<Pod>> = BTreeMap::new();
        buckets.insert(
            "web".to_string(),
            vec![
                Pod { hostname: "web-b".to_string(), address: "10.0.0.2".to_string(), labels: Default::default() },
                Pod { hostname: "web-a".to_string(), address: "10.0.0.1".to_string(), labels: Default::default() },
            ],
        );
        let snapshot = Snapshot::from_kubernetes(buckets);
        match snapshot {
            Snapshot::Kubernetes(b) => {
                let hostnames: Vec<_> = b["web"].iter().map(|p| p.hostname.as_str()).collect();
                assert_eq!(hostnames, vec!["web-a", "web-b"]);
            }
            _ => panic!("expected kubernetes snapshot"),
        }
    }
}
