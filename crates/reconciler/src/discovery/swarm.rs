//! Swarm discovery adapter — lists the services attached to each
//! configured overlay network and their live task endpoints, producing a
//! deterministically ordered `Snapshot::Swarm` (spec §4.4).

use std::collections::HashMap;

use tracing::warn;

use crate::docker::{DockerClient, DockerError};
use crate::model::{Endpoint, Service, Snapshot};

/// Discover the Swarm snapshot across all configured networks.
pub async fn discover(docker: &DockerClient, networks: &[String]) -> Result<Snapshot, DockerError> {
    let mut services = Vec::new();

    for network_name in networks {
        let matches = docker.list_networks_named(network_name).await?;
        let Some(network) = matches.into_iter().find(|n| n.name.as_deref() == Some(network_name.as_str())) else {
            warn!(network = %network_name, "given network not found");
            continue;
        };
        let Some(network_id) = network.id.clone() else {
            warn!(network = %network_name, "network has no id, skipping");
            continue;
        };

        let all_services = docker.list_services().await?;
        for svc in all_services {
            if !service_attached_to_network(&svc, &network_id) {
                continue;
            }
            let Some(name) = svc.spec.as_ref().and_then(|s| s.name.clone()) else {
                continue;
            };
            let labels = svc.spec.as_ref().and_then(|s| s.labels.clone()).unwrap_or_default();
            if labels.is_empty() {
                return Err(DockerError::ContainerNotFound(format!(
                    "service {name} has no labels; aborting discovery for network {network_name}"
                )));
            }

            let Some(service_id) = svc.id.clone() else { continue };
            let tasks = docker.list_tasks_for_service(&service_id).await?;

            let mut slots: Vec<(String, String)> = tasks
                .iter()
                .filter_map(|t| {
                    let slot = extract_slot(t)?;
                    let address = extract_endpoint_ip(t, &network_id)?;
                    Some((slot, address))
                })
                .collect();
            // Sort by slot ascending while building hostnames, as specified.
            slots.sort_by(|a, b| a.0.cmp(&b.0));

            let endpoints: Vec<Endpoint> = slots
                .into_iter()
                .map(|(slot, address)| Endpoint { hostname: format!("{name}-{slot}"), address })
                .collect();

            // Service::new re-sorts endpoints by hostname descending.
            services.push(Service::new(name, labels, endpoints));
        }
    }

    // Snapshot::from_swarm sorts services by name ascending.
    Ok(Snapshot::from_swarm(services))
}

fn service_attached_to_network(svc: &bollard::models::Service, network_id: &str) -> bool {
    svc.spec
        .as_ref()
        .and_then(|s| s.task_template.as_ref())
        .and_then(|t| t.networks.as_ref())
        .map(|nets| nets.iter().any(|n| n.target.as_deref() == Some(network_id)))
        .unwrap_or(false)
}

/// The Swarm task name has the shape `service.slot.task-id`; `slot` is the
/// second dot-separated field. Prefer the API's own `slot` integer when
/// present, falling back to parsing `name`.
fn extract_slot(task: &bollard::models::Task) -> Option<String> {
    if let Some(slot) = task.slot {
        return Some(slot.to_string());
    }
    let name = task.name.as_deref()?;
    name.split('.').nth(1).map(|s| s.to_string())
}

fn extract_endpoint_ip(task: &bollard::models::Task, network_id: &str) -> Option<String> {
    let attachments = task.network_attachments.as_ref()?;
    let attachment = attachments
        .iter()
        .find(|a| a.network.as_ref().and_then(|n| n.id.as_deref()) == Some(network_id))?;
    let addr = attachment.addresses.as_ref()?.first()?;
    Some(addr.split('/').next().unwrap_or(addr).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_prefers_api_field_over_name_parse() {
        let task = bollard::models::Task { slot: Some(7), name: Some("api.3.xyz".to_string()), ..Default::default() };
        assert_eq!(extract_slot(&task), Some("7".to_string()));
    }

    #[test]
    fn slot_falls_back_to_name_parsing() {
        let task = bollard::models::Task { slot: None, name: Some("api.3.xyz".to_string()), ..Default::default() };
        assert_eq!(extract_slot(&task), Some("3".to_string()));
    }

    #[test]
    fn slot_is_none_without_slot_or_name() {
        let task = bollard::models::Task { slot: None, name: None, ..Default::default() };
        assert_eq!(extract_slot(&task), None);
    }

    #[test]
    fn determinism_sorts_by_slot_then_hostname_descending() {
        let mut hostnames_and_ips: HashMap<String, String> = HashMap::new();
        hostnames_and_ips.insert("api-1".to_string(), "10.0.0.2".to_string());
        hostnames_and_ips.insert("api-2".to_string(), "10.0.0.3".to_string());
        hostnames_and_ips.insert("api-3".to_string(), "10.0.0.4".to_string());

        let mut endpoints: Vec<Endpoint> = hostnames_and_ips
            .into_iter()
            .map(|(hostname, address)| Endpoint { hostname, address })
            .collect();
        endpoints.sort_by(|a, b| b.hostname.cmp(&a.hostname));

        let hostnames: Vec<_> = endpoints.iter().map(|e| e.hostname.as_str()).collect();
        assert_eq!(hostnames, vec!["api-3", "api-2", "api-1"]);
    }
}
