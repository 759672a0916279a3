//! Data model — Endpoint, Service, Pod, Snapshot, TemplatePair.
//!
//! These are pure value types with no I/O. Ordering is baked into the
//! constructors (`Service::new`, `Snapshot::from_swarm`) so that once a
//! `Snapshot` exists, iterating it is always in the deterministic order
//! the renderer depends on.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// A single live backend: one Swarm task or one Kubernetes pod.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Endpoint {
    pub hostname: String,
    pub address: String,
}

/// A Swarm service and its live tasks.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Service {
    pub name: String,
    pub labels: std::collections::HashMap<String, String>,
    pub endpoints: Vec<Endpoint>,
}

impl Service {
    /// Build a service from unordered endpoints, applying the descending
    /// hostname sort the renderer depends on (Invariant 1 / spec §4.4).
    pub fn new(name: String, labels: std::collections::HashMap<String, String>, mut endpoints: Vec<Endpoint>) -> Self {
        endpoints.sort_by(|a, b| b.hostname.cmp(&a.hostname));
        Service { name, labels, endpoints }
    }
}

/// A Kubernetes pod, as projected by the discovery adapter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Pod {
    pub hostname: String,
    pub address: String,
    pub labels: std::collections::HashMap<String, String>,
}

/// The per-tick immutable view handed to the renderer. Exactly one
/// discipline is active for a given deployment — see `Config::discipline`.
#[derive(Debug, Clone)]
pub enum Snapshot {
    Swarm(Vec<Service>),
    Kubernetes(BTreeMap<String, Vec<Pod>>),
}

impl Snapshot {
    /// Build the Swarm variant, sorting services by name ascending.
    /// Endpoint ordering is already applied by `Service::new`.
    pub fn from_swarm(mut services: Vec<Service>) -> Self {
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Snapshot::Swarm(services)
    }

    /// Build the Kubernetes variant, sorting each bucket by hostname ascending.
    pub fn from_kubernetes(mut buckets: BTreeMap<String, Vec<Pod>>) -> Self {
        for pods in buckets.values_mut() {
            pods.sort_by(|a, b| a.hostname.cmp(&b.hostname));
        }
        Snapshot::Kubernetes(buckets)
    }
}

/// A single rendering job: a template source rendered into an on-disk
/// destination file.
#[derive(Debug, Clone)]
pub struct TemplatePair {
    pub name: String,
    pub src: PathBuf,
    pub dst: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ep(hostname: &str) -> Endpoint {
        Endpoint { hostname: hostname.to_string(), address: "10.0.0.1".to_string() }
    }

    #[test]
    fn service_new_sorts_endpoints_descending() {
        let svc = Service::new(
            "api".to_string(),
            Default::default(),
            vec![ep("api-1"), ep("api-3"), ep("api-2")],
        );
        let hostnames: Vec<_> = svc.endpoints.iter().map(|e| e.hostname.as_str()).collect();
        assert_eq!(hostnames, vec!["api-3", "api-2", "api-1"]);
    }

    #[test]
    fn snapshot_from_swarm_sorts_services_ascending() {
        let s1 = Service::new("zeta".to_string(), Default::default(), vec![]);
        let s2 = Service::new("alpha".to_string(), Default::default(), vec![]);
        let snap = Snapshot::from_swarm(vec![s1, s2]);
        match snap {
            Snapshot::Swarm(services) => {
                let names: Vec<_> = services.iter().map(|s| s.name.as_str()).collect();
                assert_eq!(names, vec!["alpha", "zeta"]);
            }
            _ => panic!("expected swarm snapshot"),
        }
    }

    #[test]
    fn snapshot_from_kubernetes_sorts_buckets_ascending() {
        let mut buckets = BTreeMap::new();
        buckets.insert(
            "web".to_string(),
            vec![
                Pod { hostname: "web-2".to_string(), address: "10.0.0.2".to_string(), labels: Default::default() },
                Pod { hostname: "web-1".to_string(), address: "10.0.0.1".to_string(), labels: Default::default() },
            ],
        );
        let snap = Snapshot::from_kubernetes(buckets);
        match snap {
            Snapshot::Kubernetes(b) => {
                let hostnames: Vec<_> = b["web"].iter().map(|p| p.hostname.as_str()).collect();
                assert_eq!(hostnames, vec!["web-1", "web-2"]);
            }
            _ => panic!("expected kubernetes snapshot"),
        }
    }
}
