//! Discovery Facade (C4) — a uniform `Snapshot` view over the Swarm and
//! Kubernetes adapters.

pub mod kube;
pub mod swarm;

use thiserror::Error;

use crate::conf::model::Config;
use crate::docker::{DockerClient, DockerError};
use crate::model::Snapshot;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("docker: {0}")]
    Docker(#[from] DockerError),
    #[error("kubernetes: {0}")]
    Kubernetes(#[from] kube::KubeDiscoveryError),
    #[error("no discipline configured")]
    NoDiscipline,
}

/// Discover the current snapshot for whichever discipline is active.
/// Any error aborts before any part of the snapshot is returned — no
/// partially mutated snapshot is ever visible to the renderer (Invariant 7).
pub async fn discover(config: &Config, docker: &DockerClient) -> Result<Snapshot, DiscoveryError> {
    match config.discipline() {
        crate::conf::model::Discipline::Swarm => {
            Ok(swarm::discover(docker, &config.swarm.networks).await?)
        }
        crate::conf::model::Discipline::Kubernetes => {
            Ok(kube::discover(&config.kubernetes).await?)
        }
        crate::conf::model::Discipline::None => Err(DiscoveryError::NoDiscipline),
    }
}

/// Seam over "how do we get a snapshot?" so `Reconciler::tick` can be driven
/// by a fake in tests instead of a real Docker/Kubernetes client, mirroring
/// the `ProcessProbe` seam in `supervisor.rs`.
#[async_trait::async_trait]
pub trait DiscoveryAdapter: Send + Sync {
    async fn discover(&self, config: &Config) -> Result<Snapshot, DiscoveryError>;
}

/// The production adapter: dispatches to the real Docker/Kubernetes clients
/// via the free `discover` function above.
pub struct DockerDiscovery {
    pub docker: DockerClient,
}

#[async_trait::async_trait]
impl DiscoveryAdapter for DockerDiscovery {
    async fn discover(&self, config: &Config) -> Result<Snapshot, DiscoveryError> {
        discover(config, &self.docker).await
    }
}
