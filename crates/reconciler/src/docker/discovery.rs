//! Discovery domain — the Docker API calls the Swarm discovery adapter
//! needs: networks by exact name, every service (filtered client-side by
//! task-template network attachment in `discovery::swarm`), tasks by
//! service.

use std::collections::HashMap;

use super::client::{DockerClient, DockerError};

impl DockerClient {
    /// List networks whose `Name` equals `name` exactly.
    pub async fn list_networks_named(&self, name: &str) -> Result<Vec<bollard::models::Network>, DockerError> {
        use bollard::query_parameters::ListNetworksOptionsBuilder;

        let mut filters = HashMap::new();
        filters.insert("name", vec![name]);
        let options = ListNetworksOptionsBuilder::default().filters(&filters).build();

        self.client.list_networks(Some(options)).await.map_err(DockerError::from)
    }

    /// List every service visible to this manager, unfiltered. Used by the
    /// Swarm discovery adapter, which must inspect each service's own task
    /// template to decide whether it is attached to a configured network.
    pub async fn list_services(&self) -> Result<Vec<bollard::models::Service>, DockerError> {
        match self.client.list_services(None::<bollard::query_parameters::ListServicesOptions>).await {
            Ok(services) => Ok(services),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 503, .. }) => {
                Err(DockerError::NotSwarmManager)
            }
            Err(e) => Err(DockerError::from(e)),
        }
    }

    /// List tasks belonging to `service_id`.
    pub async fn list_tasks_for_service(&self, service_id: &str) -> Result<Vec<bollard::models::Task>, DockerError> {
        use bollard::query_parameters::ListTasksOptionsBuilder;

        let mut filters = HashMap::new();
        filters.insert("service", vec![service_id]);
        let options = ListTasksOptionsBuilder::default().filters(&filters).build();

        self.client.list_tasks(Some(options)).await.map_err(DockerError::from)
    }
}
