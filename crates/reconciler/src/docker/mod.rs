//! Docker client — connection, error types, and the domain calls the
//! Swarm discovery adapter needs (networks, services, tasks).

pub mod client;
pub mod discovery;

pub use client::{DockerClient, DockerError};
