//! Sidecar supervisor: discovers Swarm/Kubernetes backends, renders
//! templates, and drives a worker process's lifecycle in lock-step with
//! them. See `reconcile::Reconciler` for the core control loop.

pub mod changedetect;
pub mod conf;
pub mod control;
pub mod cron;
pub mod discovery;
pub mod dns;
pub mod docker;
pub mod metrics;
pub mod model;
pub mod reconcile;
pub mod runtime;
pub mod supervisor;
pub mod template;
