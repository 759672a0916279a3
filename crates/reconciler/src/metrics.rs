//! Metrics / Control plane (C7) — a single hand-rolled atomic reload
//! counter exposed as Prometheus text exposition format.
//!
//! Grounded on the teacher's own `cluster::metrics::SubscriptionMetrics`:
//! an `Arc`-wrapped struct of atomics, no external Prometheus client crate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ReloadCounter {
    reloads: AtomicU64,
}

pub type SharedReloadCounter = Arc<ReloadCounter>;

impl ReloadCounter {
    pub fn new() -> SharedReloadCounter {
        Arc::new(ReloadCounter::default())
    }

    /// Bump the counter. Called exactly once per tick that both changed
    /// files and drove the Supervisor as a consequence of that change
    /// (spec §4.5 decision table) — never from cron or the HTTP trigger.
    pub fn increment(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.reloads.load(Ordering::Relaxed)
    }

    pub fn render_prometheus_text(&self) -> String {
        format!(
            "# HELP bosnd_service_configuration_reloads The count of the configuration reloads since start.\n\
             # TYPE bosnd_service_configuration_reloads counter\n\
             bosnd_service_configuration_reloads {}\n",
            self.get()
        )
    }
}
