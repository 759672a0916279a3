//! Reconciler (C5) — the single-writer tick loop. Every error path logs
//! and falls through to "sleep `check_interval`, retry next tick"; no
//! error is fatal to the loop (§4.5, §7).

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::conf::model::Config;
use crate::discovery::{DiscoveryAdapter, DockerDiscovery};
use crate::metrics::SharedReloadCounter;
use crate::supervisor::{ProcessProbe, ProcStatusProbe, Supervisor};
use crate::{changedetect, template};

pub struct Reconciler<P: ProcessProbe = ProcStatusProbe, A: DiscoveryAdapter = DockerDiscovery> {
    pub config_path: std::path::PathBuf,
    pub config: Arc<RwLock<Config>>,
    pub supervisor: Arc<Supervisor<P>>,
    pub counter: SharedReloadCounter,
    pub discovery: A,
}

impl Reconciler<ProcStatusProbe, DockerDiscovery> {
    pub fn new(
        config_path: std::path::PathBuf,
        config: Arc<RwLock<Config>>,
        supervisor: Arc<Supervisor<ProcStatusProbe>>,
        counter: SharedReloadCounter,
        docker: crate::docker::DockerClient,
    ) -> Self {
        Reconciler { config_path, config, supervisor, counter, discovery: DockerDiscovery { docker } }
    }
}

impl<P: ProcessProbe, A: DiscoveryAdapter> Reconciler<P, A> {
    /// Run the tick loop forever, sleeping `check_interval` between ticks.
    pub async fn run(&self) {
        loop {
            let sleep_for = self.tick().await;
            tokio::time::sleep(sleep_for).await;
        }
    }

    /// Run exactly one tick, returning how long to sleep before the next one.
    async fn tick(&self) -> std::time::Duration {
        // Step 1: re-read config. Parse failure keeps the prior config.
        match Config::load_from_file(&self.config_path) {
            Ok(new_config) => {
                let mut guard = self.config.write().await;
                *guard = new_config;
            }
            Err(e) => {
                warn!(error = %e, "config reload failed, keeping previous config");
            }
        }

        let config = self.config.read().await.clone();

        // Step 2: validate a discipline is active.
        if matches!(config.discipline(), crate::conf::model::Discipline::None) {
            warn!("no discipline configured (neither swarm.networks nor kubernetes.namespace)");
            return config.check_interval();
        }

        // Step 3: discover.
        let snapshot = match self.discovery.discover(&config).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "discovery failed, skipping this tick");
                return config.check_interval();
            }
        };

        // Step 4: render + detect change across all pairs.
        let mut changed = false;
        for pair in config.template_pairs() {
            match template::render(&pair.src, &snapshot) {
                Ok(rendered) => match changedetect::write_if_changed(&pair.dst, &rendered) {
                    Ok(true) => {
                        info!(pair = %pair.name, "rendered content changed, wrote new file");
                        changed = true;
                    }
                    Ok(false) => {}
                    Err(e) => warn!(pair = %pair.name, error = %e, "failed to write rendered output"),
                },
                Err(e) => warn!(pair = %pair.name, error = %e, "template render failed, skipping this pair"),
            }
        }

        // Step 5: decision table.
        let running = self.supervisor.is_running(&config.cmd).unwrap_or(false);
        match (running, changed) {
            (true, true) => {
                if self.supervisor.reload(&config.cmd).await.is_ok() {
                    self.counter.increment();
                }
            }
            (false, true) => {
                if self.supervisor.ensure_running(&config.cmd).await.is_ok() {
                    self.counter.increment();
                }
            }
            (true, false) => {}
            (false, false) => {
                // Recovery start: liveness lost, but nothing changed. Does
                // not bump the counter (spec §4.5 rationale).
                if let Err(e) = self.supervisor.ensure_running(&config.cmd).await {
                    warn!(error = %e, "recovery start failed");
                }
            }
        }

        config.check_interval()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::model::{Config, SwarmConfig};
    use crate::discovery::DiscoveryError;
    use crate::model::Snapshot;
    use crate::supervisor::ProcessProbe;

    struct AlwaysRunning;
    impl ProcessProbe for AlwaysRunning {
        fn is_running(&self, _processname: &str) -> Result<bool, std::io::Error> {
            Ok(true)
        }
    }

    struct NeverRunning;
    impl ProcessProbe for NeverRunning {
        fn is_running(&self, _processname: &str) -> Result<bool, std::io::Error> {
            Ok(false)
        }
    }

    /// A `DiscoveryAdapter` that always returns an empty Swarm snapshot,
    /// so a tick never has any rendered template to compare and `changed`
    /// stays false — the fake stands in for both Docker and the renderer
    /// having nothing new to report.
    struct EmptySwarmDiscovery;

    #[async_trait::async_trait]
    impl DiscoveryAdapter for EmptySwarmDiscovery {
        async fn discover(&self, _config: &Config) -> Result<Snapshot, DiscoveryError> {
            Ok(Snapshot::Swarm(vec![]))
        }
    }

    fn swarm_configured() -> Config {
        Config { swarm: SwarmConfig { networks: vec!["proxy".to_string()], ..Default::default() }, ..Default::default() }
    }

    /// A config with one template pair whose destination does not yet
    /// exist, so the first tick always finds `changed = true`.
    fn swarm_configured_with_one_stale_template(dir: &std::path::Path) -> Config {
        let src = dir.join("in.tpl");
        std::fs::write(&src, "static").unwrap();
        let dst = dir.join("out.conf");

        let mut config = swarm_configured();
        config.templates.insert(
            "only".to_string(),
            crate::conf::model::TemplateEntry {
                src: src.display().to_string(),
                dst: dst.display().to_string(),
            },
        );
        config
    }

    fn reconciler<P: ProcessProbe>(config: Config, probe: P) -> Reconciler<P, EmptySwarmDiscovery> {
        Reconciler {
            config_path: std::path::PathBuf::from("/nonexistent/does-not-matter.yml"),
            config: Arc::new(RwLock::new(config)),
            supervisor: Arc::new(Supervisor::with_probe(probe)),
            counter: crate::metrics::ReloadCounter::new(),
            discovery: EmptySwarmDiscovery,
        }
    }

    #[tokio::test]
    async fn no_change_and_running_does_not_bump_counter() {
        let r = reconciler(swarm_configured(), AlwaysRunning);
        r.tick().await;
        assert_eq!(r.counter.get(), 0);
    }

    #[tokio::test]
    async fn recovery_start_does_not_bump_counter() {
        let r = reconciler(swarm_configured(), NeverRunning);
        r.tick().await;
        assert_eq!(r.counter.get(), 0);
    }

    #[tokio::test]
    async fn change_while_running_reloads_and_bumps_counter() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = swarm_configured_with_one_stale_template(dir.path());
        config.cmd.reload = vec!["true".to_string()];
        let r = reconciler(config, AlwaysRunning);
        r.tick().await;
        assert_eq!(r.counter.get(), 1);
    }

    #[tokio::test]
    async fn change_while_not_running_starts_and_bumps_counter() {
        let dir = tempfile::tempdir().unwrap();
        let config = swarm_configured_with_one_stale_template(dir.path());
        let r = reconciler(config, NeverRunning);
        r.tick().await;
        assert_eq!(r.counter.get(), 1);
    }
}
