//! Process Supervisor (C1) — start, detect liveness, and gracefully reload
//! the external worker process.
//!
//! The three concurrent callers named in §9 (tick loop, HTTP control
//! surface, cron) all go through the same `Supervisor`, which holds its
//! mutable state behind a `tokio::sync::Mutex` so `ensure_running` and
//! `reload` never run concurrently with each other.

use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::conf::model::CmdConfig;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("failed to spawn {argv:?}: {source}")]
    Spawn { argv: Vec<String>, #[source] source: std::io::Error },
    #[error("reload command {argv:?} exited with {status}")]
    ReloadFailed { argv: Vec<String>, status: std::process::ExitStatus },
    #[error("reload command {argv:?} failed to run: {source}")]
    ReloadSpawn { argv: Vec<String>, #[source] source: std::io::Error },
    #[error("liveness probe failed: {0}")]
    Probe(#[from] std::io::Error),
}

/// Abstraction over "is a process named `name` alive?" so non-Linux ports
/// can substitute an OS-specific probe (§9 REDESIGN FLAGS).
pub trait ProcessProbe: Send + Sync {
    fn is_running(&self, processname: &str) -> Result<bool, std::io::Error>;
}

/// Scans `/proc/*/status` for a `Name:` line matching `processname`,
/// anchored at line start, tolerant of trailing text — the same contract
/// the original source's `isprocessrunningps` implemented via `ps`.
pub struct ProcStatusProbe;

impl ProcessProbe for ProcStatusProbe {
    fn is_running(&self, processname: &str) -> Result<bool, std::io::Error> {
        let pattern = format!(r"^Name:\s*{}", regex::escape(processname));
        let re = regex::Regex::new(&pattern).expect("anchored literal regex is always valid");

        for entry in std::fs::read_dir("/proc")? {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if !entry.file_name().to_string_lossy().chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            let status_path = entry.path().join("status");
            let contents = match std::fs::read_to_string(&status_path) {
                Ok(c) => c,
                Err(_) => continue, // process exited between readdir and read; not a failure
            };
            if contents.lines().any(|line| re.is_match(line)) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

pub struct Supervisor<P: ProcessProbe = ProcStatusProbe> {
    probe: P,
    inner: Mutex<()>,
}

impl Supervisor<ProcStatusProbe> {
    pub fn new() -> Self {
        Supervisor { probe: ProcStatusProbe, inner: Mutex::new(()) }
    }
}

impl<P: ProcessProbe> Supervisor<P> {
    pub fn with_probe(probe: P) -> Self {
        Supervisor { probe, inner: Mutex::new(()) }
    }

    pub fn is_running(&self, cmd: &CmdConfig) -> Result<bool, SupervisorError> {
        Ok(self.probe.is_running(&cmd.processname)?)
    }

    /// If the worker isn't alive, spawn it and re-probe after a short pause.
    pub async fn ensure_running(&self, cmd: &CmdConfig) -> Result<(), SupervisorError> {
        let _guard = self.inner.lock().await;

        if self.probe.is_running(&cmd.processname).unwrap_or(false) {
            return Ok(());
        }

        let Some((program, args)) = cmd.start.split_first() else {
            warn!("cmd.start is empty, nothing to spawn");
            return Ok(());
        };

        match Command::new(program).args(args).spawn() {
            Ok(mut child) => {
                // Reap the child if it exits immediately; don't block on it here.
                tokio::spawn(async move {
                    let _ = child.wait().await;
                });
            }
            Err(source) => {
                warn!(?cmd.start, error = %source, "failed to start worker process");
                return Err(SupervisorError::Spawn { argv: cmd.start.clone(), source });
            }
        }

        tokio::time::sleep(Duration::from_millis(250)).await;

        match self.probe.is_running(&cmd.processname) {
            Ok(true) => info!(processname = %cmd.processname, "worker process started"),
            Ok(false) => warn!(processname = %cmd.processname, "worker process did not come up after start"),
            Err(e) => warn!(error = %e, "liveness re-probe failed after start"),
        }
        Ok(())
    }

    /// Invoke `cmd.reload`, wait for it to exit, then re-probe liveness.
    /// A failing reload does not tear down the existing child.
    pub async fn reload(&self, cmd: &CmdConfig) -> Result<(), SupervisorError> {
        let _guard = self.inner.lock().await;

        let Some((program, args)) = cmd.reload.split_first() else {
            warn!("cmd.reload is empty, nothing to run");
            return Ok(());
        };

        let status = Command::new(program)
            .args(args)
            .status()
            .await
            .map_err(|source| SupervisorError::ReloadSpawn { argv: cmd.reload.clone(), source })?;

        if !status.success() {
            warn!(?cmd.reload, %status, "reload command exited non-zero");
            return Err(SupervisorError::ReloadFailed { argv: cmd.reload.clone(), status });
        }

        match self.probe.is_running(&cmd.processname) {
            Ok(true) => info!(processname = %cmd.processname, "worker process reloaded"),
            Ok(false) => warn!(processname = %cmd.processname, "worker process not found after reload"),
            Err(e) => warn!(error = %e, "liveness re-probe failed after reload"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct FakeProbe(Arc<AtomicBool>);

    impl ProcessProbe for FakeProbe {
        fn is_running(&self, _processname: &str) -> Result<bool, std::io::Error> {
            Ok(self.0.load(Ordering::SeqCst))
        }
    }

    #[tokio::test]
    async fn ensure_running_skips_spawn_when_already_alive() {
        let alive = Arc::new(AtomicBool::new(true));
        let sup = Supervisor::with_probe(FakeProbe(alive));
        let cmd = CmdConfig { start: vec!["false".to_string()], reload: vec![], processname: "x".to_string() };
        // `false` would fail if spawned; since probe says alive, it never is.
        sup.ensure_running(&cmd).await.unwrap();
    }

    #[tokio::test]
    async fn reload_with_empty_argv_is_a_noop() {
        let alive = Arc::new(AtomicBool::new(true));
        let sup = Supervisor::with_probe(FakeProbe(alive));
        let cmd = CmdConfig { start: vec![], reload: vec![], processname: "x".to_string() };
        sup.reload(&cmd).await.unwrap();
    }

    #[test]
    fn proc_status_probe_never_panics_on_missing_proc() {
        let probe = ProcStatusProbe;
        // Exercises the real /proc scan; on any Linux CI box "init"/"systemd" matches nothing
        // named this, so this just proves the scan completes without error.
        let _ = probe.is_running("definitely-not-a-real-process-name");
    }
}
