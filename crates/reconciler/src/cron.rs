//! Cron trigger (C6) — schedules periodic `reload` calls independent of
//! the tick loop. Never bumps the reload counter (spec §4.6 / §8 S4).

use std::sync::Arc;

use thiserror::Error;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::conf::model::CmdConfig;
use crate::supervisor::Supervisor;

#[derive(Error, Debug)]
pub enum CronError {
    #[error("invalid crontab expression {expr:?}: {source}")]
    InvalidExpression { expr: String, #[source] source: tokio_cron_scheduler::JobSchedulerError },
    #[error("starting scheduler: {0}")]
    Start(#[source] tokio_cron_scheduler::JobSchedulerError),
}

/// Build and start a scheduler that calls `supervisor.reload(cmd)` on the
/// configured crontab. Returns the running scheduler so the caller can
/// keep it alive for the process lifetime.
pub async fn start(crontab: &str, supervisor: Arc<Supervisor>, cmd: CmdConfig) -> Result<JobScheduler, CronError> {
    let scheduler = JobScheduler::new().await.map_err(CronError::Start)?;

    let job = Job::new_async(crontab, move |_uuid, _locked| {
        let supervisor = supervisor.clone();
        let cmd = cmd.clone();
        Box::pin(async move {
            info!("cron-triggered reload firing");
            if let Err(e) = supervisor.reload(&cmd).await {
                error!(error = %e, "cron-triggered reload failed");
            }
        })
    })
    .map_err(|source| CronError::InvalidExpression { expr: crontab.to_string(), source })?;

    scheduler.add(job).await.map_err(CronError::Start)?;
    scheduler.start().await.map_err(CronError::Start)?;

    Ok(scheduler)
}
