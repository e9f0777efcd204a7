//! Cron job that runs the auto-feature pass on a schedule.

use std::str::FromStr;
use std::sync::Arc;

use apalis::prelude::*;
use apalis_cron::Schedule;

use crate::application::auto_feature::{AutoFeatureError, AutoFeatureService};

/// Marker struct for the cron-triggered auto-feature job.
/// Must implement `From<chrono::DateTime<chrono::Utc>>` for apalis-cron compatibility.
#[derive(Default, Debug, Clone)]
pub struct AutoFeatureJob;

impl From<chrono::DateTime<chrono::Utc>> for AutoFeatureJob {
    fn from(_: chrono::DateTime<chrono::Utc>) -> Self {
        Self
    }
}

#[derive(Clone)]
pub struct AutoFeatureJobContext {
    pub service: Arc<AutoFeatureService>,
}

/// Run one auto-feature pass. Failures are logged and never retried.
pub async fn process_auto_feature_job(
    _job: AutoFeatureJob,
    ctx: Data<AutoFeatureJobContext>,
) -> Result<(), apalis::prelude::Error> {
    match ctx.service.run().await {
        Ok(report) => {
            tracing::info!(
                target: "application::jobs::auto_feature",
                promoted = report.promoted,
                demoted = report.demoted,
                "Scheduled auto-feature run completed"
            );
        }
        Err(AutoFeatureError::AlreadyRunning) => {
            tracing::info!(
                target: "application::jobs::auto_feature",
                "Skipped scheduled auto-feature run; another run is in progress"
            );
        }
        Err(err) => {
            tracing::warn!(
                target: "application::jobs::auto_feature",
                error = %err,
                failed_posts = ?err.failed_post_ids(),
                "Scheduled auto-feature run failed"
            );
        }
    }
    Ok(())
}

/// Parse a six-field cron expression (seconds first), e.g. `"0 0 * * * *"`.
pub fn auto_feature_schedule(expression: &str) -> Result<Schedule, String> {
    Schedule::from_str(expression)
        .map_err(|err| format!("invalid cron expression `{expression}`: {err}"))
}
