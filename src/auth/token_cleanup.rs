use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use super::auth_service::AuthService;

/// Top of every hour.
const CLEANUP_SCHEDULE: &str = "0 0 * * * *";

/// Starts the job that drops expired refresh tokens. The returned scheduler
/// must be kept alive for the job to keep running.
pub async fn start_token_cleanup(auth_service: AuthService) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(CLEANUP_SCHEDULE, move |_uuid, _l| {
        let auth_service = auth_service.clone();

        Box::pin(async move {
            match auth_service.purge_expired_refresh_tokens().await {
                Ok(0) => {}
                Ok(purged) => info!("Purged {} expired refresh tokens", purged),
                Err(e) => error!("Refresh token cleanup failed: {:?}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Refresh token cleanup scheduled");
    Ok(scheduler)
}
