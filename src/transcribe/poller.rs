use std::time::Duration;

use crate::config::PollingConfig;
use crate::error::{Error, Result};
use crate::transcribe::backend::{
    JobId, JobPayload, JobStatus, TranscriptOutcome, TranscriptionApi,
};

/// How long to wait between status checks and when to give up.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub backoff_factor: f64,
    pub max_interval: Duration,
    /// `None` polls until the job is terminal.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            backoff_factor: config.backoff_factor,
            max_interval: Duration::from_secs(config.max_interval_secs),
            max_attempts: (config.max_attempts > 0).then_some(config.max_attempts),
        }
    }
}

impl PollPolicy {
    /// Delay before the status check following wait number `wait` (0-based).
    pub fn delay(&self, wait: u32) -> Duration {
        let factor = if self.backoff_factor.is_finite() && self.backoff_factor >= 1.0 {
            self.backoff_factor
        } else {
            1.0
        };
        let cap = self.max_interval.max(self.interval);
        let exponent = wait.min(i32::MAX as u32) as i32;
        let secs = self.interval.as_secs_f64() * factor.powi(exponent);
        if !(secs < cap.as_secs_f64()) {
            return cap;
        }
        Duration::try_from_secs_f64(secs).map_or(cap, |d| d.min(cap))
    }
}

/// Query `id` until the job reaches a terminal state, calling `sleep` between
/// non-terminal responses. Returns the final payload.
pub fn poll_until_terminal<A, S>(
    api: &A,
    id: &JobId,
    policy: &PollPolicy,
    mut sleep: S,
) -> Result<JobPayload>
where
    A: TranscriptionApi + ?Sized,
    S: FnMut(Duration),
{
    let mut attempts: u32 = 0;
    loop {
        let payload = api.job_status(id)?;
        attempts += 1;
        let status = payload.status();
        tracing::debug!("Transcript {} status: {} (check {})", id, status, attempts);

        if status.is_terminal() {
            return Ok(payload);
        }

        if let Some(max) = policy.max_attempts {
            if attempts >= max {
                return Err(Error::PollTimeout {
                    job_id: id.to_string(),
                    attempts,
                });
            }
        }

        let delay = policy.delay(attempts - 1);
        tracing::info!("{}", waiting_message(id, &status, delay));
        sleep(delay);
    }
}

fn waiting_message(id: &JobId, status: &JobStatus, delay: Duration) -> String {
    format!(
        "Transcript {} is {}, waiting {:.0} seconds",
        id,
        status,
        delay.as_secs_f64()
    )
}

/// Turn a terminal payload into an outcome.
pub fn into_outcome(payload: JobPayload) -> Result<TranscriptOutcome> {
    match payload.status() {
        JobStatus::Completed => {
            let text = payload.text.ok_or_else(|| {
                Error::Remote(format!("transcript {} completed without text", payload.id))
            })?;
            Ok(TranscriptOutcome::Completed { text })
        }
        JobStatus::Error => Ok(TranscriptOutcome::Failed {
            error: payload.error.unwrap_or_else(|| "unknown error".to_string()),
        }),
        other => Err(Error::Remote(format!(
            "transcript {} is not finished (status: {})",
            payload.id, other
        ))),
    }
}
