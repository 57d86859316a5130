// medallion-core/src/application/stage.rs

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};

use crate::domain::project::OrchestrationConfig;
use crate::error::MedallionError;

/// How often a failed stage is re-run before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            delay: Duration::ZERO,
        }
    }
}

impl From<&OrchestrationConfig> for RetryPolicy {
    fn from(config: &OrchestrationConfig) -> Self {
        Self {
            retries: config.retries,
            delay: config.retry_delay(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: String,
    pub attempts: u32,
    pub duration_ms: u64,
    pub success: bool,
}

/// Runs one unit of work, re-running it on failure as the policy allows.
///
/// The timing covers every attempt including the waits between them. The
/// returned result is the last attempt's.
#[instrument(skip(policy, work))]
pub async fn run_stage<T, F, Fut>(
    name: &str,
    policy: RetryPolicy,
    mut work: F,
) -> (Result<T, MedallionError>, StageTiming)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, MedallionError>>,
{
    let start = Instant::now();
    let max_attempts = policy.retries.saturating_add(1);
    let mut attempts = 0;

    let result = loop {
        attempts += 1;
        debug!(attempt = attempts, "Starting stage");
        match work().await {
            Ok(value) => break Ok(value),
            Err(e) if attempts < max_attempts => {
                warn!(attempt = attempts, error = %e, "Stage failed, retrying in {:?}", policy.delay);
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => {
                error!(attempts, error = %e, "Stage failed");
                break Err(e);
            }
        }
    };

    let timing = StageTiming {
        stage: name.to_string(),
        attempts,
        duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        success: result.is_ok(),
    };
    debug!(duration_ms = timing.duration_ms, "Stage finished");
    (result, timing)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let (result, timing) = run_stage("silver", quick(3), || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(timing.attempts, 1);
        assert!(timing.success);
        assert_eq!(timing.stage, "silver");
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let (result, timing) = run_stage("gold", quick(2), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(MedallionError::InternalError("store unavailable".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(timing.attempts, 3);
        assert!(timing.success);
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let (result, timing) = run_stage("sync", quick(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(MedallionError::InternalError("down".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(timing.attempts, 2);
        assert!(!timing.success);
    }

    #[test]
    fn test_policy_from_config() {
        let config = OrchestrationConfig {
            retries: 4,
            retry_delay_ms: 250,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.retries, 4);
        assert_eq!(policy.delay, Duration::from_millis(250));
        assert_eq!(RetryPolicy::none().retries, 0);
    }
}
