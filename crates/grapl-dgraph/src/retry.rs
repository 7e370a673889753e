//! Bounded retry with fixed backoff for transient transport failures.
//!
//! Only `Transport { transient: true }` errors are retried; parse errors
//! and hard transport failures surface immediately. After exhaustion the
//! last transport error is returned to the caller.

use std::thread;
use std::time::Duration;

use crate::error::ClientError;

/// Retry parameters: number of attempts and the fixed delay between them.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 8,
            backoff: Duration::from_millis(100),
        }
    }
}

/// Runs `op` up to `policy.attempts` times, sleeping `policy.backoff`
/// between attempts, retrying only transient failures.
pub fn with_retries<T>(
    policy: RetryPolicy,
    mut op: impl FnMut() -> Result<T, ClientError>,
) -> Result<T, ClientError> {
    let attempts = policy.attempts.max(1);
    let mut last_err = None;
    for attempt in 1..=attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < attempts => {
                tracing::warn!(attempt, error = %err, "transient store failure, retrying");
                thread::sleep(policy.backoff);
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }
    // attempts >= 1, so op ran at least once and the loop only falls
    // through with a recorded transient error.
    Err(last_err.unwrap_or(ClientError::TxnClosed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            backoff: Duration::from_millis(0),
        }
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let mut calls = 0;
        let result = with_retries(fast_policy(5), || {
            calls += 1;
            if calls < 3 {
                Err(ClientError::unavailable())
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn gives_up_after_exhaustion() {
        let mut calls = 0;
        let result: Result<(), _> = with_retries(fast_policy(4), || {
            calls += 1;
            Err(ClientError::unavailable())
        });
        assert_eq!(calls, 4);
        assert!(matches!(
            result,
            Err(ClientError::Transport { transient: true, .. })
        ));
    }

    #[test]
    fn hard_failures_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = with_retries(fast_policy(5), || {
            calls += 1;
            Err(ClientError::Transport {
                status: "INVALID_ARGUMENT".to_string(),
                transient: false,
            })
        });
        assert_eq!(calls, 1);
        assert!(result.is_err());
    }

    #[test]
    fn parse_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = with_retries(fast_policy(5), || {
            calls += 1;
            let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
            Err(ClientError::Parse(err))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }
}
