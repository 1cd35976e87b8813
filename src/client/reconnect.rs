//! Bounded transport retry

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::error::{SyncError, SyncResult};

/// Retry schedule for establishing a relay connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl ReconnectPolicy {
    /// Delay after the given failed attempt (1-based), doubling each time
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Connection state as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    /// Never managed to connect
    Unreachable,
    /// Was connected, connection dropped
    Disconnected,
    /// Dropped, then every retry failed
    ReconnectFailed,
}

impl ConnectionStatus {
    /// Status after retries are exhausted
    pub fn after_failure(was_connected: bool) -> Self {
        if was_connected {
            ConnectionStatus::ReconnectFailed
        } else {
            ConnectionStatus::Unreachable
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionStatus::Connected
    }

    /// Banner text, if any
    pub fn banner(self) -> Option<&'static str> {
        match self {
            ConnectionStatus::Connecting | ConnectionStatus::Connected => None,
            ConnectionStatus::Unreachable => Some("Unable to connect to server."),
            ConnectionStatus::Disconnected => Some("Disconnected from server."),
            ConnectionStatus::ReconnectFailed => Some("Failed to reconnect."),
        }
    }
}

/// Call `connect` until it succeeds or the policy runs out of attempts
///
/// `connect` receives the 1-based attempt number. Exhaustion yields
/// [`SyncError::TransportFailure`] carrying the last error.
pub async fn connect_with_retry<T, E, F, Fut>(policy: &ReconnectPolicy, mut connect: F) -> SyncResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match connect(attempt).await {
            Ok(conn) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Connected after retry");
                }
                return Ok(conn);
            }
            Err(e) if attempt >= max_attempts => {
                tracing::error!(attempts = attempt, error = %e, "Giving up on connection");
                return Err(SyncError::TransportFailure {
                    attempts: attempt,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(attempt, error = %e, delay_ms = delay.as_millis() as u64, "Connection failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(8000));
        assert_eq!(policy.delay_for(5), Duration::from_secs(10));
        assert_eq!(policy.delay_for(40), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result = connect_with_retry(&fast_policy(5), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err("refused")
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_is_transport_failure() {
        let result: SyncResult<()> =
            connect_with_retry(&fast_policy(3), |_| async { Err("connection refused") }).await;

        assert_eq!(
            result.unwrap_err(),
            SyncError::TransportFailure {
                attempts: 3,
                reason: "connection refused".to_string()
            }
        );
    }

    #[test]
    fn test_status_banners() {
        assert_eq!(ConnectionStatus::Connected.banner(), None);
        assert_eq!(
            ConnectionStatus::after_failure(false).banner(),
            Some("Unable to connect to server.")
        );
        assert_eq!(
            ConnectionStatus::after_failure(true).banner(),
            Some("Failed to reconnect.")
        );
        assert_eq!(
            ConnectionStatus::Disconnected.banner(),
            Some("Disconnected from server.")
        );
    }
}
