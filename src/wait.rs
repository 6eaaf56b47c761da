// src/wait.rs

use std::future::Future;
use thiserror::Error;
use tokio::time::{Duration, sleep};
use tracing::{debug, warn};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("condition not met after {attempts} attempts")]
pub struct WaitTimeout {
    pub attempts: usize,
}

/// Polls `probe` every `interval` until it reports `true`.
///
/// `max_attempts` of `None` waits forever. A probe error counts as "not yet".
pub async fn wait_until<F, Fut>(
    mut probe: F,
    interval: Duration,
    max_attempts: Option<usize>,
) -> Result<usize, WaitTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match probe().await {
            Ok(true) => return Ok(attempts),
            Ok(false) => debug!(attempts, "Condition not met yet"),
            Err(err) => warn!(attempts, error = %err, "Probe failed"),
        }
        if max_attempts.is_some_and(|max| attempts >= max) {
            return Err(WaitTimeout { attempts });
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn resolves_once_probe_holds() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let attempts = wait_until(
            move || async move { Ok::<_, anyhow::Error>(calls.fetch_add(1, Ordering::SeqCst) >= 3) },
            Duration::from_millis(500),
            None,
        )
        .await;

        assert_eq!(attempts, Ok(4));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let result = wait_until(
            || async { Err::<bool, _>(anyhow::anyhow!("page not reachable")) },
            Duration::from_millis(500),
            Some(3),
        )
        .await;

        assert_eq!(result, Err(WaitTimeout { attempts: 3 }));
    }
}
