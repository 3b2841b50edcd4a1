//! Wall-clock guard for potentially non-cooperative work units.

use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use tracing::warn;

use st_types::{TuneError, TuneResult};

/// Run `work` on a dedicated thread and wait at most `timeout` for its value.
///
/// On timeout the worker thread is abandoned, not killed: it keeps running
/// until the work finishes on its own and its result is dropped with the
/// channel. The guard itself always returns within the budget.
pub fn run_with_timeout<T, F>(label: &str, work: F, timeout: Duration) -> TuneResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = bounded(1);

    std::thread::Builder::new()
        .name(format!("study-{label}"))
        .spawn(move || {
            let _ = tx.send(work());
        })?;

    match rx.recv_timeout(timeout) {
        Ok(value) => Ok(value),
        Err(RecvTimeoutError::Timeout) => {
            warn!(
                task = label,
                timeout_seconds = timeout.as_secs(),
                "work unit exceeded its deadline, abandoning"
            );
            Err(TuneError::Timeout {
                timeout_seconds: timeout.as_secs(),
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(TuneError::Search(format!(
            "worker for {label} terminated without producing a result"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn fast_work_returns_its_value() {
        let result = run_with_timeout("fast", || 21 * 2, Duration::from_secs(1));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn slow_work_times_out_promptly() {
        let started = Instant::now();
        let result = run_with_timeout(
            "slow",
            || {
                std::thread::sleep(Duration::from_millis(500));
                0
            },
            Duration::from_millis(50),
        );

        match result {
            Err(TuneError::Timeout { .. }) => (),
            other => panic!("expected timeout, got {other:?}"),
        }
        // The guard must return at the deadline, not when the work finishes.
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn dead_worker_is_a_search_error() {
        let result: TuneResult<()> =
            run_with_timeout("panicky", || panic!("worker died"), Duration::from_secs(1));
        match result {
            Err(TuneError::Search(message)) => assert!(message.contains("panicky")),
            other => panic!("expected search error, got {other:?}"),
        }
    }
}
