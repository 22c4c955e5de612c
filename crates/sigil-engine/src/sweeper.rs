//! Background sweep scheduling.
//!
//! Expired challenges and sessions are already invisible to readers
//! (expiry is lazy), so sweeping only bounds memory. The [`Sweeper`] runs
//! a task on a fixed interval in a named background thread and stops it
//! when dropped. Deployments that prefer their own scheduler can call
//! `sweep_expired` directly and skip this type.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

/// Default sweep interval.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// A periodically-running background task, stopped on drop.
pub struct Sweeper {
    stop: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Run `task` every `interval` until the sweeper is dropped.
    pub fn spawn<F>(interval: Duration, mut task: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (stop, rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("sigil-sweeper".to_string())
            .spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => task(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .expect("failed to spawn sweeper thread");
        Self {
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn runs_task_on_interval_and_stops_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let sweeper = Sweeper::spawn(Duration::from_millis(5), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(60));
        assert!(count.load(Ordering::SeqCst) > 0);

        drop(sweeper);
        let after_drop = count.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn sweeps_a_challenge_service() {
        use crate::challenge::{ChallengeConfig, ChallengeService};

        let service = Arc::new(ChallengeService::new(ChallengeConfig { ttl_seconds: -1 }));
        service.create();
        let svc = Arc::clone(&service);
        let _sweeper = Sweeper::spawn(Duration::from_millis(5), move || {
            svc.sweep_expired();
        });
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(service.sweep_expired(), 0, "background sweep already ran");
    }
}
