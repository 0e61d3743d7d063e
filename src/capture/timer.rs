use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

/// One-shot task that runs after a delay unless cancelled first.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct DeferredTask {
    cancel: Option<mpsc::Sender<()>>,
    fired: Arc<AtomicBool>,
}

impl DeferredTask {
    /// Run `task` on a helper thread once `delay` has elapsed.
    pub fn schedule(delay: Duration, task: impl FnOnce() + Send + 'static) -> Self {
        let (tx, rx) = mpsc::channel::<()>();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        std::thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(delay) {
                flag.store(true, Ordering::SeqCst);
                task();
            }
        });
        Self {
            cancel: Some(tx),
            fired,
        }
    }

    /// Cancel the task. Returns `false` when it already fired or was cancelled.
    ///
    /// Never blocks, so it is safe to call from inside the task itself.
    pub fn cancel(&mut self) -> bool {
        match self.cancel.take() {
            Some(tx) => {
                let _ = tx.send(());
                !self.fired.load(Ordering::SeqCst)
            }
            None => false,
        }
    }
}

impl Drop for DeferredTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/timer.rs"]
mod tests;
