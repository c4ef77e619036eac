//! Cooperative global stop
//!
//! The flag moves from running to stopped exactly once. Workers check it
//! before and after every blocking dequeue; the coordinator awaits it.

use tokio::sync::watch;

/// Write-once stop flag shared by the coordinator and every worker
#[derive(Debug)]
pub struct StopFlag {
    state: watch::Sender<bool>,
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl StopFlag {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    /// Sets the flag
    ///
    /// Returns true only for the call that performed the transition; later and
    /// concurrent calls are no-ops.
    pub fn set(&self) -> bool {
        self.state.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        })
    }

    pub fn is_set(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once the flag is set
    pub async fn wait(&self) {
        let mut stopped = self.state.subscribe();
        let _ = stopped.wait_for(|stopped| *stopped).await;
    }
}
