use std::sync::atomic::{AtomicU8, Ordering};

const RUNNING: u8 = 0;
const STOPPING: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle of an actor loop: `Running -> Stopping -> Stopped`.
///
/// Exactly one caller wins the `Running -> Stopping` exchange and owns the
/// teardown.
#[derive(Debug, Default)]
pub(crate) struct Lifecycle(AtomicU8);

impl Lifecycle {
    pub fn new() -> Self {
        Self(AtomicU8::new(RUNNING))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire) == RUNNING
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire) == STOPPED
    }

    /// Returns true for the single caller that moved us out of `Running`.
    pub fn begin_stop(&self) -> bool {
        self.0
            .compare_exchange(RUNNING, STOPPING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn finish_stop(&self) {
        self.0.store(STOPPED, Ordering::Release);
    }
}
