//! Frame bookkeeping for hosts that drive a composition synchronously.
//!
//! State writes end in [`RuntimeScheduler::schedule_frame`]; [`StdScheduler`]
//! only latches that request so a host can poll it between events and decide
//! whether to recompose.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use formset_core::{Runtime, RuntimeScheduler};

/// Latches frame requests until the host takes them.
#[derive(Default)]
pub struct StdScheduler {
    pending: AtomicBool,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the latch and reports whether it was set.
    pub fn take_frame_request(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("pending", &self.pending.load(Ordering::Acquire))
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn schedule_frame(&self) {
        if !self.pending.swap(true, Ordering::AcqRel) {
            log::trace!("frame requested");
        }
    }
}

/// A [`Runtime`] wired to a [`StdScheduler`] the host can poll.
#[derive(Clone)]
pub struct StdRuntime {
    frames: Arc<StdScheduler>,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let frames = Arc::new(StdScheduler::new());
        let runtime = Runtime::new(frames.clone());
        Self { frames, runtime }
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn take_frame_request(&self) -> bool {
        self.frames.take_frame_request()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StdRuntime").field(&self.frames).finish()
    }
}
