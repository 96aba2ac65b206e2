//! Platform abstraction for runtime services.
//!
//! The runtime never drives itself: when state changes it asks the host,
//! through a [`RuntimeScheduler`], to come back and recompose.

/// Schedules work for the composition runtime.
///
/// Implementations must be safe to share across threads even though the
/// runtime itself only ever calls them from the composing thread.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host process a new frame.
    fn schedule_frame(&self);
}
