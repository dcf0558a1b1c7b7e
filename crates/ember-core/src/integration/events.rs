//! Listener registry.

use std::fmt;

use tokio::sync::broadcast;
use tracing::trace;

/// Largest buffer an [`Emitter`] accepts. The broadcast channel allocates
/// every slot up front.
pub const MAX_EMITTER_CAPACITY: usize = 1 << 16;

/// Broadcasts notifications to every subscriber.
///
/// Emitting never blocks or fails: with no subscribers the value is dropped,
/// and a subscriber that falls more than `capacity` values behind skips the
/// oldest ones (see [`broadcast::error::RecvError::Lagged`]).
pub struct Emitter<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> Emitter<T> {
    /// Creates an emitter buffering up to `capacity` values per subscriber.
    ///
    /// The capacity is clamped to `1..=MAX_EMITTER_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.clamp(1, MAX_EMITTER_CAPACITY));
        Self { sender }
    }

    /// Sends `value` to every current subscriber.
    ///
    /// Returns the number of subscribers that received it.
    pub fn emit(&self, value: T) -> usize {
        match self.sender.send(value) {
            Ok(count) => count,
            Err(_) => {
                trace!("Notification dropped, no subscribers");
                0
            }
        }
    }

    /// Registers a new subscriber. It sees values emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.sender.receiver_count())
            .finish()
    }
}
