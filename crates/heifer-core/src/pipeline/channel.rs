//! Bounded result channel between workers and the aggregator.

use tokio::sync::mpsc;

/// Create a bounded channel pair holding at most `capacity` results.
///
/// When the buffer is full, workers wait before reporting, so a slow consumer
/// throttles the pool instead of letting results pile up in memory.
pub fn bounded_channel<T>(capacity: usize) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(capacity.max(1))
}
