//! Bounded in-memory channel.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use spout_core::{Channel, ChannelError, ChannelResult, Event, EventBatch};
use tokio::sync::Notify;
use tokio::time::{Instant, timeout_at};
use tracing::trace;

use crate::config::ChannelConfig;

/// A bounded FIFO of events shared between the source and its consumers.
///
/// Batches are committed atomically: either every event of a batch is queued
/// or none is. A batch that does not fit waits up to `keep_alive` for
/// consumers to make room and then fails with [`ChannelError::Full`].
pub struct MemoryChannel {
    capacity: usize,
    keep_alive: Duration,
    queue: Mutex<VecDeque<Event>>,
    space: Notify,
    available: Notify,
}

impl MemoryChannel {
    /// Creates a channel holding at most `capacity` events.
    pub fn new(capacity: usize, keep_alive: Duration) -> Self {
        Self {
            capacity,
            keep_alive,
            queue: Mutex::new(VecDeque::new()),
            space: Notify::new(),
            available: Notify::new(),
        }
    }

    /// Creates a channel from the `[channel]` configuration section.
    pub fn from_config(config: &ChannelConfig) -> Self {
        Self::new(config.capacity, config.keep_alive())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Free slots.
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.len())
    }

    /// Removes up to `max` events without waiting.
    pub fn try_take(&self, max: usize) -> Vec<Event> {
        let taken: Vec<Event> = {
            let mut queue = self.queue.lock();
            let n = max.min(queue.len());
            queue.drain(..n).collect()
        };
        if !taken.is_empty() {
            self.space.notify_waiters();
        }
        taken
    }

    /// Removes up to `max` events, waiting until at least one is queued.
    pub async fn take(&self, max: usize) -> Vec<Event> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let taken = self.try_take(max);
            if !taken.is_empty() || max == 0 {
                return taken;
            }
            notified.await;
        }
    }

    /// Queues the whole batch if it fits, handing it back otherwise.
    fn try_commit(&self, events: EventBatch) -> Result<(), EventBatch> {
        let mut queue = self.queue.lock();
        if self.capacity - queue.len() < events.len() {
            return Err(events);
        }
        queue.extend(events);
        Ok(())
    }
}

#[async_trait]
impl Channel for MemoryChannel {
    async fn process_batch(&self, events: EventBatch) -> ChannelResult<()> {
        let size = events.len();
        if size > self.capacity {
            return Err(ChannelError::full(format!(
                "batch of {size} events exceeds channel capacity of {}",
                self.capacity
            )));
        }

        let deadline = Instant::now() + self.keep_alive;
        let mut pending = events;
        loop {
            let notified = self.space.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_commit(pending) {
                Ok(()) => {
                    trace!(events = size, "Committed batch to memory channel");
                    if size > 0 {
                        self.available.notify_waiters();
                    }
                    return Ok(());
                }
                Err(batch) => pending = batch,
            }

            if timeout_at(deadline, notified).await.is_err() {
                return Err(ChannelError::full(format!(
                    "no space for {size} events within {}ms (capacity {}, remaining {})",
                    self.keep_alive.as_millis(),
                    self.capacity,
                    self.remaining()
                )));
            }
        }
    }
}
