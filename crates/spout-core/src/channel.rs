//! Downstream channel and request dispatch contracts.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ChannelResult;
use crate::event::EventBatch;
use crate::request::{SourceRequest, SourceResponse};

/// A transactional sink for event batches.
///
/// `process_batch` commits the whole batch or nothing. Capacity exhaustion is
/// reported as [`ChannelError::Full`](crate::ChannelError::Full) so the source
/// can signal backpressure; every other failure is
/// [`ChannelError::Internal`](crate::ChannelError::Internal). The call may wait
/// for capacity according to the channel's own policy.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Commits `events` atomically, preserving their order.
    async fn process_batch(&self, events: EventBatch) -> ChannelResult<()>;
}

/// Shared channel reference.
pub type BoxedChannel = Arc<dyn Channel>;

/// Per-request entry point invoked by the transport.
///
/// Implementations must be reentrant: the transport calls `dispatch`
/// concurrently for independent requests.
#[async_trait]
pub trait Dispatch: Send + Sync {
    /// Handles one request and produces the response to send.
    async fn dispatch(&self, request: SourceRequest) -> SourceResponse;
}

/// Shared dispatch reference.
pub type BoxedDispatch = Arc<dyn Dispatch>;
