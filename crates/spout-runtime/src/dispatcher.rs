//! Per-request glue between the transport, the handler and the channel.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use async_trait::async_trait;
use spout_core::{
    BoxedChannel, ChannelError, ConfiguredHandler, Dispatch, EventBatch, HandlerError,
    SourceRequest, SourceResponse,
};
use tracing::{Instrument, debug, debug_span, warn};
use uuid::Uuid;

/// Turns one HTTP request into at most one channel submission.
///
/// Holds only immutable state, so a single instance serves every request
/// concurrently.
pub struct Dispatcher {
    source: Arc<str>,
    handler: ConfiguredHandler,
    channel: BoxedChannel,
}

impl Dispatcher {
    pub fn new(
        source: impl Into<Arc<str>>,
        handler: ConfiguredHandler,
        channel: BoxedChannel,
    ) -> Self {
        Self {
            source: source.into(),
            handler,
            channel,
        }
    }

    /// Returns the handler this dispatcher decodes with.
    pub fn handler(&self) -> &ConfiguredHandler {
        &self.handler
    }

    /// Runs the handler, converting a panic into an internal error.
    fn decode(&self, request: &SourceRequest) -> Result<EventBatch, HandlerError> {
        match catch_unwind(AssertUnwindSafe(|| self.handler.get_events(request))) {
            Ok(result) => result,
            Err(payload) => Err(HandlerError::internal(format!(
                "handler panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }

    async fn handle(&self, request: SourceRequest) -> SourceResponse {
        let events = match self.decode(&request) {
            Ok(events) => events,
            Err(HandlerError::Decode(msg)) => {
                warn!(source = %self.source, error = %msg, "Received bad request from client");
                return SourceResponse::error(400, format!("Bad request from client. {msg}"));
            }
            Err(HandlerError::Internal(msg)) => {
                warn!(
                    source = %self.source,
                    error = %msg,
                    "Deserializer threw unexpected exception"
                );
                return SourceResponse::error(
                    500,
                    format!("Deserializer threw unexpected exception. {msg}"),
                );
            }
        };

        let count = events.len();
        match self.channel.process_batch(events).await {
            Ok(()) => {
                debug!(source = %self.source, events = count, "Batch committed");
                SourceResponse::ok().with_charset(request.character_encoding())
            }
            Err(ChannelError::Full(msg)) => {
                warn!(
                    source = %self.source,
                    events = count,
                    error = %msg,
                    "Error appending event to channel, channel might be full"
                );
                SourceResponse::error(
                    503,
                    format!("Error appending event to channel. Channel might be full. {msg}"),
                )
            }
            Err(ChannelError::Internal(msg)) => {
                warn!(
                    source = %self.source,
                    events = count,
                    error = %msg,
                    "Unexpected error appending event to channel"
                );
                SourceResponse::error(
                    500,
                    format!("Unexpected error while appending event to channel. {msg}"),
                )
            }
        }
    }
}

#[async_trait]
impl Dispatch for Dispatcher {
    async fn dispatch(&self, request: SourceRequest) -> SourceResponse {
        let span = debug_span!(
            "request",
            source = %self.source,
            request_id = %Uuid::new_v4(),
            method = %request.method(),
        );
        let response = self.handle(request).instrument(span.clone()).await;
        span.in_scope(|| debug!(status = response.status(), "Request completed"));
        response
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use spout_core::{
        Channel, ChannelResult, Context, Event, HandlerResult, SourceHandler, resolve_handler,
    };

    #[derive(Default)]
    struct RecordingChannel {
        batches: Mutex<Vec<EventBatch>>,
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        async fn process_batch(&self, events: EventBatch) -> ChannelResult<()> {
            self.batches.lock().push(events);
            Ok(())
        }
    }

    struct FailingChannel(ChannelError);

    #[async_trait]
    impl Channel for FailingChannel {
        async fn process_batch(&self, _events: EventBatch) -> ChannelResult<()> {
            Err(self.0.clone())
        }
    }

    struct PanickingHandler;

    impl SourceHandler for PanickingHandler {
        fn get_events(&self, _request: &SourceRequest) -> HandlerResult<EventBatch> {
            panic!("boom")
        }
    }

    struct BrokenHandler;

    impl SourceHandler for BrokenHandler {
        fn get_events(&self, _request: &SourceRequest) -> HandlerResult<EventBatch> {
            Err(HandlerError::internal("state corrupted"))
        }
    }

    fn json_handler() -> ConfiguredHandler {
        spout_handlers::link_builtin_handlers();
        let handler = resolve_handler("json").unwrap();
        ConfiguredHandler::configure("json", handler, &Context::new()).unwrap()
    }

    fn post(body: &str) -> SourceRequest {
        SourceRequest::new("POST", "/")
            .with_header("content-type", "application/json; charset=UTF-8")
            .with_body(body.to_string())
    }

    #[tokio::test]
    async fn test_success_commits_one_batch() {
        let channel = Arc::new(RecordingChannel::default());
        let dispatcher = Dispatcher::new("test", json_handler(), channel.clone());

        let response = dispatcher
            .dispatch(post(r#"[{"headers":{"a":"b"},"body":"random_body"},{"body":"x"}]"#))
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), "");
        assert_eq!(response.charset(), Some("UTF-8"));

        let batches = channel.batches.lock();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0][0].header("a"), Some("b"));
        assert_eq!(batches[0][0].body(), b"random_body");
        assert_eq!(batches[0][1], Event::with_body("x"));
    }

    #[tokio::test]
    async fn test_empty_array_still_submits() {
        let channel = Arc::new(RecordingChannel::default());
        let dispatcher = Dispatcher::new("test", json_handler(), channel.clone());

        let response = dispatcher.dispatch(post("[]")).await;
        assert_eq!(response.status(), 200);
        assert_eq!(channel.batches.lock().as_slice(), &[Vec::<Event>::new()]);
    }

    #[tokio::test]
    async fn test_decode_error_is_bad_request() {
        let channel = Arc::new(RecordingChannel::default());
        let dispatcher = Dispatcher::new("test", json_handler(), channel.clone());

        let response = dispatcher.dispatch(post("not json")).await;
        assert_eq!(response.status(), 400);
        assert!(response.body().starts_with("Bad request from client. "));
        assert!(channel.batches.lock().is_empty());
    }

    #[tokio::test]
    async fn test_handler_internal_error_and_panic() {
        for handler in [
            Box::new(BrokenHandler) as Box<dyn SourceHandler>,
            Box::new(PanickingHandler),
        ] {
            let channel = Arc::new(RecordingChannel::default());
            let handler = ConfiguredHandler::configure("x", handler, &Context::new()).unwrap();
            let dispatcher = Dispatcher::new("test", handler, channel.clone());

            let response = dispatcher.dispatch(post("[]")).await;
            assert_eq!(response.status(), 500);
            assert!(
                response
                    .body()
                    .starts_with("Deserializer threw unexpected exception. ")
            );
            assert!(channel.batches.lock().is_empty());
        }
    }

    #[tokio::test]
    async fn test_channel_full_is_service_unavailable() {
        let channel = Arc::new(FailingChannel(ChannelError::full("no space")));
        let dispatcher = Dispatcher::new("test", json_handler(), channel);

        let response = dispatcher.dispatch(post(r#"[{"body":"x"}]"#)).await;
        assert_eq!(response.status(), 503);
        assert_eq!(
            response.body(),
            "Error appending event to channel. Channel might be full. no space"
        );
        assert_eq!(response.charset(), None);
    }

    #[tokio::test]
    async fn test_channel_internal_error() {
        let channel = Arc::new(FailingChannel(ChannelError::internal("disk gone")));
        let dispatcher = Dispatcher::new("test", json_handler(), channel);

        let response = dispatcher.dispatch(post(r#"[{"body":"x"}]"#)).await;
        assert_eq!(response.status(), 500);
        assert_eq!(
            response.body(),
            "Unexpected error while appending event to channel. disk gone"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_each_submit_once() {
        let channel = Arc::new(RecordingChannel::default());
        let dispatcher = Arc::new(Dispatcher::new("test", json_handler(), channel.clone()));

        let requests = (0..50).map(|i| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                let body = format!(r#"[{{"body":"{i}-a"}},{{"body":"{i}-b"}}]"#);
                dispatcher.dispatch(post(&body)).await
            })
        });
        let responses = futures::future::join_all(requests).await;

        assert!(responses.iter().all(|r| r.as_ref().unwrap().status() == 200));
        let batches = channel.batches.lock();
        assert_eq!(batches.len(), 50);
        for batch in batches.iter() {
            let bodies: Vec<_> = batch.iter().filter_map(Event::body_str).collect();
            assert_eq!(bodies.len(), 2);
            let prefix = bodies[0].trim_end_matches("-a");
            assert_eq!(bodies[1], format!("{prefix}-b"));
        }
    }
}
