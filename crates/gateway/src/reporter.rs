//! The streaming reporter: one orchestrator run per request, relayed to the
//! client line by line as it happens.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Bytes;
use futures::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, Instrument, Span};
use vibeforge_agent::{Orchestrator, TraceSink};
use vibeforge_core::TraceEvent;

/// Line written when the run task dies without finishing.
pub const INTERNAL_FAILURE: &str = "internal orchestrator failure";

/// Opens trace streams over a shared orchestrator.
#[derive(Clone)]
pub struct Reporter {
    orchestrator: Orchestrator,
}

impl Reporter {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Start a run for `prompt` on its own task and return its trace.
    ///
    /// The run's logs stay inside the caller's current span. The stream ends
    /// when the run ends. Dropping the stream cancels the run.
    pub fn open(&self, prompt: String) -> TraceStream {
        let span = Span::current();
        let (sink, rx) = TraceSink::channel();
        let cancel = CancellationToken::new();

        let orchestrator = self.orchestrator.clone();
        let run_sink = sink.clone();
        let run_cancel = cancel.clone();
        let run = tokio::spawn(
            async move { orchestrator.run(&prompt, &run_sink, &run_cancel).await }
                .instrument(span.clone()),
        );

        // Holds the last sender, so the stream closes only after this returns.
        tokio::spawn(async move {
            match run.await {
                Ok(outcome) => debug!(
                    termination = %outcome.termination,
                    iterations = outcome.iterations,
                    "Trace stream complete"
                ),
                Err(e) if e.is_panic() => {
                    error!("Orchestrator task panicked");
                    sink.emit(TraceEvent::Error(INTERNAL_FAILURE.into())).await;
                }
                Err(_) => debug!("Orchestrator task aborted"),
            }
        }
        .instrument(span));

        TraceStream {
            events: ReceiverStream::new(rx),
            _cancel_on_drop: cancel.drop_guard(),
        }
    }
}

/// A run's trace as newline-terminated text frames.
pub struct TraceStream {
    events: ReceiverStream<TraceEvent>,
    _cancel_on_drop: DropGuard,
}

impl Stream for TraceStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events)
            .poll_next(cx)
            .map(|event| event.map(|e| Ok(Bytes::from(format!("{}\n", e.render())))))
    }
}
