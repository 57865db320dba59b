use crate::span::SpanState;
use crate::trace::{EventId, EventKind, GoroutineId, ProcessorId};
use crate::track::TrackKind;

/// An invariant that the parser or the index should have upheld was violated.
///
/// These indicate a bug upstream of the viewer. They are reported at the
/// boundary where they are detected instead of being papered over.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    #[error("unexpected span state {state:?} on {kind:?} track")]
    UnexpectedState { kind: TrackKind, state: SpanState },
    #[error("unexpected event kind {kind:?} for event {event}")]
    UnexpectedEventKind { event: EventId, kind: EventKind },
    #[error("event {0} is not part of the trace")]
    UnknownEvent(EventId),
    #[error("event {0} has no processor")]
    MissingProcessor(EventId),
    #[error("event {0} has no goroutine")]
    MissingGoroutine(EventId),
    #[error("goroutine {0} is not part of the trace")]
    UnknownGoroutine(GoroutineId),
    #[error("processor {0} is not part of the trace")]
    UnknownProcessor(ProcessorId),
}

/// Why a background computation ended without a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FutureError {
    #[error("computation panicked: {0}")]
    Panicked(String),
    #[error("computation failed: {0}")]
    Failed(String),
    #[error("could not start worker thread: {0}")]
    Spawn(String),
}
