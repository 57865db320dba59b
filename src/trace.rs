//! The parsed trace, as handed over by the parser.
//!
//! Everything in here is built once at load time and read-only afterwards.
//! Span sequences are trusted to be sorted by start time and non-overlapping;
//! nothing in this crate re-sorts or validates them.

use std::fmt;
use std::sync::Arc;

use crate::error::InternalError;
use crate::span::Span;

/// Nanoseconds since the start of the trace.
pub type Timestamp = i64;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Index into [`Trace::events`].
    EventId(usize)
);
entity_id!(GoroutineId(u64));
entity_id!(ProcessorId(i32));
entity_id!(MachineId(i64));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ProcStart,
    ProcStop,
    GoCreate,
    GoStart,
    GoEnd,
    GoStop,
    GoSched,
    GoPreempt,
    GoBlock,
    GoUnblock,
    GoSysCall,
    GoSysBlock,
    GoSysExit,
    GcStart,
    GcDone,
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: Timestamp,
    pub kind: EventKind,
    pub processor: Option<ProcessorId>,
    pub goroutine: Option<GoroutineId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Goroutine {
    pub id: GoroutineId,
    pub function: Option<Function>,
    pub spans: Arc<[Span]>,
}

impl Goroutine {
    pub fn new(id: GoroutineId, function: Option<&str>, spans: Vec<Span>) -> Self {
        Self {
            id,
            function: function.map(|name| Function {
                name: name.to_owned(),
            }),
            spans: spans.into(),
        }
    }

    pub fn function_name(&self) -> Option<&str> {
        self.function.as_ref().map(|f| f.name.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Processor {
    pub id: ProcessorId,
    pub spans: Arc<[Span]>,
}

impl Processor {
    pub fn new(id: ProcessorId, spans: Vec<Span>) -> Self {
        Self {
            id,
            spans: spans.into(),
        }
    }
}

/// An OS thread. Owns two lanes: which processor it ran, and which goroutine.
#[derive(Debug, Clone)]
pub struct Machine {
    pub id: MachineId,
    pub spans: Arc<[Span]>,
    pub goroutines: Arc<[Span]>,
}

impl Machine {
    pub fn new(id: MachineId, spans: Vec<Span>, goroutines: Vec<Span>) -> Self {
        Self {
            id,
            spans: spans.into(),
            goroutines: goroutines.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Trace {
    events: Vec<Event>,
    goroutines: Vec<Goroutine>,
    processors: Vec<Processor>,
    machines: Vec<Machine>,
    end: Timestamp,
}

impl Trace {
    pub fn new(
        events: Vec<Event>,
        mut goroutines: Vec<Goroutine>,
        mut processors: Vec<Processor>,
        mut machines: Vec<Machine>,
    ) -> Self {
        goroutines.sort_by_key(|g| g.id);
        processors.sort_by_key(|p| p.id);
        machines.sort_by_key(|m| m.id);

        let last_event = events.iter().map(|ev| ev.timestamp).max().unwrap_or(0);
        let last_span = goroutines
            .iter()
            .flat_map(|g| g.spans.last())
            .chain(processors.iter().flat_map(|p| p.spans.last()))
            .chain(machines.iter().flat_map(|m| m.spans.last()))
            .chain(machines.iter().flat_map(|m| m.goroutines.last()))
            .map(|s| s.end)
            .max()
            .unwrap_or(0);

        Self {
            events,
            goroutines,
            processors,
            machines,
            end: last_event.max(last_span),
        }
    }

    /// Timestamp of the last thing that happened in the trace.
    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn goroutines(&self) -> &[Goroutine] {
        &self.goroutines
    }

    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn event(&self, id: EventId) -> Result<&Event, InternalError> {
        self.events.get(id.0).ok_or(InternalError::UnknownEvent(id))
    }

    pub fn goroutine(&self, id: GoroutineId) -> Result<&Goroutine, InternalError> {
        self.goroutines
            .binary_search_by_key(&id, |g| g.id)
            .map(|idx| &self.goroutines[idx])
            .map_err(|_| InternalError::UnknownGoroutine(id))
    }

    pub fn processor(&self, id: ProcessorId) -> Result<&Processor, InternalError> {
        self.processors
            .binary_search_by_key(&id, |p| p.id)
            .map(|idx| &self.processors[idx])
            .map_err(|_| InternalError::UnknownProcessor(id))
    }

    /// The processor recorded on `event`.
    pub fn event_processor(&self, event: EventId) -> Result<ProcessorId, InternalError> {
        self.event(event)?
            .processor
            .ok_or(InternalError::MissingProcessor(event))
    }

    /// The goroutine recorded on `event`.
    pub fn event_goroutine(&self, event: EventId) -> Result<GoroutineId, InternalError> {
        self.event(event)?
            .goroutine
            .ok_or(InternalError::MissingGoroutine(event))
    }

    /// Labels for a span representing `g`, longest first. The renderer picks
    /// the first one that fits.
    pub fn goroutine_span_labels(&self, g: &Goroutine) -> Vec<String> {
        match g.function_name() {
            Some(name) => vec![
                format!("goroutine {}: {name}", g.id),
                format!("g{}: {name}", g.id),
                format!("{}", g.id),
            ],
            None => vec![format!("goroutine {}", g.id), format!("g{}", g.id)],
        }
    }

    /// Labels for a span representing `p`, longest first.
    pub fn processor_span_labels(&self, p: &Processor) -> Vec<String> {
        vec![
            format!("Processor {}", p.id),
            format!("P{}", p.id),
            format!("{}", p.id),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SpanState;

    fn span(start: i64, end: i64, event: usize) -> Span {
        Span::new(start, end, SpanState::Active, EventId(event))
    }

    #[test]
    fn lookups_are_by_id_not_position() {
        let trace = Trace::new(
            Vec::new(),
            vec![
                Goroutine::new(GoroutineId(9), None, vec![span(0, 5, 0)]),
                Goroutine::new(GoroutineId(2), Some("main.main"), vec![span(0, 40, 0)]),
            ],
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(trace.goroutine(GoroutineId(2)).unwrap().spans.len(), 1);
        assert_eq!(
            trace.goroutine(GoroutineId(3)).unwrap_err(),
            InternalError::UnknownGoroutine(GoroutineId(3))
        );
        assert_eq!(trace.end(), 40);
    }

    #[test]
    fn missing_event_references_are_reported() {
        let trace = Trace::new(
            vec![Event {
                timestamp: 3,
                kind: EventKind::GoStart,
                processor: None,
                goroutine: Some(GoroutineId(1)),
            }],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(
            trace.event_processor(EventId(0)),
            Err(InternalError::MissingProcessor(EventId(0)))
        );
        assert_eq!(trace.event_goroutine(EventId(0)), Ok(GoroutineId(1)));
        assert_eq!(
            trace.event(EventId(4)).unwrap_err(),
            InternalError::UnknownEvent(EventId(4))
        );
    }

    #[test]
    fn unknown_entities_are_reported() {
        let trace = Trace::new(
            vec![Event {
                timestamp: 0,
                kind: EventKind::ProcStart,
                processor: Some(ProcessorId(1)),
                goroutine: None,
            }],
            Vec::new(),
            vec![Processor::new(ProcessorId(1), Vec::new())],
            vec![Machine::new(MachineId(0), Vec::new(), Vec::new())],
        );

        assert!(trace.processor(ProcessorId(1)).is_ok());
        assert_eq!(
            trace.processor(ProcessorId(2)).unwrap_err(),
            InternalError::UnknownProcessor(ProcessorId(2))
        );
        assert_eq!(
            trace.event_goroutine(EventId(0)),
            Err(InternalError::MissingGoroutine(EventId(0)))
        );
    }

    #[test]
    fn goroutine_labels_shrink() {
        let trace = Trace::default();
        let g = Goroutine::new(GoroutineId(7), Some("net/http.serve"), Vec::new());
        assert_eq!(
            trace.goroutine_span_labels(&g),
            vec!["goroutine 7: net/http.serve", "g7: net/http.serve", "7"]
        );
    }
}
