use crate::action::{Action, MenuItem, ObjectLink};
use crate::error::InternalError;
use crate::span::{Span, SpanState};
use crate::themes::ColorIndex;
use crate::trace::{Goroutine, Trace};

use super::{capitalize, SpanBehavior, TrackKind};

/// Runtime background workers drawn in the GC color.
pub const GC_WORKER_FUNCTIONS: &[&str] = &[
    "runtime.bgscavenge",
    "runtime.bgsweep",
    "runtime.gcBgMarkWorker",
];

/// Goroutine executions on one processor, plus the GC work it did.
pub struct ProcessorSpans;

impl ProcessorSpans {
    fn check(&self, span: &Span) -> Result<(), InternalError> {
        if span.state == SpanState::RunningG || span.state.is_gc() {
            Ok(())
        } else {
            Err(self.unexpected(span))
        }
    }
}

impl SpanBehavior for ProcessorSpans {
    fn kind(&self) -> TrackKind {
        TrackKind::Processor
    }

    fn label(&self, span: &Span, trace: &Trace) -> Result<Vec<String>, InternalError> {
        self.check(span)?;
        if span.state == SpanState::RunningG {
            let g = running_goroutine(span, trace)?;
            Ok(trace.goroutine_span_labels(g))
        } else {
            Ok(vec![capitalize(span.state.description()), "GC".to_owned()])
        }
    }

    fn tooltip(&self, span: &Span, trace: &Trace) -> Result<String, InternalError> {
        self.check(span)?;
        if span.state == SpanState::RunningG {
            running_goroutine_tooltip(span, trace)
        } else {
            Ok(capitalize(span.state.description()))
        }
    }

    fn color(&self, span: &Span, trace: &Trace) -> Result<ColorIndex, InternalError> {
        self.check(span)?;
        if span.state == SpanState::RunningG {
            Ok(running_goroutine_color(running_goroutine(span, trace)?))
        } else {
            Ok(ColorIndex::Gc)
        }
    }

    fn links(&self, span: &Span, trace: &Trace) -> Result<Vec<MenuItem>, InternalError> {
        self.check(span)?;
        if span.state != SpanState::RunningG {
            return Ok(Vec::new());
        }
        Ok(vec![scroll_to_goroutine(running_goroutine(span, trace)?)])
    }
}

/// The goroutine a `RunningG` span refers to.
pub(super) fn running_goroutine<'t>(
    span: &Span,
    trace: &'t Trace,
) -> Result<&'t Goroutine, InternalError> {
    let id = trace.event_goroutine(span.event)?;
    trace.goroutine(id)
}

pub(super) fn running_goroutine_tooltip(
    span: &Span,
    trace: &Trace,
) -> Result<String, InternalError> {
    let g = running_goroutine(span, trace)?;
    Ok(match g.function_name() {
        Some(name) => format!("Goroutine {}: {name}", g.id),
        None => format!("Goroutine {}", g.id),
    })
}

pub(super) fn running_goroutine_color(g: &Goroutine) -> ColorIndex {
    match g.function_name() {
        Some(name) if GC_WORKER_FUNCTIONS.contains(&name) => ColorIndex::Gc,
        _ => ColorIndex::Running,
    }
}

pub(super) fn scroll_to_goroutine(g: &Goroutine) -> MenuItem {
    MenuItem::new(
        format!("Scroll to goroutine {}", g.id),
        Action::ScrollToObject(ObjectLink::Goroutine(g.id)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Event, EventId, EventKind, GoroutineId, ProcessorId};

    fn trace() -> Trace {
        let event = |g| Event {
            timestamp: 0,
            kind: EventKind::GoStart,
            processor: Some(ProcessorId(0)),
            goroutine: Some(GoroutineId(g)),
        };
        Trace::new(
            vec![event(1), event(2), event(9)],
            vec![
                Goroutine::new(GoroutineId(1), Some("runtime.bgsweep"), Vec::new()),
                Goroutine::new(GoroutineId(2), Some("main.worker"), Vec::new()),
            ],
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn gc_workers_are_colored_as_gc() {
        let trace = trace();
        let sweep = Span::new(0, 1, SpanState::RunningG, EventId(0));
        let worker = Span::new(1, 2, SpanState::RunningG, EventId(1));
        assert_eq!(ProcessorSpans.color(&sweep, &trace), Ok(ColorIndex::Gc));
        assert_eq!(ProcessorSpans.color(&worker, &trace), Ok(ColorIndex::Running));
    }

    #[test]
    fn labels_come_from_the_goroutine() {
        let trace = trace();
        let worker = Span::new(1, 2, SpanState::RunningG, EventId(1));
        assert_eq!(
            ProcessorSpans.label(&worker, &trace).unwrap()[0],
            "goroutine 2: main.worker"
        );
        assert_eq!(
            ProcessorSpans.tooltip(&worker, &trace).unwrap(),
            "Goroutine 2: main.worker"
        );
        let links = ProcessorSpans.links(&worker, &trace).unwrap();
        assert_eq!(links[0].label, "Scroll to goroutine 2");
    }

    #[test]
    fn dangling_goroutine_is_reported() {
        let trace = trace();
        let ghost = Span::new(0, 1, SpanState::RunningG, EventId(2));
        assert_eq!(
            ProcessorSpans.label(&ghost, &trace),
            Err(InternalError::UnknownGoroutine(GoroutineId(9)))
        );
    }

    #[test]
    fn goroutine_states_are_rejected() {
        let trace = trace();
        let blocked = Span::new(0, 1, SpanState::BlockedSend, EventId(0));
        assert_eq!(
            ProcessorSpans.tooltip(&blocked, &trace),
            Err(InternalError::UnexpectedState {
                kind: TrackKind::Processor,
                state: SpanState::BlockedSend,
            })
        );
    }
}
