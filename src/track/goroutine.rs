use crate::action::{Action, MenuItem, ObjectLink};
use crate::error::InternalError;
use crate::span::{Span, SpanState};
use crate::themes::ColorIndex;
use crate::trace::Trace;

use super::{capitalize, SpanBehavior, TrackKind};

/// The states of one goroutine over time.
pub struct GoroutineSpans;

impl GoroutineSpans {
    fn check(&self, span: &Span) -> Result<(), InternalError> {
        match span.state {
            SpanState::RunningP | SpanState::RunningG => Err(self.unexpected(span)),
            _ => Ok(()),
        }
    }
}

impl SpanBehavior for GoroutineSpans {
    fn kind(&self) -> TrackKind {
        TrackKind::Goroutine
    }

    fn label(&self, span: &Span, _trace: &Trace) -> Result<Vec<String>, InternalError> {
        self.check(span)?;
        Ok(vec![capitalize(span.state.description())])
    }

    fn tooltip(&self, span: &Span, trace: &Trace) -> Result<String, InternalError> {
        self.check(span)?;
        let mut out = format!("State: {}", span.state.description());
        if span.state == SpanState::Active {
            let processor = trace.event_processor(span.event)?;
            out.push_str(&format!("\nOn processor {processor}"));
        }
        Ok(out)
    }

    fn color(&self, span: &Span, _trace: &Trace) -> Result<ColorIndex, InternalError> {
        self.check(span)?;
        Ok(ColorIndex::for_state(span.state))
    }

    fn links(&self, span: &Span, trace: &Trace) -> Result<Vec<MenuItem>, InternalError> {
        self.check(span)?;
        if span.state != SpanState::Active {
            return Ok(Vec::new());
        }
        let processor = trace.event_processor(span.event)?;
        Ok(vec![MenuItem::new(
            format!("Scroll to processor {processor}"),
            Action::ScrollToObject(ObjectLink::Processor(processor)),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::EventId;

    #[test]
    fn machine_states_are_rejected() {
        let span = Span::new(0, 1, SpanState::RunningP, EventId(0));
        let trace = Trace::default();
        assert_eq!(
            GoroutineSpans.label(&span, &trace),
            Err(InternalError::UnexpectedState {
                kind: TrackKind::Goroutine,
                state: SpanState::RunningP,
            })
        );
        assert!(GoroutineSpans.color(&span, &trace).is_err());
        assert!(GoroutineSpans.tooltip(&span, &trace).is_err());
        assert!(GoroutineSpans.links(&span, &trace).is_err());
    }

    #[test]
    fn running_span_without_processor_is_an_error() {
        let span = Span::new(0, 1, SpanState::Active, EventId(3));
        let trace = Trace::default();
        assert_eq!(
            GoroutineSpans.tooltip(&span, &trace),
            Err(InternalError::UnknownEvent(EventId(3)))
        );
    }

    #[test]
    fn blocked_span_has_no_links() {
        let span = Span::new(0, 1, SpanState::BlockedRecv, EventId(0));
        let trace = Trace::default();
        assert!(GoroutineSpans.links(&span, &trace).unwrap().is_empty());
        assert_eq!(
            GoroutineSpans.label(&span, &trace).unwrap(),
            vec!["Blocked on channel recv"]
        );
    }
}
