use crate::action::{Action, MenuItem, ObjectLink};
use crate::error::InternalError;
use crate::span::{Span, SpanState};
use crate::themes::ColorIndex;
use crate::trace::Trace;

use super::processor::{
    running_goroutine, running_goroutine_color, running_goroutine_tooltip, scroll_to_goroutine,
};
use super::{MachineLane, SpanBehavior, TrackKind};

/// A machine's processor lane: `RunningP` while it holds a processor,
/// `BlockedSyscall` while it sits in a blocking syscall without one.
pub struct MachineProcessorSpans;

impl SpanBehavior for MachineProcessorSpans {
    fn kind(&self) -> TrackKind {
        TrackKind::Machine(MachineLane::Processors)
    }

    fn label(&self, span: &Span, trace: &Trace) -> Result<Vec<String>, InternalError> {
        match span.state {
            SpanState::RunningP => {
                let p = trace.processor(trace.event_processor(span.event)?)?;
                Ok(trace.processor_span_labels(p))
            }
            SpanState::BlockedSyscall => Ok(vec!["syscall".to_owned()]),
            _ => Err(self.unexpected(span)),
        }
    }

    fn tooltip(&self, span: &Span, trace: &Trace) -> Result<String, InternalError> {
        match span.state {
            SpanState::RunningP => {
                let p = trace.event_processor(span.event)?;
                Ok(format!("Processor {p}"))
            }
            SpanState::BlockedSyscall => Ok("In blocking syscall".to_owned()),
            _ => Err(self.unexpected(span)),
        }
    }

    fn color(&self, span: &Span, _trace: &Trace) -> Result<ColorIndex, InternalError> {
        match span.state {
            SpanState::RunningP => Ok(ColorIndex::Processor),
            SpanState::BlockedSyscall => Ok(ColorIndex::BlockedSyscall),
            _ => Err(self.unexpected(span)),
        }
    }

    fn links(&self, span: &Span, trace: &Trace) -> Result<Vec<MenuItem>, InternalError> {
        match span.state {
            SpanState::RunningP => {
                let p = trace.event_processor(span.event)?;
                Ok(vec![MenuItem::new(
                    format!("Scroll to processor {p}"),
                    Action::ScrollToObject(ObjectLink::Processor(p)),
                )])
            }
            SpanState::BlockedSyscall => Ok(Vec::new()),
            _ => Err(self.unexpected(span)),
        }
    }
}

/// A machine's goroutine lane. Only `RunningG` spans live here.
pub struct MachineGoroutineSpans;

impl MachineGoroutineSpans {
    fn check(&self, span: &Span) -> Result<(), InternalError> {
        if span.state == SpanState::RunningG {
            Ok(())
        } else {
            Err(self.unexpected(span))
        }
    }
}

impl SpanBehavior for MachineGoroutineSpans {
    fn kind(&self) -> TrackKind {
        TrackKind::Machine(MachineLane::Goroutines)
    }

    fn label(&self, span: &Span, trace: &Trace) -> Result<Vec<String>, InternalError> {
        self.check(span)?;
        Ok(trace.goroutine_span_labels(running_goroutine(span, trace)?))
    }

    fn tooltip(&self, span: &Span, trace: &Trace) -> Result<String, InternalError> {
        self.check(span)?;
        running_goroutine_tooltip(span, trace)
    }

    fn color(&self, span: &Span, trace: &Trace) -> Result<ColorIndex, InternalError> {
        self.check(span)?;
        Ok(running_goroutine_color(running_goroutine(span, trace)?))
    }

    fn links(&self, span: &Span, trace: &Trace) -> Result<Vec<MenuItem>, InternalError> {
        self.check(span)?;
        Ok(vec![scroll_to_goroutine(running_goroutine(span, trace)?)])
    }

    fn shows_spans(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Event, EventId, EventKind, Goroutine, GoroutineId, Processor, ProcessorId};
    use rstest::rstest;

    fn trace() -> Trace {
        Trace::new(
            vec![
                Event {
                    timestamp: 0,
                    kind: EventKind::ProcStart,
                    processor: Some(ProcessorId(4)),
                    goroutine: None,
                },
                Event {
                    timestamp: 5,
                    kind: EventKind::GoStart,
                    processor: Some(ProcessorId(4)),
                    goroutine: Some(GoroutineId(11)),
                },
            ],
            vec![Goroutine::new(GoroutineId(11), Some("runtime.gcBgMarkWorker"), Vec::new())],
            vec![Processor::new(ProcessorId(4), Vec::new())],
            Vec::new(),
        )
    }

    #[test]
    fn processor_lane_labels() {
        let trace = trace();
        let running = Span::new(0, 10, SpanState::RunningP, EventId(0));
        let syscall = Span::new(10, 20, SpanState::BlockedSyscall, EventId(0));

        assert_eq!(
            MachineProcessorSpans.label(&running, &trace).unwrap(),
            vec!["Processor 4", "P4", "4"]
        );
        assert_eq!(MachineProcessorSpans.label(&syscall, &trace).unwrap(), vec!["syscall"]);
        assert_eq!(
            MachineProcessorSpans.tooltip(&syscall, &trace).unwrap(),
            "In blocking syscall"
        );
        assert_eq!(
            MachineProcessorSpans.links(&running, &trace).unwrap()[0].label,
            "Scroll to processor 4"
        );
    }

    #[test]
    fn goroutine_event_without_processor_fails_processor_lane() {
        let trace = Trace::new(
            vec![Event {
                timestamp: 0,
                kind: EventKind::ProcStart,
                processor: None,
                goroutine: None,
            }],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let running = Span::new(0, 10, SpanState::RunningP, EventId(0));
        assert_eq!(
            MachineProcessorSpans.tooltip(&running, &trace),
            Err(InternalError::MissingProcessor(EventId(0)))
        );
    }

    #[rstest]
    #[case::processors(TrackKind::Machine(MachineLane::Processors), SpanState::Active)]
    #[case::processors_gc(TrackKind::Machine(MachineLane::Processors), SpanState::GcSweep)]
    #[case::goroutines(TrackKind::Machine(MachineLane::Goroutines), SpanState::RunningP)]
    #[case::goroutines_blocked(
        TrackKind::Machine(MachineLane::Goroutines),
        SpanState::BlockedSyscall
    )]
    fn foreign_states_are_internal_errors(#[case] kind: TrackKind, #[case] state: SpanState) {
        let trace = trace();
        let span = Span::new(0, 1, state, EventId(0));
        let behavior = kind.behavior();
        let expected = Err(InternalError::UnexpectedState { kind, state });

        assert_eq!(behavior.label(&span, &trace), expected.clone().map(|_: ()| Vec::new()));
        assert_eq!(behavior.tooltip(&span, &trace), expected.clone().map(|_: ()| String::new()));
        assert_eq!(behavior.color(&span, &trace), expected.map(|_: ()| ColorIndex::Mixed));
        assert!(behavior.links(&span, &trace).is_err());
    }

    #[test]
    fn goroutine_lane_is_gc_colored_for_workers() {
        let trace = trace();
        let span = Span::new(5, 9, SpanState::RunningG, EventId(1));
        assert_eq!(MachineGoroutineSpans.color(&span, &trace), Ok(ColorIndex::Gc));
        assert_eq!(
            MachineGoroutineSpans.tooltip(&span, &trace).unwrap(),
            "Goroutine 11: runtime.gcBgMarkWorker"
        );
        assert!(!MachineGoroutineSpans.shows_spans());
    }
}
