use std::fmt;
use std::ops::Range;

use crate::span::TimeRange;
use crate::trace::{GoroutineId, MachineId, ProcessorId};
use crate::track::TrackKind;

/// Something the user can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectLink {
    Goroutine(GoroutineId),
    Processor(ProcessorId),
    Machine(MachineId),
}

impl fmt::Display for ObjectLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectLink::Goroutine(id) => write!(f, "goroutine {id}"),
            ObjectLink::Processor(id) => write!(f, "processor {id}"),
            ObjectLink::Machine(id) => write!(f, "machine {id}"),
        }
    }
}

/// A stable reference to a run of spans: which track, and which indices of
/// the full track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanSelection {
    pub owner: ObjectLink,
    pub kind: TrackKind,
    pub range: Range<usize>,
}

/// A deferred closure handed to the shell.
pub struct ExecuteAction(Box<dyn FnOnce() + Send>);

impl ExecuteAction {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for ExecuteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExecuteAction(..)")
    }
}

/// A deferred effect.
///
/// Components never apply these themselves. They hand them to the shell,
/// which owns the viewport, the panel stack and whatever else an action
/// touches.
#[derive(Debug)]
pub enum Action {
    ZoomToRange(TimeRange),
    ScrollToObject(ObjectLink),
    OpenSpans(SpanSelection),
    OpenPanel(String),
    ClosePanel,
    PreviousPanel,
    PanelToTab,
    AttachPanel,
    Execute(ExecuteAction),
}

impl Action {
    pub fn execute(f: impl FnOnce() + Send + 'static) -> Self {
        Action::Execute(ExecuteAction::new(f))
    }
}

/// One entry of a context menu.
#[derive(Debug)]
pub struct MenuItem {
    pub label: String,
    pub action: Action,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn execute_runs_closure_once_taken() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let action = Action::execute(move || flag.store(true, Ordering::SeqCst));

        assert!(!ran.load(Ordering::SeqCst));
        match action {
            Action::Execute(inner) => inner.run(),
            other => panic!("unexpected action {other:?}"),
        }
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn links_read_naturally() {
        assert_eq!(ObjectLink::Processor(ProcessorId(3)).to_string(), "processor 3");
        assert_eq!(ObjectLink::Goroutine(GoroutineId(12)).to_string(), "goroutine 12");
    }
}
