//! Tracks: one lane of mutually exclusive spans belonging to one entity.
//!
//! A [`Track`] itself knows nothing about goroutines or processors. How its
//! spans are labelled, described, colored and linked depends on the
//! [`TrackKind`], which dispatches to exactly one [`SpanBehavior`].
//!
//! Every query that takes a view distinguishes three shapes: empty, a single
//! span, and a coalesced cluster. Span-specific fields (which processor ran
//! this, which goroutine) only exist for a single span, so clusters get
//! summary text and no links.

use std::sync::Arc;

use crate::action::{Action, MenuItem, ObjectLink, SpanSelection};
use crate::error::InternalError;
use crate::format::{format_count, format_duration};
use crate::items::{coalesce, ItemsView};
use crate::span::{Span, TimeRange};
use crate::themes::ColorIndex;
use crate::trace::{Timestamp, Trace};

mod goroutine;
mod machine;
mod processor;

pub use goroutine::GoroutineSpans;
pub use machine::{MachineGoroutineSpans, MachineProcessorSpans};
pub use processor::ProcessorSpans;

/// Which of a machine's two lanes a track shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineLane {
    /// Which processor the machine was running, or whether it sat in a
    /// blocking syscall.
    Processors,
    /// Which goroutine the machine was running.
    Goroutines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Goroutine,
    Processor,
    Machine(MachineLane),
}

impl TrackKind {
    pub fn behavior(self) -> &'static dyn SpanBehavior {
        match self {
            TrackKind::Goroutine => &GoroutineSpans,
            TrackKind::Processor => &ProcessorSpans,
            TrackKind::Machine(MachineLane::Processors) => &MachineProcessorSpans,
            TrackKind::Machine(MachineLane::Goroutines) => &MachineGoroutineSpans,
        }
    }
}

/// Per-kind interpretation of a single span.
///
/// Implementations reject states that cannot occur on their kind of track
/// with [`InternalError::UnexpectedState`].
pub trait SpanBehavior: Sync {
    fn kind(&self) -> TrackKind;

    /// Candidate labels, longest first.
    fn label(&self, span: &Span, trace: &Trace) -> Result<Vec<String>, InternalError>;

    fn tooltip(&self, span: &Span, trace: &Trace) -> Result<String, InternalError>;

    fn color(&self, span: &Span, trace: &Trace) -> Result<ColorIndex, InternalError>;

    /// Menu entries that navigate to objects referenced by the span.
    fn links(&self, _span: &Span, _trace: &Trace) -> Result<Vec<MenuItem>, InternalError> {
        Ok(Vec::new())
    }

    /// Whether the menu offers a span list for the selection.
    fn shows_spans(&self) -> bool {
        true
    }

    fn unexpected(&self, span: &Span) -> InternalError {
        InternalError::UnexpectedState {
            kind: self.kind(),
            state: span.state,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    kind: TrackKind,
    owner: ObjectLink,
    spans: Arc<[Span]>,
    start: Timestamp,
    end: Timestamp,
}

impl Track {
    pub fn new(kind: TrackKind, owner: ObjectLink, spans: Arc<[Span]>) -> Self {
        let start = spans.first().map_or(0, |s| s.start);
        let end = spans.last().map_or(0, |s| s.end);
        Self {
            kind,
            owner,
            spans,
            start,
            end,
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn owner(&self) -> ObjectLink {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn bounds(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    /// The whole track as a view.
    pub fn spans(&self) -> ItemsView<'_, Span> {
        ItemsView::new(&self.spans)
    }

    /// Spans intersecting `range`, in time order.
    ///
    /// Two binary searches: spans are sorted and non-overlapping, so both
    /// their starts and their ends are ascending.
    pub fn query(&self, range: TimeRange) -> ItemsView<'_, Span> {
        if range.is_empty() {
            return ItemsView::empty();
        }
        let lower = self.spans.partition_point(|s| s.end <= range.start);
        let upper = self.spans.partition_point(|s| s.start < range.end);
        self.spans().subslice(lower..upper.max(lower))
    }

    /// Spans intersecting `range`, grouped into clusters that are at least
    /// `min_px` wide at `ns_per_px` unless a wide gap cuts them short. See
    /// [`coalesce`].
    pub fn visible(
        &self,
        range: TimeRange,
        ns_per_px: f64,
        min_px: f32,
    ) -> Vec<ItemsView<'_, Span>> {
        let min_width = (f64::from(min_px) * ns_per_px).round() as Timestamp;
        coalesce(self.query(range), min_width)
    }

    pub fn label(
        &self,
        view: ItemsView<'_, Span>,
        trace: &Trace,
    ) -> Result<Vec<String>, InternalError> {
        match view.len() {
            0 => Ok(Vec::new()),
            1 => self.kind.behavior().label(view.at_ptr(0), trace),
            n => Ok(vec![format!("{} spans", format_count(n as u64)), n.to_string()]),
        }
    }

    pub fn tooltip(
        &self,
        view: ItemsView<'_, Span>,
        trace: &Trace,
    ) -> Result<String, InternalError> {
        match view.len() {
            0 => Ok("no spans".to_owned()),
            1 => {
                let head = self.kind.behavior().tooltip(view.at_ptr(0), trace)?;
                Ok(format!("{head}\n{}", duration_footer(view)))
            }
            n => Ok(format!(
                "{} spans\n{}",
                format_count(n as u64),
                duration_footer(view)
            )),
        }
    }

    pub fn context_menu(
        &self,
        view: ItemsView<'_, Span>,
        trace: &Trace,
    ) -> Result<Vec<MenuItem>, InternalError> {
        let Some(bounds) = view.bounds() else {
            return Ok(Vec::new());
        };
        let behavior = self.kind.behavior();

        let mut items = vec![MenuItem::new("Zoom", Action::ZoomToRange(bounds))];
        if behavior.shows_spans() {
            items.push(MenuItem::new(
                "Show spans",
                Action::OpenSpans(SpanSelection {
                    owner: self.owner,
                    kind: self.kind,
                    range: view.original_range(),
                }),
            ));
        }
        if view.len() == 1 {
            items.extend(behavior.links(view.at_ptr(0), trace)?);
        }
        Ok(items)
    }

    /// The color class of a view. A cluster whose spans disagree is
    /// [`ColorIndex::Mixed`].
    pub fn color(
        &self,
        view: ItemsView<'_, Span>,
        trace: &Trace,
    ) -> Result<ColorIndex, InternalError> {
        let behavior = self.kind.behavior();
        let mut spans = view.iter();
        let Some(first) = spans.next() else {
            return Ok(ColorIndex::Inactive);
        };
        let color = behavior.color(first, trace)?;
        for span in spans {
            if behavior.color(span, trace)? != color {
                return Ok(ColorIndex::Mixed);
            }
        }
        Ok(color)
    }
}

/// "Duration: D", plus "Time span: T" for clusters, where D excludes gaps
/// and T does not.
pub fn duration_footer(view: ItemsView<'_, Span>) -> String {
    let duration = format_duration(view.total_duration());
    match view.bounds() {
        Some(bounds) if view.len() > 1 => format!(
            "Duration: {duration}\nTime span: {}",
            format_duration(bounds.duration())
        ),
        _ => format!("Duration: {duration}"),
    }
}

pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
