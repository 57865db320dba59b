use std::cmp::Ordering;
use std::sync::OnceLock;

use crate::action::{Action, ObjectLink};
use crate::command::{Command, CommandSlice};
use crate::error::InternalError;
use crate::format::format_count;
use crate::items::ItemsView;
use crate::span::SpanState;
use crate::stats::{aggregate, Statistics};
use crate::track::{capitalize, MachineLane, Track, TrackKind};
use crate::trace::{
    EventKind, Goroutine, GoroutineId, Machine, MachineId, Processor, ProcessorId, Timestamp, Trace,
};

/// Which entity a timeline shows. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimelineKind {
    Processor(ProcessorId),
    Machine(MachineId),
    Goroutine(GoroutineId),
}

impl TimelineKind {
    pub fn link(self) -> ObjectLink {
        match self {
            TimelineKind::Processor(id) => ObjectLink::Processor(id),
            TimelineKind::Machine(id) => ObjectLink::Machine(id),
            TimelineKind::Goroutine(id) => ObjectLink::Goroutine(id),
        }
    }
}

/// The tracks of one entity, as shown to the user.
///
/// Everything but `expanded` and `scroll` is fixed at load time.
#[derive(Debug)]
pub struct Timeline {
    kind: TimelineKind,
    label: String,
    short_name: String,
    tracks: Vec<Track>,
    pub expanded: bool,
    pub scroll: f32,
    stats: OnceLock<Result<Statistics, InternalError>>,
}

impl Timeline {
    fn new(kind: TimelineKind, label: String, short_name: String, tracks: Vec<Track>) -> Self {
        Self {
            kind,
            label,
            short_name,
            tracks,
            expanded: true,
            scroll: 0.0,
            stats: OnceLock::new(),
        }
    }

    pub fn goroutine(trace: &Trace, g: &Goroutine) -> Self {
        let label = trace
            .goroutine_span_labels(g)
            .into_iter()
            .next()
            .unwrap_or_else(|| format!("goroutine {}", g.id));
        let link = ObjectLink::Goroutine(g.id);
        Self::new(
            TimelineKind::Goroutine(g.id),
            label,
            format!("g{}", g.id),
            vec![Track::new(TrackKind::Goroutine, link, g.spans.clone())],
        )
    }

    pub fn processor(p: &Processor) -> Self {
        let link = ObjectLink::Processor(p.id);
        Self::new(
            TimelineKind::Processor(p.id),
            format!("Processor {}", p.id),
            format!("P{}", p.id),
            vec![Track::new(TrackKind::Processor, link, p.spans.clone())],
        )
    }

    pub fn machine(m: &Machine) -> Self {
        let link = ObjectLink::Machine(m.id);
        Self::new(
            TimelineKind::Machine(m.id),
            format!("Machine {}", m.id),
            format!("M{}", m.id),
            vec![
                Track::new(
                    TrackKind::Machine(MachineLane::Processors),
                    link,
                    m.spans.clone(),
                ),
                Track::new(
                    TrackKind::Machine(MachineLane::Goroutines),
                    link,
                    m.goroutines.clone(),
                ),
            ],
        )
    }

    pub fn kind(&self) -> TimelineKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Earliest start across non-empty tracks, 0 if all are empty.
    pub fn start(&self) -> Timestamp {
        self.tracks
            .iter()
            .filter(|t| !t.is_empty())
            .map(Track::start)
            .min()
            .unwrap_or(0)
    }

    pub fn end(&self) -> Timestamp {
        self.tracks
            .iter()
            .filter(|t| !t.is_empty())
            .map(Track::end)
            .max()
            .unwrap_or(0)
    }

    /// Time-in-state breakdown over the whole trace, computed on first use.
    pub fn statistics(&self, trace: &Trace) -> Result<&Statistics, InternalError> {
        self.stats
            .get_or_init(|| {
                let _span =
                    tracing::debug_span!("timeline_statistics", timeline = %self.label).entered();
                compute_statistics(self.kind, &self.tracks, trace)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn tooltip(&self, trace: &Trace) -> Result<String, InternalError> {
        let stats = self.statistics(trace)?;
        let head = match self.kind {
            TimelineKind::Goroutine(_) => capitalize(&self.label),
            _ => self.label.clone(),
        };

        let spans = format_count(stats.span_count() as u64);
        let mut lines = vec![head, format!("Spans: {spans}")];
        for category in stats.categories() {
            lines.push(stats.line(&format!("Time {}", category.name), category.duration));
        }
        lines.push(stats.line("Time inactive", stats.inactive()));
        Ok(lines.join("\n"))
    }

    /// "Scroll to <label>", for the command palette.
    pub fn command(&self) -> Command {
        let link = self.kind.link();
        Command::new(format!("Scroll to {}", self.label), move || {
            Action::ScrollToObject(link)
        })
        .category("Timeline")
        .alias(self.short_name.clone())
    }
}

impl PartialEq for Timeline {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Timeline {}

impl PartialOrd for Timeline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timeline {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind.cmp(&other.kind)
    }
}

fn compute_statistics(
    kind: TimelineKind,
    tracks: &[Track],
    trace: &Trace,
) -> Result<Statistics, InternalError> {
    let total = trace.end();
    let spans = tracks.first().map_or_else(ItemsView::empty, Track::spans);

    match kind {
        TimelineKind::Machine(_) => aggregate(
            spans,
            total,
            &["running processors", "blocked in syscalls"],
            |span| -> Result<Option<&'static str>, InternalError> {
                let event = trace.event(span.event)?;
                match event.kind {
                    EventKind::ProcStart => Ok(Some("running processors")),
                    EventKind::GoSysBlock => Ok(Some("blocked in syscalls")),
                    kind => Err(InternalError::UnexpectedEventKind {
                        event: span.event,
                        kind,
                    }),
                }
            },
        ),
        TimelineKind::Goroutine(_) => aggregate(
            spans,
            total,
            &["running", "blocked", "ready", "in GC assist"],
            |span| match span.state {
                SpanState::Active => Ok(Some("running")),
                SpanState::GcMarkAssist | SpanState::BlockedGc => Ok(Some("in GC assist")),
                state if state.is_blocked() => Ok(Some("blocked")),
                SpanState::Ready => Ok(Some("ready")),
                SpanState::RunningP | SpanState::RunningG => Err(InternalError::UnexpectedState {
                    kind: TrackKind::Goroutine,
                    state: span.state,
                }),
                _ => Ok(None),
            },
        ),
        TimelineKind::Processor(_) => aggregate(
            spans,
            total,
            &["running goroutines", "in GC"],
            |span| match span.state {
                SpanState::RunningG => Ok(Some("running goroutines")),
                state if state.is_gc() => Ok(Some("in GC")),
                state => Err(InternalError::UnexpectedState {
                    kind: TrackKind::Processor,
                    state,
                }),
            },
        ),
    }
}

/// One timeline per entity of the trace, in display order.
pub fn build_timelines(trace: &Trace) -> Vec<Timeline> {
    let _span = tracing::info_span!("build_timelines").entered();
    let mut timelines: Vec<Timeline> = trace
        .processors()
        .iter()
        .map(Timeline::processor)
        .chain(trace.machines().iter().map(Timeline::machine))
        .chain(trace.goroutines().iter().map(|g| Timeline::goroutine(trace, g)))
        .collect();
    timelines.sort();
    log::debug!("built {} timelines", timelines.len());
    timelines
}

pub fn timeline_commands(timelines: &[Timeline]) -> CommandSlice {
    timelines.iter().map(Timeline::command).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::query_terms;
    use crate::span::Span;
    use crate::trace::{Event, EventId};

    fn event(kind: EventKind, ts: i64) -> Event {
        Event {
            timestamp: ts,
            kind,
            processor: Some(ProcessorId(0)),
            goroutine: None,
        }
    }

    fn machine_trace(kinds: [EventKind; 2]) -> Trace {
        Trace::new(
            vec![event(kinds[0], 0), event(kinds[1], 30), event(EventKind::GoEnd, 100)],
            Vec::new(),
            Vec::new(),
            vec![Machine::new(
                MachineId(1),
                vec![
                    Span::new(0, 30, SpanState::RunningP, EventId(0)),
                    Span::new(30, 50, SpanState::BlockedSyscall, EventId(1)),
                ],
                Vec::new(),
            )],
        )
    }

    #[test]
    fn machine_tooltip_breaks_down_time() {
        let trace = machine_trace([EventKind::ProcStart, EventKind::GoSysBlock]);
        let timeline = Timeline::machine(&trace.machines()[0]);
        assert_eq!(
            timeline.tooltip(&trace).unwrap(),
            "Machine 1\n\
             Spans: 2\n\
             Time running processors: 30ns (30.00%)\n\
             Time blocked in syscalls: 20ns (20.00%)\n\
             Time inactive: 50ns (50.00%)"
        );
    }

    #[test]
    fn machine_statistics_reject_foreign_events() {
        let trace = machine_trace([EventKind::ProcStart, EventKind::GoUnblock]);
        let timeline = Timeline::machine(&trace.machines()[0]);
        let expected = InternalError::UnexpectedEventKind {
            event: EventId(1),
            kind: EventKind::GoUnblock,
        };
        assert_eq!(timeline.statistics(&trace).unwrap_err(), expected);
        // Memoised, including the failure.
        assert_eq!(timeline.tooltip(&trace).unwrap_err(), expected);
    }

    #[test]
    fn machines_own_two_tracks() {
        let trace = machine_trace([EventKind::ProcStart, EventKind::GoSysBlock]);
        let timeline = Timeline::machine(&trace.machines()[0]);
        let kinds: Vec<_> = timeline.tracks().iter().map(Track::kind).collect();
        assert_eq!(
            kinds,
            vec![
                TrackKind::Machine(MachineLane::Processors),
                TrackKind::Machine(MachineLane::Goroutines)
            ]
        );
        assert_eq!((timeline.start(), timeline.end()), (0, 50));
    }

    #[test]
    fn goroutine_tooltip_uses_states() {
        let g = Goroutine::new(
            GoroutineId(3),
            Some("main.main"),
            vec![
                Span::new(0, 10, SpanState::Active, EventId(0)),
                Span::new(10, 15, SpanState::BlockedRecv, EventId(0)),
                Span::new(15, 20, SpanState::Active, EventId(0)),
            ],
        );
        let trace = Trace::new(Vec::new(), vec![g], Vec::new(), Vec::new());
        let timeline = Timeline::goroutine(&trace, &trace.goroutines()[0]);
        let stats = timeline.statistics(&trace).unwrap();
        assert_eq!(stats.duration_of("running"), 15);
        assert_eq!(stats.duration_of("blocked"), 5);
        assert_eq!(stats.inactive(), 0);
        assert!(timeline
            .tooltip(&trace)
            .unwrap()
            .starts_with("Goroutine 3: main.main\nSpans: 3\nTime running: 15ns (75.00%)"));
    }

    #[test]
    fn timelines_sort_by_kind_then_id() {
        let trace = Trace::new(
            Vec::new(),
            vec![Goroutine::new(GoroutineId(1), None, Vec::new())],
            vec![
                Processor::new(ProcessorId(1), Vec::new()),
                Processor::new(ProcessorId(0), Vec::new()),
            ],
            vec![Machine::new(MachineId(0), Vec::new(), Vec::new())],
        );
        let labels: Vec<_> = build_timelines(&trace)
            .iter()
            .map(|t| t.label().to_owned())
            .collect();
        assert_eq!(
            labels,
            vec!["Processor 0", "Processor 1", "Machine 0", "goroutine 1"]
        );
    }

    #[test]
    fn scroll_commands_match_short_names() {
        let p = Processor::new(ProcessorId(7), Vec::new());
        let cmd = Timeline::processor(&p).command();
        assert_eq!(cmd.primary(), "Scroll to Processor 7");
        assert!(cmd.matches(&query_terms("p7")));
        assert!(matches!(
            cmd.link(),
            Action::ScrollToObject(ObjectLink::Processor(ProcessorId(7)))
        ));
    }

    #[test]
    fn empty_trace_has_no_inactive_drift() {
        let p = Processor::new(ProcessorId(0), Vec::new());
        let trace = Trace::default();
        let timeline = Timeline::processor(&p);
        let stats = timeline.statistics(&trace).unwrap();
        assert_eq!(stats.inactive(), 0);
        assert_eq!(stats.percent(stats.inactive()), 0.0);
    }
}
