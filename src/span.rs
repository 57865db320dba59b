use std::fmt;

use crate::trace::{EventId, Timestamp};

/// The state an entity was in for the duration of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanState {
    Inactive,
    Created,
    Ready,
    Active,
    Stuck,
    Done,
    Blocked,
    BlockedSend,
    BlockedRecv,
    BlockedSelect,
    BlockedSync,
    BlockedCond,
    BlockedNet,
    BlockedGc,
    BlockedSyscall,
    GcMarkAssist,
    GcSweep,
    GcIdle,
    GcDedicated,
    GcFractional,
    /// A machine is running a processor.
    RunningP,
    /// A processor (or machine) is running a goroutine.
    RunningG,
}

impl SpanState {
    /// Human readable description used in labels and tooltips.
    pub fn description(self) -> &'static str {
        match self {
            SpanState::Inactive => "inactive",
            SpanState::Created => "not yet started",
            SpanState::Ready => "ready",
            SpanState::Active => "running",
            SpanState::Stuck => "stuck",
            SpanState::Done => "returned",
            SpanState::Blocked => "blocked",
            SpanState::BlockedSend => "blocked on channel send",
            SpanState::BlockedRecv => "blocked on channel recv",
            SpanState::BlockedSelect => "blocked in select",
            SpanState::BlockedSync => "blocked on mutex",
            SpanState::BlockedCond => "blocked on condition variable",
            SpanState::BlockedNet => "blocked on polled I/O",
            SpanState::BlockedGc => "blocked on GC assist",
            SpanState::BlockedSyscall => "blocked in syscall",
            SpanState::GcMarkAssist => "GC mark assist",
            SpanState::GcSweep => "GC sweeping",
            SpanState::GcIdle => "GC idle",
            SpanState::GcDedicated => "GC dedicated",
            SpanState::GcFractional => "GC fractional",
            SpanState::RunningP => "running processor",
            SpanState::RunningG => "running goroutine",
        }
    }

    pub fn is_blocked(self) -> bool {
        matches!(
            self,
            SpanState::Blocked
                | SpanState::BlockedSend
                | SpanState::BlockedRecv
                | SpanState::BlockedSelect
                | SpanState::BlockedSync
                | SpanState::BlockedCond
                | SpanState::BlockedNet
                | SpanState::BlockedGc
                | SpanState::BlockedSyscall
        )
    }

    pub fn is_gc(self) -> bool {
        matches!(
            self,
            SpanState::GcMarkAssist
                | SpanState::GcSweep
                | SpanState::GcIdle
                | SpanState::GcDedicated
                | SpanState::GcFractional
        )
    }
}

/// A maximal interval during which one entity stayed in one state.
///
/// `event` is an index into the trace's event log, not an owning reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Timestamp,
    pub end: Timestamp,
    pub state: SpanState,
    pub event: EventId,
}

impl Span {
    pub fn new(start: Timestamp, end: Timestamp, state: SpanState, event: EventId) -> Self {
        debug_assert!(start <= end, "span ends before it starts");
        Self {
            start,
            end,
            state,
            event,
        }
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Whether `[start, end)` intersects `range`. Nothing intersects an
    /// empty range.
    pub fn overlaps(&self, range: TimeRange) -> bool {
        !range.is_empty() && self.start < range.end && self.end > range.start
    }
}

/// A half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    /// Builds a range, swapping the bounds if they are reversed.
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && ts < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
