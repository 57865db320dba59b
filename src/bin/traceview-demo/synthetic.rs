//! A deterministic fake trace for the demo shell.

use traceview::span::{Span, SpanState};
use traceview::trace::{
    Event, EventId, EventKind, Goroutine, GoroutineId, Machine, MachineId, Processor, ProcessorId,
    Timestamp, Trace,
};

const PROCESSORS: i32 = 4;
const MACHINES: i64 = 2;
const GOROUTINES: u64 = 24;
const END: Timestamp = 50_000_000;

const FUNCTIONS: [&str; 6] = [
    "main.main",
    "net/http.(*conn).serve",
    "main.worker",
    "runtime.gcBgMarkWorker",
    "runtime.bgsweep",
    "main.(*cache).evict",
];

/// Xorshift, enough to make the demo look busy.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn between(&mut self, lo: i64, hi: i64) -> i64 {
        lo + (self.next() % (hi - lo).max(1) as u64) as i64
    }
}

#[derive(Default)]
struct Builder {
    events: Vec<Event>,
}

impl Builder {
    fn event(
        &mut self,
        timestamp: Timestamp,
        kind: EventKind,
        processor: Option<ProcessorId>,
        goroutine: Option<GoroutineId>,
    ) -> EventId {
        self.events.push(Event {
            timestamp,
            kind,
            processor,
            goroutine,
        });
        EventId(self.events.len() - 1)
    }
}

pub fn trace(seed: u64) -> Trace {
    let mut rng = Rng(seed.max(1));
    let mut b = Builder::default();

    let mut goroutine_spans: Vec<Vec<Span>> = vec![Vec::new(); GOROUTINES as usize];
    let mut processors = Vec::new();

    // Goroutine g only ever runs on processor g % PROCESSORS, so its own
    // spans never overlap.
    for p in 0..PROCESSORS {
        let pid = ProcessorId(p);
        let mine: Vec<u64> = (0..GOROUTINES).filter(|g| *g as i32 % PROCESSORS == p).collect();
        let mut spans = Vec::new();
        let mut t = rng.between(0, 20_000);
        while t < END {
            let len = match rng.next() % 10 {
                0 => rng.between(500_000, 3_000_000),
                1..=3 => rng.between(200, 2_000),
                _ => rng.between(10_000, 200_000),
            };
            let end = (t + len).min(END);
            if rng.next() % 25 == 0 {
                let ev = b.event(t, EventKind::GcStart, Some(pid), None);
                spans.push(Span::new(t, end, SpanState::GcDedicated, ev));
            } else {
                let g = mine[(rng.next() % mine.len() as u64) as usize];
                let gid = GoroutineId(g);
                let ev = b.event(t, EventKind::GoStart, Some(pid), Some(gid));
                spans.push(Span::new(t, end, SpanState::RunningG, ev));

                let own = &mut goroutine_spans[g as usize];
                let last_end = own.last().map_or(0, |s: &Span| s.end);
                if t > last_end {
                    let waiting = if rng.next() % 3 == 0 {
                        SpanState::BlockedNet
                    } else {
                        SpanState::Ready
                    };
                    let wait_ev = b.event(last_end, EventKind::GoUnblock, Some(pid), Some(gid));
                    own.push(Span::new(last_end, t, waiting, wait_ev));
                }
                own.push(Span::new(t, end, SpanState::Active, ev));
            }
            t = end + rng.between(0, 40_000);
        }
        processors.push(Processor::new(pid, spans));
    }

    let goroutines = goroutine_spans
        .into_iter()
        .enumerate()
        .map(|(g, spans)| {
            let function = FUNCTIONS[g % FUNCTIONS.len()];
            Goroutine::new(GoroutineId(g as u64), Some(function), spans)
        })
        .collect();

    let machines = (0..MACHINES)
        .map(|m| {
            let pid = ProcessorId(m as i32);
            let mut spans = Vec::new();
            let mut t = 0;
            while t < END {
                let running = (t + rng.between(2_000_000, 8_000_000)).min(END);
                let ev = b.event(t, EventKind::ProcStart, Some(pid), None);
                spans.push(Span::new(t, running, SpanState::RunningP, ev));
                if running >= END {
                    break;
                }
                let blocked = (running + rng.between(50_000, 400_000)).min(END);
                let ev = b.event(running, EventKind::GoSysBlock, Some(pid), None);
                spans.push(Span::new(running, blocked, SpanState::BlockedSyscall, ev));
                t = blocked;
            }
            let running_goroutines = processors
                .get(m as usize)
                .map(|p: &Processor| {
                    p.spans
                        .iter()
                        .filter(|s| s.state == SpanState::RunningG)
                        .copied()
                        .collect()
                })
                .unwrap_or_default();
            Machine::new(MachineId(m), spans, running_goroutines)
        })
        .collect();

    Trace::new(b.events, goroutines, processors, machines)
}
