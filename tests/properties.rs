use std::sync::Arc;

use proptest::prelude::*;
use traceview::action::{Action, ObjectLink};
use traceview::command::{Command, CommandSlice};
use traceview::items::ItemsView;
use traceview::palette::{CommandPalette, PaletteKey};
use traceview::registry::CommandSet;
use traceview::span::{Span, SpanState, TimeRange};
use traceview::stats::aggregate;
use traceview::trace::{EventId, GoroutineId};
use traceview::track::{Track, TrackKind};

const STATES: [SpanState; 4] = [
    SpanState::Active,
    SpanState::Ready,
    SpanState::Blocked,
    SpanState::Inactive,
];

/// Sorted, non-overlapping spans built from (gap, length, state) triples.
fn spans_strategy() -> impl Strategy<Value = Vec<Span>> {
    prop::collection::vec((0i64..50, 0i64..50, 0usize..STATES.len()), 0..40).prop_map(|parts| {
        let mut t = 0;
        parts
            .into_iter()
            .enumerate()
            .map(|(i, (gap, len, state))| {
                let start = t + gap;
                t = start + len;
                Span::new(start, t, STATES[state], EventId(i))
            })
            .collect()
    })
}

fn goroutine_track(spans: Vec<Span>) -> Track {
    Track::new(
        TrackKind::Goroutine,
        ObjectLink::Goroutine(GoroutineId(1)),
        Arc::from(spans),
    )
}

fn palette(labels: &[String]) -> CommandPalette {
    let commands: CommandSlice = labels
        .iter()
        .map(|label| Command::new(label.clone(), || Action::ClosePanel))
        .collect();
    CommandPalette::new(CommandSet::from_providers(vec![Arc::new(commands)]))
}

fn filtered_labels(palette: &CommandPalette) -> Vec<String> {
    (0..palette.len())
        .filter_map(|row| palette.row(row))
        .map(|cmd| cmd.primary().to_owned())
        .collect()
}

proptest! {
    #[test]
    fn query_returns_exactly_the_intersecting_spans(
        spans in spans_strategy(),
        a in -10i64..2100,
        b in -10i64..2100,
    ) {
        let range = TimeRange::new(a, b);
        let expected: Vec<Span> = spans
            .iter()
            .filter(|s| s.start < range.end && s.end > range.start && !range.is_empty())
            .copied()
            .collect();
        let track = goroutine_track(spans);
        let view = track.query(range);
        prop_assert_eq!(view.as_slice(), expected.as_slice());
        prop_assert!(view.iter().zip(view.iter().skip(1)).all(|(x, y)| x.start <= y.start));
    }

    #[test]
    fn subslices_compose(
        spans in spans_strategy(),
        outer in (0usize..40, 0usize..40),
        inner in (0usize..40, 0usize..40),
    ) {
        let view = ItemsView::new(&spans);
        let (o_start, o_end) = (outer.0.min(outer.1), outer.0.max(outer.1));
        let (i_start, i_end) = (inner.0.min(inner.1), inner.0.max(inner.1));

        let twice = view.subslice(o_start..o_end).subslice(i_start..i_end);
        let narrowed = view.subslice(o_start..o_end);
        let start = (o_start + i_start).min(o_start + narrowed.len());
        let end = (o_start + i_end).min(o_start + narrowed.len());
        let once = view.subslice(start..end.max(start));

        prop_assert_eq!(twice.as_slice(), once.as_slice());
        prop_assert_eq!(twice.original_range(), once.original_range());
    }

    #[test]
    fn filtering_is_idempotent(
        labels in prop::collection::vec("[a-c]{1,3}( [a-c]{1,3})?", 0..20),
        query in "[a-c ]{0,4}",
    ) {
        let mut first = palette(&labels);
        first.set_query(&query);
        let once = filtered_labels(&first);

        let mut second = palette(&once);
        second.set_query(&query);
        prop_assert_eq!(filtered_labels(&second), once);
    }

    #[test]
    fn up_then_down_returns_home(
        len in 2usize..30,
        start in 0usize..30,
        up_first in any::<bool>(),
    ) {
        let labels: Vec<String> = (0..len).map(|i| format!("cmd {i}")).collect();
        let mut p = palette(&labels);
        let start = start % len;
        p.hover(start);

        let (there, back) = if up_first {
            (PaletteKey::Up, PaletteKey::Down)
        } else {
            (PaletteKey::Down, PaletteKey::Up)
        };
        p.handle_key(there);
        prop_assert!((-1..len as isize).contains(&p.active_index()));
        p.handle_key(back);
        prop_assert_eq!(p.active(), Some(start));
    }

    #[test]
    fn categories_and_inactive_sum_to_total(
        spans in spans_strategy(),
        slack in 0i64..100,
    ) {
        let total = spans.last().map_or(0, |s| s.end) + slack;
        let stats = aggregate(
            &spans,
            total,
            &["running", "ready", "blocked"],
            |span| -> Result<Option<&'static str>, std::convert::Infallible> {
                Ok(match span.state {
                    SpanState::Active => Some("running"),
                    SpanState::Ready => Some("ready"),
                    SpanState::Blocked => Some("blocked"),
                    _ => None,
                })
            },
        )
        .unwrap();
        let categorised: i64 = stats.categories().iter().map(|c| c.duration).sum();
        prop_assert_eq!(categorised + stats.inactive(), total);
        prop_assert_eq!(stats.span_count(), spans.len());
    }
}
