//! Time-in-state breakdowns for tooltips and summaries.

use crate::format::{format_duration, format_percent};
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDuration {
    pub name: &'static str,
    pub duration: i64,
}

/// The result of one aggregation pass.
///
/// Durations are integers, so `categories + inactive == total` holds exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    categories: Vec<CategoryDuration>,
    inactive: i64,
    total: i64,
    spans: usize,
}

impl Statistics {
    pub fn categories(&self) -> &[CategoryDuration] {
        &self.categories
    }

    pub fn duration_of(&self, name: &str) -> i64 {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map_or(0, |c| c.duration)
    }

    /// Whatever the categorised spans do not cover.
    pub fn inactive(&self) -> i64 {
        self.inactive
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn span_count(&self) -> usize {
        self.spans
    }

    /// Share of the total in percent. A zero-length total yields 0.
    pub fn percent(&self, duration: i64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * duration as f64 / self.total as f64
        }
    }

    /// `"{label}: {duration} ({percent})"`
    pub fn line(&self, label: &str, duration: i64) -> String {
        format!(
            "{label}: {} ({})",
            format_duration(duration),
            format_percent(self.percent(duration))
        )
    }
}

/// Single-pass reducer over spans.
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    total: i64,
    categories: Vec<CategoryDuration>,
    spans: usize,
}

impl StatisticsAggregator {
    pub fn new(total: i64) -> Self {
        Self {
            total,
            categories: Vec::new(),
            spans: 0,
        }
    }

    /// Pre-seeds categories so they are reported in this order, even when
    /// nothing gets recorded for them.
    pub fn with_categories(total: i64, names: &[&'static str]) -> Self {
        Self {
            total,
            categories: names
                .iter()
                .map(|&name| CategoryDuration { name, duration: 0 })
                .collect(),
            spans: 0,
        }
    }

    pub fn record(&mut self, category: &'static str, duration: i64) {
        self.spans += 1;
        match self.categories.iter_mut().find(|c| c.name == category) {
            Some(entry) => entry.duration += duration,
            None => self.categories.push(CategoryDuration {
                name: category,
                duration,
            }),
        }
    }

    /// Counts a span that belongs to no category. Its time ends up in
    /// inactive.
    pub fn skip(&mut self) {
        self.spans += 1;
    }

    pub fn finish(self) -> Statistics {
        let categorised: i64 = self.categories.iter().map(|c| c.duration).sum();
        Statistics {
            inactive: self.total - categorised,
            categories: self.categories,
            total: self.total,
            spans: self.spans,
        }
    }
}

/// Aggregates `spans` over `total` with a fallible classifier. `Ok(None)`
/// leaves a span uncategorised.
pub fn aggregate<'a, E>(
    spans: impl IntoIterator<Item = &'a Span>,
    total: i64,
    categories: &[&'static str],
    mut classify: impl FnMut(&Span) -> Result<Option<&'static str>, E>,
) -> Result<Statistics, E> {
    let mut agg = StatisticsAggregator::with_categories(total, categories);
    for span in spans {
        match classify(span)? {
            Some(category) => agg.record(category, span.duration()),
            None => agg.skip(),
        }
    }
    Ok(agg.finish())
}
