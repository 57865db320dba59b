//! Duration histograms computed in the background.

use std::sync::Arc;

use crate::config::{DEFAULT_HISTOGRAM_BINS, MAX_HISTOGRAM_BINS};
use crate::format::format_duration;
use crate::future::{CancelToken, Future, FutureState};

/// Shown while the first result is being computed.
pub const COMPUTING_LABEL: &str = "Computing histogram…";

const CANCEL_CHECK_INTERVAL: usize = 4096;

/// What to compute. `start == end == 0` selects the data's own range and
/// `bins == 0` the default bin count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistogramConfig {
    pub start: i64,
    pub end: i64,
    pub bins: usize,
    pub reject_outliers: bool,
}

impl HistogramConfig {
    pub fn is_auto_range(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    config: HistogramConfig,
    counts: Vec<u64>,
    rejected: usize,
}

impl Histogram {
    /// Bins `data` (durations in nanoseconds). Returns `None` if `token` was
    /// cancelled along the way.
    pub fn compute(
        config: HistogramConfig,
        data: &[i64],
        token: &CancelToken,
    ) -> Option<Histogram> {
        let _span = tracing::info_span!("histogram_compute", values = data.len()).entered();

        let fence = if config.reject_outliers {
            tukey_fence(data, token)?
        } else {
            None
        };
        let keep = |v: i64| fence.map_or(true, |f| v <= f);

        let mut config = config;
        if config.bins == 0 {
            config.bins = DEFAULT_HISTOGRAM_BINS;
        }
        config.bins = config.bins.min(MAX_HISTOGRAM_BINS);
        if config.is_auto_range() || config.start > config.end {
            let mut kept = data.iter().copied().filter(|&v| keep(v));
            let (lo, hi) = match kept.next() {
                Some(first) => kept.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))),
                None => (0, 0),
            };
            config.start = lo;
            config.end = hi;
        }

        let mut counts = vec![0u64; config.bins];
        let mut rejected = 0;
        let width = i128::from(config.end) - i128::from(config.start) + 1;
        for (i, &v) in data.iter().enumerate() {
            if i % CANCEL_CHECK_INTERVAL == 0 && token.is_cancelled() {
                return None;
            }
            if !keep(v) {
                rejected += 1;
                continue;
            }
            if v < config.start || v > config.end {
                continue;
            }
            let offset = i128::from(v) - i128::from(config.start);
            let bin = (offset * config.bins as i128 / width) as usize;
            counts[bin.min(config.bins - 1)] += 1;
        }

        Some(Histogram {
            config,
            counts,
            rejected,
        })
    }

    /// The config with defaults filled in.
    pub fn config(&self) -> HistogramConfig {
        self.config
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Number of values dropped as outliers.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// The half-open value range `[lo, hi)` of bin `idx`.
    pub fn bin_range(&self, idx: usize) -> (i64, i64) {
        let width = i128::from(self.config.end) - i128::from(self.config.start) + 1;
        let bins = self.config.bins.max(1) as i128;
        let at = |i: usize| (i128::from(self.config.start) + i as i128 * width / bins) as i64;
        (at(idx), at(idx + 1))
    }

    pub fn bin_label(&self, idx: usize) -> String {
        format_duration(self.bin_range(idx).0)
    }

    pub fn bin_tooltip(&self, idx: usize) -> String {
        let (lo, hi) = self.bin_range(idx);
        let count = self.counts.get(idx).copied().unwrap_or(0);
        format!("{} – {}\nCount: {count}", format_duration(lo), format_duration(hi))
    }
}

/// `q3 + 1.5 * (q3 - q1)` over `data`, or `None` for too little data.
/// The outer `None` means cancelled.
fn tukey_fence(data: &[i64], token: &CancelToken) -> Option<Option<i64>> {
    if data.len() < 4 {
        return Some(None);
    }
    let mut quantiles = match hdrhistogram::Histogram::<u64>::new(3) {
        Ok(h) => h,
        Err(err) => {
            log::warn!("outlier rejection unavailable: {err}");
            return Some(None);
        }
    };
    for (i, &v) in data.iter().enumerate() {
        if i % CANCEL_CHECK_INTERVAL == 0 && token.is_cancelled() {
            return None;
        }
        quantiles.saturating_record(v.max(0) as u64);
    }
    let q1 = quantiles.value_at_quantile(0.25) as i64;
    let q3 = quantiles.value_at_quantile(0.75) as i64;
    Some(Some(q3.saturating_add((q3 - q1).saturating_mul(3) / 2)))
}

/// The settings dialog's editable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramSettings {
    pub num_bins_text: String,
    pub reject_outliers: bool,
}

impl HistogramSettings {
    pub fn from_config(config: &HistogramConfig) -> Self {
        Self {
            num_bins_text: config.bins.to_string(),
            reject_outliers: config.reject_outliers,
        }
    }

    pub fn reset(&mut self, config: &HistogramConfig) {
        *self = Self::from_config(config);
    }

    /// The entered bin count, or the default if it is not a number in
    /// `1..=9999`.
    pub fn num_bins(&self) -> usize {
        match self.num_bins_text.trim().parse::<i64>() {
            Ok(n) if (1..=MAX_HISTOGRAM_BINS as i64).contains(&n) => n as usize,
            _ => DEFAULT_HISTOGRAM_BINS,
        }
    }

    /// Whether the dialog may be saved.
    pub fn is_valid(&self) -> bool {
        self.num_bins_text.chars().count() <= 4
    }
}

/// Entries of the histogram's context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramMenuItem {
    ChangeSettings,
    ZoomOut,
}

impl HistogramMenuItem {
    pub const ALL: [HistogramMenuItem; 2] = [
        HistogramMenuItem::ChangeSettings,
        HistogramMenuItem::ZoomOut,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HistogramMenuItem::ChangeSettings => "Change settings",
            HistogramMenuItem::ZoomOut => "Zoom out",
        }
    }
}

/// A histogram over a fixed data set that recomputes whenever its config
/// changes.
pub struct InteractiveHistogram {
    config: HistogramConfig,
    data: Arc<[i64]>,
    future: Future<Histogram>,
    settings: HistogramSettings,
    settings_synced: bool,
    pub settings_open: bool,
    changed: bool,
}

impl InteractiveHistogram {
    pub fn new(config: HistogramConfig) -> Self {
        Self {
            config,
            data: Arc::from(Vec::new()),
            future: Future::new(),
            settings: HistogramSettings::from_config(&config),
            settings_synced: false,
            settings_open: false,
            changed: false,
        }
    }

    /// Called from the worker when a result lands.
    pub fn with_notify(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.future = Future::new().with_notify(notify);
        self
    }

    pub fn config(&self) -> HistogramConfig {
        self.config
    }

    /// Replaces the data and starts computing.
    pub fn set(&mut self, data: Arc<[i64]>) {
        self.data = data;
        self.restart();
    }

    fn restart(&mut self) {
        let config = self.config;
        let data = Arc::clone(&self.data);
        self.settings_synced = false;
        if data.is_empty() {
            if let Some(hist) = Histogram::compute(config, &data, &CancelToken::new()) {
                self.future.set(hist);
                return;
            }
        }
        self.future.start_fallible(move |token| {
            Histogram::compute(config, &data, token).ok_or("cancelled")
        });
    }

    /// Polls the computation. The settings dialog is refreshed from the
    /// effective config once the result is in.
    pub fn state(&mut self) -> FutureState<'_, Histogram> {
        if !self.settings_synced {
            if let Some(effective) = self.future.result().map(Histogram::config) {
                self.settings.reset(&effective);
                self.settings_synced = true;
            }
        }
        self.future.poll()
    }

    /// Zooms to the value range covered by bins `first..=last` of the
    /// current result.
    pub fn zoom_to(&mut self, first: usize, last: usize) {
        let Some(hist) = self.future.value() else {
            return;
        };
        let (first, last) = (first.min(last), first.max(last));
        let start = hist.bin_range(first).0;
        let end = hist.bin_range(last).1 - 1;
        self.config.start = start;
        self.config.end = end.max(start);
        self.mark_changed();
    }

    /// Back to the data's own range.
    pub fn zoom_out(&mut self) {
        self.config.start = 0;
        self.config.end = 0;
        self.mark_changed();
    }

    pub fn apply(&mut self, item: HistogramMenuItem) {
        match item {
            HistogramMenuItem::ChangeSettings => self.settings_open = true,
            HistogramMenuItem::ZoomOut => self.zoom_out(),
        }
    }

    pub fn settings(&self) -> &HistogramSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut HistogramSettings {
        &mut self.settings
    }

    /// Applies the dialog. Returns false, leaving everything as it was, if
    /// the dialog is invalid.
    pub fn save_settings(&mut self) -> bool {
        if !self.settings.is_valid() {
            return false;
        }
        self.config.bins = self.settings.num_bins();
        self.config.reject_outliers = self.settings.reject_outliers;
        self.settings_open = false;
        self.mark_changed();
        true
    }

    /// Discards the dialog's edits.
    pub fn cancel_settings(&mut self) {
        self.settings.reset(&self.config);
        self.settings_open = false;
    }

    fn mark_changed(&mut self) {
        self.changed = true;
        self.restart();
    }

    /// Whether the config changed since the last call.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::{Duration, Instant};

    fn settle(hist: &mut InteractiveHistogram) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while hist.state().is_pending() {
            assert!(Instant::now() < deadline, "histogram never settled");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn defaults_are_filled_in() {
        let data: Vec<i64> = (0..100).collect();
        let hist =
            Histogram::compute(HistogramConfig::default(), &data, &CancelToken::new()).unwrap();
        let config = hist.config();
        assert_eq!((config.start, config.end, config.bins), (0, 99, 100));
        assert!(hist.counts().iter().all(|&c| c == 1));
    }

    #[test]
    fn every_value_lands_in_a_bin() {
        let data = [5, 5, 6, 100, 250, 1_000];
        let config = HistogramConfig {
            bins: 7,
            ..Default::default()
        };
        let hist = Histogram::compute(config, &data, &CancelToken::new()).unwrap();
        assert_eq!(hist.counts().iter().sum::<u64>(), data.len() as u64);
        assert_eq!(hist.counts()[6], 1);
        assert_eq!(hist.bin_range(0).0, 5);
        assert_eq!(hist.bin_range(6).1, 1_001);
    }

    #[test]
    fn outliers_above_the_fence_are_dropped() {
        let mut data: Vec<i64> = (100..200).collect();
        data.push(1_000_000);
        let config = HistogramConfig {
            bins: 10,
            reject_outliers: true,
            ..Default::default()
        };
        let hist = Histogram::compute(config, &data, &CancelToken::new()).unwrap();
        assert_eq!(hist.rejected(), 1);
        assert_eq!(hist.config().end, 199);
    }

    #[test]
    fn cancelled_computation_yields_nothing() {
        let token = CancelToken::new();
        token.cancel();
        assert!(Histogram::compute(HistogramConfig::default(), &[1, 2, 3], &token).is_none());
    }

    #[rstest]
    #[case::plain("42", 42)]
    #[case::max("9999", 9999)]
    #[case::zero("0", 100)]
    #[case::too_many("10000", 100)]
    #[case::empty("", 100)]
    #[case::negative("-5", 100)]
    fn bin_count_parsing(#[case] text: &str, #[case] expected: usize) {
        let settings = HistogramSettings {
            num_bins_text: text.to_owned(),
            reject_outliers: false,
        };
        assert_eq!(settings.num_bins(), expected);
    }

    #[test]
    fn long_bin_text_cannot_be_saved() {
        let mut hist = InteractiveHistogram::new(HistogramConfig::default());
        hist.settings_mut().num_bins_text = "12345".into();
        assert!(!hist.save_settings());
        assert!(!hist.take_changed());

        hist.settings_mut().num_bins_text = "20".into();
        hist.settings_mut().reject_outliers = true;
        assert!(hist.save_settings());
        assert!(hist.take_changed());
        assert_eq!(hist.config().bins, 20);
        assert!(hist.config().reject_outliers);
    }

    #[test]
    fn cancel_restores_from_config() {
        let mut hist = InteractiveHistogram::new(HistogramConfig {
            bins: 30,
            ..Default::default()
        });
        hist.settings_mut().num_bins_text = "7".into();
        hist.cancel_settings();
        assert_eq!(hist.settings().num_bins_text, "30");
    }

    #[test]
    fn empty_data_is_ready_without_a_worker() {
        let mut hist = InteractiveHistogram::new(HistogramConfig::default());
        hist.set(Arc::from(Vec::new()));
        match hist.state() {
            FutureState::Ready(h) => assert_eq!(h.max_count(), 0),
            other => panic!("expected a ready histogram, got {other:?}"),
        }
        assert_eq!(hist.settings().num_bins_text, "100");
    }

    #[test]
    fn zoom_then_zoom_out() {
        let mut hist = InteractiveHistogram::new(HistogramConfig {
            bins: 10,
            ..Default::default()
        });
        hist.set((0..1000).collect::<Vec<i64>>().into());
        settle(&mut hist);
        assert_eq!(hist.settings().num_bins_text, "10");

        hist.zoom_to(2, 3);
        assert!(hist.take_changed());
        assert_eq!((hist.config().start, hist.config().end), (200, 399));

        settle(&mut hist);
        hist.apply(HistogramMenuItem::ZoomOut);
        assert!(hist.config().is_auto_range());
        settle(&mut hist);
        match hist.state() {
            FutureState::Ready(h) => assert_eq!(h.config().end, 999),
            other => panic!("unexpected state {other:?}"),
        }
    }
}
