/// Tunables of the interaction layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    /// Spans narrower than this many pixels are coalesced with their
    /// neighbours.
    pub coalesce_min_px: f32,
    pub histogram_bins: usize,
    pub palette_prompt: String,
    pub palette_width: f32,
    pub palette_max_height: f32,
}

pub const DEFAULT_PALETTE_PROMPT: &str = "Type your command here";
pub const DEFAULT_HISTOGRAM_BINS: usize = 100;
pub const MAX_HISTOGRAM_BINS: usize = 9999;

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            coalesce_min_px: 4.0,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            palette_prompt: DEFAULT_PALETTE_PROMPT.to_owned(),
            palette_width: 600.0,
            palette_max_height: 300.0,
        }
    }
}

impl ViewConfig {
    /// Defaults, overridden by `TRACEVIEW_COALESCE_PX`,
    /// `TRACEVIEW_HISTOGRAM_BINS` and `TRACEVIEW_PALETTE_PROMPT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let coalesce_min_px = lookup("TRACEVIEW_COALESCE_PX")
            .and_then(|s| s.trim().parse::<f32>().ok())
            .filter(|px| px.is_finite())
            .unwrap_or(defaults.coalesce_min_px)
            .clamp(0.0, 64.0);
        let histogram_bins = lookup("TRACEVIEW_HISTOGRAM_BINS")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(defaults.histogram_bins)
            .clamp(1, MAX_HISTOGRAM_BINS);
        let palette_prompt = lookup("TRACEVIEW_PALETTE_PROMPT")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.palette_prompt);

        Self {
            coalesce_min_px,
            histogram_bins,
            palette_prompt,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ViewConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ViewConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_overrides() {
        assert_eq!(config(&[]), ViewConfig::default());
        assert_eq!(ViewConfig::default().palette_prompt, "Type your command here");
    }

    #[test]
    fn overrides_are_parsed_and_clamped() {
        let cfg = config(&[
            ("TRACEVIEW_COALESCE_PX", "2.5"),
            ("TRACEVIEW_HISTOGRAM_BINS", "100000"),
            ("TRACEVIEW_PALETTE_PROMPT", "Go"),
        ]);
        assert_eq!(cfg.coalesce_min_px, 2.5);
        assert_eq!(cfg.histogram_bins, MAX_HISTOGRAM_BINS);
        assert_eq!(cfg.palette_prompt, "Go");
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let cfg = config(&[
            ("TRACEVIEW_COALESCE_PX", "wide"),
            ("TRACEVIEW_HISTOGRAM_BINS", "-3"),
            ("TRACEVIEW_PALETTE_PROMPT", "  "),
        ]);
        assert_eq!(cfg, ViewConfig::default());
    }
}
