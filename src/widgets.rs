//! egui adapters over the interaction core.
//!
//! Widgets here only paint and collect input. Anything they decide is
//! returned as an [`Action`](crate::action::Action) or handed to the
//! corresponding core type.

mod histogram;
mod palette;
mod track;

pub use histogram::{HistogramPlot, HistogramView, PlotResponse};
pub use palette::{consume_palette_keys, PaletteModal};
pub use track::{TrackResponse, TrackView};
