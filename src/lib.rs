//! Span indexing and interaction for execution trace timelines.
//!
//! The core is independent of any windowing toolkit: [`track::Track`]
//! answers range queries and builds labels, tooltips and menus,
//! [`timeline::Timeline`] groups tracks and aggregates their statistics,
//! and [`palette::CommandPalette`] runs the keyboard-driven command search.
//! [`widgets`] paints all of it with egui.

pub mod action;
pub mod command;
pub mod config;
pub mod error;
pub mod format;
pub mod future;
pub mod histogram;
pub mod items;
pub mod palette;
pub mod prelude;
pub mod registry;
pub mod span;
pub mod stats;
pub mod themes;
pub mod timeline;
pub mod trace;
pub mod track;
pub mod widgets;

pub use egui;
