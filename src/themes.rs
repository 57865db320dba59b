use egui::style::Selection;
use egui::{Color32, Stroke, Style, Visuals};

use crate::span::SpanState;

pub mod colorhash;
mod ral;
use ral::RAL_COLORS;

/// Implemented by widgets that accept an explicit style override.
pub trait Styled: Sized {
    type Style: Clone;

    fn set_style(&mut self, style: Option<Self::Style>);

    fn styled(mut self, style: Self::Style) -> Self {
        self.set_style(Some(style));
        self
    }
}

/// Semantic color class of a span, resolved to pixels by [`span_color`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorIndex {
    Inactive,
    Created,
    Ready,
    Running,
    Stuck,
    Done,
    Blocked,
    BlockedSyscall,
    BlockedNet,
    Gc,
    Processor,
    /// A coalesced cluster whose spans disagree.
    Mixed,
}

impl ColorIndex {
    /// The default class for a state. Tracks may refine this.
    pub fn for_state(state: SpanState) -> Self {
        match state {
            SpanState::Inactive => ColorIndex::Inactive,
            SpanState::Created => ColorIndex::Created,
            SpanState::Ready => ColorIndex::Ready,
            SpanState::Active | SpanState::RunningG => ColorIndex::Running,
            SpanState::RunningP => ColorIndex::Processor,
            SpanState::Stuck => ColorIndex::Stuck,
            SpanState::Done => ColorIndex::Done,
            SpanState::BlockedSyscall => ColorIndex::BlockedSyscall,
            SpanState::BlockedNet => ColorIndex::BlockedNet,
            SpanState::BlockedGc
            | SpanState::GcMarkAssist
            | SpanState::GcSweep
            | SpanState::GcIdle
            | SpanState::GcDedicated
            | SpanState::GcFractional => ColorIndex::Gc,
            SpanState::Blocked
            | SpanState::BlockedSend
            | SpanState::BlockedRecv
            | SpanState::BlockedSelect
            | SpanState::BlockedSync
            | SpanState::BlockedCond => ColorIndex::Blocked,
        }
    }
}

pub fn span_color(index: ColorIndex, dark_mode: bool) -> Color32 {
    match index {
        ColorIndex::Inactive => {
            if dark_mode {
                ral(9004)
            } else {
                ral(7047)
            }
        }
        ColorIndex::Created => ral(7040),
        ColorIndex::Ready => ral(1018),
        ColorIndex::Running => ral(6018),
        ColorIndex::Stuck => ral(3020),
        ColorIndex::Done => ral(7046),
        ColorIndex::Blocked => ral(3014),
        ColorIndex::BlockedSyscall => ral(4008),
        ColorIndex::BlockedNet => ral(5015),
        ColorIndex::Gc => ral(1003),
        ColorIndex::Processor => ral(6033),
        ColorIndex::Mixed => ral(5021),
    }
}

// Color utilities: simple sRGB linear interpolation for quick palette derivation
pub fn blend(a: Color32, b: Color32, t: f32) -> Color32 {
    let r = (a.r() as f32 * (1.0 - t) + b.r() as f32 * t).round() as u8;
    let g = (a.g() as f32 * (1.0 - t) + b.g() as f32 * t).round() as u8;
    let bch = (a.b() as f32 * (1.0 - t) + b.b() as f32 * t).round() as u8;
    Color32::from_rgb(r, g, bch)
}

pub fn ral(num: u16) -> Color32 {
    RAL_COLORS
        .iter()
        .find(|(code, _, _)| *code == num)
        .map(|(_, _, c)| *c)
        .unwrap_or(Color32::from_rgb(0, 0, 0))
}

/// Style for the command palette modal.
#[derive(Clone, Debug)]
pub struct PaletteStyle {
    pub fill: Color32,
    pub outline: Color32,
    pub accent: Color32,
    pub active_fill: Color32,
    pub weak_text: Color32,
    pub width: f32,
    pub max_height: f32,
}

impl From<&Style> for PaletteStyle {
    fn from(style: &Style) -> Self {
        let visuals = &style.visuals;
        let fg = visuals.widgets.noninteractive.fg_stroke.color;
        Self {
            fill: visuals.window_fill,
            outline: visuals.window_stroke.color,
            accent: visuals.selection.stroke.color,
            active_fill: visuals.selection.bg_fill,
            weak_text: blend(fg, visuals.window_fill, 0.45),
            width: 600.0,
            max_height: 300.0,
        }
    }
}

/// Style for the histogram widget.
#[derive(Clone, Debug)]
pub struct HistogramStyle {
    pub outline: Color32,
    pub ink: Color32,
    pub grid: Color32,
    pub accent: Color32,
}

impl From<&Style> for HistogramStyle {
    fn from(style: &Style) -> Self {
        let visuals = &style.visuals;
        let ink = visuals.widgets.noninteractive.fg_stroke.color;
        Self {
            outline: blend(ink, visuals.panel_fill, 0.4),
            ink,
            grid: blend(ink, visuals.panel_fill, 0.85),
            accent: visuals.selection.stroke.color,
        }
    }
}

/// Style for span tracks.
#[derive(Clone, Debug)]
pub struct TrackStyle {
    pub dark_mode: bool,
    pub background: Color32,
    pub hover_outline: Color32,
    pub row_height: f32,
}

impl From<&Style> for TrackStyle {
    fn from(style: &Style) -> Self {
        let visuals = &style.visuals;
        Self {
            dark_mode: visuals.dark_mode,
            background: visuals.faint_bg_color,
            hover_outline: visuals.selection.stroke.color,
            row_height: 18.0,
        }
    }
}

/// Build visuals from the RAL palette.
pub fn industrial(
    foreground: Color32,
    background: Color32,
    accent: Color32,
    mut base_visuals: Visuals,
) -> Visuals {
    let border = blend(foreground, background, 0.4);

    base_visuals.window_fill = background;
    base_visuals.panel_fill = background;
    base_visuals.faint_bg_color = blend(background, foreground, 0.06);
    base_visuals.extreme_bg_color = blend(background, foreground, 0.05);
    base_visuals.selection = Selection {
        bg_fill: blend(background, foreground, 0.12),
        stroke: Stroke::new(1.5, accent),
    };
    base_visuals.hyperlink_color = ral(5005);
    base_visuals.window_stroke = Stroke::new(1.0, border);
    base_visuals.menu_corner_radius = 0.0.into();
    base_visuals.window_shadow = egui::epaint::Shadow::NONE;
    base_visuals.popup_shadow = egui::epaint::Shadow {
        offset: [4, 4],
        blur: 0,
        spread: 0,
        color: ral(9004),
    };

    base_visuals
}

pub fn industrial_light() -> Style {
    Style {
        visuals: industrial(ral(9011), ral(7047), ral(2009), Visuals::light()),
        ..Default::default()
    }
}

pub fn industrial_dark() -> Style {
    Style {
        visuals: industrial(ral(9003), ral(7046), ral(2009), Visuals::dark()),
        ..Default::default()
    }
}
