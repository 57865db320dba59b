use egui::{pos2, vec2, Align2, Rect, Response, Sense, Stroke, TextStyle, Ui};

use crate::action::Action;
use crate::span::TimeRange;
use crate::themes::{span_color, Styled, TrackStyle};
use crate::trace::Trace;
use crate::track::Track;

pub struct TrackResponse {
    pub response: Response,
    /// Picked from a span's context menu this frame.
    pub action: Option<Action>,
}

/// One row of spans over `range`. Spans narrower than `min_px` are merged
/// with their neighbours.
#[must_use = "You should call `.show(ui)`"]
pub struct TrackView<'a> {
    track: &'a Track,
    trace: &'a Trace,
    range: TimeRange,
    min_px: f32,
    style: Option<TrackStyle>,
}

impl<'a> TrackView<'a> {
    pub fn new(track: &'a Track, trace: &'a Trace, range: TimeRange) -> Self {
        Self {
            track,
            trace,
            range,
            min_px: 4.0,
            style: None,
        }
    }

    pub fn min_px(mut self, min_px: f32) -> Self {
        self.min_px = min_px.max(0.0);
        self
    }

    pub fn show(self, ui: &mut Ui) -> TrackResponse {
        let TrackView {
            track,
            trace,
            range,
            min_px,
            style,
        } = self;
        let style = style.unwrap_or_else(|| TrackStyle::from(ui.style().as_ref()));

        let (rect, response) =
            ui.allocate_exact_size(vec2(ui.available_width(), style.row_height), Sense::hover());
        let mut action = None;
        if !ui.is_rect_visible(rect) || range.is_empty() || rect.width() <= 0.0 {
            return TrackResponse { response, action };
        }

        let _span = tracing::trace_span!("track_paint", spans = track.len()).entered();
        let painter = ui.painter().with_clip_rect(rect);
        painter.rect_filled(rect, 0.0, style.background);

        let ns_per_px = range.duration() as f64 / f64::from(rect.width());
        let x_at = |t: i64| rect.left() + ((t - range.start) as f64 / ns_per_px) as f32;
        let font_id = TextStyle::Small.resolve(ui.style());

        for view in track.visible(range, ns_per_px, min_px) {
            let Some(bounds) = view.bounds() else {
                continue;
            };
            let x0 = x_at(bounds.start).max(rect.left());
            let x1 = x_at(bounds.end).min(rect.right()).max(x0 + 1.0);
            let span_rect =
                Rect::from_min_max(pos2(x0, rect.top() + 1.0), pos2(x1, rect.bottom() - 1.0));

            let fill = match track.color(view, trace) {
                Ok(index) => span_color(index, style.dark_mode),
                Err(err) => {
                    log::error!("cannot color span {:?}: {err}", view.original_range());
                    ui.visuals().error_fg_color
                }
            };
            painter.rect_filled(span_rect, 0.0, fill);

            if span_rect.width() > 12.0 {
                let labels = track.label(view, trace).unwrap_or_else(|err| {
                    log::error!("cannot label span {:?}: {err}", view.original_range());
                    Vec::new()
                });
                let text_color = crate::themes::colorhash::text_color_on(fill);
                let fitting = ui.fonts_mut(|fonts| {
                    labels.into_iter().find_map(|label| {
                        let galley = fonts.layout_no_wrap(label, font_id.clone(), text_color);
                        (galley.size().x <= span_rect.width() - 4.0).then_some(galley)
                    })
                });
                if let Some(galley) = fitting {
                    let anchor = pos2(span_rect.left() + 2.0, span_rect.center().y);
                    let pos = Align2::LEFT_CENTER.anchor_size(anchor, galley.size()).min;
                    painter.galley(pos, galley, text_color);
                }
            }

            let id = response.id.with(view.original_range().start);
            let span_response = ui.interact(span_rect, id, Sense::click());
            if span_response.hovered() {
                painter.rect_stroke(
                    span_rect,
                    0.0,
                    Stroke::new(1.0, style.hover_outline),
                    egui::StrokeKind::Inside,
                );
            }

            span_response.context_menu(|ui| match track.context_menu(view, trace) {
                Ok(items) => {
                    for item in items {
                        if ui.button(&item.label).clicked() {
                            action = Some(item.action);
                            ui.close();
                        }
                    }
                }
                Err(err) => {
                    ui.colored_label(ui.visuals().error_fg_color, err.to_string());
                }
            });

            span_response.on_hover_ui(|ui| match track.tooltip(view, trace) {
                Ok(text) => {
                    ui.label(text);
                }
                Err(err) => {
                    ui.colored_label(ui.visuals().error_fg_color, err.to_string());
                }
            });
        }

        TrackResponse { response, action }
    }
}

impl Styled for TrackView<'_> {
    type Style = TrackStyle;

    fn set_style(&mut self, style: Option<Self::Style>) {
        self.style = style;
    }
}
