use egui::{pos2, vec2, Align2, Color32, Rect, Response, Sense, Stroke, TextStyle, Ui};

use crate::histogram::{
    Histogram, HistogramMenuItem, InteractiveHistogram, COMPUTING_LABEL,
};
use crate::future::FutureState;
use crate::themes::{HistogramStyle, Styled};

#[derive(Clone, Copy)]
struct CountScale {
    divisor: u64,
    suffix: &'static str,
}

impl CountScale {
    fn pick(max: u64) -> Self {
        if max >= 1_000_000_000 {
            Self {
                divisor: 1_000_000_000,
                suffix: "B",
            }
        } else if max >= 1_000_000 {
            Self {
                divisor: 1_000_000,
                suffix: "M",
            }
        } else if max >= 1_000 {
            Self {
                divisor: 1_000,
                suffix: "K",
            }
        } else {
            Self {
                divisor: 1,
                suffix: "",
            }
        }
    }

    fn format(self, value: u64) -> String {
        if value == 0 {
            return "0".to_owned();
        }
        if self.divisor == 1 {
            return format!("{value}");
        }
        let scaled = value as f64 / self.divisor as f64;
        if scaled.fract() == 0.0 {
            format!("{}{}", scaled as u64, self.suffix)
        } else {
            format!("{scaled:.1}{}", self.suffix)
        }
    }
}

fn paint_hatching(painter: &egui::Painter, rect: Rect, color: Color32) {
    let spacing = 8.0;
    let stroke = Stroke::new(1.0, color);

    let h = rect.height();
    let mut x = rect.left() - h;
    while x < rect.right() + h {
        painter.line_segment([pos2(x, rect.top()), pos2(x + h, rect.bottom())], stroke);
        x += spacing;
    }
}

fn nice_decimal_step(max_value: u64, segments: u64) -> u64 {
    let segments = segments.max(1);
    let raw_step = max_value.div_ceil(segments).max(1);
    let magnitude = 10u64.pow(raw_step.ilog10());
    for mult in [1u64, 2, 5, 10] {
        let step = mult.saturating_mul(magnitude);
        if step >= raw_step {
            return step;
        }
    }
    10u64.saturating_mul(magnitude)
}

/// What the user did with the plot this frame.
pub struct PlotResponse {
    pub response: Response,
    /// Bins `first..=last` were selected by clicking or dragging.
    pub selected: Option<(usize, usize)>,
}

/// Bars of a computed [`Histogram`]. Click a bar or drag across bars to
/// select a bin range.
#[must_use = "You should call `.show(ui)`"]
pub struct HistogramPlot<'a> {
    histogram: &'a Histogram,
    desired_width: Option<f32>,
    plot_height: f32,
    y_segments: u64,
    max_x_labels: usize,
    style: Option<HistogramStyle>,
}

impl<'a> HistogramPlot<'a> {
    pub fn new(histogram: &'a Histogram) -> Self {
        Self {
            histogram,
            desired_width: None,
            plot_height: 120.0,
            y_segments: 4,
            max_x_labels: 7,
            style: None,
        }
    }

    pub fn desired_width(mut self, desired_width: f32) -> Self {
        self.desired_width = Some(desired_width);
        self
    }

    pub fn plot_height(mut self, plot_height: f32) -> Self {
        self.plot_height = plot_height.max(16.0);
        self
    }

    pub fn show(self, ui: &mut Ui) -> PlotResponse {
        let HistogramPlot {
            histogram,
            desired_width,
            plot_height,
            y_segments,
            max_x_labels,
            style,
        } = self;
        let _span = tracing::info_span!("histogram_plot").entered();

        let hstyle = style.unwrap_or_else(|| HistogramStyle::from(ui.style().as_ref()));
        let desired_width = desired_width.unwrap_or_else(|| ui.available_width().max(128.0));
        let font_id = TextStyle::Small.resolve(ui.style());
        let tick_len = 4.0;
        let tick_pad = 2.0;
        let text_height = ui.fonts_mut(|fonts| fonts.row_height(&font_id));
        let label_row_h = tick_len + tick_pad + text_height;

        let (outer_rect, response) = ui.allocate_exact_size(
            vec2(desired_width, plot_height + label_row_h),
            Sense::click_and_drag(),
        );
        if !ui.is_rect_visible(outer_rect) {
            return PlotResponse {
                response,
                selected: None,
            };
        }

        let counts = histogram.counts();
        let max_value = histogram.max_count();
        let y_step = nice_decimal_step(max_value, y_segments);
        let y_max = y_step.saturating_mul(y_segments).max(1);
        let y_ticks: Vec<u64> = (0..=y_segments).map(|i| y_step.saturating_mul(i)).collect();
        let scale = CountScale::pick(y_max);

        let y_label_width = ui.fonts_mut(|fonts| {
            y_ticks
                .iter()
                .map(|&value| {
                    fonts
                        .layout_no_wrap(scale.format(value), font_id.clone(), hstyle.ink)
                        .size()
                        .x
                })
                .fold(0.0, f32::max)
        });
        let y_axis_w = (y_label_width + 10.0).clamp(24.0, 80.0);
        let y_axis_pad = 6.0;

        let plot_rect = Rect::from_min_max(
            pos2(
                (outer_rect.left() + y_axis_w + y_axis_pad).min(outer_rect.right()),
                outer_rect.top(),
            ),
            pos2(outer_rect.right(), outer_rect.bottom() - label_row_h),
        );
        let plot_area = plot_rect.shrink(4.0);

        let painter = ui.painter().with_clip_rect(outer_rect);
        painter.rect_stroke(
            plot_rect,
            0.0,
            Stroke::new(1.0, hstyle.outline),
            egui::StrokeKind::Inside,
        );

        for &value in &y_ticks {
            let frac = (value as f64 / y_max as f64) as f32;
            let y = plot_area.bottom() - frac * plot_area.height();
            painter.line_segment(
                [pos2(plot_area.left(), y), pos2(plot_area.right(), y)],
                Stroke::new(1.0, hstyle.grid),
            );
            painter.text(
                pos2(plot_rect.left() - 4.0, y),
                Align2::RIGHT_CENTER,
                scale.format(value),
                font_id.clone(),
                hstyle.ink,
            );
        }

        let bucket_count = counts.len();
        if bucket_count == 0 || !plot_area.is_positive() {
            return PlotResponse {
                response,
                selected: None,
            };
        }

        let gap = if bucket_count > 200 { 0.0 } else { 2.0 };
        let slot_w = plot_area.width() / bucket_count as f32;
        let bar_w = (slot_w - gap).max(1.0);
        let bin_at = |x: f32| -> usize {
            (((x - plot_area.left()) / slot_w).floor().max(0.0) as usize).min(bucket_count - 1)
        };

        let drag_bins = if response.dragged() || response.drag_stopped() {
            let origin = ui.input(|i| i.pointer.press_origin());
            let current = response.interact_pointer_pos();
            origin.zip(current).map(|(a, b)| {
                let (a, b) = (bin_at(a.x), bin_at(b.x));
                (a.min(b), a.max(b))
            })
        } else {
            None
        };

        for (i, &value) in counts.iter().enumerate() {
            let x0 = plot_area.left() + i as f32 * slot_w;
            let x1 = (x0 + bar_w).min(plot_area.right());
            let in_drag = drag_bins.is_some_and(|(a, b)| (a..=b).contains(&i));

            if in_drag {
                painter.rect_filled(
                    Rect::from_min_max(pos2(x0, plot_area.top()), pos2(x1, plot_area.bottom())),
                    0.0,
                    hstyle.grid,
                );
            }
            if value == 0 {
                continue;
            }

            let frac = (value as f64 / y_max as f64) as f32;
            let bar_h = (frac * plot_area.height()).clamp(1.0, plot_area.height());
            let bar_rect = Rect::from_min_max(
                pos2(x0, plot_area.bottom() - bar_h),
                pos2(x1, plot_area.bottom()),
            );

            let hovered = response
                .hover_pos()
                .is_some_and(|pos| pos.x >= x0 && pos.x < x0 + slot_w);
            let stroke_color = if hovered || in_drag {
                hstyle.accent
            } else {
                hstyle.outline
            };

            let hatch_rect = bar_rect.shrink(1.0);
            if hatch_rect.is_positive() {
                paint_hatching(&painter.with_clip_rect(hatch_rect), hatch_rect, hstyle.ink);
            }
            painter.rect_stroke(
                bar_rect,
                0.0,
                Stroke::new(1.0, stroke_color),
                egui::StrokeKind::Inside,
            );
        }

        if max_x_labels > 0 {
            let step = bucket_count.div_ceil(max_x_labels).max(1);
            let tick_top = plot_rect.bottom();
            for i in (0..bucket_count).step_by(step) {
                let x = plot_area.left() + i as f32 * slot_w + bar_w * 0.5;
                painter.line_segment(
                    [pos2(x, tick_top), pos2(x, tick_top + tick_len)],
                    Stroke::new(1.0, hstyle.outline),
                );
                painter.text(
                    pos2(x, tick_top + tick_len + tick_pad),
                    Align2::CENTER_TOP,
                    histogram.bin_label(i),
                    font_id.clone(),
                    hstyle.ink,
                );
            }
        }

        let selected = if response.drag_stopped() {
            drag_bins
        } else if response.clicked() {
            response.interact_pointer_pos().map(|pos| {
                let bin = bin_at(pos.x);
                (bin, bin)
            })
        } else {
            None
        };

        let response = match response.hover_pos() {
            Some(pos) if plot_area.x_range().contains(pos.x) => {
                let bin = bin_at(pos.x);
                response.on_hover_text(histogram.bin_tooltip(bin))
            }
            _ => response,
        };

        PlotResponse { response, selected }
    }
}

impl Styled for HistogramPlot<'_> {
    type Style = HistogramStyle;

    fn set_style(&mut self, style: Option<Self::Style>) {
        self.style = style;
    }
}

/// An [`InteractiveHistogram`] with its context menu and settings dialog.
#[must_use = "You should call `.show(ui)`"]
pub struct HistogramView<'a> {
    histogram: &'a mut InteractiveHistogram,
}

impl<'a> HistogramView<'a> {
    pub fn new(histogram: &'a mut InteractiveHistogram) -> Self {
        Self { histogram }
    }

    pub fn show(self, ui: &mut Ui) -> Response {
        let hist = self.histogram;

        let mut selected = None;
        let mut menu_choice = None;
        let response = match hist.state() {
            FutureState::Ready(computed) => {
                let plot = HistogramPlot::new(computed).show(ui);
                selected = plot.selected;
                plot.response.context_menu(|ui| {
                    for item in HistogramMenuItem::ALL {
                        if ui.button(item.label()).clicked() {
                            menu_choice = Some(item);
                            ui.close();
                        }
                    }
                });
                plot.response
            }
            FutureState::Failed(err) => {
                let color = ui.visuals().error_fg_color;
                ui.colored_label(color, format!("Histogram could not be computed: {err}"))
            }
            FutureState::Idle | FutureState::Pending | FutureState::Cancelled => {
                ui.horizontal(|ui| {
                    ui.add(egui::Spinner::new());
                    ui.label(COMPUTING_LABEL);
                })
                .response
            }
        };

        if let Some((first, last)) = selected {
            hist.zoom_to(first, last);
        }
        if let Some(item) = menu_choice {
            hist.apply(item);
        }
        if hist.settings_open {
            settings_dialog(ui.ctx(), hist);
        }
        response
    }
}

fn settings_dialog(ctx: &egui::Context, hist: &mut InteractiveHistogram) {
    let modal = egui::Modal::new(egui::Id::new("traceview_histogram_settings")).show(ctx, |ui| {
        ui.heading("Histogram settings");

        ui.label(egui::RichText::new("Number of bins").strong());
        let settings = hist.settings_mut();
        let edit = egui::TextEdit::singleline(&mut settings.num_bins_text).desired_width(80.0);
        if ui.add(edit).changed() {
            settings.num_bins_text.retain(|c| c.is_ascii_digit());
        }
        let valid = settings.is_valid();
        if !valid {
            ui.colored_label(ui.visuals().error_fg_color, "At most 4 digits");
        }

        ui.checkbox(&mut settings.reject_outliers, "Filter extreme outliers");

        let mut save = false;
        let mut cancel = false;
        ui.horizontal(|ui| {
            save = ui.add_enabled(valid, egui::Button::new("Save")).clicked();
            cancel = ui.button("Cancel").clicked();
        });
        (save, cancel)
    });

    let (save, cancel) = modal.inner;
    if save {
        hist.save_settings();
    } else if cancel || modal.should_close() {
        hist.cancel_settings();
    }
}
