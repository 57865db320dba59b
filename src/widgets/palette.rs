use egui::{
    pos2, vec2, Align2, Context, Key, Modifiers, Rect, Response, Sense, TextStyle, Ui, Widget,
};

use crate::command::Command;
use crate::palette::{CommandPalette, ListPosition, PaletteKey, PaletteOutcome, RowAlign};
use crate::themes::colorhash::text_color_on;
use crate::themes::{PaletteStyle, Styled};

const ROW_HEIGHT: f32 = 36.0;

/// Takes the navigation keys out of this frame's input so the text field
/// never sees them.
pub fn consume_palette_keys(ctx: &Context) -> Vec<PaletteKey> {
    const BINDINGS: [(Key, PaletteKey); 4] = [
        (Key::ArrowUp, PaletteKey::Up),
        (Key::ArrowDown, PaletteKey::Down),
        (Key::Enter, PaletteKey::Submit),
        (Key::Escape, PaletteKey::Escape),
    ];
    ctx.input_mut(|input| {
        let mut keys = Vec::new();
        for (key, palette_key) in BINDINGS {
            while input.consume_key(Modifiers::NONE, key) {
                keys.push(palette_key);
            }
        }
        keys
    })
}

/// Shows a [`CommandPalette`] as a modal over the whole context.
#[must_use = "You should call `.show(ctx)`"]
pub struct PaletteModal<'a> {
    palette: &'a mut CommandPalette,
    style: Option<PaletteStyle>,
}

impl<'a> PaletteModal<'a> {
    pub fn new(palette: &'a mut CommandPalette) -> Self {
        Self {
            palette,
            style: None,
        }
    }

    pub fn show(self, ctx: &Context) -> PaletteOutcome {
        let PaletteModal { palette, style } = self;
        let _span = tracing::info_span!("command_palette").entered();
        let style = style.unwrap_or_else(|| PaletteStyle::from(ctx.style().as_ref()));

        for key in consume_palette_keys(ctx) {
            match palette.handle_key(key) {
                PaletteOutcome::Continue => {}
                outcome => return outcome,
            }
        }

        let modal = egui::Modal::new(egui::Id::new("traceview_command_palette"))
            .frame(
                egui::Frame::popup(&ctx.style())
                    .fill(style.fill)
                    .stroke(egui::Stroke::new(1.0, style.outline)),
            )
            .show(ctx, |ui| palette_contents(ui, palette, &style));

        if let Some(row) = modal.inner {
            return palette.click(row);
        }
        if modal.should_close() {
            return PaletteOutcome::Dismiss;
        }
        PaletteOutcome::Continue
    }
}

impl Styled for PaletteModal<'_> {
    type Style = PaletteStyle;

    fn set_style(&mut self, style: Option<Self::Style>) {
        self.style = style;
    }
}

/// Returns the clicked row.
fn palette_contents(
    ui: &mut Ui,
    palette: &mut CommandPalette,
    style: &PaletteStyle,
) -> Option<usize> {
    ui.set_width(style.width);

    let mut query = palette.query().to_owned();
    let edit = egui::TextEdit::singleline(&mut query)
        .hint_text(palette.prompt())
        .desired_width(f32::INFINITY);
    ui.add(edit).request_focus();
    palette.set_query(&query);

    if palette.is_empty() {
        ui.weak("No matching commands");
        return None;
    }

    let row_stride = ROW_HEIGHT + ui.spacing().item_spacing.y;
    let total = palette.len();
    let viewport = style.max_height.min(total as f32 * row_stride);

    let mut scroll = egui::ScrollArea::vertical()
        .max_height(style.max_height)
        .auto_shrink([false, true]);
    if let Some(request) = palette.take_scroll() {
        let top = request.row as f32 * row_stride;
        let offset = match request.align {
            RowAlign::Start => top,
            RowAlign::End => (top + row_stride - viewport).max(0.0),
        };
        scroll = scroll.vertical_scroll_offset(offset);
    }

    let pointer_moved = ui.input(|i| i.pointer.delta() != egui::Vec2::ZERO);
    let mut clicked = None;
    let output = scroll.show_rows(ui, ROW_HEIGHT, total, |ui, rows| {
        for row in rows.clone() {
            let Some(command) = palette.row(row) else {
                continue;
            };
            let active = palette.active() == Some(row);
            let response = ui.add(CommandRow {
                command,
                active,
                style,
            });
            if response.hovered() && pointer_moved {
                palette.hover(row);
            }
            if response.clicked() {
                clicked = Some(row);
            }
        }
        rows
    });

    let rows = output.inner;
    let offset = output.state.offset.y;
    let height = output.inner_rect.height();
    palette.set_list_position(ListPosition {
        first: rows.start,
        count: rows.len(),
        first_clipped: offset > rows.start as f32 * row_stride + 0.5,
        last_clipped: rows.end as f32 * row_stride - ui.spacing().item_spacing.y
            > offset + height + 0.5,
    });

    clicked
}

struct CommandRow<'a> {
    command: &'a Command,
    active: bool,
    style: &'a PaletteStyle,
}

impl Widget for CommandRow<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let CommandRow {
            command,
            active,
            style,
        } = self;
        let (rect, response) =
            ui.allocate_exact_size(vec2(ui.available_width(), ROW_HEIGHT), Sense::click());
        if !ui.is_rect_visible(rect) {
            return response;
        }

        let painter = ui.painter();
        let text_color = ui.visuals().text_color();
        if active {
            painter.rect_filled(rect, 2.0, style.active_fill);
            painter.rect_filled(
                Rect::from_min_size(rect.min, vec2(3.0, rect.height())),
                0.0,
                style.accent,
            );
        }

        let body = TextStyle::Body.resolve(ui.style());
        let small = TextStyle::Small.resolve(ui.style());
        let left = rect.left() + 10.0;

        let swatch = Rect::from_center_size(pos2(left + 4.0, rect.center().y), vec2(8.0, 8.0));
        painter.rect_filled(swatch, 1.0, command.display_color());

        let text_left = swatch.right() + 8.0;
        match command.secondary() {
            Some(secondary) => {
                painter.text(
                    pos2(text_left, rect.top() + 4.0),
                    Align2::LEFT_TOP,
                    command.primary(),
                    body.clone(),
                    text_color,
                );
                painter.text(
                    pos2(text_left, rect.bottom() - 4.0),
                    Align2::LEFT_BOTTOM,
                    secondary,
                    small.clone(),
                    style.weak_text,
                );
            }
            None => {
                painter.text(
                    pos2(text_left, rect.center().y),
                    Align2::LEFT_CENTER,
                    command.primary(),
                    body,
                    text_color,
                );
            }
        }

        let mut right = rect.right() - 8.0;
        if let Some(shortcut) = command.shortcut_text() {
            let badge_text = text_color_on(style.outline);
            let galley = painter.layout_no_wrap(shortcut.to_owned(), small.clone(), badge_text);
            let size = galley.size() + vec2(8.0, 4.0);
            let badge = Rect::from_min_size(
                pos2(right - size.x, rect.center().y - size.y * 0.5),
                size,
            );
            painter.rect_filled(badge, 2.0, style.outline);
            painter.galley(badge.min + vec2(4.0, 2.0), galley, badge_text);
            right = badge.left() - 8.0;
        }
        if !command.category_name().is_empty() {
            painter.text(
                pos2(right, rect.center().y),
                Align2::RIGHT_CENTER,
                format!("Category: {}", command.category_name()),
                small,
                style.weak_text,
            );
        }

        response
    }
}
