use std::sync::Arc;

use eframe::egui::{self, Key, Modifiers};
use traceview::action::{Action, ObjectLink, SpanSelection};
use traceview::command::{panel_commands, Command, CommandSlice, PanelState};
use traceview::config::ViewConfig;
use traceview::format::format_timestamp;
use traceview::histogram::{HistogramConfig, InteractiveHistogram};
use traceview::palette::{CommandPalette, PaletteOutcome};
use traceview::registry::{CommandRegistry, ProviderId};
use traceview::span::{SpanState, TimeRange};
use traceview::timeline::{build_timelines, timeline_commands, Timeline};
use traceview::themes::{PaletteStyle, Styled};
use traceview::trace::{Timestamp, Trace};
use traceview::widgets::{HistogramView, PaletteModal, TrackView};

/// Commands owned by the app itself.
fn global_commands(trace_end: Timestamp) -> CommandSlice {
    [
        Command::new("Zoom to fit", move || {
            Action::ZoomToRange(TimeRange::new(0, trace_end))
        })
        .category("View")
        .shortcut("Home"),
        Command::new("Log a message", || {
            Action::execute(|| log::info!("hello from the command palette"))
        })
        .secondary_label("Runs a closure on dispatch")
        .category("Debug"),
    ]
    .into_iter()
    .collect()
}

pub struct TraceApp {
    config: ViewConfig,
    trace: Arc<Trace>,
    timelines: Vec<Timeline>,
    range: TimeRange,
    registry: CommandRegistry,
    // Kept alive here; the registry only holds weak handles.
    _timeline_commands: Arc<CommandSlice>,
    _global_commands: Arc<CommandSlice>,
    panel_commands: (ProviderId, Arc<CommandSlice>),
    panel_state: PanelState,
    palette: Option<CommandPalette>,
    histogram: InteractiveHistogram,
    histogram_title: String,
    scroll_to: Option<ObjectLink>,
    status: String,
}

impl TraceApp {
    pub fn new(ctx: &egui::Context, config: ViewConfig, trace: Trace) -> Self {
        let trace = Arc::new(trace);
        let timelines = build_timelines(&trace);

        let mut registry = CommandRegistry::new();
        let timeline_cmds = Arc::new(timeline_commands(&timelines));
        registry.register(&timeline_cmds);
        let global_cmds = Arc::new(global_commands(trace.end()));
        registry.register(&global_cmds);
        let panel_state = PanelState::Panel;
        let panel_cmds = Arc::new(panel_commands(panel_state));
        let panel_id = registry.register(&panel_cmds);

        let repaint = ctx.clone();
        let mut histogram = InteractiveHistogram::new(HistogramConfig {
            bins: config.histogram_bins,
            ..Default::default()
        })
        .with_notify(move || repaint.request_repaint());
        histogram.set(active_durations(&trace));

        Self {
            range: TimeRange::new(0, trace.end()),
            config,
            trace,
            timelines,
            registry,
            _timeline_commands: timeline_cmds,
            _global_commands: global_cmds,
            panel_commands: (panel_id, panel_cmds),
            panel_state,
            palette: None,
            histogram,
            histogram_title: "Running goroutine durations".to_owned(),
            scroll_to: None,
            status: String::new(),
        }
    }

    fn set_panel_state(&mut self, state: PanelState) {
        self.panel_state = state;
        let commands = Arc::new(panel_commands(state));
        self.registry.unregister(self.panel_commands.0);
        let id = self.registry.register(&commands);
        self.panel_commands = (id, commands);
        self.status = format!("Panel is now a {state:?}");
    }

    fn dispatch(&mut self, action: Action) {
        log::info!("dispatching {action:?}");
        match action {
            Action::ZoomToRange(range) => {
                self.range = range;
                self.status = format!("Zoomed to {range}");
            }
            Action::ScrollToObject(link) => {
                self.scroll_to = Some(link);
                self.status = format!("Scrolled to {link}");
            }
            Action::OpenSpans(selection) => self.open_spans(selection),
            Action::OpenPanel(name) => self.status = format!("No panel named {name:?}"),
            Action::ClosePanel => {
                self.set_panel_state(PanelState::Panel);
                self.status = "Panel closed".to_owned();
            }
            Action::PreviousPanel => self.status = "No previous panel".to_owned(),
            Action::PanelToTab => self.set_panel_state(PanelState::Tab),
            Action::AttachPanel => self.set_panel_state(PanelState::Panel),
            Action::Execute(f) => f.run(),
        }
    }

    fn open_spans(&mut self, selection: SpanSelection) {
        let track = self
            .timelines
            .iter()
            .filter(|tl| tl.kind().link() == selection.owner)
            .flat_map(|tl| tl.tracks())
            .find(|track| track.kind() == selection.kind);
        let Some(track) = track else {
            log::warn!("no track for {}", selection.owner);
            return;
        };
        let spans = track.spans().subslice(selection.range.clone());
        let durations: Vec<i64> = spans.iter().map(|s| s.duration()).collect();
        self.histogram_title = format!("{} spans of {}", spans.len(), selection.owner);
        self.status = format!("Opened {} spans", spans.len());
        self.histogram.set(Arc::from(durations));
    }

    fn show_palette(&mut self, ctx: &egui::Context) {
        let open = ctx.input_mut(|i| i.consume_key(Modifiers::COMMAND | Modifiers::SHIFT, Key::P));
        if open && self.palette.is_none() {
            let prompt = self.config.palette_prompt.clone();
            self.palette =
                Some(CommandPalette::from_registry(&mut self.registry).with_prompt(prompt));
        }

        let Some(palette) = self.palette.as_mut() else {
            return;
        };
        palette.sync(&mut self.registry);
        let mut style = PaletteStyle::from(ctx.style().as_ref());
        style.width = self.config.palette_width;
        style.max_height = self.config.palette_max_height;
        match PaletteModal::new(palette).styled(style).show(ctx) {
            PaletteOutcome::Continue => {}
            PaletteOutcome::Dismiss => self.palette = None,
            PaletteOutcome::Dispatch(action) => {
                self.palette = None;
                self.dispatch(action);
            }
        }
    }

    fn show_timelines(&mut self, ui: &mut egui::Ui) -> Vec<Action> {
        let mut actions = Vec::new();
        let trace = Arc::clone(&self.trace);
        let range = self.range;
        let min_px = self.config.coalesce_min_px;

        for timeline in &mut self.timelines {
            let header = egui::CollapsingHeader::new(timeline.label())
                .id_salt(timeline.kind())
                .open(Some(timeline.expanded))
                .show(ui, |ui| {
                    for track in timeline.tracks() {
                        let shown = TrackView::new(track, &trace, range).min_px(min_px).show(ui);
                        actions.extend(shown.action);
                    }
                });
            if header.header_response.clicked() {
                timeline.expanded = !timeline.expanded;
            }
            if self.scroll_to == Some(timeline.kind().link()) {
                header.header_response.scroll_to_me(Some(egui::Align::Min));
                self.scroll_to = None;
            }
            let tooltip = timeline
                .tooltip(&trace)
                .unwrap_or_else(|err| format!("Statistics unavailable: {err}"));
            header.header_response.on_hover_text(tooltip);
        }
        actions
    }
}

impl eframe::App for TraceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.key_pressed(Key::Home)) && self.palette.is_none() {
            self.range = TimeRange::new(0, self.trace.end());
        }

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!(
                    "{} .. {}",
                    format_timestamp(self.range.start),
                    format_timestamp(self.range.end)
                ));
                ui.separator();
                ui.weak("Ctrl+Shift+P for commands");
                ui.separator();
                ui.weak(format!("Panel: {:?}", self.panel_state));
                ui.separator();
                ui.label(&self.status);
            });
        });

        egui::SidePanel::right("histogram")
            .default_width(360.0)
            .show(ctx, |ui| {
                ui.heading(&self.histogram_title);
                if self.histogram.take_changed() {
                    self.status = "Histogram settings changed".to_owned();
                }
                let _ = HistogramView::new(&mut self.histogram).show(ui);
            });

        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink(false)
                    .show(ui, |ui| self.show_timelines(ui))
                    .inner
            })
            .inner;
        for action in actions {
            self.dispatch(action);
        }

        self.show_palette(ctx);
    }
}

/// Durations of every running span of every goroutine.
fn active_durations(trace: &Trace) -> Arc<[i64]> {
    trace
        .goroutines()
        .iter()
        .flat_map(|g| g.spans.iter())
        .filter(|s| s.state == SpanState::Active)
        .map(|s| s.duration())
        .collect()
}
