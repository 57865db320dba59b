mod app;
mod synthetic;

use dark_light::Mode;
use eframe::egui;
use traceview::config::ViewConfig;
use traceview::themes::{industrial_dark, industrial_light};

fn main() -> eframe::Result {
    _ = env_logger::try_init();

    let config = ViewConfig::from_env();
    let seed = std::env::var("TRACEVIEW_DEMO_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0x5eed);
    let trace = {
        let _span = tracing::info_span!("synthetic_trace", seed).entered();
        synthetic::trace(seed)
    };
    log::info!(
        "synthetic trace: {} goroutines, {} processors, {} machines",
        trace.goroutines().len(),
        trace.processors().len(),
        trace.machines().len()
    );

    let mut native_options = eframe::NativeOptions::default();
    native_options.persist_window = true;

    eframe::run_native(
        "traceview",
        native_options,
        Box::new(move |cc| {
            let ctx = cc.egui_ctx.clone();
            if let Err(err) =
                ctrlc::set_handler(move || ctx.send_viewport_cmd(egui::ViewportCommand::Close))
            {
                log::warn!("failed to set exit signal handler: {err}");
            }

            cc.egui_ctx.set_style_of(egui::Theme::Light, industrial_light());
            cc.egui_ctx.set_style_of(egui::Theme::Dark, industrial_dark());
            let theme = match dark_light::detect() {
                Ok(Mode::Light) => egui::ThemePreference::Light,
                Ok(Mode::Dark) => egui::ThemePreference::Dark,
                Ok(Mode::Unspecified) | Err(_) => egui::ThemePreference::Dark,
            };
            cc.egui_ctx.set_theme(theme);

            Ok(Box::new(app::TraceApp::new(&cc.egui_ctx, config, trace)))
        }),
    )
}
