use std::sync::Arc;

use traceview::action::Action;
use traceview::command::{panel_commands, Command, CommandSlice, PanelState};
use traceview::palette::{CommandPalette, PaletteKey, PaletteOutcome};
use traceview::registry::CommandRegistry;

fn file_commands() -> Arc<CommandSlice> {
    Arc::new(
        ["Open file", "Close file", "Save as"]
            .into_iter()
            .map(|label| Command::new(label, move || Action::OpenPanel(label.to_owned())))
            .collect(),
    )
}

fn labels(palette: &CommandPalette) -> Vec<&str> {
    (0..palette.len())
        .filter_map(|row| palette.row(row))
        .map(Command::primary)
        .collect()
}

#[test]
fn file_query_then_no_match() {
    let mut registry = CommandRegistry::new();
    let commands = file_commands();
    registry.register(&commands);
    let mut palette = CommandPalette::from_registry(&mut registry);

    palette.set_query("file");
    assert_eq!(labels(&palette), vec!["Open file", "Close file"]);
    assert_eq!(palette.active_index(), -1);

    palette.handle_key(PaletteKey::Down);
    assert_eq!(palette.active_index(), 0);

    palette.set_query("zzz");
    assert!(palette.is_empty());
    assert_eq!(palette.active_index(), -1);

    assert!(matches!(
        palette.handle_key(PaletteKey::Submit),
        PaletteOutcome::Continue
    ));
}

#[test]
fn submit_dispatches_the_active_command() {
    let mut registry = CommandRegistry::new();
    let commands = file_commands();
    registry.register(&commands);
    let mut palette = CommandPalette::from_registry(&mut registry);

    palette.set_query("save");
    palette.handle_key(PaletteKey::Down);
    match palette.handle_key(PaletteKey::Submit) {
        PaletteOutcome::Dispatch(Action::OpenPanel(name)) => assert_eq!(name, "Save as"),
        other => panic!("expected a dispatch, got {other:?}"),
    }
}

#[test]
fn every_term_must_match_somewhere() {
    let commands: Arc<CommandSlice> = Arc::new(
        [
            Command::new("Open file", || Action::ClosePanel).category("File"),
            Command::new("Scroll to goroutine 7", || Action::ClosePanel)
                .category("Timeline")
                .alias("g7"),
        ]
        .into_iter()
        .collect(),
    );
    let mut registry = CommandRegistry::new();
    registry.register(&commands);
    let mut palette = CommandPalette::from_registry(&mut registry);

    palette.set_query("timeline g7");
    assert_eq!(labels(&palette), vec!["Scroll to goroutine 7"]);

    palette.set_query("FILE open");
    assert_eq!(labels(&palette), vec!["Open file"]);

    palette.set_query("file g7");
    assert!(palette.is_empty());
}

#[test]
fn panel_commands_follow_panel_state() {
    let mut registry = CommandRegistry::new();
    let panel = Arc::new(panel_commands(PanelState::Panel));
    let id = registry.register(&panel);
    let mut palette = CommandPalette::from_registry(&mut registry);
    assert_eq!(labels(&palette), vec!["Go to previous panel", "Turn panel into tab"]);

    palette.set_query("back");
    assert_eq!(labels(&palette), vec!["Go to previous panel"]);
    palette.set_query("");

    registry.unregister(id);
    let window = Arc::new(panel_commands(PanelState::Window));
    registry.register(&window);
    palette.sync(&mut registry);
    assert_eq!(labels(&palette), vec!["Attach panel", "Close panel"]);

    palette.handle_key(PaletteKey::Up);
    assert!(matches!(
        palette.handle_key(PaletteKey::Submit),
        PaletteOutcome::Dispatch(Action::ClosePanel)
    ));
}

#[test]
fn escape_never_dispatches() {
    let mut registry = CommandRegistry::new();
    let commands = file_commands();
    registry.register(&commands);
    let mut palette = CommandPalette::from_registry(&mut registry);
    palette.handle_key(PaletteKey::Down);
    assert!(matches!(
        palette.handle_key(PaletteKey::Escape),
        PaletteOutcome::Dismiss
    ));
}
