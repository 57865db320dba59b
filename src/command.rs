//! Commands and the providers that contribute them.

use std::fmt;
use std::sync::Arc;

use egui::Color32;

use crate::action::Action;
use crate::themes::colorhash::category_color;

pub type CommandFn = Arc<dyn Fn() -> Action + Send + Sync>;

/// A named, user-invocable action.
///
/// The searchable text is lowercased once at construction so filtering on
/// every keystroke does not allocate per command.
#[derive(Clone)]
pub struct Command {
    primary_label: String,
    secondary_label: Option<String>,
    category: String,
    shortcut: Option<String>,
    aliases: Vec<String>,
    color: Option<Color32>,
    action: CommandFn,
    searchable: Vec<String>,
}

impl Command {
    pub fn new(
        primary_label: impl Into<String>,
        action: impl Fn() -> Action + Send + Sync + 'static,
    ) -> Self {
        let mut cmd = Self {
            primary_label: primary_label.into(),
            secondary_label: None,
            category: String::new(),
            shortcut: None,
            aliases: Vec::new(),
            color: None,
            action: Arc::new(action),
            searchable: Vec::new(),
        };
        cmd.reindex();
        cmd
    }

    pub fn secondary_label(mut self, label: impl Into<String>) -> Self {
        self.secondary_label = Some(label.into());
        self.reindex();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self.reindex();
        self
    }

    pub fn shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self.reindex();
        self
    }

    pub fn color(mut self, color: Color32) -> Self {
        self.color = Some(color);
        self
    }

    fn reindex(&mut self) {
        self.searchable = std::iter::once(self.primary_label.as_str())
            .chain(self.secondary_label.as_deref())
            .chain(std::iter::once(self.category.as_str()))
            .chain(self.aliases.iter().map(String::as_str))
            .map(str::to_lowercase)
            .collect();
    }

    pub fn primary(&self) -> &str {
        &self.primary_label
    }

    pub fn secondary(&self) -> Option<&str> {
        self.secondary_label.as_deref()
    }

    pub fn category_name(&self) -> &str {
        &self.category
    }

    pub fn shortcut_text(&self) -> Option<&str> {
        self.shortcut.as_deref()
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The explicit color, or a categorical one hashed from the category.
    pub fn display_color(&self) -> Color32 {
        self.color.unwrap_or_else(|| category_color(&self.category))
    }

    /// Whether every term occurs in the primary label, the secondary label,
    /// the category or one of the aliases. `terms` must be lowercase; see
    /// [`query_terms`].
    pub fn matches(&self, terms: &[String]) -> bool {
        terms
            .iter()
            .all(|term| self.searchable.iter().any(|text| text.contains(term.as_str())))
    }

    /// Produces the command's deferred effect.
    pub fn link(&self) -> Action {
        (self.action)()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("primary_label", &self.primary_label)
            .field("secondary_label", &self.secondary_label)
            .field("category", &self.category)
            .field("shortcut", &self.shortcut)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

/// Splits a query into lowercase, whitespace-delimited terms.
pub fn query_terms(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// A component's contribution to the palette. Commands stay owned by the
/// provider; the registry only ever borrows them.
pub trait CommandProvider: Send + Sync {
    fn len(&self) -> usize;

    fn command(&self, idx: usize) -> Option<&Command>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandSlice(pub Vec<Command>);

impl CommandProvider for CommandSlice {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn command(&self, idx: usize) -> Option<&Command> {
        self.0.get(idx)
    }
}

impl FromIterator<Command> for CommandSlice {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Where a panel currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Panel,
    Tab,
    Window,
}

const PANEL_COMMAND_COLOR: Color32 = Color32::from_rgb(137, 201, 136);

/// The commands a panel in `state` offers.
pub fn panel_commands(state: PanelState) -> CommandSlice {
    let commands = match state {
        PanelState::Panel => vec![
            Command::new("Go to previous panel", || Action::PreviousPanel).alias("back"),
            Command::new("Turn panel into tab", || Action::PanelToTab),
        ],
        PanelState::Tab => Vec::new(),
        PanelState::Window => vec![
            Command::new("Attach panel", || Action::AttachPanel),
            Command::new("Close panel", || Action::ClosePanel),
        ],
    };
    commands
        .into_iter()
        .map(|cmd| cmd.category("Panel").color(PANEL_COMMAND_COLOR))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn open() -> Command {
        Command::new("Open file", || Action::OpenPanel("file".into()))
            .secondary_label("from disk")
            .category("File")
            .alias("load")
    }

    #[rstest]
    #[case::empty("", true)]
    #[case::primary("open", true)]
    #[case::case_insensitive("OPEN FiLe", true)]
    #[case::secondary("disk", true)]
    #[case::category("file open", true)]
    #[case::alias("load", true)]
    #[case::terms_across_fields("load disk", true)]
    #[case::one_term_missing("open zzz", false)]
    #[case::no_match("save", false)]
    fn filtering(#[case] query: &str, #[case] expected: bool) {
        assert_eq!(open().matches(&query_terms(query)), expected);
    }

    #[test]
    fn back_alias_finds_previous_panel() {
        let cmds = panel_commands(PanelState::Panel);
        let terms = query_terms("back");
        let hits: Vec<_> = cmds.0.iter().filter(|c| c.matches(&terms)).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].primary(), "Go to previous panel");
        assert!(matches!(hits[0].link(), Action::PreviousPanel));
    }

    #[rstest]
    #[case(PanelState::Panel, &["Go to previous panel", "Turn panel into tab"])]
    #[case(PanelState::Tab, &[])]
    #[case(PanelState::Window, &["Attach panel", "Close panel"])]
    fn panel_commands_per_state(#[case] state: PanelState, #[case] expected: &[&str]) {
        let cmds = panel_commands(state);
        let names: Vec<_> = cmds.0.iter().map(Command::primary).collect();
        assert_eq!(names, expected);
        assert!(cmds.0.iter().all(|c| c.category_name() == "Panel"));
    }

    #[test]
    fn uncolored_commands_hash_their_category() {
        let a = Command::new("a", || Action::ClosePanel).category("Timeline");
        let b = Command::new("b", || Action::ClosePanel).category("Timeline");
        assert_eq!(a.display_color(), b.display_color());
    }
}
