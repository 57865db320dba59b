//! Command palette session: query, filtered rows, keyboard navigation.
//!
//! The palette never performs an effect. Submitting hands the selected
//! command's [`Action`] back to the shell, which also decides what to do
//! with a dismissal.

use crate::action::Action;
use crate::command::{query_terms, Command};
use crate::config::DEFAULT_PALETTE_PROMPT;
use crate::registry::{CommandRegistry, CommandSet};

/// Keys the palette reacts to. The text editor consumes everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKey {
    Up,
    Down,
    Submit,
    Escape,
}

#[derive(Debug)]
pub enum PaletteOutcome {
    /// Keep the palette open.
    Continue,
    /// Run this action and close the palette.
    Dispatch(Action),
    /// Close the palette without doing anything.
    Dismiss,
}

/// Which rows the shell currently shows, reported back after layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListPosition {
    /// First row with any visible part.
    pub first: usize,
    /// Number of rows with any visible part.
    pub count: usize,
    /// The first row is cut off at the top.
    pub first_clipped: bool,
    /// The last row is cut off at the bottom.
    pub last_clipped: bool,
}

impl ListPosition {
    fn first_visible(&self) -> usize {
        self.first + usize::from(self.first_clipped)
    }

    /// Fully visible rows.
    fn visible(&self) -> std::ops::Range<usize> {
        let end = (self.first + self.count).saturating_sub(usize::from(self.last_clipped));
        self.first_visible()..end.max(self.first_visible())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAlign {
    Start,
    End,
}

/// A request for the shell to scroll `row` into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub row: usize,
    pub align: RowAlign,
}

pub struct CommandPalette {
    prompt: String,
    query: String,
    terms: Vec<String>,
    commands: CommandSet,
    filtered: Vec<usize>,
    active: Option<usize>,
    list: ListPosition,
    scroll: Option<ScrollRequest>,
}

impl CommandPalette {
    pub fn new(commands: CommandSet) -> Self {
        let mut palette = Self {
            prompt: DEFAULT_PALETTE_PROMPT.to_owned(),
            query: String::new(),
            terms: Vec::new(),
            commands,
            filtered: Vec::new(),
            active: None,
            list: ListPosition::default(),
            scroll: None,
        };
        palette.refilter();
        palette
    }

    /// A palette over everything currently in `registry`.
    pub fn from_registry(registry: &mut CommandRegistry) -> Self {
        Self::new(registry.snapshot())
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Picks up providers that were registered or dropped since the last
    /// snapshot. The query is kept.
    pub fn sync(&mut self, registry: &mut CommandRegistry) {
        if registry.generation() != self.commands.generation() {
            self.set_commands(registry.snapshot());
        }
    }

    pub fn set_commands(&mut self, commands: CommandSet) {
        self.commands = commands;
        self.refilter();
    }

    /// Re-filters if the text changed.
    pub fn set_query(&mut self, query: &str) {
        if query == self.query {
            return;
        }
        self.query = query.to_owned();
        self.terms = query_terms(query);
        self.refilter();
    }

    fn refilter(&mut self) {
        let _span = tracing::debug_span!("palette_filter", query = %self.query).entered();
        let terms = &self.terms;
        self.filtered = self
            .commands
            .iter()
            .enumerate()
            .filter(|(_, cmd)| cmd.matches(terms))
            .map(|(idx, _)| idx)
            .collect();

        self.active = match self.filtered.len() {
            0 => None,
            len => self.active.map(|active| active.min(len - 1)),
        };
        self.scroll = Some(ScrollRequest {
            row: self.active.unwrap_or(0),
            align: RowAlign::Start,
        });
    }

    /// Registry indices of the matching commands, in registry order.
    pub fn filtered(&self) -> &[usize] {
        &self.filtered
    }

    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// The command shown in `row`.
    pub fn row(&self, row: usize) -> Option<&Command> {
        self.filtered
            .get(row)
            .and_then(|&idx| self.commands.get(idx))
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// `-1` when nothing is active.
    pub fn active_index(&self) -> isize {
        self.active.map_or(-1, |a| a as isize)
    }

    /// Layout feedback from the shell.
    pub fn set_list_position(&mut self, list: ListPosition) {
        self.list = list;
    }

    /// The pending scroll request, if any. Cleared on read.
    pub fn take_scroll(&mut self) -> Option<ScrollRequest> {
        self.scroll.take()
    }

    pub fn handle_key(&mut self, key: PaletteKey) -> PaletteOutcome {
        match key {
            PaletteKey::Up => {
                self.up();
                PaletteOutcome::Continue
            }
            PaletteKey::Down => {
                self.down();
                PaletteOutcome::Continue
            }
            PaletteKey::Submit => self.submit(),
            PaletteKey::Escape => PaletteOutcome::Dismiss,
        }
    }

    fn up(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let active = match self.active {
            Some(0) | None => len - 1,
            Some(a) => a - 1,
        };
        self.active = Some(active);
        if !self.list.visible().contains(&active) {
            self.scroll = Some(ScrollRequest {
                row: active,
                align: RowAlign::Start,
            });
        }
    }

    fn down(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let active = self.active.map_or(0, |a| a + 1);
        if active >= len {
            self.active = Some(0);
            self.scroll = Some(ScrollRequest {
                row: 0,
                align: RowAlign::Start,
            });
            return;
        }
        self.active = Some(active);

        let visible = self.list.visible();
        if active < visible.start {
            self.scroll = Some(ScrollRequest {
                row: active,
                align: RowAlign::Start,
            });
        } else if active >= visible.end {
            self.scroll = Some(ScrollRequest {
                row: active,
                align: RowAlign::End,
            });
        }
    }

    /// Dispatches the active command. A no-op without a valid active row.
    pub fn submit(&mut self) -> PaletteOutcome {
        let Some(cmd) = self.active.and_then(|row| self.row(row)) else {
            return PaletteOutcome::Continue;
        };
        log::debug!("dispatching command {:?}", cmd.primary());
        PaletteOutcome::Dispatch(cmd.link())
    }

    /// The pointer moved over `row`.
    pub fn hover(&mut self, row: usize) {
        if row < self.filtered.len() {
            self.active = Some(row);
        }
    }

    /// The pointer clicked `row`.
    pub fn click(&mut self, row: usize) -> PaletteOutcome {
        if row >= self.filtered.len() {
            return PaletteOutcome::Continue;
        }
        self.active = Some(row);
        self.submit()
    }
}
