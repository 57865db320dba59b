// Preludes: re-export commonly used items for convenience
pub use crate::action::{Action, MenuItem, ObjectLink};
pub use crate::command::{Command, CommandProvider, CommandSlice};
pub use crate::config::ViewConfig;
pub use crate::error::{FutureError, InternalError};
pub use crate::future::{CancelToken, Future, FutureState};
pub use crate::histogram::{Histogram, HistogramConfig, InteractiveHistogram};
pub use crate::items::ItemsView;
pub use crate::palette::{CommandPalette, PaletteKey, PaletteOutcome};
pub use crate::registry::{CommandRegistry, CommandSet};
pub use crate::span::{Span, SpanState, TimeRange};
pub use crate::themes::Styled;
pub use crate::timeline::Timeline;
pub use crate::trace::Trace;
pub use crate::track::{Track, TrackKind};
pub use crate::widgets;
