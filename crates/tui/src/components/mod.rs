//! Panes hosted by the application windows.
use debugger::DebugBackend;
use ratatui::{Frame, layout::Rect};

use crate::{
    cache::ContentCache,
    message::{Cmd, Message},
    theme::Theme,
};

pub mod breakpoints;
pub mod callstack;
pub mod list;
pub mod output;
pub mod source;
pub mod status;
pub mod text_input;
pub mod variables;
pub mod viewport;
pub mod window;

pub use breakpoints::BreakpointsPane;
pub use callstack::CallStackPane;
pub use output::OutputPane;
pub use source::SourcePane;
pub use status::StatusBar;
pub use variables::VariablesPane;
pub use window::Window;

/// Collaborators available while handling a message
pub struct Context<'a> {
    pub backend: &'a mut dyn DebugBackend,
    pub cache: &'a mut ContentCache,
    pub theme: &'a Theme,
}

/// Capabilities shared by everything that lives inside a window.
///
/// Errors returned from [`Pane::update`] are shown in the status bar; a pane
/// leaves its own state untouched when an operation fails.
pub trait Pane {
    fn init(&mut self, _ctx: &mut Context<'_>) -> eyre::Result<Cmd> {
        Ok(Cmd::None)
    }

    fn update(&mut self, msg: &Message, ctx: &mut Context<'_>) -> eyre::Result<Cmd>;

    fn view(&self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Whether the pane currently wants every key press, bypassing global shortcuts
    fn captures_input(&self) -> bool {
        false
    }

    /// Key help shown in the status bar while the pane is focused
    fn hint(&self) -> &str {
        ""
    }
}
