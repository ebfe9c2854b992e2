use debugger::BackendError;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::theme::Theme;

pub const SESSION_ENDED: &str = "debug session ended, press r to reset or q to quit";
const GLOBAL_HINT: &str = "1-5: focus, q: quit";
const CONDITION_ERROR: &str = "error evaluating expression:";

fn backend_error(err: &eyre::Report) -> Option<&BackendError> {
    err.chain().find_map(|cause| cause.downcast_ref::<BackendError>())
}

/// Whether the error means the debuggee has exited
pub fn is_process_exit(err: &eyre::Report) -> bool {
    backend_error(err).is_some_and(BackendError::is_process_exit)
}

/// Text shown to the user for an error
pub fn describe(err: &eyre::Report) -> String {
    if is_process_exit(err) {
        return SESSION_ENDED.to_string();
    }
    let text = format!("{err:#}");
    match text.find(CONDITION_ERROR) {
        Some(start) => {
            let rest = text[start + CONDITION_ERROR.len()..].trim();
            format!("breakpoint condition failed: {rest}")
        }
        None => text,
    }
}

/// Bottom line: key hints, the last error, or the end of session notice
#[derive(Debug, Default)]
pub struct StatusBar {
    error: Option<String>,
    session_ended: bool,
}

impl StatusBar {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn session_ended(&self) -> bool {
        self.session_ended
    }

    /// Show `err` unless an earlier error is still displayed.
    ///
    /// Returns whether the error was shown.
    pub fn report(&mut self, err: &eyre::Report) -> bool {
        if is_process_exit(err) {
            self.session_ended = true;
        }
        if self.error.is_some() {
            return false;
        }
        self.error = Some(describe(err));
        true
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn session_restarted(&mut self) {
        self.session_ended = false;
    }

    pub fn view(&self, frame: &mut Frame, area: Rect, theme: &Theme, hint: &str) {
        let line = if let Some(error) = &self.error {
            Line::from(Span::styled(format!(" {error}"), theme.banner)).style(theme.banner)
        } else if self.session_ended {
            Line::from(Span::styled(format!(" {SESSION_ENDED}"), theme.session_ended))
        } else {
            let mut spans = vec![Span::styled(format!(" {GLOBAL_HINT}"), theme.hint)];
            if !hint.is_empty() {
                spans.push(Span::styled(format!(", {hint}"), theme.hint));
            }
            Line::from(spans)
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}
