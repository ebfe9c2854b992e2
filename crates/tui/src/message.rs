//! Messages flowing through the UI loop and the effects panes ask for.
use std::path::PathBuf;

use crossterm::event::KeyEvent;
use debugger::{Breakpoint, BreakpointId, Location, Output};

/// Numeric identifier of a top-level window, also its focus shortcut
pub type WindowId = usize;

/// Identity of a breakpoint carried by lifecycle messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointRef {
    pub id: BreakpointId,
    pub filename: PathBuf,
    pub line: usize,
}

impl From<&Breakpoint> for BreakpointRef {
    fn from(bp: &Breakpoint) -> Self {
        Self {
            id: bp.id,
            filename: bp.filename.clone(),
            line: bp.line,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Key(KeyEvent),
    /// Terminal size for the shell, outer size for a window, inner size for a pane
    Resize { width: u16, height: u16 },
    WindowFocused(WindowId),
    WindowTitleChanged { id: WindowId, title: String },

    /// Reload everything from the backend
    RefreshContent,
    DebuggerStepped,
    DebuggerRestarted,
    BreakpointCreated(BreakpointRef),
    BreakpointToggled(BreakpointRef),
    BreakpointCleared(BreakpointRef),
    /// Condition or alias changed
    BreakpointAmended(BreakpointRef),

    /// Ask the breakpoints pane to select a breakpoint and take focus
    BreakpointSelected(BreakpointId),
    /// Ask the source pane to show a location and take focus
    FileRequested(Location),
    OutputReceived(Output),
}

impl Message {
    /// Messages after which panes re-query the backend
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Message::RefreshContent
                | Message::DebuggerStepped
                | Message::DebuggerRestarted
                | Message::BreakpointCreated(_)
                | Message::BreakpointToggled(_)
                | Message::BreakpointCleared(_)
                | Message::BreakpointAmended(_)
        )
    }
}

/// Effect returned from an update
#[derive(Debug, Default, PartialEq)]
pub enum Cmd {
    #[default]
    None,
    Msg(Message),
    Batch(Vec<Cmd>),
    /// Deliver the next line of debuggee output once one is available
    AwaitOutput,
    Quit,
}

impl Cmd {
    pub fn msg(message: Message) -> Self {
        Cmd::Msg(message)
    }

    pub fn batch(cmds: impl IntoIterator<Item = Cmd>) -> Self {
        let mut cmds: Vec<_> = cmds.into_iter().filter(|cmd| *cmd != Cmd::None).collect();
        match cmds.len() {
            0 => Cmd::None,
            1 => cmds.remove(0),
            _ => Cmd::Batch(cmds),
        }
    }

    /// Flatten into individual effects, preserving order
    pub fn flatten(self, into: &mut Vec<Cmd>) {
        match self {
            Cmd::None => {}
            Cmd::Batch(cmds) => {
                for cmd in cmds {
                    cmd.flatten(into);
                }
            }
            other => into.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_drop_empty_commands() {
        assert_eq!(Cmd::batch([Cmd::None, Cmd::None]), Cmd::None);
        assert_eq!(Cmd::batch([Cmd::None, Cmd::Quit]), Cmd::Quit);
    }

    #[test]
    fn flatten_keeps_order() {
        let cmd = Cmd::batch([
            Cmd::msg(Message::DebuggerStepped),
            Cmd::batch([Cmd::AwaitOutput, Cmd::msg(Message::RefreshContent)]),
        ]);
        let mut flat = Vec::new();
        cmd.flatten(&mut flat);
        assert_eq!(
            flat,
            vec![
                Cmd::Msg(Message::DebuggerStepped),
                Cmd::AwaitOutput,
                Cmd::Msg(Message::RefreshContent),
            ]
        );
    }
}
