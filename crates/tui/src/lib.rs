//! Terminal front-end for a Delve debugging session.
//!
//! [`app::App`] hosts five windows around a [`debugger::DebugBackend`]: local
//! variables, breakpoints, the call stack, the source viewer and the output
//! pane with its command prompt.
pub mod app;
pub mod cache;
pub mod components;
pub mod highlight;
pub mod layout;
pub mod message;
pub mod paths;
pub mod theme;

pub use app::App;
