//! Debugging backend abstraction used by the terminal front-end.
//!
//! The [`DebugBackend`] trait is the synchronous surface the UI drives. The
//! [`delve`] module implements it on top of a headless Delve server.
mod backend;
pub mod delve;
mod error;
mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::DebugBackend;
pub use delve::DelveBackend;
pub use error::{BackendError, Result};
pub use types::{Breakpoint, BreakpointId, Location, Output, OutputSource, StackFrame, Variable};
