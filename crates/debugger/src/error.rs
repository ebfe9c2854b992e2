use crate::BreakpointId;

/// Errors reported by a [`crate::DebugBackend`]
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The debuggee ran to completion; the session is over until restarted
    #[error("process has exited with status {status}")]
    ProcessExited { status: i32 },

    #[error("{method} failed: {message}")]
    Rpc { method: String, message: String },

    #[error("no breakpoint with id {0}")]
    BreakpointNotFound(BreakpointId),

    #[error("debuggee is not stopped at a known location")]
    NoLocation,

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    /// Build the error for a failed remote call, recognising process exit messages
    pub fn from_rpc(method: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        match exit_status(&message) {
            Some(status) => BackendError::ProcessExited { status },
            None => BackendError::Rpc {
                method: method.into(),
                message,
            },
        }
    }

    pub fn is_process_exit(&self) -> bool {
        matches!(self, BackendError::ProcessExited { .. })
    }
}

/// Extract the status from messages like "Process 1234 has exited with status 0"
fn exit_status(message: &str) -> Option<i32> {
    const NEEDLE: &str = "has exited with status ";
    let start = message.find(NEEDLE)? + NEEDLE.len();
    let digits: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    digits.parse().ok()
}

pub type Result<T> = std::result::Result<T, BackendError>;
