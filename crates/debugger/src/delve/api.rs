//! Wire types of the Delve JSON-RPC v2 API.
//!
//! Only the fields this crate reads are modelled. Breakpoints keep every
//! other field in `extra` so that amending a breakpoint sends back exactly
//! what the server reported.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Breakpoint {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: i64,
    #[serde(rename = "Cond", default)]
    pub cond: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebuggerState {
    #[serde(rename = "currentThread", default)]
    pub current_thread: Option<Thread>,
    #[serde(default)]
    pub exited: bool,
    #[serde(rename = "exitStatus", default)]
    pub exit_status: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thread {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: i64,
    #[serde(rename = "goroutineID", default)]
    pub goroutine_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Function {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Stackframe {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: i64,
    #[serde(default)]
    pub function: Option<Function>,
}

/// Go `reflect.Kind` values as reported in `Variable.kind`
pub mod kind {
    pub const INVALID: u32 = 0;
    pub const BOOL: u32 = 1;
    pub const ARRAY: u32 = 17;
    pub const CHAN: u32 = 18;
    pub const FUNC: u32 = 19;
    pub const INTERFACE: u32 = 20;
    pub const MAP: u32 = 21;
    pub const POINTER: u32 = 22;
    pub const SLICE: u32 = 23;
    pub const STRING: u32 = 24;
    pub const STRUCT: u32 = 25;
    pub const UNSAFE_POINTER: u32 = 26;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Variable {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub addr: u64,
    #[serde(rename = "onlyAddr", default)]
    pub only_addr: bool,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default)]
    pub kind: u32,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub len: i64,
    #[serde(default)]
    pub cap: i64,
    #[serde(default)]
    pub children: Vec<Variable>,
    #[serde(default)]
    pub unreadable: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadConfig {
    pub follow_pointers: bool,
    pub max_variable_recurse: i64,
    pub max_string_len: i64,
    pub max_array_values: i64,
    pub max_struct_fields: i64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            follow_pointers: true,
            max_variable_recurse: 4,
            max_string_len: 64,
            max_array_values: 64,
            max_struct_fields: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EvalScope {
    #[serde(rename = "GoroutineID")]
    pub goroutine_id: i64,
    #[serde(rename = "Frame")]
    pub frame: i64,
    #[serde(rename = "DeferredCall")]
    pub deferred_call: i64,
}

impl EvalScope {
    pub fn goroutine(goroutine_id: i64) -> Self {
        Self {
            goroutine_id,
            frame: 0,
            deferred_call: 0,
        }
    }
}

// request and response payloads

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateIn {
    pub non_blocking: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateOut {
    pub state: DebuggerState,
}

#[derive(Debug, Serialize)]
pub struct CommandIn<'a> {
    pub name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandOut {
    pub state: DebuggerState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestartIn {
    pub position: String,
    pub reset_args: bool,
    pub new_args: Vec<String>,
    pub rerecord: bool,
    pub rebuild: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListBreakpointsIn {
    pub all: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListBreakpointsOut {
    #[serde(default)]
    pub breakpoints: Vec<Breakpoint>,
}

#[derive(Debug, Serialize)]
pub struct BreakpointIdIn {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BreakpointOut {
    pub breakpoint: Breakpoint,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BreakpointIn {
    pub breakpoint: Breakpoint,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScopedIn {
    pub scope: EvalScope,
    pub cfg: LoadConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListLocalVarsOut {
    #[serde(default)]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListFunctionArgsOut {
    #[serde(default)]
    pub args: Vec<Variable>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvalIn<'a> {
    pub scope: EvalScope,
    pub expr: &'a str,
    pub cfg: LoadConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvalOut {
    pub variable: Variable,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StacktraceIn {
    pub id: i64,
    pub depth: i64,
    pub full: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StacktraceOut {
    #[serde(default)]
    pub locations: Vec<Stackframe>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetachIn {
    pub kill: bool,
}

/// Responses whose payload is ignored
#[derive(Debug, Default, Deserialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoint_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "id": 3,
            "name": "",
            "file": "/src/main.go",
            "line": 12,
            "Cond": "i > 2",
            "disabled": false,
            "addrs": [4242],
            "hitCount": {},
        });
        let bp: Breakpoint = serde_json::from_value(raw).unwrap();
        assert_eq!(bp.cond, "i > 2");

        let back = serde_json::to_value(&bp).unwrap();
        assert_eq!(back["addrs"], serde_json::json!([4242]));
        assert_eq!(back["Cond"], "i > 2");
    }

    #[test]
    fn state_without_thread() {
        let state: DebuggerState =
            serde_json::from_str(r#"{"Running":false,"exited":true,"exitStatus":2}"#).unwrap();
        assert!(state.current_thread.is_none());
        assert!(state.exited);
        assert_eq!(state.exit_status, 2);
    }
}
