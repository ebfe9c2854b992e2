use std::fmt::Write;

use super::api::{self, kind};
use crate::Variable;

const INDENT: &str = "  ";

/// Convert a Delve variable into its single and multi-line renderings
pub(crate) fn to_variable(name: &str, v: &api::Variable) -> Variable {
    let value = render(v, false);
    let multiline_value = has_children(v).then(|| render(v, true));
    Variable {
        name: name.to_string(),
        value,
        multiline_value,
    }
}

fn has_children(v: &api::Variable) -> bool {
    v.unreadable.is_empty() && !v.children.is_empty() && v.kind != kind::STRING
}

pub(crate) fn render(v: &api::Variable, multiline: bool) -> String {
    let mut out = String::new();
    write_value(&mut out, v, multiline, 0, true);
    out
}

fn write_value(out: &mut String, v: &api::Variable, multiline: bool, depth: usize, top: bool) {
    if !v.unreadable.is_empty() {
        let _ = write!(out, "(unreadable {})", v.unreadable);
        return;
    }

    match v.kind {
        kind::STRING => write_string(out, v),
        kind::STRUCT => {
            out.push_str(&v.type_name);
            out.push(' ');
            let fields = v.children.iter().map(|child| (Some(child.name.as_str()), child));
            write_children(out, fields, multiline, depth, '{', '}');
            if v.len > v.children.len() as i64 {
                let _ = write!(out, "...+{} more", v.len - v.children.len() as i64);
            }
        }
        kind::SLICE | kind::ARRAY => {
            if top {
                out.push_str(&v.type_name);
                if v.kind == kind::SLICE {
                    let _ = write!(out, " len: {}, cap: {}, ", v.len, v.cap);
                } else {
                    out.push(' ');
                }
            }
            let items = v.children.iter().map(|child| (None, child));
            write_children(out, items, multiline, depth, '[', ']');
            write_remaining(out, v.len, v.children.len());
        }
        kind::MAP => {
            if top {
                out.push_str(&v.type_name);
                out.push(' ');
            }
            write_map(out, v, multiline, depth);
        }
        kind::POINTER => match v.children.first() {
            None => out.push_str("nil"),
            Some(child) if child.addr == 0 => out.push_str("nil"),
            Some(child) if child.only_addr => {
                let _ = write!(out, "({})(0x{:x})", v.type_name, child.addr);
            }
            Some(child) => {
                out.push('*');
                write_value(out, child, multiline, depth, top);
            }
        },
        kind::INTERFACE => match v.children.first() {
            Some(child) if child.kind != kind::INVALID => {
                write_value(out, child, multiline, depth, top)
            }
            _ => out.push_str("nil"),
        },
        kind::FUNC | kind::CHAN if v.value.is_empty() => out.push_str("nil"),
        kind::UNSAFE_POINTER => {
            let _ = write!(out, "unsafe.Pointer(0x{:x})", v.addr);
        }
        kind::INVALID if v.value.is_empty() => out.push_str("(invalid)"),
        _ => out.push_str(&v.value),
    }
}

fn write_string(out: &mut String, v: &api::Variable) {
    let _ = write!(out, "{:?}", v.value);
    write_remaining(out, v.len, v.value.chars().count());
}

fn write_remaining(out: &mut String, total: i64, shown: usize) {
    let shown = shown as i64;
    if total > shown {
        let _ = write!(out, "...+{} more", total - shown);
    }
}

fn write_children<'a>(
    out: &mut String,
    children: impl ExactSizeIterator<Item = (Option<&'a str>, &'a api::Variable)>,
    multiline: bool,
    depth: usize,
    open: char,
    close: char,
) {
    out.push(open);
    let count = children.len();
    if multiline && count > 0 {
        out.push('\n');
        for (label, child) in children {
            push_indent(out, depth + 1);
            if let Some(label) = label {
                let _ = write!(out, "{label}: ");
            }
            write_value(out, child, true, depth + 1, false);
            out.push_str(",\n");
        }
        push_indent(out, depth);
    } else {
        for (i, (label, child)) in children.enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if let Some(label) = label {
                let _ = write!(out, "{label}: ");
            }
            write_value(out, child, false, depth + 1, false);
        }
    }
    out.push(close);
}

/// Map children alternate key, value
fn write_map(out: &mut String, v: &api::Variable, multiline: bool, depth: usize) {
    out.push('[');
    let pairs: Vec<_> = v.children.chunks(2).filter(|pair| pair.len() == 2).collect();
    if multiline && !pairs.is_empty() {
        out.push('\n');
        for pair in &pairs {
            push_indent(out, depth + 1);
            write_value(out, &pair[0], false, depth + 1, false);
            out.push_str(": ");
            write_value(out, &pair[1], true, depth + 1, false);
            out.push_str(",\n");
        }
        push_indent(out, depth);
    } else {
        for (i, pair) in pairs.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            write_value(out, &pair[0], false, depth + 1, false);
            out.push_str(": ");
            write_value(out, &pair[1], false, depth + 1, false);
        }
    }
    out.push(']');
    write_remaining(out, v.len, pairs.len());
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
