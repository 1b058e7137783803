//! JSON text rendering for converted values

use std::fmt::Write as _;

use crate::value::{Array, Object, Value};

const INDENT: &str = "  ";

/// Render `value` as compact JSON
pub fn to_string(value: &Value) -> String {
    let mut output = String::new();
    write_value(value, None, &mut output);
    output
}

/// Render `value` as JSON indented by two spaces per level
pub fn to_string_pretty(value: &Value) -> String {
    let mut output = String::new();
    write_value(value, Some(0), &mut output);
    output
}

fn write_value(value: &Value, indent: Option<usize>, output: &mut String) {
    match value {
        Value::String(s) => write_string(s, output),
        Value::Array(arr) => write_array(arr, indent, output),
        Value::Object(obj) => write_object(obj, indent, output),
    }
}

fn write_array(arr: &Array, indent: Option<usize>, output: &mut String) {
    if arr.is_empty() {
        output.push_str("[]");
        return;
    }

    output.push('[');
    for (i, item) in arr.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        newline(indent.map(|level| level + 1), output);
        write_value(item, indent.map(|level| level + 1), output);
    }
    newline(indent, output);
    output.push(']');
}

fn write_object(obj: &Object, indent: Option<usize>, output: &mut String) {
    if obj.is_empty() {
        output.push_str("{}");
        return;
    }

    output.push('{');
    for (i, (key, value)) in obj.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        newline(indent.map(|level| level + 1), output);
        write_string(key, output);
        output.push(':');
        if indent.is_some() {
            output.push(' ');
        }
        write_value(value, indent.map(|level| level + 1), output);
    }
    newline(indent, output);
    output.push('}');
}

fn newline(indent: Option<usize>, output: &mut String) {
    if let Some(level) = indent {
        output.push('\n');
        for _ in 0..level {
            output.push_str(INDENT);
        }
    }
}

fn write_string(s: &str, output: &mut String) {
    output.push('"');
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\x08' => output.push_str("\\b"),
            '\x0C' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c < '\u{20}' => {
                let _ = write!(output, "\\u{:04x}", u32::from(c));
            }
            c => output.push(c),
        }
    }
    output.push('"');
}
