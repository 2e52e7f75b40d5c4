//! InfluxDB line protocol encoding.
//!
//! `measurement[,tag=value...] field=value[,field=value...] timestamp`, one
//! point per line, timestamps in nanoseconds.

use std::fmt::Write;

use buildpulse_core::model::point::{FieldValue, Point, PointBatch};

pub fn encode_point(point: &Point) -> String {
    let mut line = String::with_capacity(128);
    write_point(&mut line, point);
    line
}

/// Newline separated lines, no trailing newline. An empty batch encodes to an
/// empty body.
pub fn encode_batch(batch: &PointBatch) -> String {
    let mut body = String::with_capacity(batch.len() * 128);
    for (idx, point) in batch.iter().enumerate() {
        if idx > 0 {
            body.push('\n');
        }
        write_point(&mut body, point);
    }
    body
}

fn write_point(out: &mut String, point: &Point) {
    escape_into(out, point.measurement(), &[',', ' ']);
    for (key, value) in point.tags() {
        out.push(',');
        escape_into(out, key, &[',', '=', ' ']);
        out.push('=');
        escape_into(out, value, &[',', '=', ' ']);
    }
    out.push(' ');
    for (idx, (key, value)) in point.fields().iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        escape_into(out, key, &[',', '=', ' ']);
        out.push('=');
        write_field_value(out, value);
    }
    let _ = write!(out, " {}", point.timestamp_nanos());
}

fn write_field_value(out: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Boolean(v) => out.push_str(if *v { "true" } else { "false" }),
        FieldValue::Integer(v) => {
            let _ = write!(out, "{v}i");
        }
        FieldValue::Float(v) => {
            let _ = write!(out, "{v}");
        }
        FieldValue::String(v) => {
            out.push('"');
            escape_into(out, v, &['"', '\\']);
            out.push('"');
        }
    }
}

/// Backslash-escapes `special` and replaces line breaks, which would
/// otherwise split the point across lines.
fn escape_into(out: &mut String, raw: &str, special: &[char]) {
    for ch in raw.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}
