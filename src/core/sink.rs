//! Destinations for metric records.

use std::io::Write;

use log::{error, warn};
use serde::Serialize;

use super::records::{FieldValue, Fields, MetricRecord, Tags};

/// Receives records from the collector. Delivery is fire-and-forget.
pub trait MetricsSink {
    fn add_fields(&mut self, measurement: &str, fields: &Fields, tags: &Tags);

    fn add_record(&mut self, record: &MetricRecord) {
        self.add_fields(&record.measurement, &record.fields, &record.tags);
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for &mut S {
    fn add_fields(&mut self, measurement: &str, fields: &Fields, tags: &Tags) {
        (**self).add_fields(measurement, fields, tags)
    }
}

/// Keeps every record in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<MetricRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records with the given measurement name
    pub fn measurement(&self, name: &str) -> Vec<&MetricRecord> {
        self.records.iter().filter(|r| r.measurement == name).collect()
    }
}

impl MetricsSink for MemorySink {
    fn add_fields(&mut self, measurement: &str, fields: &Fields, tags: &Tags) {
        self.records.push(MetricRecord {
            measurement: measurement.to_string(),
            fields: fields.clone(),
            tags: tags.clone(),
        });
    }
}

// Line protocol

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_measurement(s: &str) -> String {
    escape(s, &[',', ' '])
}

fn escape_key(s: &str) -> String {
    escape(s, &[',', '=', ' '])
}

fn format_field_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Unsigned(n) => format!("{}u", n),
        FieldValue::Integer(n) => format!("{}i", n),
        FieldValue::Boolean(b) => b.to_string(),
        FieldValue::Text(s) => format!("\"{}\"", escape(s, &['"', '\\'])),
    }
}

/// Tag keys and values must be non-empty and fit on one line
pub fn is_valid_tag(key: &str, value: &str) -> bool {
    let one_line = |s: &str| !s.is_empty() && !s.contains(['\n', '\r']);
    one_line(key) && one_line(value)
}

/// Format one record as an InfluxDB line-protocol line (without newline).
/// Tags that cannot be written are left out.
pub fn format_line(measurement: &str, fields: &Fields, tags: &Tags, timestamp_ns: Option<i64>) -> String {
    let mut line = escape_measurement(measurement);

    for (key, value) in tags {
        if !is_valid_tag(key, value) {
            warn!("Skipping tag {:?}={:?} on {}", key, value, measurement);
            continue;
        }
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    let fields = fields
        .iter()
        .map(|(key, value)| format!("{}={}", escape_key(key), format_field_value(value)))
        .collect::<Vec<_>>()
        .join(",");
    line.push(' ');
    line.push_str(&fields);

    if let Some(ts) = timestamp_ns {
        line.push(' ');
        line.push_str(&ts.to_string());
    }

    line
}

/// Writes records as line protocol, one per line
pub struct LineProtocolSink<W: Write> {
    writer: W,
    timestamps: bool,
}

impl<W: Write> LineProtocolSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            timestamps: true,
        }
    }

    /// Leave timestamps to the receiver
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsSink for LineProtocolSink<W> {
    fn add_fields(&mut self, measurement: &str, fields: &Fields, tags: &Tags) {
        if fields.is_empty() {
            error!("Dropping {}: a line needs at least one field", measurement);
            return;
        }

        let ts = if self.timestamps {
            chrono::Utc::now().timestamp_nanos_opt()
        } else {
            None
        };
        let line = format_line(measurement, fields, tags, ts);

        if let Err(e) = writeln!(self.writer, "{}", line).and_then(|_| self.writer.flush()) {
            error!("Failed to write {}: {}", measurement, e);
        }
    }
}

// JSON lines

#[derive(Serialize)]
struct JsonLine<'a> {
    name: &'a str,
    timestamp: i64,
    fields: &'a Fields,
    tags: &'a Tags,
}

/// Writes each record as one JSON object per line
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MetricsSink for JsonSink<W> {
    fn add_fields(&mut self, measurement: &str, fields: &Fields, tags: &Tags) {
        let line = JsonLine {
            name: measurement,
            timestamp: chrono::Utc::now().timestamp(),
            fields,
            tags,
        };

        let result = serde_json::to_writer(&mut self.writer, &line)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.writer))
            .and_then(|_| self.writer.flush());

        if let Err(e) = result {
            error!("Failed to write {}: {}", measurement, e);
        }
    }
}
