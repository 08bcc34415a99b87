//! Time-series points and InfluxDB line protocol encoding

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// A single tagged, timestamped record written to the time-series sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub time: DateTime<Utc>,
    pub fields: BTreeMap<String, Decimal>,
}

impl Point {
    pub fn new(measurement: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            time,
            fields: BTreeMap::new(),
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: Decimal) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Encode as one line-protocol row with a second-precision timestamp
    ///
    /// `measurement,tag=v field=v,field=v 1620000000`
    pub fn to_line_protocol(&self) -> String {
        let mut line = String::with_capacity(64 + 24 * self.fields.len());
        line.push_str(&escape(&self.measurement, &[',', ' ']));

        for (key, value) in &self.tags {
            let _ = write!(
                line,
                ",{}={}",
                escape(key, KEY_SPECIALS),
                escape(value, KEY_SPECIALS)
            );
        }

        for (i, (key, value)) in self.fields.iter().enumerate() {
            let sep = if i == 0 { ' ' } else { ',' };
            let _ = write!(line, "{}{}={}", sep, escape(key, KEY_SPECIALS), value.normalize());
        }

        let _ = write!(line, " {}", self.time.timestamp());
        line
    }
}

/// Encode a batch as newline-separated line protocol
pub fn encode_batch(points: &[Point]) -> String {
    points
        .iter()
        .map(Point::to_line_protocol)
        .collect::<Vec<_>>()
        .join("\n")
}

const KEY_SPECIALS: &[char] = &[',', '=', ' '];

fn escape(raw: &str, specials: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if specials.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
