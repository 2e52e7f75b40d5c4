use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BuildPulseError, Result};

/// A typed field value. Deserialization tries bool, integer, float, string in
/// that order so JSON `11` stays an integer and `11.5` becomes a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl FieldValue {
    fn is_finite(&self) -> bool {
        match self {
            Self::Float(v) => v.is_finite(),
            _ => true,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// One time-series record. Only constructible through [`PointBuilder`], which
/// guarantees a non-empty measurement, at least one field and finite floats.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    measurement: String,
    timestamp: DateTime<Utc>,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
}

impl Point {
    pub fn builder(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> PointBuilder {
        PointBuilder {
            measurement: measurement.into(),
            timestamp,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Nanoseconds since the epoch; range is checked when the point is built.
    pub fn timestamp_nanos(&self) -> i64 {
        self.timestamp.timestamp_nanos_opt().unwrap_or_default()
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}

#[derive(Debug, Clone)]
pub struct PointBuilder {
    measurement: String,
    timestamp: DateTime<Utc>,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
}

impl PointBuilder {
    pub fn time(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Tags with an empty key or value are dropped; the wire format cannot
    /// carry them.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        if !key.is_empty() && !value.is_empty() {
            self.tags.insert(key, value);
        }
        self
    }

    pub fn tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in tags {
            self = self.tag(k, v);
        }
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field_opt<V: Into<FieldValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.field(key, v),
            None => self,
        }
    }

    pub fn fields<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        for (k, v) in fields {
            self = self.field(k, v);
        }
        self
    }

    pub fn build(self) -> Result<Point> {
        if self.measurement.trim().is_empty() {
            return Err(BuildPulseError::InvalidPoint(
                "measurement name cannot be empty".to_string(),
            ));
        }
        if self.fields.is_empty() {
            return Err(BuildPulseError::InvalidPoint(format!(
                "point '{}' has no fields",
                self.measurement
            )));
        }
        if self.fields.contains_key("") {
            return Err(BuildPulseError::InvalidPoint(format!(
                "point '{}' has an empty field key",
                self.measurement
            )));
        }
        if let Some((key, _)) = self.fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(BuildPulseError::InvalidPoint(format!(
                "field '{key}' of point '{}' is not a finite number",
                self.measurement
            )));
        }
        if self.timestamp.timestamp_nanos_opt().is_none() {
            return Err(BuildPulseError::InvalidPoint(format!(
                "timestamp {} of point '{}' is out of nanosecond range",
                self.timestamp, self.measurement
            )));
        }

        Ok(Point {
            measurement: self.measurement,
            timestamp: self.timestamp,
            tags: self.tags,
            fields: self.fields,
        })
    }
}

/// All points of one publish run, in append order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointBatch {
    points: Vec<Point>,
}

impl PointBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn append(&mut self, points: Vec<Point>) {
        self.points.extend(points);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    pub fn by_measurement<'a>(&'a self, measurement: &'a str) -> impl Iterator<Item = &'a Point> {
        self.points
            .iter()
            .filter(move |p| p.measurement == measurement)
    }
}

impl<'a> IntoIterator for &'a PointBatch {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
