//! Core data model types for upload intake.
//!
//! Every parser produces a [`FileInformation`]: the column headings, the keyed row [`Record`]s
//! (when materialized) and the record count.

use indexmap::IndexMap;

/// A single raw cell value, untyped beyond what the source format yielded.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing/empty cell.
    Empty,
    /// Boolean cell.
    Bool(bool),
    /// Integer cell.
    Int(i64),
    /// Floating point cell (spreadsheet numbers and date serials land here).
    Float(f64),
    /// Text cell. Delimited-text fields are always text.
    Text(String),
}

impl CellValue {
    /// `true` for an empty cell or a zero-length string.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Render the value the way a spreadsheet displays it in delimited-text exports.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => general_number(*f),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Convert a JSON scalar into a cell. Nested arrays/objects are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Int(i),
                None => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Empty),
            },
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// Format a number like a spreadsheet's General format: at most 15 significant digits and no
/// fractional part for whole numbers.
fn general_number(f: f64) -> String {
    if !f.is_finite() {
        return f.to_string();
    }
    let rounded = format!("{f:.14e}").parse::<f64>().unwrap_or(f);
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        (rounded as i64).to_string()
    } else {
        rounded.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// One keyed row. Keys keep their insertion order.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, CellValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value stored under `key` in place.
    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        self.fields.insert(key.into(), value);
    }

    /// Returns the value stored under `key`, if present.
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.get(key)
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when the record holds no keys.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a record from a JSON object, keeping its key order.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        object
            .iter()
            .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
            .collect()
    }
}

/// Records are equal when they hold the same keys and values in the same order.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Into<String>> FromIterator<(K, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, CellValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Normalized result of parsing one upload.
///
/// In header-discovery mode `data` stays empty while `total_records` still carries the true row
/// count.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInformation {
    /// Column headings in source order.
    pub headings: Vec<String>,
    /// Materialized keyed rows.
    pub data: Vec<Record>,
    /// Number of data rows.
    pub total_records: usize,
}
