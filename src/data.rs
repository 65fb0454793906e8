use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;

/// A single scalar cell of a raw record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric coercion: anything that does not parse to a finite number is 0.
    pub fn as_number(&self) -> f64 {
        let n = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            RawValue::Bool(true) => 1.0,
            RawValue::Bool(false) | RawValue::Null => 0.0,
        };
        if n.is_finite() {
            n
        } else {
            0.0
        }
    }

    /// Display string used for grouping keys. `None` for null and blank text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Bool(b) => Some(b.to_string()),
            RawValue::Number(n) => Some(format_number(*n)),
            RawValue::Text(s) if s.trim().is_empty() => None,
            RawValue::Text(s) => Some(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }
}

/// Formats integral values without a fractional part (`2024`, not `2024.0`).
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One record as returned by the analytics API: an open field -> scalar map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: IndexMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<RawValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<RawValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Looks up a field; explicit nulls count as absent.
    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn number(&self, field: &str) -> f64 {
        self.get(field).map(RawValue::as_number).unwrap_or(0.0)
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(RawValue::as_text)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n as f64)
    }
}

impl From<i32> for RawValue {
    fn from(n: i32) -> Self {
        RawValue::Number(n as f64)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(RawValue::Null)
    }
}

/// Ordered collection of raw records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub rows: Vec<RawRecord>,
}

impl RowSet {
    pub fn new(rows: Vec<RawRecord>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawRecord> {
        self.rows.iter()
    }

    /// Create a RowSet from a JSON array of objects, or from an API
    /// response object carrying the records under `items`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = match value {
            Value::Array(items) => items,
            Value::Object(obj) => obj
                .get("items")
                .and_then(Value::as_array)
                .ok_or_else(|| anyhow!("Response object has no 'items' array"))?,
            _ => return Err(anyhow!("Input data must be a JSON array of objects")),
        };

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;

            let mut record = RawRecord::new();
            for (field, val) in obj {
                let raw = match val {
                    Value::String(s) => RawValue::Text(s.clone()),
                    Value::Number(n) => RawValue::Number(n.as_f64().unwrap_or(0.0)),
                    Value::Bool(b) => RawValue::Bool(*b),
                    Value::Null => RawValue::Null,
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", field)),
                };
                record.insert(field, raw);
            }
            rows.push(record);
        }

        Ok(Self { rows })
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input).context("Failed to parse JSON data")?;
        Self::from_json(&value)
    }

    /// Create a RowSet from CSV with a header row. Numeric cells become
    /// numbers and empty cells become nulls.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (line, result) in csv_reader.records().enumerate() {
            let record = result.with_context(|| format!("Failed to read CSV record {}", line + 1))?;
            let mut row = RawRecord::new();
            for (header, cell) in headers.iter().zip(record.iter()) {
                let cell = cell.trim();
                let value = if cell.is_empty() {
                    RawValue::Null
                } else {
                    match cell.parse::<f64>() {
                        Ok(n) if n.is_finite() => RawValue::Number(n),
                        _ => RawValue::Text(cell.to_string()),
                    }
                };
                row.insert(header, value);
            }
            rows.push(row);
        }

        Ok(Self { rows })
    }
}

impl FromIterator<RawRecord> for RowSet {
    fn from_iter<I: IntoIterator<Item = RawRecord>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a RawRecord;
    type IntoIter = std::slice::Iter<'a, RawRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// One page of records from the analytics API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDataResponse {
    pub items: Vec<RawRecord>,
    pub total_items: u64,
    pub page: u64,
    pub items_per_page: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
}

impl RawDataResponse {
    pub fn from_json_str(input: &str) -> Result<Self> {
        let mut response: Self =
            serde_json::from_str(input).context("Failed to parse raw data response")?;
        if response.total_pages.is_none() {
            response.total_pages = Some(response.page_count());
        }
        Ok(response)
    }

    pub fn page_count(&self) -> u64 {
        self.total_pages.unwrap_or_else(|| {
            if self.items_per_page == 0 {
                0
            } else {
                self.total_items.div_ceil(self.items_per_page)
            }
        })
    }

    pub fn into_rows(self) -> RowSet {
        RowSet::new(self.items)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
}

/// A draggable field as presented in the field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl DataField {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: display_name(id),
            field_type: infer_field_type(id),
        }
    }
}

const KNOWN_FIELD_TYPES: [(&str, FieldType); 7] = [
    ("project_key", FieldType::String),
    ("team_name", FieldType::String),
    ("year", FieldType::Number),
    ("month", FieldType::Number),
    ("burn_team_size", FieldType::Number),
    ("build_team_size", FieldType::Number),
    ("all_team_size", FieldType::Number),
];

const DATE_HINTS: [&str; 3] = ["date", "time", "timestamp"];

const NUMBER_HINTS: [&str; 10] = [
    "size", "count", "number", "amount", "value", "score", "rate", "percent", "burn", "build",
];

/// Name-based field type guess; known API fields win over heuristics.
pub fn infer_field_type(field: &str) -> FieldType {
    if let Some((_, ty)) = KNOWN_FIELD_TYPES.iter().find(|(name, _)| *name == field) {
        return *ty;
    }

    let lower = field.to_lowercase();
    if DATE_HINTS.iter().any(|h| lower.contains(h)) || lower == "year" || lower == "month" {
        return FieldType::Date;
    }
    if NUMBER_HINTS.iter().any(|h| lower.contains(h)) {
        return FieldType::Number;
    }
    FieldType::String
}

/// `burn_team_size` -> `Burn Team Size`
pub fn display_name(field: &str) -> String {
    field
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Sorted union of the field names seen across all rows.
pub fn discover_fields(rows: &RowSet) -> Vec<DataField> {
    let mut names: Vec<&str> = rows.iter().flat_map(RawRecord::keys).collect();
    names.sort_unstable();
    names.dedup();
    names.into_iter().map(DataField::new).collect()
}
