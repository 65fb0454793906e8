use crate::mapping::ChartKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// Phase 1: Aggregation output
// =============================================================================

/// A single output cell: either a group key or an accumulated number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    Number(f64),
    Text(String),
}

impl Datum {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Number(n) => Some(*n),
            Datum::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Text(s) => Some(s),
            Datum::Number(_) => None,
        }
    }
}

impl From<f64> for Datum {
    fn from(n: f64) -> Self {
        Datum::Number(n)
    }
}

impl From<usize> for Datum {
    fn from(n: usize) -> Self {
        Datum::Number(n as f64)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::Text(s.to_string())
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::Text(s)
    }
}

/// One row handed to the renderer: field name -> datum, in insertion order.
///
/// Writing a field twice keeps its first position and the latest value, so a
/// y field literally named `count` overwrites the counter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartRow {
    fields: IndexMap<String, Datum>,
}

impl ChartRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<Datum>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<Datum>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Datum> {
        self.fields.get(field)
    }

    /// Presence check; a missing series value is not the same as zero.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Datum::as_f64)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Datum::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Datum)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// =============================================================================
// Phase 2: Chart spec
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSide {
    Single,
    Left,
    Right,
}

/// How one series of the dataset should be drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDescriptor {
    pub data_key: String,
    pub label: String,
    pub color: String,
    pub axis: AxisSide,
    pub kind: ChartKind,
}

/// Everything a renderer needs for one chart canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_kind: Option<ChartKind>,
    pub title: String,
    /// Field holding the category (or pie slice name) in every data row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_key: Option<String>,
    pub data: Vec<ChartRow>,
    pub series: Vec<SeriesDescriptor>,
    /// One colour per data row; only filled for pie charts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slice_colors: Vec<String>,
    pub show_legend: bool,
    pub show_grid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
}

impl ChartSpec {
    /// Nothing to draw: either unconfigured or no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.series.is_empty()
    }

    pub fn is_composed(&self) -> bool {
        self.secondary_kind.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayPosition {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlaySize {
    Small,
    #[default]
    Medium,
    Large,
}

impl OverlaySize {
    /// Pixel dimensions (width, height) of the inset.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            OverlaySize::Small => (200, 150),
            OverlaySize::Medium => (300, 200),
            OverlaySize::Large => (400, 250),
        }
    }
}

/// An inset chart floated over the main canvas; never merged into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayChart {
    pub position: OverlayPosition,
    pub width: u32,
    pub height: u32,
    pub spec: ChartSpec,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_overwrite_keeps_position() {
        let row = ChartRow::new()
            .with("region", "N")
            .with("count", 2usize)
            .with("count", 15.0);
        let keys: Vec<&str> = row.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["region", "count"]);
        assert_eq!(row.number("count"), Some(15.0));
    }

    #[test]
    fn test_row_serializes_in_order() {
        let row = ChartRow::new().with("region", "N").with("count", 2usize).with("sales", 15.0);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"region":"N","count":2.0,"sales":15.0}"#);
    }

    #[test]
    fn test_overlay_dimensions() {
        assert_eq!(OverlaySize::Small.dimensions(), (200, 150));
        assert_eq!(OverlaySize::Large.dimensions(), (400, 250));
    }
}
