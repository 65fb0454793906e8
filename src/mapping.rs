use serde::{Deserialize, Serialize};

/// Chart kind; decides the aggregation strategy and which roles matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Area,
    Pie,
    Scatter,
}

impl ChartKind {
    pub fn is_pie(self) -> bool {
        matches!(self, ChartKind::Pie)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Area => "area",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
        }
    }
}

impl std::str::FromStr for ChartKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "area" => Ok(ChartKind::Area),
            "pie" => Ok(ChartKind::Pie),
            "scatter" => Ok(ChartKind::Scatter),
            other => Err(anyhow::anyhow!("Unknown chart type '{}'", other)),
        }
    }
}

/// Role -> field name assignments made by dropping fields onto axes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_y: Option<String>,
}

impl FieldMapping {
    /// Simple x/y mapping, handy for building series programmatically.
    pub fn xy(x: &str, y: &str) -> Self {
        Self {
            x: Some(x.to_string()),
            y: Some(y.to_string()),
            ..Self::default()
        }
    }

    /// Pie mapping: slices named by `name` (optional), sized by `value`.
    pub fn pie(name: Option<&str>, value: &str) -> Self {
        Self {
            x: name.map(str::to_string),
            value: Some(value.to_string()),
            ..Self::default()
        }
    }

    pub fn x(&self) -> Option<&str> {
        self.x.as_deref()
    }

    pub fn y(&self) -> Option<&str> {
        self.y.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Mapping of the primary composed series, expressed as a simple x/y mapping.
    pub fn primary(&self) -> FieldMapping {
        Self::series(self.primary_x.as_deref(), self.primary_y.as_deref())
    }

    /// Mapping of the secondary composed series.
    pub fn secondary(&self) -> FieldMapping {
        Self::series(self.secondary_x.as_deref(), self.secondary_y.as_deref())
    }

    // A pie-kind series reads its slice size from the y role.
    fn series(x: Option<&str>, y: Option<&str>) -> FieldMapping {
        FieldMapping {
            x: x.map(str::to_string),
            y: y.map(str::to_string),
            value: y.map(str::to_string),
            ..FieldMapping::default()
        }
    }

    /// True when the mapping has enough roles to render a chart of `kind`.
    pub fn is_renderable(&self, kind: ChartKind) -> bool {
        if kind.is_pie() {
            self.value.is_some()
        } else {
            self.x.is_some() && self.y.is_some()
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary_x.is_some() && self.primary_y.is_some()
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary_x.is_some() && self.secondary_y.is_some()
    }

    /// Role bookkeeping when the chart kind changes. Lossy: switching to pie
    /// drops every axis role, switching to anything else drops `value`.
    pub fn switch_kind(&mut self, kind: ChartKind) {
        if kind.is_pie() {
            self.x = None;
            self.y = None;
            self.primary_x = None;
            self.primary_y = None;
            self.secondary_x = None;
            self.secondary_y = None;
        } else {
            self.value = None;
        }
    }
}
