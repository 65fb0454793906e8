//! The persisted chart configuration document.
//!
//! Field names match the JSON files the chart builder exports, so a file
//! written by [`ChartConfiguration::to_json_string`] can be re-imported
//! verbatim. Unknown keys are ignored on import.

use crate::filter::Filter;
use crate::ir::{OverlayPosition, OverlaySize};
use crate::mapping::{ChartKind, FieldMapping};
use crate::overlay::ComposedSpec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Kind used for the secondary series when composed mode is switched on.
pub const DEFAULT_SECONDARY_KIND: ChartKind = ChartKind::Line;

/// Visual options shared by the main chart and the inset overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dual_y_axis: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_legend: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_grid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
}

impl ChartConfig {
    /// Explicit title, ignoring blank strings.
    pub fn explicit_title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Inset chart floated over the main canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayChartConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "type", default)]
    pub kind: ChartKind,
    #[serde(default)]
    pub position: OverlayPosition,
    #[serde(default)]
    pub size: OverlaySize,
    #[serde(rename = "dataFields", default)]
    pub data_fields: FieldMapping,
    #[serde(default)]
    pub config: ChartConfig,
}

impl Default for OverlayChartConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: ChartKind::Pie,
            position: OverlayPosition::default(),
            size: OverlaySize::default(),
            data_fields: FieldMapping::default(),
            config: ChartConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub chart_type: ChartKind,
    #[serde(rename = "dataFields", default)]
    pub data_fields: FieldMapping,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub config: ChartConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlayChartConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(rename = "isComposed", default, skip_serializing_if = "Option::is_none")]
    pub is_composed: Option<bool>,
    #[serde(rename = "secondaryChartType", default, skip_serializing_if = "Option::is_none")]
    pub secondary_chart_type: Option<ChartKind>,
}

fn default_name() -> String {
    "New Chart".to_string()
}

impl Default for ChartConfiguration {
    fn default() -> Self {
        Self {
            id: None,
            user_id: None,
            name: default_name(),
            description: None,
            chart_type: ChartKind::Bar,
            data_fields: FieldMapping::default(),
            filters: Vec::new(),
            config: ChartConfig {
                show_legend: Some(true),
                show_grid: Some(true),
                ..ChartConfig::default()
            },
            overlay: None,
            created_at: None,
            updated_at: None,
            is_composed: None,
            secondary_chart_type: None,
        }
    }
}

impl ChartConfiguration {
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Invalid configuration file")
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration '{}'", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Failed to load configuration '{}'", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_json_string()?;
        fs::write(path, text)
            .with_context(|| format!("Failed to write configuration '{}'", path.display()))
    }

    /// Suggested export file name: `{name}.json`, or `chart-config.json`.
    pub fn export_file_name(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            "chart-config.json".to_string()
        } else {
            format!("{}.json", name)
        }
    }

    pub fn composed(&self) -> bool {
        self.is_composed.unwrap_or(false)
    }

    /// Changes the chart kind, clearing roles the new kind cannot use.
    pub fn set_chart_type(&mut self, kind: ChartKind) {
        self.chart_type = kind;
        self.data_fields.switch_kind(kind);
    }

    pub fn toggle_composed(&mut self) {
        if self.composed() {
            self.is_composed = Some(false);
            self.secondary_chart_type = None;
        } else {
            self.is_composed = Some(true);
            self.secondary_chart_type = Some(DEFAULT_SECONDARY_KIND);
        }
    }

    /// Primary/secondary split of the mapping, when composed mode is on.
    pub fn composed_spec(&self) -> Option<ComposedSpec> {
        self.composed().then(|| {
            ComposedSpec::from_mapping(
                &self.data_fields,
                self.chart_type,
                self.secondary_chart_type.unwrap_or(DEFAULT_SECONDARY_KIND),
            )
        })
    }

    /// The enabled inset overlay, if any.
    pub fn active_overlay(&self) -> Option<&OverlayChartConfig> {
        self.overlay.as_ref().filter(|o| o.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAVED: &str = r##"{
        "name": "Burn by month",
        "chart_type": "line",
        "dataFields": { "x": "month", "y": "burn_team_size" },
        "filters": [ { "field": "team_name", "operator": "equals", "value": "Core" } ],
        "config": { "showLegend": true, "colors": ["#111111"], "title": "" },
        "overlay": {
            "enabled": true,
            "type": "pie",
            "position": "bottom-left",
            "size": "small",
            "dataFields": { "x": "team_name", "value": "all_team_size" },
            "config": {}
        },
        "isComposed": false,
        "someFutureKey": 1
    }"##;

    #[test]
    fn test_import_saved_document() {
        let config = ChartConfiguration::from_json_str(SAVED).unwrap();
        assert_eq!(config.name, "Burn by month");
        assert_eq!(config.chart_type, ChartKind::Line);
        assert_eq!(config.data_fields.y(), Some("burn_team_size"));
        assert_eq!(config.filters.len(), 1);
        assert_eq!(config.config.explicit_title(), None);
        assert_eq!(config.config.colors, Some(vec!["#111111".to_string()]));

        let overlay = config.active_overlay().unwrap();
        assert_eq!(overlay.kind, ChartKind::Pie);
        assert_eq!(overlay.position, OverlayPosition::BottomLeft);
        assert_eq!(overlay.size, OverlaySize::Small);
    }

    #[test]
    fn test_export_import_round_trip() {
        let config = ChartConfiguration::from_json_str(SAVED).unwrap();
        let text = config.to_json_string().unwrap();
        assert!(text.contains("\"dataFields\""));
        assert!(text.contains("\"chart_type\": \"line\""));
        let again = ChartConfiguration::from_json_str(&text).unwrap();
        assert_eq!(config, again);
    }

    #[test]
    fn test_invalid_document() {
        let err = ChartConfiguration::from_json_str("{ not json").unwrap_err();
        assert!(err.to_string().contains("Invalid configuration file"));
        assert!(ChartConfiguration::from_json_str(r#"{"chart_type": "donut"}"#).is_err());
    }

    #[test]
    fn test_set_chart_type_is_lossy() {
        let mut config = ChartConfiguration::default();
        config.data_fields = FieldMapping {
            value: Some("sales".to_string()),
            ..FieldMapping::xy("region", "sales")
        };
        config.set_chart_type(ChartKind::Pie);
        assert_eq!(config.data_fields, FieldMapping::pie(None, "sales"));
        config.set_chart_type(ChartKind::Bar);
        assert_eq!(config.data_fields, FieldMapping::default());
    }

    #[test]
    fn test_toggle_composed() {
        let mut config = ChartConfiguration::default();
        assert!(config.composed_spec().is_none());
        config.toggle_composed();
        assert_eq!(config.secondary_chart_type, Some(ChartKind::Line));
        assert_eq!(config.composed_spec().unwrap().secondary_kind, ChartKind::Line);
        config.toggle_composed();
        assert!(!config.composed());
        assert_eq!(config.secondary_chart_type, None);
    }

    #[test]
    fn test_export_file_name() {
        let mut config = ChartConfiguration::default();
        assert_eq!(config.export_file_name(), "New Chart.json");
        config.name = "  ".to_string();
        assert_eq!(config.export_file_name(), "chart-config.json");
    }
}
