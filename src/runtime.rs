// Runtime executor: configuration + raw rows -> chart spec (-> image)

use crate::compiler;
use crate::config::ChartConfiguration;
use crate::data::RowSet;
use crate::filter::apply_filters;
use crate::graph;
use crate::ir::{ChartSpec, OverlayChart};
use crate::resolve::{resolve_chart, ResolvedChart};
use crate::transform::aggregate;
use crate::RenderOptions;
use anyhow::{Context, Result};
use serde::Serialize;

/// Main chart plus the optional inset overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOutput {
    pub chart: ChartSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlayChart>,
}

/// Build the main chart spec. Never fails: missing configuration or data
/// produce a spec with no rows.
pub fn build_chart(config: &ChartConfiguration, rows: &RowSet) -> ChartSpec {
    let _span = tracing::debug_span!("build_chart", name = %config.name, rows = rows.len()).entered();

    let rows = apply_filters(rows, &config.filters);
    let resolved = resolve_chart(config);
    let data = match &resolved {
        ResolvedChart::Single { mapping, kind } => aggregate(&rows, mapping, *kind),
        ResolvedChart::Composed(spec) => spec.merge(&rows),
        ResolvedChart::Unconfigured { reason, .. } => {
            tracing::debug!(reason, "chart not configured");
            Vec::new()
        }
    };

    compiler::compile(&resolved, &config.config, compiler::chart_title(config), data)
}

/// Build the inset overlay, if one is enabled.
pub fn build_overlay(config: &ChartConfiguration, rows: &RowSet) -> Option<OverlayChart> {
    let overlay = config.active_overlay()?;
    let _span = tracing::debug_span!("build_overlay", kind = overlay.kind.as_str()).entered();

    let rows = apply_filters(rows, &config.filters);
    let data = aggregate(&rows, &overlay.data_fields, overlay.kind);
    Some(compiler::compile_overlay(overlay, data))
}

pub fn build(config: &ChartConfiguration, rows: &RowSet) -> ChartOutput {
    ChartOutput {
        chart: build_chart(config, rows),
        overlay: build_overlay(config, rows),
    }
}

/// Render the configured chart to image bytes in the requested format
pub fn render_plot(config: &ChartConfiguration, rows: &RowSet, options: &RenderOptions) -> Result<Vec<u8>> {
    let spec = build_chart(config, rows);
    if spec.is_empty() {
        anyhow::bail!(
            "Nothing to render for '{}': configure the chart fields or load data",
            config.name
        );
    }
    graph::render(&spec, options).context("Failed to render chart")
}
