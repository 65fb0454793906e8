use crate::config::{ChartConfig, ChartConfiguration, OverlayChartConfig};
use crate::data::display_name;
use crate::ir::{AxisSide, ChartRow, ChartSpec, OverlayChart, SeriesDescriptor};
use crate::mapping::{ChartKind, FieldMapping};
use crate::palette::ColorPalette;
use crate::resolve::{resolve_single, ResolvedChart};
use crate::transform::PIE_NAME_FIELD;

/// Title shown when the user set none and nothing can be derived.
pub const DEFAULT_TITLE: &str = "Chart Preview";

/// Display label for a field: `burn_team_size` -> `Burn Team Size`.
pub fn field_label(field: &str) -> String {
    display_name(field)
}

/// Title derived from the mapped fields.
pub fn derive_title(mapping: &FieldMapping, kind: ChartKind, composed: bool) -> String {
    if composed {
        return match (mapping.primary_y.as_deref(), mapping.secondary_y.as_deref()) {
            (Some(p), Some(s)) => format!("{} & {}", field_label(p), field_label(s)),
            (Some(only), None) | (None, Some(only)) => field_label(only),
            (None, None) => DEFAULT_TITLE.to_string(),
        };
    }

    if kind.is_pie() {
        return match mapping.value() {
            Some(value) => format!("{} Distribution", field_label(value)),
            None => DEFAULT_TITLE.to_string(),
        };
    }

    match (mapping.x(), mapping.y()) {
        (Some(x), Some(y)) => format!("{} by {}", field_label(y), field_label(x)),
        _ => DEFAULT_TITLE.to_string(),
    }
}

/// Explicit title if the user set one, otherwise the derived one.
pub fn chart_title(config: &ChartConfiguration) -> String {
    match config.config.explicit_title() {
        Some(title) => title.to_string(),
        None => derive_title(&config.data_fields, config.chart_type, config.composed()),
    }
}

fn series(field: &str, palette: &ColorPalette, index: usize, axis: AxisSide, kind: ChartKind) -> SeriesDescriptor {
    SeriesDescriptor {
        data_key: field.to_string(),
        label: field_label(field),
        color: palette.color(index).to_string(),
        axis,
        kind,
    }
}

/// Assemble the render-ready spec from a resolved chart and its dataset.
pub fn compile(resolved: &ResolvedChart, chart: &ChartConfig, title: String, data: Vec<ChartRow>) -> ChartSpec {
    let palette = ColorPalette::from_config(chart.colors.as_deref());

    let mut spec = ChartSpec {
        kind: resolved.kind(),
        secondary_kind: None,
        title,
        x_key: None,
        data: Vec::new(),
        series: Vec::new(),
        slice_colors: Vec::new(),
        show_legend: chart.show_legend.unwrap_or(true),
        show_grid: chart.show_grid.unwrap_or(true),
        x_axis_label: chart.x_axis_label.clone(),
        y_axis_label: chart.y_axis_label.clone(),
    };

    match resolved {
        ResolvedChart::Single { mapping, kind } if kind.is_pie() => {
            if let Some(value) = mapping.value() {
                spec.series.push(series(value, &palette, 0, AxisSide::Single, *kind));
            }
            spec.x_key = Some(PIE_NAME_FIELD.to_string());
            spec.slice_colors = palette.assign(data.len());
            spec.data = data;
        }
        ResolvedChart::Single { mapping, kind } => {
            if let Some(y) = mapping.y() {
                spec.series.push(series(y, &palette, 0, AxisSide::Single, *kind));
            }
            spec.x_key = mapping.x.clone();
            spec.data = data;
        }
        ResolvedChart::Composed(composed) => {
            // colour slots are fixed per side so a series keeps its colour
            // when the other one is unset
            if let Some(y) = composed.primary.y().filter(|_| composed.primary.x.is_some()) {
                spec.series.push(series(y, &palette, 0, AxisSide::Left, composed.primary_kind));
            }
            if let Some(y) = composed.secondary.y().filter(|_| composed.secondary.x.is_some()) {
                spec.series.push(series(y, &palette, 1, AxisSide::Right, composed.secondary_kind));
            }
            spec.secondary_kind = Some(composed.secondary_kind);
            spec.x_key = Some(composed.combined_x_field().to_string());
            spec.data = data;
        }
        ResolvedChart::Unconfigured { .. } => {}
    }

    tracing::debug!(
        kind = spec.kind.as_str(),
        rows = spec.data.len(),
        series = spec.series.len(),
        "compiled chart spec"
    );
    spec
}

/// Build the inset overlay chart around an already aggregated dataset.
pub fn compile_overlay(overlay: &OverlayChartConfig, data: Vec<ChartRow>) -> OverlayChart {
    let resolved = resolve_single(&overlay.data_fields, overlay.kind);
    let title = match overlay.config.explicit_title() {
        Some(title) => title.to_string(),
        None => derive_title(&overlay.data_fields, overlay.kind, false),
    };
    let (width, height) = overlay.size.dimensions();

    OverlayChart {
        position: overlay.position,
        width,
        height,
        spec: compile(&resolved, &overlay.config, title, data),
    }
}
