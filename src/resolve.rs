use crate::config::ChartConfiguration;
use crate::mapping::{ChartKind, FieldMapping};
use crate::overlay::ComposedSpec;

pub const CONFIGURE_FIELDS: &str = "Configure your chart fields to see a preview";
pub const CONFIGURE_BOTH_SERIES: &str = "Configure both series to see a preview";

/// What the configuration asks to be drawn, before any data is touched.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedChart {
    Single {
        mapping: FieldMapping,
        kind: ChartKind,
    },
    Composed(ComposedSpec),
    /// Not enough roles are set; carries the placeholder message to show.
    Unconfigured {
        kind: ChartKind,
        reason: &'static str,
    },
}

impl ResolvedChart {
    pub fn kind(&self) -> ChartKind {
        match self {
            ResolvedChart::Single { kind, .. } | ResolvedChart::Unconfigured { kind, .. } => *kind,
            ResolvedChart::Composed(spec) => spec.primary_kind,
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, ResolvedChart::Unconfigured { .. })
    }
}

/// Resolve the chart configuration into a single or composed chart
pub fn resolve_chart(config: &ChartConfiguration) -> ResolvedChart {
    if let Some(spec) = config.composed_spec() {
        if spec.is_configured() {
            return ResolvedChart::Composed(spec);
        }
        return ResolvedChart::Unconfigured {
            kind: config.chart_type,
            reason: CONFIGURE_BOTH_SERIES,
        };
    }

    resolve_single(&config.data_fields, config.chart_type)
}

/// Resolve a plain mapping (main chart or inset overlay)
pub fn resolve_single(mapping: &FieldMapping, kind: ChartKind) -> ResolvedChart {
    if mapping.is_renderable(kind) {
        ResolvedChart::Single {
            mapping: mapping.clone(),
            kind,
        }
    } else {
        ResolvedChart::Unconfigured {
            kind,
            reason: CONFIGURE_FIELDS,
        }
    }
}
