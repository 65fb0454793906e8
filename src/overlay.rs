// Composed (dual-axis) charts: two independent aggregations on one x-domain.

use crate::data::RowSet;
use crate::ir::{ChartRow, Datum};
use crate::mapping::{ChartKind, FieldMapping};
use crate::transform::{aggregate_keyed, KeyedRow};
use indexmap::IndexMap;

/// Field used for the shared x column when neither series names one.
pub const DEFAULT_X_FIELD: &str = "x";

/// The two halves of a composed chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedSpec {
    pub primary: FieldMapping,
    pub primary_kind: ChartKind,
    pub secondary: FieldMapping,
    pub secondary_kind: ChartKind,
}

impl ComposedSpec {
    /// Splits the composed roles of `mapping` into two series mappings.
    pub fn from_mapping(mapping: &FieldMapping, primary_kind: ChartKind, secondary_kind: ChartKind) -> Self {
        Self {
            primary: mapping.primary(),
            primary_kind,
            secondary: mapping.secondary(),
            secondary_kind,
        }
    }

    /// Name of the combined x column: primary x, else secondary x, else `x`.
    pub fn combined_x_field(&self) -> &str {
        self.primary
            .x()
            .or_else(|| self.secondary.x())
            .unwrap_or(DEFAULT_X_FIELD)
    }

    pub fn is_configured(&self) -> bool {
        has_xy(&self.primary) || has_xy(&self.secondary)
    }

    pub fn merge(&self, rows: &RowSet) -> Vec<ChartRow> {
        merge(rows, &self.primary, self.primary_kind, &self.secondary, self.secondary_kind)
    }
}

fn has_xy(mapping: &FieldMapping) -> bool {
    mapping.x.is_some() && mapping.y.is_some()
}

/// Aggregates both series and joins them on the group key.
///
/// Primary keys come first in their aggregation order, secondary-only keys
/// are appended after. A key missing from one series leaves that series'
/// field absent rather than zero. No temporal re-sort is applied here.
pub fn merge(
    rows: &RowSet,
    primary: &FieldMapping,
    primary_kind: ChartKind,
    secondary: &FieldMapping,
    secondary_kind: ChartKind,
) -> Vec<ChartRow> {
    let _span = tracing::debug_span!(
        "merge",
        primary = primary_kind.as_str(),
        secondary = secondary_kind.as_str(),
        rows = rows.len()
    )
    .entered();

    if !has_xy(primary) && !has_xy(secondary) {
        tracing::debug!("neither series configured");
        return Vec::new();
    }

    let x_field = primary
        .x()
        .or_else(|| secondary.x())
        .unwrap_or(DEFAULT_X_FIELD);

    let primary_rows = aggregate_keyed(rows, primary, primary_kind);
    let secondary_rows = aggregate_keyed(rows, secondary, secondary_kind);

    let mut combined: IndexMap<String, ChartRow> = IndexMap::new();
    join_series(&mut combined, x_field, primary.y(), primary_rows);
    join_series(&mut combined, x_field, secondary.y(), secondary_rows);

    tracing::debug!(rows = combined.len(), "merged");
    combined.into_values().collect()
}

fn join_series(
    combined: &mut IndexMap<String, ChartRow>,
    x_field: &str,
    y_field: Option<&str>,
    series: Vec<KeyedRow>,
) {
    let Some(y_field) = y_field else {
        return;
    };

    for KeyedRow { key, row } in series {
        let target = combined
            .entry(key)
            .or_insert_with_key(|key| ChartRow::new().with(x_field, key.as_str()));
        if let Some(value) = row.get(y_field).and_then(Datum::as_f64) {
            target.set(y_field, value);
        }
    }
}
