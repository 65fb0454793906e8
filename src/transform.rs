use crate::data::RowSet;
use crate::ir::ChartRow;
use crate::mapping::{ChartKind, FieldMapping};
use crate::temporal::{self, TemporalKeyResolver};
use indexmap::IndexMap;

/// Canonical pie fields, written alongside the role-named ones.
pub const PIE_NAME_FIELD: &str = "name";
pub const PIE_VALUE_FIELD: &str = "value";
pub const COUNT_FIELD: &str = "count";

/// Main entry point: group raw rows by the resolved x key and sum the y
/// (or pie value) field. Returns an empty vector when there is nothing to
/// aggregate or the mapping is incomplete for `kind`.
pub fn aggregate(rows: &RowSet, mapping: &FieldMapping, kind: ChartKind) -> Vec<ChartRow> {
    aggregate_keyed(rows, mapping, kind)
        .into_iter()
        .map(|group| group.row)
        .collect()
}

/// An aggregated row together with the group key it was built from.
#[derive(Debug, Clone)]
pub(crate) struct KeyedRow {
    pub key: String,
    pub row: ChartRow,
}

#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    sum: f64,
}

pub(crate) fn aggregate_keyed(
    rows: &RowSet,
    mapping: &FieldMapping,
    kind: ChartKind,
) -> Vec<KeyedRow> {
    let _span = tracing::debug_span!("aggregate", kind = kind.as_str(), rows = rows.len()).entered();

    if rows.is_empty() || !mapping.is_renderable(kind) {
        tracing::debug!("nothing to aggregate");
        return Vec::new();
    }

    let x_field = mapping.x();
    let resolver = TemporalKeyResolver::resolve(x_field, rows);

    let output = if kind.is_pie() {
        // is_renderable guarantees the value role for pie
        let value_field = mapping.value().unwrap_or(PIE_VALUE_FIELD);
        aggregate_pie(rows, &resolver, x_field, value_field)
    } else {
        let y_field = mapping.y().unwrap_or_default();
        let mut groups = aggregate_series(rows, &resolver, x_field.unwrap_or_default(), y_field);
        if resolver.is_temporal() {
            groups.sort_by_key(|group| temporal::sort_tuple(&group.key));
        }
        groups
    };

    tracing::debug!(groups = output.len(), temporal = resolver.is_temporal(), "aggregated");
    output
}

fn accumulate(
    rows: &RowSet,
    resolver: &TemporalKeyResolver,
    x_field: Option<&str>,
    y_field: &str,
) -> IndexMap<String, Accumulator> {
    let mut groups: IndexMap<String, Accumulator> = IndexMap::new();
    for row in rows {
        let key = resolver.key_for(row, x_field);
        let acc = groups.entry(key).or_default();
        acc.count += 1;
        acc.sum += row.number(y_field);
    }
    groups
}

fn aggregate_pie(
    rows: &RowSet,
    resolver: &TemporalKeyResolver,
    x_field: Option<&str>,
    value_field: &str,
) -> Vec<KeyedRow> {
    accumulate(rows, resolver, x_field, value_field)
        .into_iter()
        .map(|(key, acc)| {
            let mut row = ChartRow::new()
                .with(PIE_NAME_FIELD, key.as_str())
                .with(PIE_VALUE_FIELD, acc.sum);
            if let Some(x) = x_field {
                row.set(x, key.as_str());
            }
            row.set(value_field, acc.sum);
            KeyedRow { key, row }
        })
        .collect()
}

fn aggregate_series(
    rows: &RowSet,
    resolver: &TemporalKeyResolver,
    x_field: &str,
    y_field: &str,
) -> Vec<KeyedRow> {
    accumulate(rows, resolver, Some(x_field), y_field)
        .into_iter()
        .map(|(key, acc)| {
            let row = ChartRow::new()
                .with(x_field, key.as_str())
                .with(COUNT_FIELD, acc.count)
                .with(y_field, acc.sum);
            KeyedRow { key, row }
        })
        .collect()
}
