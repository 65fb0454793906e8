use crate::data::{format_number, RawRecord, RawValue, RowSet};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Equals,
    Contains,
    Greater,
    Less,
    Between,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Range([f64; 2]),
    Number(f64),
    Text(String),
}

impl FilterValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(n) => Some(*n),
            FilterValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            FilterValue::Range(_) => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            FilterValue::Number(n) => Some(format_number(*n)),
            FilterValue::Text(s) => Some(s.clone()),
            FilterValue::Range(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl Filter {
    pub fn new(field: &str, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value,
        }
    }

    /// Whether the operator can be evaluated with this value shape.
    pub fn is_applicable(&self) -> bool {
        match self.operator {
            FilterOperator::Equals | FilterOperator::Contains => self.value.as_text().is_some(),
            FilterOperator::Greater | FilterOperator::Less => self.value.as_number().is_some(),
            FilterOperator::Between => matches!(self.value, FilterValue::Range(_)),
        }
    }

    /// Evaluates the filter; rows lacking the field never match. Filters
    /// that are not applicable match everything.
    pub fn matches(&self, row: &RawRecord) -> bool {
        if !self.is_applicable() {
            return true;
        }
        let Some(raw) = row.get(&self.field) else {
            return false;
        };

        match (&self.operator, &self.value) {
            (FilterOperator::Equals, value) => {
                match (strict_number(raw), value.as_number()) {
                    (Some(a), Some(b)) => a == b,
                    _ => raw.as_text() == value.as_text(),
                }
            }
            (FilterOperator::Contains, value) => match (raw.as_text(), value.as_text()) {
                (Some(haystack), Some(needle)) => {
                    haystack.to_lowercase().contains(&needle.to_lowercase())
                }
                _ => false,
            },
            (FilterOperator::Greater, value) => compare(raw, value, |a, b| a > b),
            (FilterOperator::Less, value) => compare(raw, value, |a, b| a < b),
            (FilterOperator::Between, FilterValue::Range([low, high])) => {
                let (low, high) = if low <= high { (*low, *high) } else { (*high, *low) };
                strict_number(raw).is_some_and(|n| n >= low && n <= high)
            }
            (FilterOperator::Between, _) => true,
        }
    }
}

fn compare(raw: &RawValue, value: &FilterValue, op: impl Fn(f64, f64) -> bool) -> bool {
    match (strict_number(raw), value.as_number()) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}

// Unlike aggregation, filters must not treat text as zero.
fn strict_number(raw: &RawValue) -> Option<f64> {
    match raw {
        RawValue::Number(n) => Some(*n),
        RawValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        RawValue::Bool(_) | RawValue::Null => None,
    }
}

/// Keeps the rows that pass every filter.
pub fn apply_filters(rows: &RowSet, filters: &[Filter]) -> RowSet {
    if filters.is_empty() {
        return rows.clone();
    }

    for filter in filters.iter().filter(|f| !f.is_applicable()) {
        tracing::warn!(
            field = %filter.field,
            operator = ?filter.operator,
            "filter value does not fit its operator, skipping"
        );
    }

    let kept: RowSet = rows
        .iter()
        .filter(|row| filters.iter().all(|f| f.matches(row)))
        .cloned()
        .collect();
    tracing::debug!(before = rows.len(), after = kept.len(), "filters applied");
    kept
}
