// Temporal grouping keys: detection, "Mon/Year" synthesis and ordering.

use crate::data::{RawRecord, RowSet};
use nom::{
    branch::alt,
    character::complete::{alpha1, char, digit1},
    combinator::{all_consuming, map, map_opt, map_res, opt, recognize},
    sequence::{pair, separated_pair},
    IResult,
};

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const UNKNOWN_KEY: &str = "Unknown";

const TEMPORAL_HINTS: [&str; 4] = ["year", "month", "date", "timestamp"];
const YEAR_FIELD: &str = "year";
const MONTH_FIELD: &str = "month";

/// Comparable form of a temporal key: (year, month index). Month 0 means
/// "year only"; (0, 0) is anything that did not parse.
pub type SortTuple = (i64, u32);

/// Decides whether an x-role is calendar time and builds keys for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalKeyResolver {
    temporal: bool,
}

impl TemporalKeyResolver {
    /// A field is temporal when its name looks like a date part, or when any
    /// row carries both `year` and `month` columns, whatever the x field is.
    pub fn resolve(x_field: Option<&str>, rows: &RowSet) -> Self {
        let by_name = x_field
            .map(|f| {
                let lower = f.to_lowercase();
                TEMPORAL_HINTS.iter().any(|hint| lower.contains(hint))
            })
            .unwrap_or(false);
        let by_columns = rows
            .iter()
            .any(|row| row.contains(YEAR_FIELD) && row.contains(MONTH_FIELD));

        Self {
            temporal: by_name || by_columns,
        }
    }

    pub fn is_temporal(&self) -> bool {
        self.temporal
    }

    /// Grouping key for one row. Non-temporal resolvers use the raw x value.
    pub fn key_for(&self, row: &RawRecord, x_field: Option<&str>) -> String {
        if self.temporal {
            if let Some(key) = calendar_key(row) {
                return key;
            }
        }
        raw_key(row, x_field)
    }
}

fn raw_key(row: &RawRecord, x_field: Option<&str>) -> String {
    x_field
        .and_then(|f| row.text(f))
        .unwrap_or_else(|| UNKNOWN_KEY.to_string())
}

fn calendar_key(row: &RawRecord) -> Option<String> {
    let year = row.text(YEAR_FIELD)?.trim().to_string();
    match month_index(row) {
        Some(month) => Some(format!("{}/{}", MONTH_ABBREVIATIONS[month as usize - 1], year)),
        None => Some(year),
    }
}

/// 1-based month from the `month` column; numbers or abbreviations.
fn month_index(row: &RawRecord) -> Option<u32> {
    let raw = row.get(MONTH_FIELD)?;
    let n = raw.as_number();
    if n.fract() == 0.0 && (1.0..=12.0).contains(&n) {
        return Some(n as u32);
    }
    raw.as_text().and_then(|s| abbreviation_index(&s))
}

fn abbreviation_index(name: &str) -> Option<u32> {
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

fn year(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i64>)(input)
}

fn month_year(input: &str) -> IResult<&str, SortTuple> {
    map(
        separated_pair(map_opt(alpha1, abbreviation_index), char('/'), year),
        |(month, year)| (year, month),
    )(input)
}

fn sort_key(input: &str) -> IResult<&str, SortTuple> {
    all_consuming(alt((month_year, map(year, |y| (y, 0)))))(input)
}

/// Parses a key produced by [`TemporalKeyResolver::key_for`] back into a
/// sortable tuple.
pub fn sort_tuple(key: &str) -> SortTuple {
    sort_key(key.trim()).map(|(_, t)| t).unwrap_or((0, 0))
}
