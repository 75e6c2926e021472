use std::collections::BTreeMap;

use super::model::Table;

// ---------------------------------------------------------------------------
// Numeric range predicate
// ---------------------------------------------------------------------------

/// Inclusive `[low, high]` bounds chosen on a slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
}

impl ValueRange {
    pub fn new(low: f64, high: f64) -> Self {
        ValueRange { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }
}

// ---------------------------------------------------------------------------
// Range filter result
// ---------------------------------------------------------------------------

/// Outcome of [`apply_range_filter`].
///
/// Rows with a null value in the filtered column are in neither `kept` nor
/// `excluded`; they only show up in `not_applicable`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub kept: Table,
    pub excluded: Table,
    pub not_applicable: usize,
    /// Row count of the unfiltered input, nulls included.
    pub original_total: usize,
}

/// Summary counts shown next to the charts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterMetrics {
    pub original_total: usize,
    /// Rows with a non-null value (kept + excluded).
    pub considered: usize,
    pub kept: usize,
    pub excluded: usize,
    pub not_applicable: usize,
    /// `excluded / original_total * 100`, 2 decimals. The denominator is the
    /// whole input, not `considered`.
    pub excluded_pct: f64,
    /// `not_applicable / original_total * 100`, 2 decimals.
    pub not_applicable_pct: f64,
}

/// Split `table` on `low <= column <= high`.
pub fn apply_range_filter(table: &Table, column: &str, range: ValueRange) -> RangeFilter {
    let mut kept = Vec::new();
    let mut excluded = Vec::new();
    let mut not_applicable = 0;

    for row in &table.rows {
        match row.number(column) {
            Some(v) if range.contains(v) => kept.push(row.clone()),
            Some(_) => excluded.push(row.clone()),
            None => not_applicable += 1,
        }
    }

    RangeFilter {
        kept: Table::new(table.column_names.clone(), kept),
        excluded: Table::new(table.column_names.clone(), excluded),
        not_applicable,
        original_total: table.len(),
    }
}

impl RangeFilter {
    pub fn metrics(&self) -> FilterMetrics {
        FilterMetrics {
            original_total: self.original_total,
            considered: self.kept.len() + self.excluded.len(),
            kept: self.kept.len(),
            excluded: self.excluded.len(),
            not_applicable: self.not_applicable,
            excluded_pct: percentage(self.excluded.len(), self.original_total),
            not_applicable_pct: percentage(self.not_applicable, self.original_total),
        }
    }

    /// Excluded rows counted per value of a categorical column.
    pub fn excluded_by(&self, column: &str) -> BTreeMap<String, usize> {
        group_counts(&self.excluded, column)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `part / total * 100` rounded to 2 decimals; 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `(min, max)` over the non-null values of `column`.
pub fn column_range(table: &Table, column: &str) -> Option<(f64, f64)> {
    table.numbers(column).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Row count per distinct value of `column` (nulls reported as `<null>`).
pub fn group_counts(table: &Table, column: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for row in &table.rows {
        *counts.entry(row.get(column).to_string()).or_insert(0) += 1;
    }
    counts
}
