//! Dashboard sections: delay join → range filter → metrics → histogram

use std::collections::BTreeMap;

use crate::chart::{BinStrategy, ChartSpec, Histogram};
use crate::data::delay::{CHECKIN_TYPE, DELAY_FROM_PREVIOUS, STATE, TIME_DELTA};
use crate::data::filter::{
    apply_range_filter, column_range, percentage, FilterMetrics, ValueRange,
};
use crate::data::model::Table;
use crate::error::{InsightsError, Result};

pub const TIME_DELTA_STEP: f64 = 15.0;
/// Default upper slider position: one day.
pub const TIME_DELTA_DEFAULT_CAP: f64 = 1440.0;
pub const TIME_DELTA_AXIS: (f64, f64) = (0.0, 720.0);

pub const PREVIOUS_DELAY_STEP: f64 = 10.0;
pub const PREVIOUS_DELAY_DEFAULT_CAP: f64 = 2000.0;
pub const PREVIOUS_DELAY_BINS: usize = 50;

/// Slider limits and starting position for a section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: ValueRange,
}

// ---------------------------------------------------------------------------
// Section 1: time delta between consecutive rentals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TimeDeltaReport {
    pub range: ValueRange,
    /// Range filter counts; `excluded` are the potentially impacted rentals.
    pub metrics: FilterMetrics,
    /// Impacted rentals per check-in type.
    pub impacted_by_checkin: BTreeMap<String, usize>,
    pub chart: ChartSpec,
}

impl TimeDeltaReport {
    /// Rentals without a known delta (the last one of a sequence).
    pub fn not_followed(&self) -> usize {
        self.metrics.not_applicable
    }

    pub fn not_followed_pct(&self) -> f64 {
        self.metrics.not_applicable_pct
    }
}

pub fn time_delta_bounds(rentals: &Table) -> Result<SliderBounds> {
    let (min, max) = column_range(rentals, TIME_DELTA).ok_or_else(|| {
        InsightsError::EmptyResult("Delay analysis data is empty or all missing.".to_string())
    })?;
    Ok(SliderBounds {
        min,
        max,
        step: TIME_DELTA_STEP,
        default: ValueRange::new(min, max.min(TIME_DELTA_DEFAULT_CAP)),
    })
}

/// Rentals whose delta falls outside `range` would be lost with that
/// minimum delay between rentals.
pub fn time_delta_report(rentals: &Table, range: ValueRange) -> Result<TimeDeltaReport> {
    time_delta_bounds(rentals)?;

    let filter = apply_range_filter(rentals, TIME_DELTA, range);
    let chart = Histogram::new(TIME_DELTA)
        .color_by(CHECKIN_TYPE)
        .x_range(TIME_DELTA_AXIS.0, TIME_DELTA_AXIS.1)
        .title(format!(
            "Distribution of Rentals between {} and {} minutes delta",
            range.low as i64, range.high as i64
        ))
        .labels(
            "Time Delta Between Rentals (minutes)",
            "Frequency (Number of Observations)",
        )
        .empty_message("No data matches the selected filters. Please adjust the criteria.")
        .render(&filter.kept);

    Ok(TimeDeltaReport {
        range,
        metrics: filter.metrics(),
        impacted_by_checkin: filter.excluded_by(CHECKIN_TYPE),
        chart,
    })
}

// ---------------------------------------------------------------------------
// Section 2: checkout delay of the previous rental
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PreviousDelayReport {
    pub total_rentals: usize,
    /// Rentals whose previous rental ended late.
    pub total_impacted: usize,
    /// `total_impacted / total_rentals * 100`, 2 decimals.
    pub impacted_pct: f64,
    pub max_delay: f64,
    /// Selected maximum; impacted rentals above it are hidden.
    pub limit: f64,
    /// Filter over the impacted rentals; `kept` are the ones displayed.
    pub metrics: FilterMetrics,
    /// Impacted rentals above the displayed maximum, per check-in type.
    pub hidden_by_checkin: BTreeMap<String, usize>,
    pub chart: ChartSpec,
}

impl PreviousDelayReport {
    pub fn displayed(&self) -> usize {
        self.metrics.kept
    }
}

fn no_impact() -> InsightsError {
    InsightsError::EmptyResult(
        "No data available for delay impact analysis (no rentals with a delayed previous rental)."
            .to_string(),
    )
}

pub fn previous_delay_bounds(impact: &Table) -> Result<SliderBounds> {
    let (_, max) = column_range(impact, DELAY_FROM_PREVIOUS).ok_or_else(no_impact)?;
    Ok(SliderBounds {
        min: 0.0,
        max,
        step: PREVIOUS_DELAY_STEP,
        default: ValueRange::new(0.0, max.min(PREVIOUS_DELAY_DEFAULT_CAP)),
    })
}

/// `impact` is the output of
/// [`compute_delay_impact`](crate::data::delay::compute_delay_impact) over
/// `rentals`; only rows with a previous delay `<= max_delay` are charted.
pub fn previous_delay_report(
    rentals: &Table,
    impact: &Table,
    max_delay: f64,
) -> Result<PreviousDelayReport> {
    let bounds = previous_delay_bounds(impact)?;

    let filter = apply_range_filter(impact, DELAY_FROM_PREVIOUS, ValueRange::new(0.0, max_delay));
    let chart = Histogram::new(DELAY_FROM_PREVIOUS)
        .color_by(STATE)
        .bins(BinStrategy::Fixed(PREVIOUS_DELAY_BINS))
        .opacity(0.6)
        .x_range(0.0, max_delay)
        .title("Impact of the Delay on the State of Rental")
        .labels(
            "Delay of the Previous Rental at Checkout (minutes)",
            "Frequency (Number of Observations)",
        )
        .empty_message(
            "No data to display for the selected maximum delay. Please increase the limit.",
        )
        .render(&filter.kept);

    Ok(PreviousDelayReport {
        total_rentals: rentals.len(),
        total_impacted: impact.len(),
        impacted_pct: percentage(impact.len(), rentals.len()),
        max_delay: bounds.max,
        limit: max_delay,
        metrics: filter.metrics(),
        hidden_by_checkin: filter.excluded_by(CHECKIN_TYPE),
        chart,
    })
}
