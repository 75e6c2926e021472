//! Integration test: rentals file → delay join → range filter → reports

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use getaround_insights::analysis::{previous_delay_report, time_delta_bounds, time_delta_report};
use getaround_insights::chart::ChartSpec;
use getaround_insights::data::delay::{DELAY_FROM_PREVIOUS, RENTAL_ID, TIME_DELTA};
use getaround_insights::{
    apply_range_filter, compute_delay_impact, DataSource, DatasetCache, InsightsError, Table,
    ValueRange,
};

const RENTALS_CSV: &str = "\
,rental_id,car_id,checkin_type,state,delay_at_checkout_in_minutes,previous_ended_rental_id,time_delta_with_previous_rental_in_minutes
0,1,10,mobile,ended,15,,
1,2,10,connect,ended,0,1,60
2,3,10,mobile,canceled,,2,240
3,4,11,connect,ended,-20,,
4,5,11,mobile,ended,90,4,
5,6,12,mobile,ended,45,99,30
6,7,12,connect,ended,,,900
";

static FIXTURE_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn write_fixture(name: &str, contents: &str) -> PathBuf {
    let n = FIXTURE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!("getaround_{}_{n}_{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

fn load_rentals() -> Table {
    let path = write_fixture("rentals.csv", RENTALS_CSV);
    let cache = DatasetCache::new(Duration::from_secs(5));
    let table = cache.get(&DataSource::path(&path)).unwrap();
    std::fs::remove_file(&path).ok();
    (*table).clone()
}

fn ids(table: &Table) -> Vec<i64> {
    table
        .rows
        .iter()
        .filter_map(|r| r.get(RENTAL_ID).as_key())
        .collect()
}

#[test]
fn test_index_column_is_dropped() {
    let rentals = load_rentals();
    assert_eq!(rentals.len(), 7);
    assert!(!rentals.has_column(""));
    assert!(rentals.has_column(TIME_DELTA));
}

#[test]
fn test_delay_impact_keeps_only_late_predecessors() {
    let rentals = load_rentals();
    let impact = compute_delay_impact(&rentals);

    // 2 follows 1 (15 min late); 3 follows 2 (on time); 5 follows 4 (early);
    // 6 points at a rental outside the table.
    assert_eq!(ids(&impact), vec![2]);
    assert_eq!(impact.rows[0].number(DELAY_FROM_PREVIOUS), Some(15.0));
    assert!(impact.numbers(DELAY_FROM_PREVIOUS).all(|d| d > 0.0));
}

#[test]
fn test_time_delta_metrics_use_original_total() {
    let rentals = load_rentals();
    let bounds = time_delta_bounds(&rentals).unwrap();
    assert_eq!((bounds.min, bounds.max), (30.0, 900.0));
    assert_eq!(bounds.default, ValueRange::new(30.0, 900.0));

    let report = time_delta_report(&rentals, ValueRange::new(60.0, 720.0)).unwrap();
    let m = &report.metrics;
    assert_eq!(m.original_total, 7);
    assert_eq!(m.considered, 4);
    assert_eq!(m.kept, 2);
    assert_eq!(m.excluded, 2);
    // 2 / 7 with three null deltas still in the denominator
    assert_eq!(m.excluded_pct, 28.57);
    assert_eq!(report.not_followed(), 3);
    assert_eq!(report.impacted_by_checkin.get("mobile"), Some(&1));
    assert_eq!(report.impacted_by_checkin.get("connect"), Some(&1));
    assert!(!report.chart.is_empty());
}

#[test]
fn test_own_range_keeps_every_known_row() {
    let rentals = load_rentals();
    let bounds = time_delta_bounds(&rentals).unwrap();
    let filter = apply_range_filter(&rentals, TIME_DELTA, ValueRange::new(bounds.min, bounds.max));
    assert_eq!(filter.kept.len(), 4);
    assert!(filter.excluded.is_empty());

    let again = apply_range_filter(&filter.kept, TIME_DELTA, ValueRange::new(bounds.min, bounds.max));
    assert_eq!(again.kept, filter.kept);
}

#[test]
fn test_previous_delay_report_and_empty_states() {
    let rentals = load_rentals();
    let impact = compute_delay_impact(&rentals);

    let report = previous_delay_report(&rentals, &impact, 2000.0).unwrap();
    assert_eq!(report.total_impacted, 1);
    assert_eq!(report.impacted_pct, 14.29);
    assert_eq!(report.displayed(), 1);

    let hidden = previous_delay_report(&rentals, &impact, 10.0).unwrap();
    assert_eq!(hidden.displayed(), 0);
    assert!(matches!(hidden.chart, ChartSpec::NoData { .. }));

    let no_impact = compute_delay_impact(&Table::default());
    assert!(matches!(
        previous_delay_report(&rentals, &no_impact, 2000.0),
        Err(InsightsError::EmptyResult(_))
    ));
}

#[test]
fn test_missing_source_is_data_unavailable() {
    let cache = DatasetCache::new(Duration::from_secs(1));
    let source = DataSource::new("/nonexistent/get_around_delay_analysis.xlsx", Some("rentals_data"));
    assert!(matches!(cache.get(&source), Err(InsightsError::DataUnavailable(_))));
    // cached failure
    assert!(cache.is_loaded(&source));
}
