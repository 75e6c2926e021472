use std::collections::HashMap;

use super::model::{CellValue, Table};

// Rentals sheet columns.
pub const RENTAL_ID: &str = "rental_id";
pub const PREVIOUS_RENTAL_ID: &str = "previous_ended_rental_id";
pub const CHECKOUT_DELAY: &str = "delay_at_checkout_in_minutes";
pub const TIME_DELTA: &str = "time_delta_with_previous_rental_in_minutes";
pub const CHECKIN_TYPE: &str = "checkin_type";
pub const STATE: &str = "state";

/// Joined column: checkout delay of the previous rental on the same car.
pub const DELAY_FROM_PREVIOUS: &str = "delay_at_checkout_in_minutes_from_previous_rental";

/// Rentals whose previous rental on the same car ended late.
///
/// Keeps rows with a `previous_ended_rental_id`, left-joins that id against
/// `rental_id` to fetch the previous rental's checkout delay, stores it as
/// [`DELAY_FROM_PREVIOUS`] and keeps only rows where it is known and > 0.
/// Dangling references simply drop out; a rental referenced by several rows
/// lends its delay to each of them.
pub fn compute_delay_impact(rentals: &Table) -> Table {
    let delay_by_id: HashMap<i64, &CellValue> = rentals
        .rows
        .iter()
        .filter_map(|r| Some((r.get(RENTAL_ID).as_key()?, r.get(CHECKOUT_DELAY))))
        .collect();

    let mut column_names = rentals.column_names.clone();
    if !column_names.iter().any(|c| c == DELAY_FROM_PREVIOUS) {
        column_names.push(DELAY_FROM_PREVIOUS.to_string());
    }

    let rows = rentals
        .rows
        .iter()
        .filter_map(|row| {
            let previous_id = row.get(PREVIOUS_RENTAL_ID).as_key()?;
            let delay = delay_by_id.get(&previous_id)?.as_f64()?;
            if !(delay.is_finite() && delay > 0.0) {
                return None;
            }
            let mut joined = row.clone();
            joined.set(DELAY_FROM_PREVIOUS, delay);
            Some(joined)
        })
        .collect();

    Table::new(column_names, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Row;

    fn rental(id: i64, previous: Option<i64>, delay: Option<f64>) -> Row {
        Row::new()
            .with(RENTAL_ID, id)
            .with(PREVIOUS_RENTAL_ID, previous)
            .with(CHECKOUT_DELAY, delay)
            .with(STATE, "ended")
    }

    fn ids(table: &Table) -> Vec<i64> {
        table
            .rows
            .iter()
            .filter_map(|r| r.get(RENTAL_ID).as_key())
            .collect()
    }

    #[test]
    fn previous_delay_is_joined() {
        let rentals = Table::from_rows(vec![
            rental(1, None, Some(15.0)),
            rental(2, Some(1), Some(-3.0)),
            rental(3, None, None),
        ]);
        let impact = compute_delay_impact(&rentals);

        assert_eq!(ids(&impact), vec![2]);
        assert_eq!(impact.rows[0].number(DELAY_FROM_PREVIOUS), Some(15.0));
        // the current rental's own delay is left untouched
        assert_eq!(impact.rows[0].number(CHECKOUT_DELAY), Some(-3.0));
        assert!(impact.has_column(DELAY_FROM_PREVIOUS));
    }

    #[test]
    fn zero_previous_delay_is_excluded() {
        let rentals = Table::from_rows(vec![
            rental(1, None, Some(15.0)),
            rental(2, Some(1), Some(0.0)),
            rental(3, Some(2), Some(40.0)),
        ]);
        assert_eq!(ids(&compute_delay_impact(&rentals)), vec![2]);
    }

    #[test]
    fn dangling_and_unknown_delays_drop_out() {
        let rentals = Table::from_rows(vec![
            rental(1, None, None),
            rental(2, Some(1), Some(5.0)),
            rental(3, Some(999), Some(5.0)),
            rental(4, Some(2), Some(f64::NAN)),
        ]);
        assert_eq!(ids(&compute_delay_impact(&rentals)), vec![4]);
    }

    #[test]
    fn shared_predecessor_feeds_every_referrer() {
        let rentals = Table::from_rows(vec![
            rental(10, None, Some(30.0)),
            rental(11, Some(10), None),
            rental(12, Some(10), None),
        ]);
        let impact = compute_delay_impact(&rentals);
        assert_eq!(ids(&impact), vec![11, 12]);
        assert!(impact
            .rows
            .iter()
            .all(|r| r.number(DELAY_FROM_PREVIOUS) == Some(30.0)));
    }

    #[test]
    fn float_encoded_ids_still_join() {
        // nullable id columns come back from the workbook as floats
        let rentals = Table::from_rows(vec![
            Row::new().with(RENTAL_ID, 505000.0).with(CHECKOUT_DELAY, 12.0),
            Row::new()
                .with(RENTAL_ID, 505001.0)
                .with(PREVIOUS_RENTAL_ID, 505000.0),
        ]);
        let impact = compute_delay_impact(&rentals);
        assert_eq!(impact.len(), 1);
        assert_eq!(impact.rows[0].number(DELAY_FROM_PREVIOUS), Some(12.0));
    }

    #[test]
    fn every_output_delay_is_positive() {
        let rentals = Table::from_rows(
            (0..50)
                .map(|i| {
                    let prev = if i % 3 == 0 { None } else { Some(i - 1) };
                    rental(i, prev, Some((i as f64) * 7.0 - 120.0))
                })
                .collect(),
        );
        let impact = compute_delay_impact(&rentals);
        assert!(!impact.is_empty());
        for row in &impact.rows {
            assert!(!row.get(PREVIOUS_RENTAL_ID).is_null());
            assert!(row.number(DELAY_FROM_PREVIOUS).unwrap() > 0.0);
        }
    }
}
