use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};
use egui_extras::{Column, TableBuilder};

use getaround_insights::analysis::SliderBounds;
use getaround_insights::data::filter::ValueRange;
use getaround_insights::{DataSource, InsightsError, Table};

use crate::state::{
    DashboardState, Page, CAR_TYPE_CHOICES, COLOR_CHOICES, FUEL_CHOICES, MODEL_CHOICES,
    RAW_PRICING_ROWS,
};
use crate::ui::plot;

const WARNING: Color32 = Color32::from_rgb(230, 160, 0);

// ---------------------------------------------------------------------------
// Left side panel – navigation and filters
// ---------------------------------------------------------------------------

/// Render the left panel: page selector, then the sliders of the delay page.
pub fn side_panel(ui: &mut Ui, state: &mut DashboardState) {
    ui.heading("GetAround");
    ui.separator();

    ui.strong("Navigation");
    for page in Page::ALL {
        ui.radio_value(&mut state.page, page, page.label());
    }
    ui.separator();

    if state.page != Page::DelayAnalysis {
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Time Delta Filter");
            if let Ok(bounds) = state.time_delta_bounds() {
                let current = state.time_delta_range.unwrap_or(bounds.default);
                ui.label("Select minimum delta time to apply (in minutes):");
                if let Some(range) = range_slider(ui, &bounds, current) {
                    state.time_delta_range = Some(range);
                }
            }
            ui.separator();

            ui.strong("Previous Delay Filter");
            if let Ok(bounds) = state.previous_delay_bounds() {
                let mut max = state.max_previous_delay.unwrap_or(bounds.default.high);
                ui.label("Select max delay from previous rental to display (minutes):");
                let slider = Slider::new(&mut max, bounds.min..=bounds.max).step_by(bounds.step);
                if ui.add(slider).changed() {
                    state.max_previous_delay = Some(max);
                }
            }
        });
}

/// Two sliders standing in for a range slider; `high` never drops below `low`.
fn range_slider(ui: &mut Ui, bounds: &SliderBounds, current: ValueRange) -> Option<ValueRange> {
    let mut range = current;
    let span = bounds.min..=bounds.max;
    let low = ui.add(
        Slider::new(&mut range.low, span.clone())
            .step_by(bounds.step)
            .text("from"),
    );
    let high = ui.add(Slider::new(&mut range.high, span).step_by(bounds.step).text("to"));

    if low.changed() {
        range.high = range.high.max(range.low);
    } else if high.changed() {
        range.low = range.low.min(range.high);
    } else {
        return None;
    }
    Some(range)
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut DashboardState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open rentals data…").clicked() {
                open_file_dialog(state, Page::DelayAnalysis);
                ui.close_menu();
            }
            if ui.button("Open pricing data…").clicked() {
                open_file_dialog(state, Page::PricePrediction);
                ui.close_menu();
            }
        });

        ui.separator();

        let source = match state.page {
            Page::DelayAnalysis => &state.delay_source,
            Page::PricePrediction => &state.pricing_source,
        };
        ui.label(RichText::new(source.to_string()).weak());

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Delay analysis page
// ---------------------------------------------------------------------------

pub fn delay_page(ui: &mut Ui, state: &mut DashboardState) {
    ui.heading("Impact of Time Delta & Previous Rental Delay");

    let rentals = match state.rentals() {
        Ok(table) => table,
        Err(e) => {
            error_label(ui, &e.to_string());
            return;
        }
    };

    // ---- Section 1: time delta between consecutive rentals ----
    ui.add_space(8.0);
    ui.heading("1. Analysis of the Time Delta between consecutive rentals");

    let report = match state.time_delta_view() {
        Ok(report) => report,
        Err(InsightsError::EmptyResult(_)) => {
            error_label(ui, "Delay analysis data is empty or all missing.");
            return;
        }
        Err(e) => {
            error_label(ui, &e.to_string());
            return;
        }
    };

    ui.label(format!(
        "Note: This analysis focuses only on rentals immediately followed by another. \
         {} rentals ({}%) were excluded from the primary delta analysis because they were \
         the last observed rental in a sequence (or had a missing time delta).",
        report.not_followed(),
        report.not_followed_pct()
    ));

    ui.checkbox(&mut state.show_raw_rentals, "Display raw data");
    if state.show_raw_rentals {
        ui.strong("Raw Data");
        raw_table(ui, "raw_rentals", &rentals, None);
    }

    ui.add_space(8.0);
    ui.strong("Metrics: Time Delta Impact");
    let m = &report.metrics;
    ui.columns(4, |cols| {
        metric(&mut cols[0], "Rentals with Follow-up (Known Delta)", m.considered.to_string());
        metric(
            &mut cols[1],
            &format!("Rentals Kept (Delta >= {} min)", report.range.low as i64),
            m.kept.to_string(),
        );
        metric(&mut cols[2], "Potentially Impacted Rentals", m.excluded.to_string());
        cols[2].label(RichText::new(format!("-{}", m.excluded)).color(Color32::RED));
        metric(&mut cols[3], "Global Rentals Impacted %", format!("{}%", m.excluded_pct));
    });

    if !report.impacted_by_checkin.is_empty() {
        let breakdown: Vec<String> = report
            .impacted_by_checkin
            .iter()
            .map(|(checkin, n)| format!("{checkin}: {n}"))
            .collect();
        ui.label(format!("Impacted by check-in type: {}", breakdown.join(", ")));
    }

    ui.add_space(8.0);
    ui.strong("Distribution of Time Delta Between Rentals (Filtered)");
    plot::histogram_plot(ui, "time_delta_plot", &report.chart);

    // ---- Section 2: checkout delay of the previous rental ----
    ui.add_space(8.0);
    ui.separator();
    ui.heading("2. Impact of the Previous Rental's Checkout Delay");

    let report = match state.previous_delay_view() {
        Ok(report) => report,
        Err(InsightsError::EmptyResult(msg)) => {
            warning_label(ui, &msg);
            return;
        }
        Err(e) => {
            error_label(ui, &e.to_string());
            return;
        }
    };

    if report.chart.is_empty() {
        plot::histogram_plot(ui, "previous_delay_plot", &report.chart);
        return;
    }

    ui.columns(3, |cols| {
        metric(
            &mut cols[0],
            "Total Rentals Impacted by Previous Delay (P.D. > 0)",
            report.total_impacted.to_string(),
        );
        metric(
            &mut cols[1],
            "Percentage of Rentals Impacted by the Delay of the Previous Rental",
            format!("{}%", report.impacted_pct),
        );
        metric(
            &mut cols[2],
            &format!("Rentals Displayed (P.D. <= {} min)", report.limit as i64),
            report.displayed().to_string(),
        );
    });

    if !report.hidden_by_checkin.is_empty() {
        let breakdown: Vec<String> = report
            .hidden_by_checkin
            .iter()
            .map(|(checkin, n)| format!("{checkin}: {n}"))
            .collect();
        ui.label(format!(
            "Hidden above {} min by check-in type: {}",
            report.limit as i64,
            breakdown.join(", ")
        ));
    }

    ui.add_space(8.0);
    ui.strong("Distribution of the Previous Rental's Delay by Current Rental State");
    plot::histogram_plot(ui, "previous_delay_plot", &report.chart);
}

// ---------------------------------------------------------------------------
// Price prediction page
// ---------------------------------------------------------------------------

pub fn prediction_page(ui: &mut Ui, state: &mut DashboardState) {
    ui.heading("Daily Rental Price Prediction");

    if !state.gateway.is_available() {
        error_label(ui, "Machine Learning model could not be loaded. Feature disabled.");
        if let Some(reason) = state.gateway.unavailable_reason() {
            ui.label(RichText::new(reason).weak());
        }
        return;
    }

    ui.checkbox(&mut state.show_raw_pricing, "Display raw pricing data");
    if state.show_raw_pricing {
        ui.strong("Raw Pricing Data Preview");
        match state.pricing() {
            Ok(table) => {
                raw_table(ui, "raw_pricing", &table, Some(RAW_PRICING_ROWS));
                ui.label(format!("Total rows: {}", table.len()));
            }
            Err(e) => error_label(ui, &e.to_string()),
        }
    }

    ui.separator();
    ui.strong("Enter vehicle features:");
    if let Some(notice) = state.pricing_notice() {
        ui.label(RichText::new(notice).weak());
    }

    let models = state.choices("model_key", &MODEL_CHOICES);
    let fuels = state.choices("fuel", &FUEL_CHOICES);
    let colors = state.choices("paint_color", &COLOR_CHOICES);
    let car_types = state.choices("car_type", &CAR_TYPE_CHOICES);

    let form = &mut state.form;
    ui.columns(2, |cols| {
        let ui = &mut cols[0];
        choice(ui, "Model (model_key)", &mut form.model_key, &models);
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Mileage (mileage)");
            ui.add(egui::DragValue::new(&mut form.mileage).speed(1000.0).range(0.0..=f64::MAX));
        });
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Engine Power (engine_power)");
            ui.add(egui::DragValue::new(&mut form.engine_power).speed(1.0).range(50.0..=400.0));
        });
        choice(ui, "Fuel (fuel)", &mut form.fuel, &fuels);
        choice(ui, "Color (paint_color)", &mut form.paint_color, &colors);
        choice(ui, "Car Type (car_type)", &mut form.car_type, &car_types);

        let ui = &mut cols[1];
        ui.strong("Features (bool)");
        ui.checkbox(&mut form.private_parking_available, "Private Parking Available");
        ui.checkbox(&mut form.has_gps, "GPS");
        ui.checkbox(&mut form.has_air_conditioning, "Air Conditioning");
        ui.checkbox(&mut form.automatic_car, "Automatic Car");
        ui.checkbox(&mut form.has_getaround_connect, "GetAround Connect");
        ui.checkbox(&mut form.has_speed_regulator, "Speed Regulator");
        ui.checkbox(&mut form.winter_tires, "Winter Tires");
    });

    ui.separator();
    if ui.button("Calculate").clicked() {
        state.calculate_price();
    }

    match &state.last_prediction {
        Some(Ok(price)) => {
            ui.label(RichText::new("Prediction Successful").color(Color32::GREEN).strong());
            metric(ui, "Estimated Rental Price (per day)", format!("{price} €"));
        }
        Some(Err(e)) => {
            error_label(ui, &format!("Error during prediction: {e}"));
            if matches!(e, InsightsError::PredictionFailed(_)) {
                warning_label(ui, "Please check the model input types.");
            }
        }
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).small().weak());
        ui.label(RichText::new(value).size(24.0).strong());
    });
}

fn error_label(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(message).color(Color32::RED));
}

fn warning_label(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(format!("⚠ {message}")).color(WARNING));
}

fn choice(ui: &mut Ui, label: &str, value: &mut String, options: &[String]) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(label)
            .selected_text(value.as_str())
            .show_ui(ui, |ui: &mut Ui| {
                for option in options {
                    ui.selectable_value(value, option.clone(), option.as_str());
                }
            });
    });
}

/// Scrollable table of `table`, limited to the first `max_rows` rows.
fn raw_table(ui: &mut Ui, id: &str, table: &Table, max_rows: Option<usize>) {
    let n_rows = max_rows.map_or(table.len(), |n| n.min(table.len()));
    let columns = &table.column_names;

    ui.push_id(id, |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(300.0)
                .columns(Column::auto().at_least(60.0), columns.len())
                .header(20.0, |mut header| {
                    for name in columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, n_rows, |mut row| {
                        let record = &table.rows[row.index()];
                        for name in columns {
                            row.col(|ui: &mut Ui| {
                                ui.label(record.get(name).to_string());
                            });
                        }
                    });
                });
        });
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Replace the configured source of `page` with a local file.
pub fn open_file_dialog(state: &mut DashboardState, page: Page) {
    let file = rfd::FileDialog::new()
        .set_title(match page {
            Page::DelayAnalysis => "Open rentals data",
            Page::PricePrediction => "Open pricing data",
        })
        .add_filter("Supported files", &["xlsx", "xls", "csv", "json", "parquet", "pq"])
        .add_filter("Excel", &["xlsx", "xls"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    let Some(path) = file else {
        return;
    };

    let mut source = DataSource::path(&path);
    if page == Page::DelayAnalysis && source.extension().starts_with("xls") {
        source.sheet = state.config.delay_sheet.clone();
    }

    match state.datasets.get(&source) {
        Ok(table) => {
            log::info!("Loaded {} rows with columns {:?}", table.len(), table.column_names);
            state.status_message = None;
            match page {
                Page::DelayAnalysis => state.set_delay_source(source),
                Page::PricePrediction => state.set_pricing_source(source),
            }
            state.page = page;
        }
        Err(e) => {
            log::error!("Failed to load file: {e}");
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}
