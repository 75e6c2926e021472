use std::sync::Arc;

use getaround_insights::analysis::{
    previous_delay_bounds, previous_delay_report, time_delta_bounds, time_delta_report,
    PreviousDelayReport, SliderBounds, TimeDeltaReport,
};
use getaround_insights::data::filter::{round2, ValueRange};
use getaround_insights::error::Result;
use getaround_insights::{
    compute_delay_impact, AppConfig, DataSource, DatasetCache, PredictionGateway, PricingFeatures,
    Table,
};

/// Fallback choices for the form when the pricing dataset is unavailable.
pub const MODEL_CHOICES: [&str; 5] = ["Peugeot", "Renault", "BMW", "Audi", "Ferrari"];
pub const FUEL_CHOICES: [&str; 4] = ["diesel", "petrol", "hybrid", "electric"];
pub const COLOR_CHOICES: [&str; 6] = ["black", "grey", "white", "red", "blue", "other"];
pub const CAR_TYPE_CHOICES: [&str; 5] = ["sedan", "coupe", "hatchback", "suv", "stationwagon"];

/// Rows shown by the raw pricing data table.
pub const RAW_PRICING_ROWS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    DelayAnalysis,
    PricePrediction,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::DelayAnalysis, Page::PricePrediction];

    pub fn label(self) -> &'static str {
        match self {
            Page::DelayAnalysis => "Delay Analysis",
            Page::PricePrediction => "ML Price Prediction",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Everything the dashboard remembers between frames. Reports are rebuilt
/// every frame from the cached tables.
pub struct DashboardState {
    pub config: AppConfig,
    pub datasets: DatasetCache,
    pub gateway: PredictionGateway,

    pub page: Page,
    pub delay_source: DataSource,
    pub pricing_source: DataSource,

    /// Previous-rental join for `delay_source`, computed on first use.
    impact: Option<(DataSource, Arc<Table>)>,

    pub show_raw_rentals: bool,
    /// `None` until the user moves the slider; the default range applies.
    pub time_delta_range: Option<ValueRange>,
    pub max_previous_delay: Option<f64>,

    pub show_raw_pricing: bool,
    pub form: PricingFeatures,
    pub last_prediction: Option<Result<f64>>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl DashboardState {
    pub fn new(config: AppConfig) -> Self {
        let gateway = PredictionGateway::load(&config.model_path);
        let datasets = DatasetCache::new(config.fetch_timeout);
        Self::with_parts(config, datasets, gateway)
    }

    pub fn with_parts(config: AppConfig, datasets: DatasetCache, gateway: PredictionGateway) -> Self {
        Self {
            delay_source: config.delay_data_source(),
            pricing_source: config.pricing_data_source(),
            config,
            datasets,
            gateway,
            page: Page::DelayAnalysis,
            impact: None,
            show_raw_rentals: false,
            time_delta_range: None,
            max_previous_delay: None,
            show_raw_pricing: false,
            form: PricingFeatures::default(),
            last_prediction: None,
            status_message: None,
        }
    }

    // ---- datasets ----

    pub fn rentals(&self) -> Result<Arc<Table>> {
        self.datasets.get(&self.delay_source)
    }

    pub fn pricing(&self) -> Result<Arc<Table>> {
        self.datasets.get(&self.pricing_source)
    }

    pub fn delay_impact(&mut self) -> Result<Arc<Table>> {
        if let Some((source, table)) = &self.impact {
            if *source == self.delay_source {
                return Ok(table.clone());
            }
        }
        let rentals = self.rentals()?;
        let table = Arc::new(compute_delay_impact(&rentals));
        log::info!(
            "{} of {} rentals follow a late checkout",
            table.len(),
            rentals.len()
        );
        self.impact = Some((self.delay_source.clone(), table.clone()));
        Ok(table)
    }

    /// Point the delay page at another source; slider positions reset.
    pub fn set_delay_source(&mut self, source: DataSource) {
        log::info!("Delay analysis source set to {source}");
        self.delay_source = source;
        self.impact = None;
        self.time_delta_range = None;
        self.max_previous_delay = None;
    }

    pub fn set_pricing_source(&mut self, source: DataSource) {
        log::info!("Pricing source set to {source}");
        self.pricing_source = source;
    }

    // ---- delay analysis ----

    pub fn time_delta_bounds(&self) -> Result<SliderBounds> {
        time_delta_bounds(&*self.rentals()?)
    }

    pub fn time_delta_view(&self) -> Result<TimeDeltaReport> {
        let rentals = self.rentals()?;
        let bounds = time_delta_bounds(&rentals)?;
        time_delta_report(&rentals, self.time_delta_range.unwrap_or(bounds.default))
    }

    pub fn previous_delay_bounds(&mut self) -> Result<SliderBounds> {
        previous_delay_bounds(&*self.delay_impact()?)
    }

    pub fn previous_delay_view(&mut self) -> Result<PreviousDelayReport> {
        let impact = self.delay_impact()?;
        let bounds = previous_delay_bounds(&impact)?;
        let max_delay = self.max_previous_delay.unwrap_or(bounds.default.high);
        previous_delay_report(&*self.rentals()?, &impact, max_delay)
    }

    // ---- price prediction ----

    /// Form choices for a categorical column: the values present in the
    /// pricing dataset, or `fallback` when it is not loaded.
    pub fn choices(&self, column: &str, fallback: &[&str]) -> Vec<String> {
        let from_data: Vec<String> = self
            .pricing()
            .map(|table| {
                table
                    .unique_values(column)
                    .into_iter()
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_string())
                    .collect()
            })
            .unwrap_or_default();
        if from_data.is_empty() {
            fallback.iter().map(|s| s.to_string()).collect()
        } else {
            from_data
        }
    }

    /// Why the form shows the fixed option lists instead of the dataset's
    /// values; `None` once the pricing dataset is loaded.
    pub fn pricing_notice(&self) -> Option<String> {
        self.pricing()
            .err()
            .map(|e| format!("Form choices use the default lists: {e}"))
    }

    /// Score the form; the shown price is rounded to cents.
    pub fn calculate_price(&mut self) {
        let result = self.gateway.predict(&self.form).map(round2);
        match &result {
            Ok(price) => log::info!("Predicted {price} per day for {}", self.form.model_key),
            Err(e) => log::warn!("{e}"),
        }
        self.last_prediction = Some(result);
    }
}
