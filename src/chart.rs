//! Declarative histogram specs built from filtered tables

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::Table;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum BinStrategy {
    Fixed(usize),
    /// Sturges' rule over the value span.
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BarMode {
    Overlay,
    Stack,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Bars for one value of the color column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub bins: Vec<Bin>,
}

impl Series {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bar_mode: BarMode,
    pub opacity: f32,
    pub bin_width: f64,
    /// Visible x-axis window.
    pub x_range: AxisRange,
    /// One series per group, ordered by group label. Every series shares the
    /// same bin edges.
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChartSpec {
    /// Nothing to draw; the UI shows `message` instead of an empty plot.
    NoData { title: String, message: String },
    Histogram(HistogramSpec),
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        matches!(self, ChartSpec::NoData { .. })
    }
}

/// Histogram of `value_column`, grouped by `color_column`, x-axis clamped to
/// `range_hint`. Automatic bins, overlaid groups.
pub fn histogram(
    table: &Table,
    value_column: &str,
    color_column: Option<&str>,
    range_hint: Option<(f64, f64)>,
) -> ChartSpec {
    let mut builder = Histogram::new(value_column);
    if let Some(col) = color_column {
        builder = builder.color_by(col);
    }
    if let Some((min, max)) = range_hint {
        builder = builder.x_range(min, max);
    }
    builder.render(table)
}

/// Histogram builder with the cosmetic knobs.
#[derive(Debug, Clone)]
pub struct Histogram {
    value_column: String,
    color_column: Option<String>,
    range_hint: Option<AxisRange>,
    bins: BinStrategy,
    bar_mode: BarMode,
    title: String,
    x_label: String,
    y_label: String,
    opacity: f32,
    empty_message: String,
}

impl Histogram {
    pub fn new(value_column: &str) -> Self {
        Histogram {
            value_column: value_column.to_string(),
            color_column: None,
            range_hint: None,
            bins: BinStrategy::Auto,
            bar_mode: BarMode::Overlay,
            title: String::new(),
            x_label: value_column.to_string(),
            y_label: "Frequency (Number of Observations)".to_string(),
            opacity: 0.75,
            empty_message: "No data matches the selected filters.".to_string(),
        }
    }

    pub fn color_by(mut self, column: &str) -> Self {
        self.color_column = Some(column.to_string());
        self
    }

    pub fn x_range(mut self, min: f64, max: f64) -> Self {
        self.range_hint = Some(AxisRange { min, max });
        self
    }

    pub fn bins(mut self, bins: BinStrategy) -> Self {
        self.bins = bins;
        self
    }

    pub fn bar_mode(mut self, mode: BarMode) -> Self {
        self.bar_mode = mode;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = x.into();
        self.y_label = y.into();
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn render(&self, table: &Table) -> ChartSpec {
        // (group label, value) for every row with a numeric value
        let points: Vec<(String, f64)> = table
            .rows
            .iter()
            .filter_map(|row| {
                let v = row.number(&self.value_column).filter(|v| v.is_finite())?;
                let group = match &self.color_column {
                    Some(col) => row.get(col).to_string(),
                    None => self.value_column.clone(),
                };
                Some((group, v))
            })
            .collect();

        if points.is_empty() {
            return ChartSpec::NoData {
                title: self.title.clone(),
                message: self.empty_message.clone(),
            };
        }

        let (lo, hi) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, v)| {
            (lo.min(*v), hi.max(*v))
        });
        let (start, width, n_bins) = if hi > lo {
            let n_bins = match self.bins {
                BinStrategy::Fixed(n) => n.max(1),
                BinStrategy::Auto => sturges(points.len()),
            };
            (lo, (hi - lo) / n_bins as f64, n_bins)
        } else {
            // single distinct value: one unit-wide bar centred on it
            (lo - 0.5, 1.0, 1)
        };

        let mut counts: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (group, v) in &points {
            let idx = (((v - start) / width).floor() as usize).min(n_bins - 1);
            counts.entry(group.clone()).or_insert_with(|| vec![0; n_bins])[idx] += 1;
        }

        let series = counts
            .into_iter()
            .map(|(name, counts)| Series {
                name,
                bins: counts
                    .into_iter()
                    .enumerate()
                    .map(|(i, count)| Bin {
                        start: start + i as f64 * width,
                        end: start + (i + 1) as f64 * width,
                        count,
                    })
                    .collect(),
            })
            .collect();

        let x_range = self.range_hint.unwrap_or(AxisRange {
            min: start,
            max: start + n_bins as f64 * width,
        });

        ChartSpec::Histogram(HistogramSpec {
            title: self.title.clone(),
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
            bar_mode: self.bar_mode,
            opacity: self.opacity,
            bin_width: width,
            x_range,
            series,
        })
    }
}

/// `ceil(log2(n)) + 1`
fn sturges(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (n as f64).log2().ceil() as usize + 1
}
