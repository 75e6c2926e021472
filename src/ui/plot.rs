use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotBounds};

use getaround_insights::chart::{BarMode, ChartSpec, HistogramSpec};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Histogram (central panel)
// ---------------------------------------------------------------------------

/// Render a histogram spec, or its empty-state warning.
pub fn histogram_plot(ui: &mut Ui, id: &str, chart: &ChartSpec) {
    match chart {
        ChartSpec::NoData { title, message } => {
            ui.strong(title);
            ui.label(RichText::new(format!("⚠ {message}")).color(Color32::from_rgb(230, 160, 0)));
        }
        ChartSpec::Histogram(spec) => {
            ui.strong(&spec.title);
            bar_plot(ui, id, spec);
        }
    }
}

fn bar_plot(ui: &mut Ui, id: &str, spec: &HistogramSpec) {
    let colors = ColorMap::for_histogram(spec);

    let mut charts: Vec<BarChart> = Vec::with_capacity(spec.series.len());
    for series in &spec.series {
        let color = colors.color_for(&series.name);
        let bars: Vec<Bar> = series
            .bins
            .iter()
            .map(|bin| {
                Bar::new((bin.start + bin.end) / 2.0, bin.count as f64)
                    .width(bin.end - bin.start)
                    .fill(color)
                    .stroke((1.0, Color32::BLACK))
            })
            .collect();

        let mut chart = BarChart::new(bars).name(&series.name).color(color);
        if spec.bar_mode == BarMode::Stack {
            let below: Vec<&BarChart> = charts.iter().collect();
            chart = chart.stack_on(&below);
        }
        charts.push(chart);
    }

    let y_max = match spec.bar_mode {
        BarMode::Overlay => spec
            .series
            .iter()
            .flat_map(|s| s.bins.iter().map(|b| b.count))
            .max()
            .unwrap_or(0),
        BarMode::Stack => {
            let n_bins = spec.series.first().map_or(0, |s| s.bins.len());
            (0..n_bins)
                .map(|i| {
                    spec.series
                        .iter()
                        .filter_map(|s| s.bins.get(i))
                        .map(|b| b.count)
                        .sum::<usize>()
                })
                .max()
                .unwrap_or(0)
        }
    } as f64;
    let bounds = PlotBounds::from_min_max(
        [spec.x_range.min, 0.0],
        [spec.x_range.max, (y_max * 1.05).max(1.0)],
    );

    Plot::new(id)
        .legend(Legend::default())
        .x_axis_label(spec.x_label.clone())
        .y_axis_label(spec.y_label.clone())
        .height(320.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.set_plot_bounds(bounds);
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}
