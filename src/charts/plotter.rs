//! Chart Plotter Module
//! Creates the dashboard visualizations using egui_plot.

use crate::data::{date_from_days, CountrySeries, RankEntry};
use egui::Color32;
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

/// Primary series color
pub const ACCENT: Color32 = Color32::from_rgb(52, 152, 219); // Blue

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(255, 87, 34),  // Deep Orange
    Color32::from_rgb(121, 85, 72),  // Brown
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

const CHART_HEIGHT: f32 = 280.0;

/// Creates dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Get the palette color for a series index.
    pub fn series_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Format a days-since-epoch axis value as year-month.
    fn format_date(days: f64) -> String {
        date_from_days(days).format("%Y-%m").to_string()
    }

    /// Draw a time-series line chart; x values are days since epoch.
    pub fn draw_time_series(
        ui: &mut egui::Ui,
        id: &str,
        points: &[[f64; 2]],
        y_label: &str,
        color: Color32,
    ) {
        Plot::new(id)
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label(y_label)
            .x_axis_formatter(|mark, _range| Self::format_date(mark.value))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from_iter(points.iter().copied()))
                        .color(color)
                        .width(2.0),
                );
            });
    }

    /// Draw a vertical bar ranking; one bar per entry, labelled with the
    /// location name on the x-axis.
    pub fn draw_bar_ranking(ui: &mut egui::Ui, id: &str, entries: &[RankEntry], y_label: &str) {
        let labels: Vec<String> = entries.iter().map(|e| e.location.clone()).collect();
        let bars: Vec<Bar> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| Bar::new(i as f64, e.value).width(0.6).fill(ACCENT))
            .collect();

        Plot::new(id)
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .y_axis_label(y_label)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if (mark.value - idx as f64).abs() < 1e-6 && idx < labels.len() {
                    labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars));
            });
    }

    /// Draw a horizontal bar ranking; one bar per entry, labelled with the
    /// location name on the y-axis. Entries render top to bottom in rank
    /// order.
    pub fn draw_hbar_ranking(ui: &mut egui::Ui, id: &str, entries: &[RankEntry], x_label: &str) {
        let count = entries.len();
        let labels: Vec<String> = entries.iter().map(|e| e.location.clone()).collect();
        let bars: Vec<Bar> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| Bar::new((count - 1 - i) as f64, e.value).width(0.6).fill(ACCENT))
            .collect();

        Plot::new(id)
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label(x_label)
            .y_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if (mark.value - idx as f64).abs() < 1e-6 && idx < labels.len() {
                    labels[count - 1 - idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal());
            });
    }

    /// Draw a scatter plot of (x, y) pairs.
    pub fn draw_scatter(
        ui: &mut egui::Ui,
        id: &str,
        points: &[[f64; 2]],
        x_label: &str,
        y_label: &str,
    ) {
        Plot::new(id)
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label(x_label)
            .y_axis_label(y_label)
            .show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new(PlotPoints::from_iter(points.iter().copied()))
                        .radius(3.0)
                        .color(ACCENT),
                );
            });
    }

    /// Draw the overlaid per-country comparison chart with a legend entry
    /// per selected location. An empty selection draws an empty plot.
    pub fn draw_comparison(ui: &mut egui::Ui, id: &str, series: &[CountrySeries]) {
        Plot::new(id)
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label("Total Cases")
            .x_axis_formatter(|mark, _range| Self::format_date(mark.value))
            .legend(Legend::default())
            .show(ui, |plot_ui| {
                for (i, country) in series.iter().enumerate() {
                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(country.points.iter().copied()))
                            .color(Self::series_color(i))
                            .width(2.0)
                            .name(&country.location),
                    );
                }
            });
    }
}
