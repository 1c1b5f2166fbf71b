//! Dashboard Page Widget
//! Central scrollable page with the ordered chart sections.

use crate::charts::ChartPlotter;
use crate::data::DashboardData;
use egui::{RichText, ScrollArea};

const SECTION_SPACING: f32 = 12.0;

/// Scrollable dashboard page. Holds the last completed pipeline result;
/// stale charts stay visible until the next run replaces them.
pub struct Dashboard {
    data: Option<DashboardData>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self { data: None }
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the current page content.
    pub fn clear(&mut self) {
        self.data = None;
    }

    /// Replace the page content with a completed pipeline run.
    pub fn set_data(&mut self, data: DashboardData) {
        self.data = Some(data);
    }

    /// Draw the dashboard page.
    pub fn show(&self, ui: &mut egui::Ui) {
        let Some(data) = &self.data else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(8.0);
                    ui.label(RichText::new("🌎 COVID-19 Data Dashboard").size(24.0).strong());
                });
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "Global Total COVID-19 Cases Over Time", |ui| {
                    ChartPlotter::draw_time_series(
                        ui,
                        "global_cases",
                        &data.global_cases,
                        "Total Cases",
                        ChartPlotter::series_color(6),
                    );
                });

                Self::section(ui, "Top 10 Countries by Total COVID-19 Cases", |ui| {
                    ChartPlotter::draw_bar_ranking(ui, "top_cases", &data.top_cases, "Total Cases");
                });

                Self::section(ui, "Top 10 Countries by Total COVID-19 Deaths", |ui| {
                    ChartPlotter::draw_bar_ranking(
                        ui,
                        "top_deaths",
                        &data.top_deaths,
                        "Total Deaths",
                    );
                });

                Self::section(ui, "Daily New COVID-19 Cases (Global)", |ui| {
                    ChartPlotter::draw_time_series(
                        ui,
                        "daily_new_cases",
                        &data.daily_new_cases,
                        "New Cases",
                        ChartPlotter::series_color(3),
                    );
                });

                Self::section(ui, "Population vs Total COVID-19 Cases", |ui| {
                    ChartPlotter::draw_scatter(
                        ui,
                        "population_vs_cases",
                        &data.population_vs_cases,
                        "Population",
                        "Total Cases",
                    );
                });

                Self::section(ui, "Top 10 Countries by Cases per Million", |ui| {
                    ChartPlotter::draw_hbar_ranking(
                        ui,
                        "top_cases_per_million",
                        &data.top_cases_per_million,
                        "Cases per Million",
                    );
                });

                Self::section(ui, "Countries with Lowest COVID-19 Death Rate", |ui| {
                    ChartPlotter::draw_hbar_ranking(
                        ui,
                        "lowest_death_rate",
                        &data.lowest_death_rate,
                        "Death Rate",
                    );
                });

                Self::section(ui, "Global Vaccination Trend Over Time", |ui| {
                    ChartPlotter::draw_time_series(
                        ui,
                        "vaccination_trend",
                        &data.vaccination_trend,
                        "People Vaccinated",
                        ChartPlotter::series_color(1),
                    );
                });

                Self::section(ui, "COVID-19 Cases Comparison by Country", |ui| {
                    ChartPlotter::draw_comparison(ui, "comparison", &data.comparison);
                });

                Self::section(ui, "Monthly COVID-19 New Cases", |ui| {
                    ChartPlotter::draw_time_series(
                        ui,
                        "monthly_new_cases",
                        &data.monthly_new_cases,
                        "New Cases",
                        ChartPlotter::series_color(2),
                    );
                });

                ui.add_space(SECTION_SPACING);
            });
    }

    /// Draw one titled chart card.
    fn section(ui: &mut egui::Ui, title: &str, add_chart: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(
                1.0,
                ui.visuals().widgets.noninteractive.bg_stroke.color,
            ))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(title).size(16.0).strong());
                ui.add_space(6.0);
                add_chart(ui);
            });
        ui.add_space(SECTION_SPACING);
    }
}
