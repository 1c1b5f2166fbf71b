//! COVID-19 Data Dashboard
//!
//! Loads a per-country per-day epidemiological CSV and renders a fixed set
//! of aggregation charts on an interactive page.

mod charts;
mod data;
mod gui;

use anyhow::Result;
use eframe::egui;
use gui::DashboardApp;

fn main() -> Result<()> {
    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("COVID-19 Data Dashboard"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "COVID-19 Data Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start dashboard: {e}"))
}
