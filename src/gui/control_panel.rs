//! Control Panel Widget
//! Left side panel with the data source row, the country comparison
//! selector and the progress/status display.

use egui::{Color32, RichText, ScrollArea};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default selection for the country comparison chart.
pub const DEFAULT_SELECTION: [&str; 3] = ["India", "United States", "Germany"];

/// User settings persisted between sessions.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub csv_path: Option<PathBuf>,
    pub selected_countries: Vec<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            csv_path: None,
            selected_countries: DEFAULT_SELECTION.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub locations: Vec<String>,
    pub progress: f32,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            locations: Vec::new(),
            progress: 0.0,
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the selectable locations after a load.
    pub fn update_locations(&mut self, locations: Vec<String>) {
        self.locations = locations;
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🌎 COVID-19 Dashboard")
                    .size(20.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.settings.csv_path.is_some() {
                            Color32::WHITE
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                        if ui.button("⟳ Reload").clicked() {
                            action = ControlPanelAction::Reload;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Country Comparison Section =====
        ui.label(RichText::new("🔧 Country Comparison").size(14.0).strong());
        ui.add_space(5.0);
        ui.label(
            RichText::new(format!(
                "{} selected",
                self.settings.selected_countries.len()
            ))
            .size(11.0)
            .color(Color32::GRAY),
        );
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(5.0)
            .show(ui, |ui| {
                ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                    if self.locations.is_empty() {
                        ui.label(RichText::new("Load data to list countries").size(11.0));
                    }
                    for location in &self.locations {
                        let mut checked = self.settings.selected_countries.contains(location);
                        if ui.checkbox(&mut checked, location).changed() {
                            if checked {
                                self.settings.selected_countries.push(location.clone());
                            } else {
                                self.settings.selected_countries.retain(|l| l != location);
                            }
                            action = ControlPanelAction::SelectionChanged;
                        }
                    }
                });
            });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.small_button("Defaults").clicked() {
                self.settings.selected_countries =
                    DEFAULT_SELECTION.iter().map(|s| s.to_string()).collect();
                action = ControlPanelAction::SelectionChanged;
            }
            if ui.small_button("Clear All").clicked() {
                self.settings.selected_countries.clear();
                action = ControlPanelAction::SelectionChanged;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Complete") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    Reload,
    SelectionChanged,
}
