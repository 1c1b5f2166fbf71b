//! Dashboard Main Application
//! Main window with control panel and the dashboard page; CSV loading and
//! the aggregation pipeline run on background threads.

use crate::data::{read_observations, DashboardData, DataLoader, DEFAULT_DATA_PATH};
use crate::gui::{ControlPanel, ControlPanelAction, Dashboard};
use egui::SidePanel;
use polars::prelude::DataFrame;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use std::time::SystemTime;

const SETTINGS_KEY: &str = "dashboard_settings";

/// CSV loading result from background thread
enum LoadResult {
    Progress(String),
    Complete {
        df: DataFrame,
        path: PathBuf,
        modified: Option<SystemTime>,
    },
    Error(String),
}

/// Pipeline result from background thread
enum PipelineResult {
    Complete(Box<DashboardData>),
    Error(String),
}

/// Main application window.
pub struct DashboardApp {
    loader: DataLoader,
    control_panel: ControlPanel,
    dashboard: Dashboard,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,

    // Async pipeline run
    pipeline_rx: Option<Receiver<PipelineResult>>,
    is_computing: bool,
    recompute_queued: bool,
}

impl DashboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut control_panel = ControlPanel::new();
        if let Some(settings) = cc
            .storage
            .and_then(|storage| storage.get_string(SETTINGS_KEY))
            .and_then(|json| serde_json::from_str(&json).ok())
        {
            control_panel.settings = settings;
        }

        let mut app = Self {
            loader: DataLoader::new(),
            control_panel,
            dashboard: Dashboard::new(),
            load_rx: None,
            is_loading: false,
            pipeline_rx: None,
            is_computing: false,
            recompute_queued: false,
        };

        let path = app
            .control_panel
            .settings
            .csv_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        if path.exists() {
            app.start_load(path);
        } else {
            app.control_panel
                .set_progress(0.0, &format!("Waiting for {}", path.display()));
        }

        app
    }

    /// Start loading a CSV file in a background thread. A fresh cache
    /// entry for the same file skips the read and goes straight to the
    /// pipeline.
    fn start_load(&mut self, path: PathBuf) {
        if self.is_loading {
            return;
        }
        if self.loader.is_fresh(&path) {
            self.queue_recompute();
            return;
        }

        self.control_panel.settings.csv_path = Some(path.clone());
        self.control_panel.set_progress(5.0, "Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress("Reading observations...".to_string()));

            let modified = fs::metadata(&path).and_then(|m| m.modified()).ok();
            match read_observations(&path) {
                Ok(df) => {
                    let _ = tx.send(LoadResult::Complete { df, path, modified });
                }
                Err(e) => {
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                }
            }
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(status) => {
                        self.control_panel.set_progress(10.0, &status);
                    }
                    LoadResult::Complete { df, path, modified } => {
                        self.loader.set_observations(path, modified, df);
                        self.control_panel.update_locations(self.loader.locations());
                        self.control_panel.set_progress(
                            40.0,
                            &format!(
                                "Loaded {} rows, {} countries",
                                self.loader.row_count(),
                                self.control_panel.locations.len()
                            ),
                        );
                        self.is_loading = false;
                        should_keep_receiver = false;
                        self.queue_recompute();
                    }
                    LoadResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", error));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Re-run the pipeline, or remember to once the current run finishes.
    fn queue_recompute(&mut self) {
        if self.is_computing {
            self.recompute_queued = true;
        } else {
            self.start_pipeline();
        }
    }

    /// Run the aggregation pipeline in a background thread.
    fn start_pipeline(&mut self) {
        let Some(df) = self.loader.observations().cloned() else {
            return;
        };
        let selected = self.control_panel.settings.selected_countries.clone();

        self.is_computing = true;
        self.control_panel.set_progress(60.0, "Aggregating...");

        let (tx, rx) = channel();
        self.pipeline_rx = Some(rx);

        thread::spawn(move || match DashboardData::compute(&df, &selected) {
            Ok(data) => {
                let _ = tx.send(PipelineResult::Complete(Box::new(data)));
            }
            Err(e) => {
                let _ = tx.send(PipelineResult::Error(e.to_string()));
            }
        });
    }

    /// Check for pipeline results
    fn check_pipeline_results(&mut self) {
        let rx = self.pipeline_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    PipelineResult::Complete(data) => {
                        self.dashboard.set_data(*data);
                        self.control_panel
                            .set_progress(100.0, "Complete! Dashboard up to date");
                        self.is_computing = false;
                        should_keep_receiver = false;
                    }
                    PipelineResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", error));
                        self.is_computing = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.pipeline_rx = Some(rx);
            } else if self.recompute_queued {
                self.recompute_queued = false;
                self.start_pipeline();
            }
        }
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.dashboard.clear();
            self.loader.invalidate();
            self.start_load(path);
        }
    }

    /// Handle an explicit reload: invalidate the cache and re-read the
    /// current file. The previous charts stay up until replaced.
    fn handle_reload(&mut self) {
        let Some(path) = self.control_panel.settings.csv_path.clone() else {
            self.control_panel.set_progress(0.0, "No file selected");
            return;
        };
        self.loader.invalidate();
        self.start_load(path);
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();
        self.check_pipeline_results();

        // Request repaint while loading or computing
        if self.is_loading || self.is_computing {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::SelectionChanged => self.queue_recompute(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard page
        egui::CentralPanel::default().show(ctx, |ui| {
            self.dashboard.show(ui);
        });
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(json) = serde_json::to_string(&self.control_panel.settings) {
            storage.set_string(SETTINGS_KEY, json);
        }
    }
}
