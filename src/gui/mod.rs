//! GUI module - User interface components

mod app;
mod control_panel;
mod dashboard;

pub use app::DashboardApp;
pub use control_panel::{ControlPanel, ControlPanelAction, UserSettings, DEFAULT_SELECTION};
pub use dashboard::Dashboard;
