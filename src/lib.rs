//! SHORECAST: an egui dashboard for coastal shoreline change.
//!
//! The binary in `main.rs` only wires logging and configuration to
//! [`app::ShorecastApp`]; everything else lives here so the data layer can be
//! exercised without a window.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod state;
pub mod ui;
