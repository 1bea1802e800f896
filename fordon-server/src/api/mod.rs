//! HTTP API handlers for fordon-server

pub mod health;
pub mod stats;
pub mod ui;
pub mod upload;
pub mod vehicles;

pub use health::health_routes;
pub use stats::get_stats;
pub use ui::{serve_app_js, serve_index, serve_style_css};
pub use upload::upload_file;
pub use vehicles::get_vehicles;
