//! HTTP handlers for cpath-web

pub mod buildinfo;
pub mod delete;
pub mod form;
pub mod health;
pub mod plot;
pub mod stats;
pub mod ui;

pub use buildinfo::get_build_info;
pub use delete::delete_data;
pub use form::{show_form, submit_form};
pub use health::health_routes;
pub use plot::plot_page;
pub use stats::{get_stats, parse_preview};
pub use ui::{about_page, serve_style_css};
