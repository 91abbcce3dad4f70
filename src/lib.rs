pub mod api;
pub mod audit;
pub mod classify;
pub mod config;
pub mod error;
pub mod functions;
pub mod indent;
pub mod mode;
pub mod newline;
pub mod pipeline;
pub mod placeholder;
pub mod report;
mod string_utils;

// Re-export the main public API
pub use api::{format_string, get_matching_paths, run, PASS_VERSION};
pub use config::load_config;
pub use error::{Result, SqlPassError};
pub use mode::Mode;
pub use pipeline::{format_sql, FormatResult};
