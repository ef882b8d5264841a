//! Report rendering.

pub mod generator;

pub use generator::{
    chart_links, generate_json_report, generate_markdown_report, prepare_report_path, write_report,
};
