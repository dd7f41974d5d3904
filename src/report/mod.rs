//! Report output.
//!
//! Markdown/JSON documents and the SVG radar chart.

pub mod chart;
pub mod generator;

pub use chart::{render_radar_svg, ChartOptions};
pub use generator::{build_report, generate_json_report, generate_markdown_report};
