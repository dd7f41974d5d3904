//! Survey aggregation pipeline.
//!
//! Raw sheet rows are normalized against a [`schema::Schema`], reduced to
//! per-competency averages by the aggregator, and reshaped for tables and
//! the radar chart.

pub mod aggregator;
pub mod cohort;
pub mod likert;
pub mod normalize;
pub mod schema;
pub mod shaper;

pub use aggregator::{aggregate, distinct_values};
pub use normalize::{normalize, ShortRows};
pub use schema::{IdentityField, Schema};
pub use shaper::{radar_series, summary_table, to_long_form, SeriesLabels};
