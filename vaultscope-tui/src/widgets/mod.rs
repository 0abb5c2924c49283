//! Reusable widget components.

pub mod progress;
pub mod status;

pub use progress::BulkGauge;
pub use status::StatusLine;
