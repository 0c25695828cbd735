// UI and formatting module

pub mod formatters;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_rate, format_size, format_snapshot, format_timestamp, usage_bar};
