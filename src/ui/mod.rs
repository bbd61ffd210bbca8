// UI and formatting module

pub mod formatters;

// Re-export commonly used items for cleaner imports
pub use formatters::{
    format_aggregate, format_clock, format_fan, format_severity, format_snapshot_line,
    format_temperature, format_uptime, print_history_table, print_stats,
};
