// Command handlers module
pub mod completions;
pub mod config;
pub mod monitor;
pub mod status;
pub mod version;

// Re-exports for cleaner imports
pub use monitor::execute as monitor;
pub use status::execute as status;
pub use version::execute as version;
