//! CLI command implementations

pub mod analyze;
pub mod controls;
pub mod json_output;
pub mod render;
