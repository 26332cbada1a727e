//! CLI library components for seedplan.

pub mod config;
pub mod logging;
pub mod pipeline;
