//! Amazon vs Goodreads rating comparison: data pipeline and dashboard state.

pub mod color;
pub mod config;
pub mod data;
pub mod report;
pub mod state;
