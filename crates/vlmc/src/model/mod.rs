//! High-level model API.
//!
//! - [`VlmcConfig`]: fit configuration, built with validation
//! - [`VlmcModel`]: fit a sample end to end and query the fitted chain

mod config;
mod vlmc;

pub use config::VlmcConfig;
pub use vlmc::VlmcModel;
