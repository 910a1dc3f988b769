//! Configuration module for Contact-Scout
//!
//! This module handles loading, parsing, and validating the engine's TOML
//! configuration file.
//!
//! # Example
//!
//! ```no_run
//! use contact_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Batch size: {}", config.engine.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, EngineConfig, HttpConfig, OutputConfig, ProxyConfig,
    BROWSER_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
