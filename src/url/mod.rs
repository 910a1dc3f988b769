//! URL handling module for Contact-Scout
//!
//! This module provides:
//! - Seed/internal URL normalization used as dedup keys
//! - Authority extraction and same-domain checks
//! - User-configured URL-exclusion patterns

mod domain;
mod matcher;
mod normalize;

pub use domain::{host_of, is_same_domain};
pub use matcher::ExclusionPatterns;
pub use normalize::{normalize_url, strip_fragment_and_query};
