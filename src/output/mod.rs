//! Output formatters for cache tables and scan results.
//!
//! This module provides different renderings of a directory's cache:
//! - An aligned text table for humans
//! - JSON for automation and scripting
//! - CSV, in the same layout as the cache file itself
//!
//! and the summary printed when a scan finishes.
//!
//! # Example
//!
//! ```no_run
//! use hashkeep::cache::store;
//! use hashkeep::output::json::JsonOutput;
//! use std::path::Path;
//!
//! let dir = Path::new(".");
//! let (cache, _) = store::load(dir);
//!
//! // Output as JSON to stdout
//! let output = JsonOutput::new(dir, &cache);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod csv;
pub mod json;
pub mod summary;
pub mod table;

// Re-export main types
pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use summary::SummaryOutput;
pub use table::TableOutput;
