//! File output for deduplicated items.
//!
//! # Submodules
//!
//! - [`json`]: Reads upstream clippings and writes the retained items back as JSON
//!
//! # Output Structure
//!
//! ```text
//! output/
//! └── clippings.dedup.json   # retained items, input order, fields untouched
//! ```

pub mod json;
