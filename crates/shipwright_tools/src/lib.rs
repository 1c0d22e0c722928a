//! # Shipwright Development Tools
//!
//! Command-line tools for working on ship data:
//! - Block catalog and blueprint validators
//! - Stats reports for assembled ships

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod report;
pub mod validate;
