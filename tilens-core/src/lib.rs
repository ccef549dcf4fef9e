//! tilens Core - observables and tool-argument primitives
//!
//! This crate provides the foundational pieces shared by every lookup agent:
//! - Observable and observable-type model (IP, domain, URL, file hash)
//! - Relationship kinds for sample pivoting
//! - Comma-delimited tool argument parsing
//! - The output truncation budget

pub mod observable;
pub mod params;
pub mod budget;

pub use observable::*;
pub use params::*;
pub use budget::*;
