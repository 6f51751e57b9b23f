//! Result reporting
//!
//! - [`text`]: the one-line summary on stdout and the `--dry-run` listing
//! - [`json`]: optional machine-readable result file

pub mod json;
pub mod text;
