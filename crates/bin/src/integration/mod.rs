//! Glue between the CLI and the library crates.
//!
//! Terminal progress bars for the network-bound stages, and writing a run's
//! results to disk.

pub(crate) mod outputs;
pub(crate) mod progress_bar;
