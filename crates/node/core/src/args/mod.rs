//! Command line arguments shared by Meridian binaries.

mod log;

pub use log::LogArgs;
