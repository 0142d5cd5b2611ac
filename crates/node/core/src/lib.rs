//! Meridian node core library.
//!
//! - [`config`] - TOML node configuration
//! - [`logging`] - tracing subscriber setup
//! - [`args`] - shared CLI arguments
//! - [`node`] - assembly of a discovery node from its parts

pub mod args;
pub mod config;
pub mod logging;
pub mod node;

pub use args::LogArgs;
pub use config::{ConfigError, NodeConfig};
pub use node::{NodeError, SwarmNode, SwarmNodeBuilder};
