//! Ambient helpers shared by the BrainJar client crates: log setup and
//! filesystem sanity checks performed at startup.

pub mod env;
pub mod utils;

pub use utils::logging::LogFormat;
