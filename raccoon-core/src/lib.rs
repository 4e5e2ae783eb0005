//! Raccoon Core - configuration, error and logging primitives shared by the blog host
//!
//! Everything here is independent of HTTP and of the document store.

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
pub use logging::*;

// Re-export commonly used external types
pub use tracing;
