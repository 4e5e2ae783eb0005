//! Type definitions for handlers
//!
//! Request inputs, response bodies and view models.

pub mod comments;
pub mod common;
pub mod posts;

pub use comments::*;
pub use common::*;
pub use posts::*;
