//! HTTP request handlers for the blog
//!
//! Handlers reach the database only through the request's [`RequestContext`],
//! so everything they write is committed or dropped with the request.
//!
//! [`RequestContext`]: crate::session::RequestContext

pub mod admin;
pub mod comments;
pub mod health;
pub mod pages;
pub mod posts;
pub mod types;

pub use admin::*;
pub use comments::*;
pub use health::*;
pub use pages::*;
pub use posts::*;
