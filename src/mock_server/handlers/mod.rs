//! HTTP request handlers for the mock server.

pub mod entities;
pub mod files;

pub use entities::*;
pub use files::*;
