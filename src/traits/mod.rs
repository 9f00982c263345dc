//! Trait definitions for the export seams.
//!
//! The traversal only needs "give me every entity of this query"; keeping
//! that behind a trait lets it run against the live API or an in-memory
//! account.

mod source;

pub use source::ResourceSource;
