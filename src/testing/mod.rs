//! Test utilities
//!
//! An in-memory stand-in for a broker admin endpoint, used by the crate's
//! own integration tests and available to embedders for theirs.

mod memory_admin;

pub use memory_admin::{AdminCall, InMemoryTopicAdmin};
