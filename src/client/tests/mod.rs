//! Unit tests for the client module.
//!
//! Split by operation: argument construction, the two table-producing
//! operations, fetch, and channel release on failure paths.

mod fetch;
mod fixtures;
mod release;
mod usage;
