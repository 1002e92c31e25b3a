//! Feature slices
//!
//! Each feature keeps its commands, queries, persistence and routes together.

pub mod shared;
pub mod todos;
