//! Deterministic, pure logic for the mediation core.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests; filesystem
//! state only enters through the validator in [`crate::io`].

pub mod content;
pub mod protected;
pub mod rules;
pub mod safety;
pub mod triage;
pub mod types;
