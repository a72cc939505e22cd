//! Tool-execution and change-safety mediation for autonomous repository
//! maintenance agents.
//!
//! A calling agent supplies a capability registry, a repository context, and
//! prompts; this crate drives the model's plan through a step-bounded loop
//! where every capability call is gated by a safety classifier, every
//! invocation is recorded, and every surfaced file change is collected as
//! inert data for the caller to validate before applying. The architecture
//! enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (safety rules, triage, content
//!   checks). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, the change validator's
//!   filesystem checks). Isolated to enable tempdir-backed tests.
//!
//! [`capability`], [`gate`], and [`session`] coordinate core logic with the
//! caller-supplied capabilities and model collaborator.

pub mod capability;
pub mod core;
pub mod gate;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
