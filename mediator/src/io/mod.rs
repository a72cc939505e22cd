//! Side-effecting pieces of the mediation layer.

pub mod config;
pub mod context;
pub mod validator;
