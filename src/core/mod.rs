//! Core library components.
//!
//! The plan/execute/rotate engine and the pieces it is built from.

pub mod constants;
pub mod domain;
pub mod executor;
pub mod git;
pub mod identity;
pub mod keys;
pub mod manifest;
pub mod planner;
pub mod rotation;
pub mod sops;
pub mod tool;
pub mod types;
pub mod workspace;
