//! Common test utilities and helpers
//!
//! This module provides shared functionality used across integration tests:
//! - Binary invocation with an isolated environment (via `extforge_command`)
//! - Package fixtures on disk (via `helpers`)

pub(crate) mod helpers;

#[allow(unused_imports)]
pub(crate) use helpers::{Fixture, extforge_command};
