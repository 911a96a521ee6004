//! Shared test utilities for vistoria integration tests.
//!
//! This module provides:
//! - `TestHarness`: a temp upload directory, an on-disk database and helpers
//!   to seed inspections, checklist entries and uploads
//! - Fake collaborators standing in for the AI provider and detector

pub mod fakes;
pub mod harness;

pub use fakes::*;
pub use harness::{wait_finished, TestHarness};
