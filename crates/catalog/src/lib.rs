//! Configuration catalog domain module.
//!
//! A configuration is a named bill of materials: which items, and how many of
//! each, compose one build. This crate holds the pure rules — component
//! upserts, archive state, duplication — plus the build-capacity arithmetic.

pub mod capacity;
pub mod configuration;

pub use capacity::can_build;
pub use configuration::{Configuration, ConfigurationComponent, ConfigurationPatch};
