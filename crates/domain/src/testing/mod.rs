//! Test support shared by this crate's unit tests and downstream crates.

pub mod fixtures;
