//! Test helpers shared by the blueprint crates.
//!
//! - [`env`] guards process environment mutations.
//! - [`figment`] runs CLI configuration tests inside a jail.
//! - [`repo`] builds temporary repository trees.

pub mod env;
pub mod figment;
pub mod repo;
