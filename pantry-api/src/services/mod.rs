//! Service layer between the HTTP routes and the resolver crates.

pub mod resolver;

pub use resolver::{ProductResolver, Resolution};
