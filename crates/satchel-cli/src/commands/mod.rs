//! Command implementations.

pub mod build;
pub mod check;
pub mod manifest;
mod utils;

pub use build::execute as build_execute;
pub use check::execute as check_execute;
pub use manifest::execute as manifest_execute;
