//! Application services layer.

pub mod coordinator;
pub mod error;
pub mod repos;
