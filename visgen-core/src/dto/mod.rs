//! Data Transfer Objects
//!
//! Bodies exchanged with the provider's task endpoints, and the request a
//! caller hands to the client to start a generation.

pub mod generate;
pub mod task;
