//! Core domain types
//!
//! These types describe a single generation job from the caller's point of
//! view: the credential pair used to sign it, the job being tracked while the
//! provider works on it, and the outcome handed back at the end.

pub mod credentials;
pub mod image;
pub mod job;
pub mod outcome;
