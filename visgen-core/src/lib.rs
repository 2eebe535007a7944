//! Visgen Core
//!
//! Core types shared by the Visgen image-generation client and CLI.
//!
//! This crate contains:
//! - Domain types: credentials, generation jobs and their outcomes
//! - DTOs: request and response bodies exchanged with the provider

pub mod domain;
pub mod dto;
