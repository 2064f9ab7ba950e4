//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep front ends decoupled from storage details and memo encoding.

pub mod record_service;
pub mod stats_service;
