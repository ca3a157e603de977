//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and gateway calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod change_request_service;
pub mod schedule_service;
