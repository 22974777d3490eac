//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep API/CLI layers decoupled from storage details.

pub mod association_service;
pub mod catalog_service;
pub mod display;
pub mod epidemiology_service;
