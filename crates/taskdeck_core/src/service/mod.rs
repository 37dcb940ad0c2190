//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate model mutations and blob persistence into user intents.
//! - Keep UI/FFI layers decoupled from storage and ordering details.

pub mod event;
pub mod ordering;
pub mod project_store;
