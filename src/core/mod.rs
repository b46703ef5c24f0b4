//! Core domain models for guided setup sequences
//!
//! This module defines the fundamental data structures that represent
//! sequences, stages, preconditions and their configuration.

pub mod builtin;
pub mod config;
pub mod context;
pub mod pipeline;
pub mod precondition;
pub mod stage;
pub mod state;

pub use context::*;
pub use pipeline::*;
pub use precondition::*;
pub use stage::*;
pub use state::*;
