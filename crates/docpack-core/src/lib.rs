//! Core domain models for docpack
//!
//! This crate contains:
//! - The language taxonomy shared by estimation and chunking
//! - Batch group models handed in by the batch-grouping collaborator
//! - Project metadata used to enrich task output
//! - The error taxonomy shared across the workspace

pub mod batch;
pub mod error;
pub mod language;
pub mod project;

pub use batch::{BatchFile, BatchGroup, BatchKind};
pub use error::{CoreError, Result};
pub use language::Language;
pub use project::ProjectContext;
