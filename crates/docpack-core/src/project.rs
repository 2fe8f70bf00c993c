//! Project metadata supplied by the project-metadata collaborator
//!
//! Used only to enrich task output, never to alter scheduling logic.

use crate::Language;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project_name: String,
    pub primary_language: Language,
    #[serde(default)]
    pub frameworks: Vec<String>,
}

impl ProjectContext {
    pub fn new(project_name: impl Into<String>, primary_language: Language) -> Self {
        Self {
            project_name: project_name.into(),
            primary_language,
            frameworks: Vec::new(),
        }
    }
}

impl Default for ProjectContext {
    fn default() -> Self {
        Self {
            project_name: "unknown".to_string(),
            primary_language: Language::Generic,
            frameworks: Vec::new(),
        }
    }
}
