//! crates/cognipath_core/src/schema.rs
//!
//! The declared output schema for learning paths, and the checks that go with it.

use crate::domain::LearningPath;
use crate::normalize::StructuredOutput;
use serde_json::{json, Value};
use std::collections::HashSet;

impl StructuredOutput for LearningPath {
    const SCHEMA_NAME: &'static str = "learning_path";

    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "studentName": { "type": "string" },
                "title": { "type": "string" },
                "overallGoal": { "type": "string" },
                "estimatedCompletionWeeks": { "type": "integer" },
                "modules": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "duration": { "type": "string" },
                            "difficulty": { "type": "string" },
                            "topics": { "type": "array", "items": { "type": "string" } },
                            "description": { "type": "string" }
                        },
                        "required": ["id", "title", "duration", "difficulty", "topics", "description"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["studentName", "title", "overallGoal", "estimatedCompletionWeeks", "modules"],
            "additionalProperties": false
        })
    }

    fn check(&mut self) -> Result<(), String> {
        let mut seen_ids = HashSet::new();
        for (index, module) in self.modules.iter_mut().enumerate() {
            if module.id.trim().is_empty() {
                return Err(format!("module at position {} has an empty id", index + 1));
            }
            if !seen_ids.insert(module.id.clone()) {
                return Err(format!("module id '{}' is used more than once", module.id));
            }

            // Topics behave like a set that keeps its first-seen order.
            let mut seen_topics = HashSet::new();
            module.topics.retain(|topic| seen_topics.insert(topic.clone()));
        }
        Ok(())
    }
}

/// Warnings about a path that is schema-valid but probably not what the learner wanted.
pub fn semantic_warnings(path: &LearningPath) -> Vec<String> {
    let mut warnings = Vec::new();
    if path.modules.is_empty() {
        warnings.push("learning path contains no modules".to_string());
    }
    warnings
}
