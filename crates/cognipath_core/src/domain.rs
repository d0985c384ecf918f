//! crates/cognipath_core/src/domain.rs
//!
//! Defines the request-scoped data structures for the tutoring core.
//! Nothing here outlives a single request; persistence belongs to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//=========================================================================================
// Conversation
//=========================================================================================

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role string is neither `user` nor `model`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown conversation role '{0}' (expected 'user' or 'model')")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            // Clients built against OpenAI-style APIs say "assistant".
            "model" | "assistant" => Ok(Role::Model),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// One message of a tutoring conversation. Order within a history is conversation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Hierarchical context injected into a chat: the lesson being read and the whole syllabus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatContext {
    pub module_content: Option<String>,
    pub path_syllabus: Option<String>,
}

/// The tutor's answer to a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub role: Role,
    pub text: String,
}

//=========================================================================================
// Path and Lesson Requests
//=========================================================================================

/// Learner details used to tailor a learning path. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnerProfile {
    pub name: Option<String>,
    pub goal: Option<String>,
    pub level: Option<String>,
}

/// Input for generating (or regenerating) the markdown body of one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonRequest {
    pub topic: Option<String>,
    pub description: Option<String>,
    pub user_goal: Option<String>,
    /// Critique of a previous version; non-empty only when regenerating.
    pub feedback: Vec<String>,
}

//=========================================================================================
// Uploaded Documents
//=========================================================================================

/// A raw file as received from the caller.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: bytes::Bytes,
}

/// Plain text pulled out of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub filename: String,
    /// At most `extract::MAX_DOCUMENT_CHARS` characters.
    pub text: String,
    pub truncated: bool,
}

impl ExtractedDocument {
    /// The text as it is placed in a prompt, with the truncation marker when the cap applied.
    pub fn display_text(&self) -> String {
        if self.truncated {
            format!("{}{}", self.text, crate::extract::TRUNCATION_MARKER)
        } else {
            self.text.clone()
        }
    }
}

//=========================================================================================
// Learning Path (structured output)
//=========================================================================================

/// A generated curriculum. Field names match the web client's camelCase interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub student_name: String,
    pub title: String,
    pub overall_goal: String,
    pub estimated_completion_weeks: u32,
    pub modules: Vec<Module>,
}

/// One unit of a learning path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub duration: String,
    pub difficulty: String,
    pub topics: Vec<String>,
    pub description: String,
}

/// A normalized learning path plus anything the caller should know about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathOutcome {
    pub path: LearningPath,
    pub warnings: Vec<String>,
}
