//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged with the web client.
//! Field names follow the client's camelCase interface.

use cognipath_core::{
    ChatContext, ConversationTurn, LearnerProfile, LearningPath, LessonRequest, Module, Role,
    UnknownRole,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Requests
//=========================================================================================

/// Learner profile for a path generated without uploaded files.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PathRequest {
    pub name: Option<String>,
    pub goal: Option<String>,
    pub level: Option<String>,
}

impl From<PathRequest> for LearnerProfile {
    fn from(request: PathRequest) -> Self {
        LearnerProfile {
            name: request.name,
            goal: request.goal,
            level: request.level,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonPayload {
    pub topic: Option<String>,
    pub description: Option<String>,
    pub user_goal: Option<String>,
}

impl From<LessonPayload> for LessonRequest {
    fn from(payload: LessonPayload) -> Self {
        LessonRequest {
            topic: payload.topic,
            description: payload.description,
            user_goal: payload.user_goal,
            feedback: Vec::new(),
        }
    }
}

/// A lesson rewrite, with the reasons the previous version was rejected.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegeneratePayload {
    pub topic: Option<String>,
    pub description: Option<String>,
    pub user_goal: Option<String>,
    #[serde(default)]
    pub feedback: Vec<String>,
    /// Only logged; the service keeps no path records.
    pub path_id: Option<String>,
    pub user_id: Option<String>,
}

impl RegeneratePayload {
    pub fn into_lesson_request(self) -> LessonRequest {
        LessonRequest {
            topic: self.topic,
            description: self.description,
            user_goal: self.user_goal,
            feedback: self.feedback,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatTurnPayload {
    /// `user` or `model` (`assistant` is accepted for `model`).
    pub role: String,
    pub text: String,
}

impl TryFrom<ChatTurnPayload> for ConversationTurn {
    type Error = UnknownRole;

    fn try_from(turn: ChatTurnPayload) -> Result<Self, Self::Error> {
        Ok(ConversationTurn {
            role: turn.role.parse::<Role>()?,
            text: turn.text,
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatContextPayload {
    pub module_content: Option<String>,
    pub path_syllabus: Option<String>,
}

impl From<ChatContextPayload> for ChatContext {
    fn from(payload: ChatContextPayload) -> Self {
        ChatContext {
            module_content: payload.module_content,
            path_syllabus: payload.path_syllabus,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatPayload {
    #[serde(default)]
    pub history: Vec<ChatTurnPayload>,
    #[serde(default)]
    pub message: String,
    pub context: Option<ChatContextPayload>,
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleResponse {
    pub id: String,
    pub title: String,
    pub duration: String,
    pub difficulty: String,
    pub topics: Vec<String>,
    pub description: String,
}

impl From<Module> for ModuleResponse {
    fn from(module: Module) -> Self {
        ModuleResponse {
            id: module.id,
            title: module.title,
            duration: module.duration,
            difficulty: module.difficulty,
            topics: module.topics,
            description: module.description,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathResponse {
    pub student_name: String,
    pub title: String,
    pub overall_goal: String,
    pub estimated_completion_weeks: u32,
    pub modules: Vec<ModuleResponse>,
    /// Present only when something about the request or the result needs attention.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl LearningPathResponse {
    pub fn new(path: LearningPath, warnings: Vec<String>) -> Self {
        LearningPathResponse {
            student_name: path.student_name,
            title: path.title,
            overall_goal: path.overall_goal,
            estimated_completion_weeks: path.estimated_completion_weeks,
            modules: path.modules.into_iter().map(ModuleResponse::from).collect(),
            warnings,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LessonResponse {
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub role: String,
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
