//! crates/cognipath_core/src/tutor.rs
//!
//! The three tutoring entry points: learning paths, lessons and contextual chat.
//! Each one assembles its call, makes a single bounded remote attempt, and
//! normalizes the result. Nothing is kept between calls.

use crate::context::{assemble_chat_call, assemble_lesson_call, assemble_path_call};
use crate::domain::{
    ChatContext, ChatReply, ConversationTurn, ExtractedDocument, LearnerProfile, LearningPath,
    LessonRequest, PathOutcome, Role,
};
use crate::error::{GenerationError, TutorResult};
use crate::normalize::{normalize_structured, normalize_text};
use crate::ports::{GenerationService, ModelCall, ModelOutput};
use crate::schema::semantic_warnings;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default upper bound for one remote generation.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Model identifiers per workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    /// Used for learning paths and lessons.
    pub reasoning_model: String,
    pub chat_model: String,
}

/// Entry point for all tutoring operations. Cheap to clone and safe to share.
#[derive(Clone)]
pub struct Tutor {
    generator: Arc<dyn GenerationService>,
    models: ModelSettings,
    timeout: Duration,
}

impl Tutor {
    pub fn new(
        generator: Arc<dyn GenerationService>,
        models: ModelSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            models,
            timeout,
        }
    }

    /// Generates a learning path tailored to `profile`, grounded in `documents` when given.
    pub async fn generate_path(
        &self,
        profile: &LearnerProfile,
        documents: &[ExtractedDocument],
    ) -> TutorResult<PathOutcome> {
        info!(documents = documents.len(), "Generating learning path");
        let call = assemble_path_call(&self.models.reasoning_model, profile, documents);

        let output = self.call_model(call).await?;
        let (path, _) = normalize_structured::<LearningPath>(output)?;

        let warnings = semantic_warnings(&path);
        for warning in &warnings {
            warn!("Generated path flagged: {}", warning);
        }
        Ok(PathOutcome { path, warnings })
    }

    /// Writes the markdown body of a lesson. Non-empty feedback makes this a regeneration.
    pub async fn generate_lesson(&self, request: &LessonRequest) -> TutorResult<String> {
        let call = assemble_lesson_call(&self.models.reasoning_model, request)?;
        info!(
            regeneration = !request.feedback.is_empty(),
            "Generating lesson content"
        );

        let output = self.call_model(call).await?;
        Ok(normalize_text(output))
    }

    /// Answers `message` in the light of the conversation so far and the lesson context.
    pub async fn chat(
        &self,
        history: &[ConversationTurn],
        message: &str,
        context: &ChatContext,
    ) -> TutorResult<ChatReply> {
        let call = assemble_chat_call(&self.models.chat_model, history, message, context)?;
        info!(history = history.len(), "Answering chat message");

        let output = self.call_model(call).await?;
        Ok(ChatReply {
            role: Role::Model,
            text: normalize_text(output),
        })
    }

    /// One attempt, bounded by the configured timeout. No retries.
    async fn call_model(&self, call: ModelCall) -> Result<ModelOutput, GenerationError> {
        match tokio::time::timeout(self.timeout, self.generator.generate(call)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(GenerationError::Timeout(self.timeout)),
        }
    }
}
