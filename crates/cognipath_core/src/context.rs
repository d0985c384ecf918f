//! crates/cognipath_core/src/context.rs
//!
//! Builds the instruction and context payload for each generation mode.
//! Validation happens here, so a request with missing required input never
//! reaches the remote service.

use crate::domain::{
    ChatContext, ConversationTurn, ExtractedDocument, LearnerProfile, LearningPath, LessonRequest,
};
use crate::error::{TutorError, TutorResult};
use crate::normalize::StructuredOutput;
use crate::ports::ModelCall;
use crate::prompts::{
    HIERARCHICAL_CHAT_INSTRUCTIONS, LESSON_GENERATOR_INSTRUCTIONS, MODULE_CONTENT_HEADER,
    PATH_GENERATOR_INSTRUCTIONS, PATH_SYLLABUS_HEADER, UPLOADED_FILES_HEADER,
};

pub const DEFAULT_STUDENT_NAME: &str = "Student";
pub const DEFAULT_GOAL: &str = "General improvement";
pub const DEFAULT_LEVEL: &str = "Beginner";

/// How much of the current module is placed in a chat's system instruction.
pub const MAX_MODULE_CONTEXT_CHARS: usize = 20_000;

/// Sampling temperature for lesson writing.
pub const LESSON_TEMPERATURE: f32 = 0.7;

const NOT_PROVIDED: &str = "(not provided)";

//=========================================================================================
// Path Mode
//=========================================================================================

/// Builds the structured-output call for a learning path.
pub fn assemble_path_call(
    model: &str,
    profile: &LearnerProfile,
    documents: &[ExtractedDocument],
) -> ModelCall {
    let name = present(&profile.name).unwrap_or(DEFAULT_STUDENT_NAME);
    let goal = present(&profile.goal).unwrap_or(DEFAULT_GOAL);
    let level = present(&profile.level).unwrap_or(DEFAULT_LEVEL);

    let mut prompt = format!(
        "Create a learning path for:\nStudent Name: {name}\nGoal: {goal}\nCurrent Level: {level}\n"
    );

    if !documents.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(UPLOADED_FILES_HEADER);
        prompt.push('\n');
        for document in documents {
            prompt.push_str(&format!(
                "\n--- Start of {name} ---\n{text}\n--- End of {name} ---\n",
                name = document.filename,
                text = document.display_text(),
            ));
        }
    }

    prompt.push_str(&format!(
        "\nTailor this curriculum to help the student achieve their goal: {goal}.\n\
         Adjust difficulty and module topics to fit this specific mission.\n"
    ));
    if !documents.is_empty() {
        prompt.push_str(
            "Files were uploaded with this request: the modules and topics MUST incorporate \
             their content and refer to specific concepts found in them.\n",
        );
    }

    ModelCall {
        model: model.to_string(),
        system_instruction: PATH_GENERATOR_INSTRUCTIONS.to_string(),
        history: Vec::new(),
        prompt,
        response_schema: Some(LearningPath::json_schema()),
        temperature: None,
    }
}

//=========================================================================================
// Lesson Mode
//=========================================================================================

/// Builds the free-text call for a lesson. A missing topic is a caller error.
pub fn assemble_lesson_call(model: &str, request: &LessonRequest) -> TutorResult<ModelCall> {
    let topic = present(&request.topic)
        .ok_or_else(|| TutorError::validation("Topic is required"))?;
    let description = present(&request.description).unwrap_or(NOT_PROVIDED);
    let user_goal = present(&request.user_goal).unwrap_or(NOT_PROVIDED);

    let mut prompt = format!(
        "Topic: {topic}\nDescription: {description}\nUser Context/Goal: {user_goal}\n"
    );

    let feedback: Vec<&str> = request
        .feedback
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .collect();
    if !feedback.is_empty() {
        prompt.push_str(
            "\nThis is a regeneration. The student rejected the previous version of this lesson \
             for the reasons below. Write a new version that addresses every one of them:\n",
        );
        for item in feedback {
            prompt.push_str(&format!("- {item}\n"));
        }
    }

    prompt.push_str("\nWrite the full lesson content now.");

    Ok(ModelCall {
        model: model.to_string(),
        system_instruction: LESSON_GENERATOR_INSTRUCTIONS.to_string(),
        history: Vec::new(),
        prompt,
        response_schema: None,
        temperature: Some(LESSON_TEMPERATURE),
    })
}

//=========================================================================================
// Chat Mode
//=========================================================================================

/// Builds a chat call: hierarchical system instruction, prior turns, then the new message.
pub fn assemble_chat_call(
    model: &str,
    history: &[ConversationTurn],
    message: &str,
    context: &ChatContext,
) -> TutorResult<ModelCall> {
    if message.trim().is_empty() {
        return Err(TutorError::validation("Message is required"));
    }

    Ok(ModelCall {
        model: model.to_string(),
        system_instruction: chat_system_instruction(context),
        history: history.to_vec(),
        prompt: message.to_string(),
        response_schema: None,
        temperature: None,
    })
}

/// The base tutor instruction, then the current module, then the syllabus.
pub fn chat_system_instruction(context: &ChatContext) -> String {
    let mut instruction = HIERARCHICAL_CHAT_INSTRUCTIONS.to_string();

    if let Some(module_content) = non_blank(&context.module_content) {
        instruction.push_str("\n\n");
        instruction.push_str(MODULE_CONTENT_HEADER);
        instruction.push('\n');
        match module_content.char_indices().nth(MAX_MODULE_CONTEXT_CHARS) {
            Some((cut, _)) => {
                instruction.push_str(&module_content[..cut]);
                instruction.push_str("...");
            }
            None => instruction.push_str(module_content),
        }
    }

    if let Some(syllabus) = non_blank(&context.path_syllabus) {
        instruction.push_str("\n\n");
        instruction.push_str(PATH_SYLLABUS_HEADER);
        instruction.push('\n');
        instruction.push_str(syllabus);
    }

    instruction
}

/// Treats empty and whitespace-only strings as absent. Yields the trimmed value.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Like `present`, but yields the value untouched.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
