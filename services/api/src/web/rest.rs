//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Failures are rendered here and only here: the core reports typed errors and
//! each endpoint decides what its client expects to see.

use crate::web::protocol::{
    ChatPayload, ChatResponse, ErrorResponse, LearningPathResponse, LessonPayload, LessonResponse,
    PathRequest, RegeneratePayload,
};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::Json,
};
use cognipath_core::{
    extract_documents, ChatContext, ConversationTurn, LearnerProfile, LessonRequest, Role,
    TutorError, UploadedFile,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_path_handler,
        generate_lesson_handler,
        regenerate_module_handler,
        chat_handler,
        health_handler,
    ),
    components(
        schemas(
            PathRequest,
            LessonPayload,
            RegeneratePayload,
            ChatPayload,
            LearningPathResponse,
            LessonResponse,
            ChatResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "CogniPath API", description = "Learning path, lesson and tutor chat generation.")
    )
)]
pub struct ApiDoc;

/// The OpenAPI document for this service, as pretty-printed JSON.
pub fn openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}

//=========================================================================================
// Error Rendering
//=========================================================================================

/// The error half of every handler: a status plus `{ "error": ... }`.
pub type Rejection = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, message: impl Into<String>) -> Rejection {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn bad_json(rejection: JsonRejection) -> Rejection {
    reject(StatusCode::BAD_REQUEST, rejection.body_text())
}

//=========================================================================================
// Path Request Extraction (JSON or multipart)
//=========================================================================================

/// Name given to a `files` part sent without a filename.
pub const UNNAMED_UPLOAD: &str = "unnamed upload";

/// The learner profile and any uploaded files, from either request encoding.
pub struct PathInput {
    pub profile: LearnerProfile,
    pub files: Vec<UploadedFile>,
}

impl<S> FromRequest<S> for PathInput
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(request) = Json::<PathRequest>::from_request(req, state)
                .await
                .map_err(bad_json)?;
            return Ok(PathInput {
                profile: request.into(),
                files: Vec::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| reject(StatusCode::BAD_REQUEST, e.body_text()))?;

        let mut profile = LearnerProfile::default();
        let mut files = Vec::new();
        while let Some(field) = multipart.next_field().await.map_err(|e| {
            reject(
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart data: {}", e.body_text()),
            )
        })? {
            let field_name = field.name().unwrap_or_default().to_string();
            match field_name.as_str() {
                "files" => {
                    // No extension, so a nameless part is reported as skipped, not guessed at.
                    let filename = field.file_name().unwrap_or(UNNAMED_UPLOAD).to_string();
                    let bytes = field.bytes().await.map_err(|e| {
                        reject(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read file bytes: {}", e.body_text()),
                        )
                    })?;
                    files.push(UploadedFile { filename, bytes });
                }
                "name" | "goal" | "level" => {
                    let value = field.text().await.map_err(|e| {
                        reject(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read field '{}': {}", field_name, e.body_text()),
                        )
                    })?;
                    let slot = match field_name.as_str() {
                        "name" => &mut profile.name,
                        "goal" => &mut profile.goal,
                        _ => &mut profile.level,
                    };
                    *slot = Some(value);
                }
                other => warn!("Ignoring unexpected multipart field '{}'", other),
            }
        }

        Ok(PathInput { profile, files })
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Generate a learning path.
///
/// Accepts either a JSON learner profile or a multipart/form-data request with
/// `name`, `goal` and `level` text fields and any number of `files` parts
/// (PDF, DOCX, TXT, MD). Uploaded material is woven into the curriculum.
#[utoipa::path(
    post,
    path = "/api/generate-path",
    request_body(
        content = PathRequest,
        description = "Learner profile as JSON, or the same fields as multipart/form-data with repeated `files` parts."
    ),
    responses(
        (status = 200, description = "Learning path generated", body = LearningPathResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 502, description = "The model failed to produce a usable path", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn generate_path_handler(
    State(app_state): State<Arc<AppState>>,
    input: PathInput,
) -> Result<Json<LearningPathResponse>, Rejection> {
    let PathInput { profile, files } = input;
    info!(files = files.len(), "Received learning path request");

    let batch = tokio::task::spawn_blocking(move || extract_documents(&files))
        .await
        .map_err(|e| {
            error!("Document extraction task failed: {:?}", e);
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read uploaded files",
            )
        })?;

    let mut warnings: Vec<String> = batch
        .skipped
        .iter()
        .map(|name| format!("skipped unsupported file: {}", name))
        .collect();

    match app_state
        .tutor
        .generate_path(&profile, &batch.documents)
        .await
    {
        Ok(outcome) => {
            warnings.extend(outcome.warnings);
            Ok(Json(LearningPathResponse::new(outcome.path, warnings)))
        }
        Err(TutorError::Validation(message)) => Err(reject(StatusCode::BAD_REQUEST, message)),
        Err(TutorError::Generation(e)) => {
            error!("Failed to generate learning path: {}", e);
            Err(reject(StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

/// Generate the content of a lesson.
///
/// A generation failure still answers 200, with the failure written into the
/// lesson body so the client can display it in place.
#[utoipa::path(
    post,
    path = "/api/generate-lesson",
    request_body = LessonPayload,
    responses(
        (status = 200, description = "Lesson content in markdown", body = LessonResponse),
        (status = 400, description = "Missing topic", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn generate_lesson_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<LessonPayload>, JsonRejection>,
) -> Result<Json<LessonResponse>, Rejection> {
    let Json(payload) = payload.map_err(bad_json)?;
    render_lesson(&app_state, payload.into()).await
}

/// Regenerate a lesson, addressing the learner's feedback on the previous version.
#[utoipa::path(
    post,
    path = "/api/modules/{module_id}/regenerate",
    request_body = RegeneratePayload,
    params(
        ("module_id" = String, Path, description = "Identifier of the module being rewritten.")
    ),
    responses(
        (status = 200, description = "Rewritten lesson content in markdown", body = LessonResponse),
        (status = 400, description = "Missing topic", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn regenerate_module_handler(
    State(app_state): State<Arc<AppState>>,
    Path(module_id): Path<String>,
    payload: Result<Json<RegeneratePayload>, JsonRejection>,
) -> Result<Json<LessonResponse>, Rejection> {
    let Json(payload) = payload.map_err(bad_json)?;
    info!(
        module_id = %module_id,
        path_id = payload.path_id.as_deref().unwrap_or("-"),
        user_id = payload.user_id.as_deref().unwrap_or("-"),
        reasons = payload.feedback.len(),
        "Received lesson regeneration request"
    );
    render_lesson(&app_state, payload.into_lesson_request()).await
}

async fn render_lesson(
    app_state: &AppState,
    request: LessonRequest,
) -> Result<Json<LessonResponse>, Rejection> {
    match app_state.tutor.generate_lesson(&request).await {
        Ok(content) => Ok(Json(LessonResponse { content })),
        Err(TutorError::Validation(message)) => Err(reject(StatusCode::BAD_REQUEST, message)),
        Err(TutorError::Generation(e)) => {
            error!("Failed to generate lesson: {}", e);
            Ok(Json(LessonResponse {
                content: format!(
                    "# Error Generating Lesson\n\nSorry, we encountered an error: {}",
                    e
                ),
            }))
        }
    }
}

/// Ask the tutor a question about the current lesson.
///
/// A generation failure still answers 200, as a model turn describing the error.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatPayload,
    responses(
        (status = 200, description = "The tutor's reply", body = ChatResponse),
        (status = 400, description = "Missing message or unknown role", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<ChatPayload>, JsonRejection>,
) -> Result<Json<ChatResponse>, Rejection> {
    let Json(payload) = payload.map_err(bad_json)?;

    let history = payload
        .history
        .into_iter()
        .map(ConversationTurn::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;
    let context: ChatContext = payload.context.unwrap_or_default().into();

    match app_state
        .tutor
        .chat(&history, &payload.message, &context)
        .await
    {
        Ok(reply) => Ok(Json(ChatResponse {
            role: reply.role.to_string(),
            text: reply.text,
        })),
        Err(TutorError::Validation(message)) => Err(reject(StatusCode::BAD_REQUEST, message)),
        Err(TutorError::Generation(e)) => {
            error!("Failed to answer chat message: {}", e);
            Ok(Json(ChatResponse {
                role: Role::Model.to_string(),
                text: format!("Error: {}", e),
            }))
        }
    }
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The service is up", body = String))
)]
pub async fn health_handler() -> &'static str {
    "ok"
}
