//! crates/cognipath_core/src/ports.rs
//!
//! Defines the service contract for the remote generation capability.
//! This trait is the boundary of the hexagonal architecture: the pipelines in this
//! crate only ever see `GenerationService`, never a concrete HTTP client.

use crate::domain::ConversationTurn;
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the remote service and its transport.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("The remote service rejected the request: {0}")]
    Api(String),
    #[error("Could not reach the remote service: {0}")]
    Transport(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Generation Call Payloads
//=========================================================================================

/// Everything the remote model needs for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCall {
    pub model: String,
    pub system_instruction: String,
    /// Prior turns, oldest first.
    pub history: Vec<ConversationTurn>,
    /// The triggering user turn.
    pub prompt: String,
    /// JSON schema the output must conform to, if structured output is wanted.
    pub response_schema: Option<serde_json::Value>,
    pub temperature: Option<f32>,
}

/// What came back from the remote model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// Already-parsed data, returned when the schema constraint was honored.
    Structured(serde_json::Value),
    Text(String),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Runs a single generation. Implementations must not retry on their own.
    async fn generate(&self, call: ModelCall) -> PortResult<ModelOutput>;
}
