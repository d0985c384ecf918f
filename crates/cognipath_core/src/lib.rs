pub mod context;
pub mod domain;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod ports;
pub mod prompts;
pub mod schema;
pub mod tutor;

pub use domain::{
    ChatContext, ChatReply, ConversationTurn, ExtractedDocument, LearnerProfile, LearningPath,
    LessonRequest, Module, PathOutcome, Role, UnknownRole, UploadedFile,
};
pub use error::{GenerationError, TutorError, TutorResult};
pub use extract::{extract_documents, ExtractError, ExtractionBatch};
pub use ports::{GenerationService, ModelCall, ModelOutput, PortError, PortResult};
pub use tutor::{ModelSettings, Tutor, DEFAULT_GENERATION_TIMEOUT};
