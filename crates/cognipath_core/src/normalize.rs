//! crates/cognipath_core/src/normalize.rs
//!
//! Turns raw model output into a well-formed result.
//!
//! Structured output is resolved in one fixed order: an already-parsed payload,
//! then the body of a `json`-labelled fence, then the body of any fence, then the
//! raw text. The first text candidate that parses as JSON wins. Whatever wins must
//! then deserialize into the target type and pass its own checks; there is no
//! partial result.

use crate::error::GenerationError;
use crate::ports::ModelOutput;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// A type the model can be asked to produce as JSON.
pub trait StructuredOutput: DeserializeOwned {
    /// Name passed along with the schema constraint.
    const SCHEMA_NAME: &'static str;

    /// JSON schema sent to the remote call as an output constraint.
    fn json_schema() -> Value;

    /// Enforces invariants serde cannot express. May tidy the value in place.
    fn check(&mut self) -> Result<(), String> {
        Ok(())
    }
}

/// Which step of the resolution order produced the JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Structured,
    FencedJson,
    Fenced,
    Raw,
}

/// Normalizes structured model output into `T`.
pub fn normalize_structured<T: StructuredOutput>(
    output: ModelOutput,
) -> Result<(T, Resolution), GenerationError> {
    let (value, resolution) = match output {
        ModelOutput::Structured(value) => (value, Resolution::Structured),
        ModelOutput::Text(raw) => parse_json_text(&raw)?,
    };

    let mut parsed: T = serde_json::from_value(value)
        .map_err(|e| GenerationError::SchemaViolation(e.to_string()))?;
    parsed.check().map_err(GenerationError::SchemaViolation)?;

    debug!(schema = T::SCHEMA_NAME, ?resolution, "Normalized structured model output");
    Ok((parsed, resolution))
}

/// Free-text modes pass the model's text through untouched.
pub fn normalize_text(output: ModelOutput) -> String {
    match output {
        ModelOutput::Text(text) => text,
        // A free-text call should never come back structured, but if it does the
        // JSON text is still the most faithful rendering.
        ModelOutput::Structured(value) => match value {
            Value::String(text) => text,
            other => other.to_string(),
        },
    }
}

/// Parses the first JSON candidate in `raw`, in resolution order.
///
/// When no candidate parses, the error of the highest-priority candidate is returned.
pub fn parse_json_text(raw: &str) -> Result<(Value, Resolution), GenerationError> {
    let mut first_error = None;
    for (candidate, resolution) in json_candidates(raw) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return Ok((value, resolution)),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    // `json_candidates` always yields the raw text, so an error is recorded.
    match first_error {
        Some(e) => Err(GenerationError::MalformedJson(e)),
        None => Err(GenerationError::SchemaViolation(
            "model output was empty".to_string(),
        )),
    }
}

fn json_candidates(raw: &str) -> Vec<(&str, Resolution)> {
    let mut candidates = Vec::with_capacity(3);
    if let Some(body) = json_fence_body(raw) {
        candidates.push((body, Resolution::FencedJson));
    }
    if let Some(body) = any_fence_body(raw) {
        candidates.push((body, Resolution::Fenced));
    }
    candidates.push((raw.trim(), Resolution::Raw));
    candidates
}

/// Body after the first ```json marker (label matched case-insensitively), up to the next
/// fence or the end of the text.
fn json_fence_body(raw: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets identical to `raw`.
    let start = raw.to_ascii_lowercase().find(JSON_FENCE)? + JSON_FENCE.len();
    let rest = &raw[start..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// Body between the first pair of fences, minus the info-string line when there is one.
fn any_fence_body(raw: &str) -> Option<&str> {
    let start = raw.find(FENCE)? + FENCE.len();
    let rest = &raw[start..];
    let end = rest.find(FENCE).unwrap_or(rest.len());
    let body = &rest[..end];
    let body = match body.split_once('\n') {
        Some((info, tail)) if !starts_json_value(info) => tail,
        _ => body,
    };
    Some(body.trim())
}

fn starts_json_value(line: &str) -> bool {
    matches!(line.trim_start().chars().next(), Some('{') | Some('['))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LearningPath;
    use serde_json::json;

    fn sample_value() -> Value {
        json!({
            "studentName": "X",
            "title": "Intro to Rust",
            "overallGoal": "Write safe systems code",
            "estimatedCompletionWeeks": 6,
            "modules": [
                {
                    "id": "1",
                    "title": "Ownership",
                    "duration": "1 week",
                    "difficulty": "Beginner",
                    "topics": ["moves", "borrows"],
                    "description": "How values are owned."
                },
                {
                    "id": "2",
                    "title": "Traits",
                    "duration": "2 weeks",
                    "difficulty": "Intermediate",
                    "topics": ["generics", "dyn"],
                    "description": "Shared behavior."
                }
            ]
        })
    }

    #[test]
    fn structured_payload_is_used_directly() {
        let (path, resolution) =
            normalize_structured::<LearningPath>(ModelOutput::Structured(sample_value())).unwrap();
        assert_eq!(resolution, Resolution::Structured);
        assert_eq!(path.modules.len(), 2);
        assert_eq!(path.modules[1].title, "Traits");
    }

    #[test]
    fn json_fence_parses_identically_to_bare_json() {
        let body = sample_value().to_string();
        let fenced = format!("```json\n{body}\n```");

        let (from_fence, fence_step) =
            normalize_structured::<LearningPath>(ModelOutput::Text(fenced)).unwrap();
        let (from_raw, raw_step) =
            normalize_structured::<LearningPath>(ModelOutput::Text(body)).unwrap();

        assert_eq!(fence_step, Resolution::FencedJson);
        assert_eq!(raw_step, Resolution::Raw);
        assert_eq!(from_fence, from_raw);
    }

    #[test]
    fn unlabelled_fence_after_prose_is_recovered() {
        let raw = format!("Here you go:\n```\n{}\n```", sample_value());
        let (path, resolution) =
            normalize_structured::<LearningPath>(ModelOutput::Text(raw)).unwrap();
        assert_eq!(resolution, Resolution::Fenced);
        assert_eq!(path.student_name, "X");
    }

    #[test]
    fn uppercase_label_and_other_info_strings_are_handled() {
        let upper = format!("```JSON\n{}\n```", sample_value());
        let (_, resolution) = parse_json_text(&upper).unwrap();
        assert_eq!(resolution, Resolution::FencedJson);

        let json5 = format!("```json5\n{}\n```", sample_value());
        let (_, resolution) = parse_json_text(&json5).unwrap();
        assert_eq!(resolution, Resolution::Fenced);
    }

    #[test]
    fn unterminated_json_fence_runs_to_end_of_text() {
        let raw = format!("```json\n{}", sample_value());
        let (_, resolution) = parse_json_text(&raw).unwrap();
        assert_eq!(resolution, Resolution::FencedJson);
    }

    #[test]
    fn backticks_inside_bare_json_fall_through_to_raw() {
        let raw = json!({"note": "use ```rust``` blocks"}).to_string();
        let (value, resolution) = parse_json_text(&raw).unwrap();
        assert_eq!(resolution, Resolution::Raw);
        assert_eq!(value["note"], "use ```rust``` blocks");
    }

    #[test]
    fn unparseable_text_is_malformed_json() {
        let err = normalize_structured::<LearningPath>(ModelOutput::Text(
            "Sorry, I cannot help with that.".into(),
        ))
        .unwrap_err();
        assert!(matches!(err, GenerationError::MalformedJson(_)));
    }

    #[test]
    fn missing_required_field_is_a_schema_violation() {
        let mut value = sample_value();
        value.as_object_mut().unwrap().remove("overallGoal");
        let err =
            normalize_structured::<LearningPath>(ModelOutput::Structured(value)).unwrap_err();
        match err {
            GenerationError::SchemaViolation(msg) => assert!(msg.contains("overallGoal")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn text_output_passes_through_unmodified() {
        let text = "# Lesson\n\n```rust\nfn main() {}\n```\n";
        assert_eq!(normalize_text(ModelOutput::Text(text.into())), text);
        assert_eq!(
            normalize_text(ModelOutput::Structured(json!("plain"))),
            "plain"
        );
    }
}
