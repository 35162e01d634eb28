//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap the JSON payload in prose or code fences, so the
//! object between the first `{` and the last `}` is what gets parsed.

use crate::error::{Error, Result};
use crate::models::{CategorizeResult, CategorySource, DEFAULT_CATEGORY};

use super::types::CategoryReply;

/// Confidence given to a reply that could not be parsed
pub const MALFORMED_CONFIDENCE: f64 = 0.3;
/// Confidence assumed when the reply omits one
pub const MISSING_CONFIDENCE: f64 = 0.5;

/// Extract the outermost JSON object from a model response
pub fn extract_json(response: &str) -> Result<&str> {
    let response = response.trim();
    match (response.find('{'), response.rfind('}')) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate(response, 200)
        ))),
    }
}

/// Parse a category reply, requiring a non-empty `category` string
pub fn parse_category_json(response: &str) -> Result<CategoryReply> {
    let json_str = extract_json(response)?;
    let reply: CategoryReply = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from AI: {} | Raw: {}",
            e,
            truncate(json_str, 200)
        ))
    })?;
    if reply.category.trim().is_empty() {
        return Err(Error::InvalidData("AI reply has an empty category".into()));
    }
    Ok(reply)
}

/// Turn a raw reply into a categorization; malformed replies become `Other` at 0.3
pub fn category_result_from_reply(response: &str) -> CategorizeResult {
    match parse_category_json(response) {
        Ok(reply) => {
            let confidence = reply
                .confidence
                .filter(|c| c.is_finite())
                .unwrap_or(MISSING_CONFIDENCE);
            let explanation = reply
                .explanation
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "Gemini classification".to_string());
            CategorizeResult::new(
                reply.category.trim(),
                confidence,
                CategorySource::Gemini,
                explanation,
            )
        }
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable category reply");
            CategorizeResult::new(
                DEFAULT_CATEGORY,
                MALFORMED_CONFIDENCE,
                CategorySource::Gemini,
                "Gemini response could not be parsed",
            )
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_reply_used_verbatim() {
        let r = category_result_from_reply(
            r#"{"category": "Entertainment", "confidence": 0.82, "explanation": "Streaming service"}"#,
        );
        assert_eq!(r.category, "Entertainment");
        assert_eq!(r.confidence, 0.82);
        assert_eq!(r.source, CategorySource::Gemini);
        assert_eq!(r.explanation, "Streaming service");
    }

    #[test]
    fn test_reply_wrapped_in_prose() {
        let r = category_result_from_reply(
            "Sure! ```json\n{\"category\": \"Health\", \"confidence\": 0.7}\n``` Hope that helps.",
        );
        assert_eq!(r.category, "Health");
        assert_eq!(r.explanation, "Gemini classification");
    }

    #[test]
    fn test_confidence_clamped_and_defaulted() {
        let r = category_result_from_reply(r#"{"category": "Travel", "confidence": 3.5}"#);
        assert_eq!(r.confidence, 1.0);

        let r = category_result_from_reply(r#"{"category": "Travel"}"#);
        assert_eq!(r.confidence, 0.5);
    }

    #[test]
    fn test_malformed_reply() {
        for raw in [
            "I think it's groceries",
            "{\"category\": }",
            "{\"label\": \"Food\"}",
            "{\"category\": \"  \"}",
            "",
        ] {
            let r = category_result_from_reply(raw);
            assert_eq!(r.category, "Other", "raw: {raw}");
            assert_eq!(r.confidence, 0.3);
            assert_eq!(r.source, CategorySource::Gemini);
        }
    }
}
