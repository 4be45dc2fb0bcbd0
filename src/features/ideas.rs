// AI-assisted business idea generation and validation
// The model is an opaque collaborator; we only shape the request and
// parse the structured response

use serde::{Deserialize, Serialize};

use crate::api::llm::completion_gemini;
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct IdeaRequest {
    pub topic: String,
    pub industry: Option<String>,
}

/// One generated idea with a validation verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessIdea {
    pub title: String,
    pub description: String,
    /// 0-100 model-estimated viability
    #[serde(rename = "viabilityScore")]
    pub viability_score: i32,
    pub validation: String,
}

/// Generate validated business ideas for a topic
pub async fn generate_ideas(
    client: &reqwest::Client,
    request: &IdeaRequest,
) -> Result<Vec<BusinessIdea>, AppError> {
    let industry = request.industry.as_deref().unwrap_or("any industry");
    let prompt = format!(
        "Generate 3 business ideas about \"{}\" in {}. \
         Respond with only a JSON array; each element must have the fields \
         \"title\", \"description\", \"viabilityScore\" (integer 0-100) and \
         \"validation\" (one short paragraph on market fit and risks).",
        request.topic, industry
    );

    let text = completion_gemini(client, &prompt).await?;
    let ideas: Vec<BusinessIdea> = serde_json::from_str(strip_code_fence(&text))
        .map_err(|e| AppError::Store(anyhow::anyhow!("Unparseable idea response: {}", e)))?;
    Ok(ideas)
}

/// The model sometimes wraps JSON in a markdown code fence
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("[1]"), "[1]");
    }

    #[test]
    fn test_idea_response_parses() {
        let text = r#"```json
        [{"title": "T", "description": "D", "viabilityScore": 72, "validation": "V"}]
        ```"#;
        let ideas: Vec<BusinessIdea> = serde_json::from_str(strip_code_fence(text)).unwrap();
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].viability_score, 72);
    }
}
