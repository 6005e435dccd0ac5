//! OpenAI-compatible chat client for the optional narrative insights.
//! Sync HTTP via ureq — the one call per run does not justify an async
//! runtime.

use crate::error::AiError;
use crate::types::{AiInsights, ResultBundle};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const API_URL:          &str = "https://api.openai.com/v1/chat/completions";
const API_KEY_VAR:      &str = "OPENAI_API_KEY";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS:       u32  = 2000;
const TEMPERATURE:      f32  = 0.7;

const SYSTEM_PROMPT: &str = "You are a senior software engineering analyst specializing in \
     project estimation, development metrics, and code assessment. Provide professional, \
     objective, actionable insights grounded in the data you are given.";

pub struct AiClient {
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(120)))
        .build()
        .new_agent()
}

impl AiClient {
    /// Reads the API key from the environment. `model` overrides the
    /// default when the config names one.
    pub fn from_env(model: Option<String>) -> Result<Self, AiError> {
        let api_key =
            env::var(API_KEY_VAR).map_err(|_| AiError::MissingApiKey(API_KEY_VAR.to_string()))?;
        Ok(AiClient {
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
            agent: make_agent(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One chat-completions round trip: metrics in, structured insights out.
    pub fn generate(&self, bundle: &ResultBundle) -> Result<AiInsights, AiError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message { role: "system", content: SYSTEM_PROMPT.to_string() },
                Message { role: "user", content: build_prompt(bundle) },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            response_format: ResponseFormat { format_type: "json_object" },
        };

        let response = self
            .agent
            .post(API_URL)
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body)
            .map_err(|e| AiError::Request {
                url: API_URL.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let body = response.into_body().read_to_string().unwrap_or_default();
            return Err(AiError::Status { status, body });
        }

        let reply: ChatResponse = response
            .into_body()
            .read_json()
            .map_err(|e| AiError::MalformedReply(e.to_string()))?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiError::MalformedReply("reply carried no choices".to_string()))?;

        parse_reply(&content, &self.model)
    }
}

// ─── Prompt ───────────────────────────────────────────────────────────────────

/// Embeds each metric section that exists as a labeled JSON block. The
/// security section is reduced to its counters so a 500-finding scan does
/// not blow the token budget.
fn build_prompt(bundle: &ResultBundle) -> String {
    let mut prompt = format!(
        "Analyze the software project metrics below and provide professional, \
         actionable insights.\n\nPROJECT: {}\n\nCOST MODEL METRICS:\n{}\n",
        bundle.project_name,
        to_pretty_json(&bundle.cocomo),
    );

    if let Some(git) = &bundle.git {
        prompt.push_str(&format!("\nGIT HISTORY METRICS:\n{}\n", to_pretty_json(git)));
    }
    if let Some(integrated) = &bundle.integrated {
        prompt.push_str(&format!(
            "\nINTEGRATED INDICATORS:\n{}\n",
            to_pretty_json(integrated)
        ));
    }
    if let Some(security) = &bundle.security {
        let summary = serde_json::json!({
            "total_findings": security.total_findings,
            "critical_count": security.critical_count,
            "high_count": security.high_count,
            "medium_count": security.medium_count,
            "low_count": security.low_count,
            "security_score": crate::security::security_score(security),
        });
        prompt.push_str(&format!(
            "\nSECURITY SCAN SUMMARY:\n{}\n",
            to_pretty_json(&summary)
        ));
    }

    prompt.push_str(
        "\nReply with a single JSON object and nothing else, using exactly these keys:\n\
         {\n\
         \x20 \"assessment\": \"3-4 sentence overall assessment of the project\",\n\
         \x20 \"strengths\": [\"3-5 strengths visible in the metrics\"],\n\
         \x20 \"concerns\": [\"3-5 areas that need attention\"],\n\
         \x20 \"recommendations\": [\"3-5 concrete, prioritized actions\"]\n\
         }\n\
         Base every statement on the numbers provided.",
    );

    prompt
}

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

// ─── Reply Parsing ────────────────────────────────────────────────────────────

fn parse_reply(content: &str, model: &str) -> Result<AiInsights, AiError> {
    let reply: InsightsReply = serde_json::from_str(strip_code_fences(content))
        .map_err(|e| AiError::MalformedReply(e.to_string()))?;

    Ok(AiInsights {
        model: model.to_string(),
        assessment: reply.assessment,
        strengths: reply.strengths,
        concerns: reply.concerns,
        recommendations: reply.recommendations,
    })
}

/// Models sometimes wrap the object in a markdown fence even when told not
/// to; tolerate ``` and ```json wrappers.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ─── Wire Types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

/// The shape the prompt demands back. Assessment is mandatory; the lists
/// default to empty so a terse reply still produces usable insights.
#[derive(Deserialize)]
struct InsightsReply {
    assessment: String,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    concerns: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComplexityTier, CostEstimate};

    const REPLY: &str = r#"{
        "assessment": "A compact, healthy project.",
        "strengths": ["steady commit cadence", "low churn"],
        "concerns": ["single maintainer"],
        "recommendations": ["add a second reviewer"]
    }"#;

    fn make_bundle(with_git: bool) -> ResultBundle {
        ResultBundle {
            project_name: "demo".to_string(),
            project_path: "/tmp/demo".to_string(),
            analysis_type: "integrated".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            cocomo: CostEstimate {
                kloc: 10.0,
                effort_person_months: 26.9,
                duration_months: 8.7,
                headcount: 3.1,
                maintenance_headcount: 0.56,
                expansion_headcount: 0.93,
                productivity: 371.0,
                cost: 403_500.0,
                complexity: ComplexityTier::Low,
            },
            git: if with_git {
                serde_json::from_str(
                    r#"{
                        "total_commits": 10, "total_authors": 1,
                        "authors": {"ana": 10},
                        "total_insertions": 100, "total_deletions": 10,
                        "total_files_changed": 12,
                        "avg_changes_per_commit": 11.0, "avg_files_per_commit": 1.2,
                        "commits_per_day": 0.1,
                        "first_commit_date": "2024-01-01T00:00:00+00:00",
                        "last_commit_date": "2024-04-10T00:00:00+00:00",
                        "repository_age_days": 100
                    }"#,
                )
                .ok()
            } else {
                None
            },
            integrated: None,
            security: None,
            ai_insights: None,
        }
    }

    #[test]
    fn test_parse_plain_json_reply() {
        let insights = parse_reply(REPLY, "gpt-4o-mini").expect("reply should parse");

        assert_eq!(insights.model, "gpt-4o-mini");
        assert_eq!(insights.assessment, "A compact, healthy project.");
        assert_eq!(insights.strengths.len(), 2);
        assert_eq!(insights.concerns, vec!["single maintainer"]);
    }

    #[test]
    fn test_parse_fenced_reply() {
        let fenced = format!("```json\n{REPLY}\n```");
        let insights = parse_reply(&fenced, "gpt-4o-mini").expect("fenced reply should parse");
        assert_eq!(insights.recommendations, vec!["add a second reviewer"]);

        let bare_fence = format!("```\n{REPLY}\n```");
        assert!(parse_reply(&bare_fence, "gpt-4o-mini").is_ok());
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let insights = parse_reply(r#"{"assessment": "fine"}"#, "m").expect("should parse");
        assert!(insights.strengths.is_empty());
        assert!(insights.recommendations.is_empty());
    }

    #[test]
    fn test_missing_assessment_is_an_error() {
        let result = parse_reply(r#"{"strengths": ["x"]}"#, "m");
        assert!(matches!(result, Err(AiError::MalformedReply(_))));
    }

    #[test]
    fn test_non_json_reply_is_an_error() {
        let result = parse_reply("The project looks great!", "m");
        assert!(matches!(result, Err(AiError::MalformedReply(_))));
    }

    #[test]
    fn test_prompt_sections_follow_the_bundle() {
        let without_git = build_prompt(&make_bundle(false));
        assert!(without_git.contains("COST MODEL METRICS"));
        assert!(!without_git.contains("GIT HISTORY METRICS"));
        assert!(without_git.contains("\"assessment\""));

        let with_git = build_prompt(&make_bundle(true));
        assert!(with_git.contains("GIT HISTORY METRICS"));
        assert!(with_git.contains("total_commits"));
    }
}
