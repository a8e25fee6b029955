pub mod gemini;
pub mod keyring;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::plan::{WEEK, WeeklyPlan, day_name};
use crate::core::task::ExtractedTask;

pub use gemini::GeminiClient;

/// Longest payload excerpt carried inside an error message.
pub const PREVIEW_LIMIT: usize = 1000;

const META_PROMPT: &str = "\
Act as an expert Task Organizer.
I'll give you unstructured text containing various tasks.
Analyze the unstructured text and extract clear tasks.
Make sure to break down complex tasks into smaller, manageable subtasks.
Organize the tasks into a structured format, categorizing them by priority (High, Medium, Low) and due dates if provided.
Create a weekly plan assigning tasks to each day of the week, with start and end dates in format yyyy-MM-dd.
Also use the current date as a reference for scheduling.
The final output should be in JSON format.
";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI request failed (model={model}, contentLength={content_length}): {source}")]
    Request {
        model: String,
        content_length: usize,
        #[source]
        source: reqwest::Error,
    },
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("no text field in AI response. responsePreview={preview}")]
    MissingText { preview: String },
    #[error("failed to parse AI response as JSON: {source}. responsePreview={preview}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
        preview: String,
    },
    #[error("AI response failed schema validation: {reason}. responseJsonPreview={preview}")]
    Validation { reason: String, preview: String },
    #[error("no API key found; set GOOGLE_API_KEY or run `clarity set-key <KEY>`")]
    MissingApiKey,
    #[error("keyring: {0}")]
    Keyring(String),
}

/// Tasks and weekly plan extracted from one brain dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub tasks: Vec<ExtractedTask>,
    #[serde(rename = "weeklyPlan")]
    pub weekly_plan: WeeklyPlan,
}

impl AiResponse {
    fn validate(&self) -> Result<(), String> {
        for (i, task) in self.tasks.iter().enumerate() {
            if task.title.is_empty() {
                return Err(format!("tasks[{}].title must not be empty", i));
            }
        }
        Ok(())
    }
}

// The stored plan tolerates missing days; a model answer must carry all seven.
fn check_week(value: &serde_json::Value) -> Result<(), String> {
    for day in WEEK {
        let key = day_name(day).to_lowercase();
        if value["weeklyPlan"].get(&key).is_none() {
            return Err(format!("weeklyPlan.{} is required", key));
        }
    }
    Ok(())
}

/// Cut `s` to `limit` characters, noting how much was dropped.
pub fn truncate(s: &str, limit: usize) -> String {
    let total = s.chars().count();
    if total <= limit {
        return s.to_string();
    }
    let head: String = s.chars().take(limit).collect();
    format!("{}…(truncated {} chars)", head, total - limit)
}

pub fn build_prompt(content: &str, today: NaiveDate) -> String {
    format!("{}current date: {}\n\n{}", META_PROMPT, today.format("%Y-%m-%d"), content)
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Turn the model's text output into a checked [`AiResponse`].
pub fn parse_response(text: &str) -> Result<AiResponse, AiError> {
    let json_str = strip_code_fences(text);

    let value: serde_json::Value =
        serde_json::from_str(json_str).map_err(|source| AiError::InvalidJson {
            source,
            preview: truncate(text, PREVIEW_LIMIT),
        })?;

    let response: AiResponse =
        serde_json::from_value(value.clone()).map_err(|e| AiError::Validation {
            reason: e.to_string(),
            preview: truncate(&value.to_string(), PREVIEW_LIMIT),
        })?;

    check_week(&value)
        .and_then(|()| response.validate())
        .map_err(|reason| AiError::Validation {
            reason,
            preview: truncate(&value.to_string(), PREVIEW_LIMIT),
        })?;

    Ok(response)
}

/// JSON schema sent alongside the prompt so the model answers in shape.
pub fn response_schema() -> serde_json::Value {
    let entry = serde_json::json!({
        "type": "object",
        "properties": {
            "task": { "type": "string", "description": "Task for the day." },
            "taskId": { "type": "string", "description": "Reference to the task ID." },
            "start": { "type": "string", "description": "Start date for the task (yyyy-MM-dd). If not specified, use the given current date." },
            "end": { "type": "string", "description": "Deadline for the task (yyyy-MM-dd)." },
            "completed": { "type": "boolean" },
            "notes": { "type": "string", "description": "Additional notes for the day." }
        },
        "required": ["task", "start", "end"]
    });

    let mut days = serde_json::Map::new();
    for day in WEEK {
        let name = day_name(day);
        days.insert(
            name.to_lowercase(),
            serde_json::json!({
                "type": "array",
                "items": entry.clone(),
                "description": format!("Tasks for {}.", name),
            }),
        );
    }
    let day_keys: Vec<String> = WEEK.iter().map(|d| day_name(*d).to_lowercase()).collect();

    serde_json::json!({
        "type": "object",
        "properties": {
            "tasks": {
                "type": "array",
                "description": "A list of organized tasks.",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1, "description": "The title of the task." },
                        "description": { "type": "string", "description": "Detailed description of the task." },
                        "category": {
                            "type": "string",
                            "description": format!(
                                "The category of the task, e.g. {}.",
                                crate::core::color::CATEGORIES.join(", ")
                            ),
                        },
                        "priority": { "type": "string", "enum": ["high", "medium", "low"] },
                        "estimated_time": { "type": "string", "description": "Estimated time to complete the task, e.g., '30min', '1h'." },
                        "deadline": { "type": ["string", "null"], "description": "Deadline for the task if recognizable, otherwise null." },
                        "tags": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["title", "category", "priority", "estimated_time", "deadline"]
                }
            },
            "weeklyPlan": {
                "type": "object",
                "description": "A weekly plan with tasks assigned to each day.",
                "properties": days,
                "required": day_keys,
            }
        },
        "required": ["tasks", "weeklyPlan"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::Priority;

    const SAMPLE: &str = r#"{
        "tasks": [
            {"title": "Book dentist", "category": "health", "priority": "high",
             "estimated_time": "15min", "deadline": "2026-10-20"},
            {"title": "Read chapter 3", "category": "study", "priority": "low",
             "estimated_time": "1h", "deadline": null, "tags": ["reading"]}
        ],
        "weeklyPlan": {
            "monday": [{"task": "Book dentist", "start": "2026-10-19", "end": "2026-10-20"}],
            "tuesday": [], "wednesday": [], "thursday": [],
            "friday": [{"task": "Read chapter 3", "start": "2026-10-23", "end": "2026-10-23"}],
            "saturday": [], "sunday": []
        }
    }"#;

    #[test]
    fn parses_valid_response() {
        let response = parse_response(SAMPLE).unwrap();
        assert_eq!(response.tasks.len(), 2);
        assert_eq!(response.tasks[0].priority, Priority::High);
        assert_eq!(response.tasks[1].deadline, None);
        assert_eq!(response.tasks[1].tags.as_deref(), Some(&["reading".to_string()][..]));
        assert_eq!(response.weekly_plan.monday[0].end, "2026-10-20");
        assert_eq!(response.weekly_plan.len(), 2);
    }

    #[test]
    fn strips_markdown_fences() {
        let fenced = format!("```json\n{}\n```", SAMPLE);
        assert!(parse_response(&fenced).is_ok());
    }

    const EMPTY_WEEK: &str = r#"{"monday": [], "tuesday": [], "wednesday": [], "thursday": [],
        "friday": [], "saturday": [], "sunday": []}"#;

    #[test]
    fn every_plan_day_is_required() {
        let no_days = r#"{"tasks": [], "weeklyPlan": {}}"#;
        match parse_response(no_days) {
            Err(AiError::Validation { reason, .. }) => assert_eq!(reason, "weeklyPlan.monday is required"),
            other => panic!("unexpected: {:?}", other),
        }

        let no_sunday = r#"{"tasks": [], "weeklyPlan": {"monday": [], "tuesday": [], "wednesday": [],
            "thursday": [], "friday": [], "saturday": []}}"#;
        match parse_response(no_sunday) {
            Err(AiError::Validation { reason, .. }) => assert_eq!(reason, "weeklyPlan.sunday is required"),
            other => panic!("unexpected: {:?}", other),
        }

        let full = format!(r#"{{"tasks": [], "weeklyPlan": {}}}"#, EMPTY_WEEK);
        assert!(parse_response(&full).unwrap().weekly_plan.is_empty());
    }

    #[test]
    fn snake_case_plan_key_is_rejected() {
        let text = format!(r#"{{"tasks": [], "weekly_plan": {}}}"#, EMPTY_WEEK);
        assert!(matches!(parse_response(&text), Err(AiError::Validation { .. })));
    }

    #[test]
    fn garbage_is_invalid_json() {
        let err = parse_response("Sure! Here are your tasks:").unwrap_err();
        assert!(matches!(err, AiError::InvalidJson { .. }));
    }

    #[test]
    fn wrong_shape_fails_validation() {
        let text = r#"{"tasks": [{"title": "x", "category": "work", "priority": "urgent",
            "estimated_time": "1h", "deadline": null}], "weeklyPlan": {}}"#;
        assert!(matches!(parse_response(text), Err(AiError::Validation { .. })));

        let missing_plan = r#"{"tasks": []}"#;
        assert!(matches!(parse_response(missing_plan), Err(AiError::Validation { .. })));
    }

    #[test]
    fn empty_titles_fail_validation() {
        let text = format!(
            r#"{{"tasks": [{{"title": "", "category": "work", "priority": "low",
            "estimated_time": "1h", "deadline": null}}], "weeklyPlan": {}}}"#,
            EMPTY_WEEK
        );
        match parse_response(&text) {
            Err(AiError::Validation { reason, .. }) => assert_eq!(reason, "tasks[0].title must not be empty"),
            other => panic!("unexpected: {:?}", other),
        }

        let blank = text.replace(r#""title": """#, r#""title": "  ""#);
        assert_eq!(parse_response(&blank).unwrap().tasks[0].title, "  ");
    }

    #[test]
    fn truncate_marks_dropped_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd…(truncated 6 chars)");
    }

    #[test]
    fn prompt_carries_date_and_content() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let prompt = build_prompt("buy milk, call mom", today);
        assert!(prompt.starts_with("Act as an expert Task Organizer."));
        assert!(prompt.contains("current date: 2026-10-17\n\nbuy milk, call mom"));
    }

    #[test]
    fn schema_lists_every_day() {
        let schema = response_schema();
        let days = &schema["properties"]["weeklyPlan"]["properties"];
        for day in ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"] {
            assert_eq!(days[day]["type"], "array");
        }
        assert_eq!(schema["properties"]["weeklyPlan"]["required"].as_array().unwrap().len(), 7);
    }
}
