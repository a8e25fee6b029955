use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::color::category_hex;

static ESTIMATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(hours|hour|hrs|hr|h|minutes|minute|mins|min|m)([a-z]*)").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// A task as returned by the model, before it has an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub priority: Priority,
    pub estimated_time: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub priority: Priority,
    #[serde(rename = "estimated_time")]
    pub estimated_time: String,
    pub deadline: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Task {
    pub fn new(title: impl Into<String>, category: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            category: category.into(),
            priority,
            estimated_time: String::new(),
            deadline: None,
            completed: false,
            color: None,
            tags: Vec::new(),
        }
    }

    /// Give an extracted task a fresh id. New tasks start incomplete and uncoloured.
    pub fn from_extracted(extracted: ExtractedTask) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: extracted.title,
            description: extracted.description,
            category: extracted.category,
            priority: extracted.priority,
            estimated_time: extracted.estimated_time,
            deadline: extracted.deadline,
            completed: false,
            color: None,
            tags: extracted.tags.unwrap_or_default(),
        }
    }

    /// Explicit colour tag, falling back to the category palette.
    pub fn color_hex(&self) -> &str {
        match &self.color {
            Some(color) => color,
            None => category_hex(&self.category),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Parse estimates like "30min", "1h", "1h 30m" or "1.5 hours".
    pub fn estimated_minutes(&self) -> Option<u32> {
        parse_estimate(&self.estimated_time)
    }
}

pub fn parse_estimate(estimate: &str) -> Option<u32> {
    let mut total = 0.0;
    let mut matched = false;

    for caps in ESTIMATE_RE.captures_iter(estimate) {
        // "1 month", "2 meetings"
        if !caps[3].is_empty() {
            continue;
        }
        let Ok(amount) = caps[1].parse::<f64>() else {
            continue;
        };
        matched = true;
        if caps[2].to_ascii_lowercase().starts_with('h') {
            total += amount * 60.0;
        } else {
            total += amount;
        }
    }

    matched.then(|| total.round() as u32)
}

/// Field-level edits to a task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub estimated_time: Option<String>,
    pub deadline: Option<Option<String>>,
    pub completed: Option<bool>,
    pub color: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.estimated_time.is_none()
            && self.deadline.is_none()
            && self.completed.is_none()
            && self.color.is_none()
            && self.tags.is_none()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(category) = &self.category {
            task.category = category.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(estimate) = &self.estimated_time {
            task.estimated_time = estimate.clone();
        }
        if let Some(deadline) = &self.deadline {
            task.deadline = deadline.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(color) = &self.color {
            task.color = color.clone();
        }
        if let Some(tags) = &self.tags {
            task.tags = tags.clone();
        }
    }
}
