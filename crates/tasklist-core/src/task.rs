use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::datetime::due_date_serde;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(TaskId)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Ok(Priority::Low),
            "medium" | "m" => Ok(Priority::Medium),
            "high" | "h" => Ok(Priority::High),
            other => Err(anyhow::anyhow!("unknown priority: {other}")),
        }
    }
}

/// A single to-do record, persisted as one element of the stored JSON array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, with = "due_date_serde")]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub done: bool,
}

impl Task {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date.map(|due| due < today).unwrap_or(false)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is required")]
    MissingTitle,

    #[error("at least one tag is required")]
    MissingTags,

    #[error("invalid due date {0:?}, expected YYYY-MM-DD")]
    InvalidDueDate(String),

    #[error("a task titled {title:?} with the same due date already exists")]
    Duplicate {
        title: String,
        due_date: Option<NaiveDate>,
    },
}

/// Raw creation-form input, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub tags_input: String,
    pub due_date_input: String,
    pub priority: Priority,
}

impl TaskDraft {
    /// Checks the draft against the current collection and builds the task
    /// that would be appended under `id`.
    pub fn validate(&self, existing: &[Task], id: TaskId) -> Result<Task, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }

        let tags = parse_tags(&self.tags_input);
        if tags.is_empty() {
            return Err(ValidationError::MissingTags);
        }

        let due_input = self.due_date_input.trim();
        let due_date = if due_input.is_empty() {
            None
        } else {
            Some(
                crate::datetime::parse_due_date(due_input)
                    .ok_or_else(|| ValidationError::InvalidDueDate(due_input.to_string()))?,
            )
        };

        if existing
            .iter()
            .any(|task| task.title == title && task.due_date == due_date)
        {
            return Err(ValidationError::Duplicate {
                title: title.to_string(),
                due_date,
            });
        }

        Ok(Task {
            id,
            title: title.to_string(),
            description: self.description.trim().to_string(),
            tags,
            due_date,
            priority: self.priority,
            done: false,
        })
    }
}

/// Splits comma-separated tag input, trimming each segment and dropping
/// empty or repeated ones.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in input.split(',').map(str::trim) {
        if tag.is_empty() || out.iter().any(|seen| seen == tag) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn draft(title: &str, tags: &str, due: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            tags_input: tags.to_string(),
            due_date_input: due.to_string(),
            ..TaskDraft::default()
        }
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated() {
        assert_eq!(
            parse_tags(" work, home ,,work,  "),
            vec!["work".to_string(), "home".to_string()]
        );
        assert!(parse_tags(" , ,").is_empty());
    }

    #[test]
    fn rejects_missing_title_and_tags() {
        assert_eq!(
            draft("   ", "work", "").validate(&[], TaskId(1)),
            Err(ValidationError::MissingTitle)
        );
        assert_eq!(
            draft("Write report", " , ", "").validate(&[], TaskId(1)),
            Err(ValidationError::MissingTags)
        );
    }

    #[test]
    fn rejects_same_title_and_due_date() {
        let first = draft("Pay rent", "home", "2024-06-01")
            .validate(&[], TaskId(1))
            .expect("first draft is valid");
        let existing = vec![first];

        let dup = draft("Pay rent", "bills", "2024-06-01").validate(&existing, TaskId(2));
        assert!(matches!(dup, Err(ValidationError::Duplicate { .. })));

        let other_day = draft("Pay rent", "home", "2024-07-01").validate(&existing, TaskId(2));
        assert!(other_day.is_ok());
    }

    #[test]
    fn undated_duplicates_are_rejected() {
        let first = draft("Call mom", "family", "")
            .validate(&[], TaskId(1))
            .expect("valid");
        let dup = draft("Call mom", "family", "").validate(&[first], TaskId(2));
        assert!(matches!(
            dup,
            Err(ValidationError::Duplicate { due_date: None, .. })
        ));
    }

    #[test]
    fn bad_due_date_is_rejected() {
        assert_eq!(
            draft("x", "y", "tomorrow").validate(&[], TaskId(1)),
            Err(ValidationError::InvalidDueDate("tomorrow".to_string()))
        );
    }

    #[test]
    fn serializes_with_browser_field_names() {
        let task = Task {
            id: TaskId(1718400000000),
            title: "Ship".to_string(),
            description: String::new(),
            tags: vec!["work".to_string()],
            due_date: NaiveDate::from_ymd_opt(2024, 6, 15),
            priority: Priority::High,
            done: false,
        };
        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(json["id"], 1718400000000u64);
        assert_eq!(json["dueDate"], "2024-06-15");
        assert_eq!(json["priority"], "high");
        assert_eq!(json["done"], false);
    }

    #[test]
    fn empty_due_date_reads_as_absent() {
        let raw = r#"{"id":5,"title":"t","description":"","tags":["a"],"dueDate":"","priority":"low","done":true}"#;
        let task: Task = serde_json::from_str(raw).expect("parse");
        assert_eq!(task.due_date, None);
        assert!(task.done);
        assert_eq!(
            serde_json::to_value(&task).expect("serialize")["dueDate"],
            ""
        );
    }
}
