use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task as it travels over the wire. The same shape is used for pending
/// and completed tasks; which collection it lives in is decided by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Deadline")]
    pub deadline: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Validated fields for inserting or replacing a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub name: String,
    pub deadline: DateTime<Utc>,
}

/// The two collections a task can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskList {
    Pending,
    Completed,
}

impl TaskList {
    pub fn collection_name(self) -> &'static str {
        match self {
            TaskList::Pending => "tasks",
            TaskList::Completed => "completed_tasks",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskList::Pending => "Task",
            TaskList::Completed => "Completed Task",
        }
    }
}

/// Request payload for `POST /tasks` and `PUT /tasks/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskInput {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Deadline")]
    pub deadline: Option<String>,
}

/// Request payload for `POST /tasks/completed`. When `_id` is present the
/// pending task with that id is moved; otherwise a completed record is
/// created from `Name` and `Deadline`.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionInput {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Deadline")]
    pub deadline: Option<String>,
}

impl CompletionInput {
    pub fn into_task_input(self) -> TaskInput {
        TaskInput {
            name: self.name,
            deadline: self.deadline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl TaskInput {
    /// Checks the payload before it reaches a store. Every problem is
    /// reported, not just the first one.
    pub fn validate(&self) -> Result<NewTask, ValidationErrors> {
        let mut errors = Vec::new();

        let name = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            _ => {
                errors.push(FieldError {
                    field: "Name",
                    message: "Name is required".to_string(),
                });
                None
            }
        };

        let deadline = match self.deadline.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => match parse_deadline(raw) {
                Some(deadline) => Some(deadline),
                None => {
                    errors.push(FieldError {
                        field: "Deadline",
                        message: format!("Deadline {:?} is not a valid date and time", raw),
                    });
                    None
                }
            },
            _ => {
                errors.push(FieldError {
                    field: "Deadline",
                    message: "Deadline is required".to_string(),
                });
                None
            }
        };

        match (name, deadline) {
            (Some(name), Some(deadline)) if errors.is_empty() => Ok(NewTask { name, deadline }),
            _ => Err(ValidationErrors(errors)),
        }
    }
}

/// Accepts RFC 3339 timestamps and the zone-less `datetime-local` values a
/// browser form submits; the latter are taken as UTC.
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
