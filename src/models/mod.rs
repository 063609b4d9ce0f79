pub mod task;
pub mod user;

use chrono::{DateTime, Utc};

pub use task::{
    parse_deadline, CompletionInput, FieldError, NewTask, Task, TaskInput, TaskList,
    ValidationErrors,
};
pub use user::{normalize_username, Credentials, User};

/// Server-side record of an authenticated browser session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
