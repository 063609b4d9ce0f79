use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `/register` and `/login`, sent either as JSON or as a form.
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Returns the normalized username and the password, or `None` when
    /// either one is missing or blank.
    pub fn normalized(&self) -> Option<(String, &str)> {
        let username = normalize_username(self.username.as_deref()?);
        let password = self.password.as_deref()?;
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some((username, password))
    }
}

pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}
