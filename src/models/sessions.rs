use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One logged-in device or browser. `valid` only ever goes true → false.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(rename = "user")]
    pub user_id: String,
    pub valid: bool,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for session lookups. Unset fields match anything.
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub valid: Option<bool>,
}

impl SessionQuery {
    pub fn by_id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    /// The valid sessions of one user.
    pub fn active_for_user(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            valid: Some(true),
            ..Self::default()
        }
    }

    pub fn matches(&self, session: &Session) -> bool {
        self.id.as_ref().is_none_or(|id| *id == session.id)
            && self.user_id.as_ref().is_none_or(|user| *user == session.user_id)
            && self.valid.is_none_or(|valid| valid == session.valid)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub valid: Option<bool>,
}

impl SessionUpdate {
    pub fn invalidate() -> Self {
        Self { valid: Some(false) }
    }
}

/// `POST /api/v1/session` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    pub email: String,
    pub password: String,
}

/// Tokens handed out at session login (and nulled at logout).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}
