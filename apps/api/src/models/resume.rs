use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeEntryRow {
    pub id: i64,
    pub user_id: i64,
    pub section: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SavedResumeRow {
    pub id: i64,
    pub user_id: i64,
    pub template_id: Option<i64>,
    pub file_ref: String,
    pub file_name: String,
    pub content_type: String,
    pub file_size_bytes: i64,
    pub created_at: DateTime<Utc>,
}
