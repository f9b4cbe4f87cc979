use serde_json::Value;
use sqlx::PgPool;

use crate::models::resume::ResumeEntryRow;
use crate::resume::models::Section;

/// Every resume row of the user, oldest first within each section.
pub async fn list_all_entries(pool: &PgPool, user_id: i64) -> Result<Vec<ResumeEntryRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeEntryRow>(
        "SELECT * FROM resume_entries WHERE user_id = $1 ORDER BY section, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_entries(
    pool: &PgPool,
    user_id: i64,
    section: Section,
) -> Result<Vec<ResumeEntryRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeEntryRow>(
        "SELECT * FROM resume_entries WHERE user_id = $1 AND section = $2 ORDER BY id",
    )
    .bind(user_id)
    .bind(section.as_str())
    .fetch_all(pool)
    .await
}

/// Inserts the singleton row or merges `data` into the existing one.
/// Keys absent from `data` keep their stored value.
///
/// The merged row is not re-validated: singleton sections carry only
/// per-field rules (see `validate_personal_info` and
/// `validate_contact_info`), so a merge of validated payloads stays valid.
pub async fn upsert_singleton(
    pool: &PgPool,
    user_id: i64,
    section: Section,
    data: &Value,
) -> Result<ResumeEntryRow, sqlx::Error> {
    debug_assert!(section.is_singleton());
    sqlx::query_as::<_, ResumeEntryRow>(
        r#"
        INSERT INTO resume_entries (user_id, section, data)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, section) WHERE section IN ('personal_info', 'contact_info')
        DO UPDATE SET data = resume_entries.data || EXCLUDED.data, updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(section.as_str())
    .bind(data)
    .fetch_one(pool)
    .await
}

pub async fn create_entry(
    pool: &PgPool,
    user_id: i64,
    section: Section,
    data: &Value,
) -> Result<ResumeEntryRow, sqlx::Error> {
    sqlx::query_as::<_, ResumeEntryRow>(
        r#"
        INSERT INTO resume_entries (user_id, section, data)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(section.as_str())
    .bind(data)
    .fetch_one(pool)
    .await
}

/// Replaces the payload of one list entry owned by the user.
pub async fn update_entry(
    pool: &PgPool,
    user_id: i64,
    section: Section,
    entry_id: i64,
    data: &Value,
) -> Result<Option<ResumeEntryRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeEntryRow>(
        r#"
        UPDATE resume_entries SET data = $4, updated_at = now()
        WHERE id = $1 AND user_id = $2 AND section = $3
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(user_id)
    .bind(section.as_str())
    .bind(data)
    .fetch_optional(pool)
    .await
}

pub async fn delete_entry(
    pool: &PgPool,
    user_id: i64,
    section: Section,
    entry_id: i64,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM resume_entries WHERE id = $1 AND user_id = $2 AND section = $3")
            .bind(entry_id)
            .bind(user_id)
            .bind(section.as_str())
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}
