use sqlx::PgPool;

use crate::models::resume::SavedResumeRow;
use crate::store::Page;

pub struct NewSavedResume<'a> {
    pub user_id: i64,
    pub template_id: i64,
    pub file_ref: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub file_size_bytes: i64,
}

pub async fn record_saved_resume(
    pool: &PgPool,
    saved: NewSavedResume<'_>,
) -> Result<SavedResumeRow, sqlx::Error> {
    sqlx::query_as::<_, SavedResumeRow>(
        r#"
        INSERT INTO saved_resumes
            (user_id, template_id, file_ref, file_name, content_type, file_size_bytes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(saved.user_id)
    .bind(saved.template_id)
    .bind(saved.file_ref)
    .bind(saved.file_name)
    .bind(saved.content_type)
    .bind(saved.file_size_bytes)
    .fetch_one(pool)
    .await
}

/// One page of the user's saved resumes, newest first, plus the total count.
pub async fn list_saved_resumes(
    pool: &PgPool,
    user_id: i64,
    page: Page,
) -> Result<(Vec<SavedResumeRow>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM saved_resumes WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as::<_, SavedResumeRow>(
        r#"
        SELECT * FROM saved_resumes
        WHERE user_id = $1
        ORDER BY id DESC
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(page.skip)
    .bind(page.limit)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}
