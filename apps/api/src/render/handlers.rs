use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::files::object_key;
use crate::ledger::purchase::ensure_template_access;
use crate::models::resume::SavedResumeRow;
use crate::models::user::User;
use crate::render::html::{HtmlRenderer, RenderContext, ResumeOwner, TemplateMeta};
use crate::render::load_template_html;
use crate::render::saved::{list_saved_resumes, record_saved_resume, NewSavedResume};
use crate::resume::assembly::load_resume;
use crate::state::AppState;
use crate::store::Page;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const RESUME_PREFIX: &str = "resumes";

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub template_id: i64,
}

#[derive(Debug, Serialize)]
pub struct SavedResumeList {
    pub total: i64,
    pub items: Vec<SavedResumeRow>,
}

/// `{phone}_resume.pdf`, restricted to header-safe characters.
fn pdf_file_name(user: &User) -> String {
    let phone: String = user
        .phone_number
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '+')
        .collect();
    if phone.is_empty() {
        "resume.pdf".to_string()
    } else {
        format!("{phone}_resume.pdf")
    }
}

/// GET /api/v1/pdf/generate?template_id=
/// Renders the caller's resume with a template they may use, stores the PDF,
/// records it, and returns it as a download.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<GenerateQuery>,
) -> Result<Response, AppError> {
    let template = ensure_template_access(
        state.catalog.as_ref(),
        state.entitlements.as_ref(),
        user.id,
        query.template_id,
    )
    .await?;

    let source = load_template_html(&state.config.templates_dir, &template.template_path).await?;
    let resume = load_resume(&state.db, user.id).await?;
    let html = HtmlRenderer::new().render(
        &source,
        &RenderContext {
            user: ResumeOwner::from(&user),
            resume: &resume,
            template: TemplateMeta::from(&template),
        },
    )?;
    let pdf = state.renderer.html_to_pdf(&html).await?;

    let file_name = pdf_file_name(&user);
    let key = object_key(RESUME_PREFIX, user.id, &file_name);
    let file_ref = state.files.put(&key, PDF_CONTENT_TYPE, pdf.clone()).await?;
    let saved = record_saved_resume(
        &state.db,
        NewSavedResume {
            user_id: user.id,
            template_id: template.id,
            file_ref: &file_ref,
            file_name: &file_name,
            content_type: PDF_CONTENT_TYPE,
            file_size_bytes: pdf.len() as i64,
        },
    )
    .await?;

    info!(
        "Generated resume {} for user {} with template {} ({} bytes)",
        saved.id,
        user.id,
        template.id,
        pdf.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

/// GET /api/v1/resume-files
pub async fn handle_list_saved_resumes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<Page>,
) -> Result<Json<SavedResumeList>, AppError> {
    page.check().map_err(AppError::Validation)?;
    let (items, total) = list_saved_resumes(&state.db, user.id, page).await?;
    Ok(Json(SavedResumeList { total, items }))
}
