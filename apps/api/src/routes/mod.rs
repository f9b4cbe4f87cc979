pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};

use crate::render::handlers as render;
use crate::resume::handlers as resume;
use crate::state::AppState;
use crate::templates::{admin as template_admin, handlers as templates};
use crate::users::handlers as users;
use crate::wallet::{admin as wallet_admin, handlers as wallet};

/// Room for multipart boundaries and text fields on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Users
        .route("/api/v1/users", post(users::handle_register))
        .route(
            "/api/v1/users/me",
            get(users::handle_get_profile).patch(users::handle_update_profile),
        )
        // Wallet
        .route("/api/v1/wallet/balance", get(wallet::handle_get_balance))
        .route(
            "/api/v1/wallet/charges",
            get(wallet::handle_list_my_charges).post(wallet::handle_submit_charge),
        )
        .route(
            "/api/v1/admin/wallet/charges",
            get(wallet_admin::handle_list_charges),
        )
        .route(
            "/api/v1/admin/wallet/charges/:id",
            get(wallet_admin::handle_get_charge),
        )
        .route(
            "/api/v1/admin/wallet/charges/:id/accept",
            post(wallet_admin::handle_accept_charge),
        )
        .route(
            "/api/v1/admin/wallet/charges/:id/reject",
            post(wallet_admin::handle_reject_charge),
        )
        // Templates
        .route("/api/v1/templates", get(templates::handle_list_templates))
        .route(
            "/api/v1/templates/purchased",
            get(templates::handle_list_purchased),
        )
        .route(
            "/api/v1/templates/:id/purchase",
            post(templates::handle_purchase),
        )
        .route(
            "/api/v1/admin/templates",
            get(template_admin::handle_list_templates).post(template_admin::handle_create_template),
        )
        .route(
            "/api/v1/admin/templates/:id",
            get(template_admin::handle_get_template)
                .put(template_admin::handle_update_template)
                .delete(template_admin::handle_delete_template),
        )
        .route(
            "/api/v1/admin/templates/:id/toggle-status",
            patch(template_admin::handle_toggle_status),
        )
        .route(
            "/api/v1/admin/templates/:id/sort-order",
            patch(template_admin::handle_set_sort_order),
        )
        // Resume sections
        .route("/api/v1/resume", get(resume::handle_get_resume))
        .route(
            "/api/v1/resume/:section",
            get(resume::handle_get_section)
                .put(resume::handle_upsert_section)
                .post(resume::handle_create_entry),
        )
        .route(
            "/api/v1/resume/:section/:id",
            put(resume::handle_update_entry).delete(resume::handle_delete_entry),
        )
        // PDF rendering
        .route("/api/v1/pdf/generate", get(render::handle_generate_pdf))
        .route(
            "/api/v1/resume-files",
            get(render::handle_list_saved_resumes),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
