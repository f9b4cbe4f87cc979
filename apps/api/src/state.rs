use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::files::FileStore;
use crate::render::PdfRenderer;
use crate::store::{EntitlementLedger, LedgerStore, TemplateCatalog, UserDirectory};

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The ledger-facing ports are trait objects so the wallet and purchase
/// workflows run unchanged against Postgres or the embedded test store.
#[derive(Clone)]
pub struct AppState {
    /// Resume sections and saved resume records are queried directly.
    pub db: PgPool,
    pub ledger: Arc<dyn LedgerStore>,
    pub catalog: Arc<dyn TemplateCatalog>,
    pub entitlements: Arc<dyn EntitlementLedger>,
    pub users: Arc<dyn UserDirectory>,
    pub files: Arc<dyn FileStore>,
    pub renderer: Arc<dyn PdfRenderer>,
    pub config: Config,
}
