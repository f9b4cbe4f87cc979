//! Template purchases paid from the wallet balance.

use std::collections::HashSet;

use tracing::info;

use crate::ledger::{debit, LedgerError};
use crate::models::template::{Template, TemplateFilter, TemplateView};
use crate::store::{EntitlementLedger, LedgerStore, Page, TemplateCatalog};

/// Buys `template_id` for `user_id`.
///
/// Free templates succeed without touching the balance and record nothing.
/// For paid templates the debit and the entitlement grant happen in one
/// transaction under the user's row lock, so two concurrent purchases can
/// never both pass the funds check.
pub async fn purchase_template(
    ledger: &dyn LedgerStore,
    catalog: &dyn TemplateCatalog,
    entitlements: &dyn EntitlementLedger,
    user_id: i64,
    template_id: i64,
) -> Result<TemplateView, LedgerError> {
    let template = enabled_template(catalog, template_id).await?;

    if template.is_free {
        return Ok(TemplateView {
            template,
            purchased: true,
        });
    }
    if entitlements.exists(user_id, template_id).await? {
        return Err(LedgerError::AlreadyPurchased { template_id });
    }

    let price = template.effective_price();
    let mut tx = ledger.begin().await?;
    let user = tx
        .lock_user_for_update(user_id)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("User {user_id}")))?;

    // Another purchase may have committed between the check above and the lock.
    if tx.entitlement_exists(user_id, template_id).await? {
        return Err(LedgerError::AlreadyPurchased { template_id });
    }
    let remaining = debit(user.wallet_balance, price)?;

    tx.adjust_balance(user_id, -price).await?;
    tx.grant_entitlement(user_id, template_id).await?;
    tx.commit().await?;

    info!(
        "User {user_id} purchased template {template_id} for {price}; balance now {remaining}"
    );
    Ok(TemplateView {
        template,
        purchased: true,
    })
}

/// Enabled catalog rows with the caller's `purchased` flag. Free templates
/// always read as purchased.
pub async fn list_templates_for_user(
    catalog: &dyn TemplateCatalog,
    entitlements: &dyn EntitlementLedger,
    user_id: i64,
    category: Option<String>,
    page: Page,
) -> Result<Vec<TemplateView>, LedgerError> {
    page.check().map_err(LedgerError::Validation)?;
    let filter = TemplateFilter {
        enabled_only: true,
        category,
    };
    let owned: HashSet<i64> = entitlements.list_by_user(user_id).await?.into_iter().collect();

    Ok(catalog
        .list_templates(&filter, page)
        .await?
        .into_iter()
        .map(|template| TemplateView {
            purchased: template.is_free || owned.contains(&template.id),
            template,
        })
        .collect())
}

/// Templates the user holds an entitlement for, newest purchase first.
/// Free templates are not listed unless explicitly recorded.
pub async fn list_purchased_templates(
    catalog: &dyn TemplateCatalog,
    entitlements: &dyn EntitlementLedger,
    user_id: i64,
) -> Result<Vec<Template>, LedgerError> {
    let mut templates = Vec::new();
    for template_id in entitlements.list_by_user(user_id).await? {
        if let Some(template) = catalog.get_template(template_id).await? {
            templates.push(template);
        }
    }
    Ok(templates)
}

/// Resolves a template the user may render: enabled, and either free or owned.
pub async fn ensure_template_access(
    catalog: &dyn TemplateCatalog,
    entitlements: &dyn EntitlementLedger,
    user_id: i64,
    template_id: i64,
) -> Result<Template, LedgerError> {
    let template = enabled_template(catalog, template_id).await?;
    if template.is_free || entitlements.exists(user_id, template_id).await? {
        return Ok(template);
    }
    Err(LedgerError::NotPurchased { template_id })
}

async fn enabled_template(
    catalog: &dyn TemplateCatalog,
    template_id: i64,
) -> Result<Template, LedgerError> {
    catalog
        .get_template(template_id)
        .await?
        .filter(|t| t.is_enabled)
        .ok_or_else(|| LedgerError::NotFound(format!("Template {template_id}")))
}
