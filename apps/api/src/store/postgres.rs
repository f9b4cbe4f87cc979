use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::models::template::{NewTemplate, Template, TemplateFilter, TemplatePatch};
use crate::models::user::{ProfileUpdate, User};
use crate::models::wallet::{ChargeFilter, ChargeStatus, WalletCharge};
use crate::store::{
    EntitlementLedger, LedgerStore, LedgerTx, Page, StoreError, TemplateCatalog, UserDirectory,
};

/// PostgreSQL backend. Row locks are `SELECT ... FOR UPDATE` inside one
/// transaction; the non-negative balance and the unique entitlement pair are
/// also enforced by table constraints.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn duplicate_name(err: sqlx::Error, name: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Duplicate(format!("template name '{name}' already exists"));
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_charge(
        &self,
        user_id: i64,
        amount: Decimal,
        receipt_ref: &str,
    ) -> Result<WalletCharge, StoreError> {
        Ok(sqlx::query_as::<_, WalletCharge>(
            r#"
            INSERT INTO wallet_charges (user_id, amount, receipt_ref, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(receipt_ref)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_charge(&self, charge_id: i64) -> Result<Option<WalletCharge>, StoreError> {
        Ok(
            sqlx::query_as::<_, WalletCharge>("SELECT * FROM wallet_charges WHERE id = $1")
                .bind(charge_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_charges(
        &self,
        filter: &ChargeFilter,
        page: Page,
    ) -> Result<Vec<WalletCharge>, StoreError> {
        Ok(sqlx::query_as::<_, WalletCharge>(
            r#"
            SELECT * FROM wallet_charges
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::wallet_charge_status IS NULL OR status = $2)
            ORDER BY id DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.status)
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTx { tx }))
    }
}

pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lock_charge_for_update(
        &mut self,
        charge_id: i64,
    ) -> Result<Option<WalletCharge>, StoreError> {
        Ok(sqlx::query_as::<_, WalletCharge>(
            "SELECT * FROM wallet_charges WHERE id = $1 FOR UPDATE",
        )
        .bind(charge_id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn lock_user_for_update(&mut self, user_id: i64) -> Result<Option<User>, StoreError> {
        debug!("Locking user {user_id} for update");
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *self.tx)
                .await?,
        )
    }

    async fn adjust_balance(&mut self, user_id: i64, delta: Decimal) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE users SET wallet_balance = wallet_balance + $1 WHERE id = $2")
                .bind(delta)
                .bind(user_id)
                .execute(&mut *self.tx)
                .await?;
        if result.rows_affected() != 1 {
            return Err(StoreError::Conflict(format!(
                "balance update matched {} rows for user {user_id}",
                result.rows_affected()
            )));
        }
        Ok(())
    }

    async fn set_charge_status(
        &mut self,
        charge_id: i64,
        status: ChargeStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE wallet_charges SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(charge_id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() != 1 {
            return Err(StoreError::Conflict(format!(
                "status update matched {} rows for charge {charge_id}",
                result.rows_affected()
            )));
        }
        Ok(())
    }

    async fn entitlement_exists(
        &mut self,
        user_id: i64,
        template_id: i64,
    ) -> Result<bool, StoreError> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM entitlements WHERE user_id = $1 AND template_id = $2)",
        )
        .bind(user_id)
        .bind(template_id)
        .fetch_one(&mut *self.tx)
        .await?)
    }

    async fn grant_entitlement(
        &mut self,
        user_id: i64,
        template_id: i64,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO entitlements (user_id, template_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(template_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl TemplateCatalog for PgStore {
    async fn get_template(&self, template_id: i64) -> Result<Option<Template>, StoreError> {
        Ok(
            sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = $1")
                .bind(template_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_template_by_name(&self, name: &str) -> Result<Option<Template>, StoreError> {
        Ok(
            sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_templates(
        &self,
        filter: &TemplateFilter,
        page: Page,
    ) -> Result<Vec<Template>, StoreError> {
        Ok(sqlx::query_as::<_, Template>(
            r#"
            SELECT * FROM templates
            WHERE (NOT $1 OR is_enabled)
              AND ($2::TEXT IS NULL OR category = $2)
            ORDER BY sort_order ASC, name ASC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(filter.enabled_only)
        .bind(filter.category.as_deref())
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_template(&self, template: &NewTemplate) -> Result<Template, StoreError> {
        Ok(sqlx::query_as::<_, Template>(
            r#"
            INSERT INTO templates
                (name, description, direction, language, price, is_free, is_enabled,
                 template_path, preview_path, category, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&template.name)
        .bind(&template.description)
        .bind(&template.direction)
        .bind(&template.language)
        .bind(template.price)
        .bind(template.is_free)
        .bind(template.is_enabled)
        .bind(&template.template_path)
        .bind(&template.preview_path)
        .bind(&template.category)
        .bind(template.sort_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| duplicate_name(e, &template.name))?)
    }

    async fn update_template(
        &self,
        template_id: i64,
        patch: &TemplatePatch,
    ) -> Result<Option<Template>, StoreError> {
        Ok(sqlx::query_as::<_, Template>(
            r#"
            UPDATE templates SET
                name          = COALESCE($2, name),
                description   = COALESCE($3, description),
                direction     = COALESCE($4, direction),
                language      = COALESCE($5, language),
                price         = COALESCE($6, price),
                is_free       = COALESCE($7, is_free),
                is_enabled    = COALESCE($8, is_enabled),
                template_path = COALESCE($9, template_path),
                preview_path  = COALESCE($10, preview_path),
                category      = COALESCE($11, category),
                sort_order    = COALESCE($12, sort_order),
                updated_at    = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(template_id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(&patch.direction)
        .bind(&patch.language)
        .bind(patch.price)
        .bind(patch.is_free)
        .bind(patch.is_enabled)
        .bind(&patch.template_path)
        .bind(&patch.preview_path)
        .bind(&patch.category)
        .bind(patch.sort_order)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| duplicate_name(e, patch.name.as_deref().unwrap_or_default()))?)
    }

    async fn delete_template(&self, template_id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(template_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EntitlementLedger for PgStore {
    async fn exists(&self, user_id: i64, template_id: i64) -> Result<bool, StoreError> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM entitlements WHERE user_id = $1 AND template_id = $2)",
        )
        .bind(user_id)
        .bind(template_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<i64>, StoreError> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT template_id FROM entitlements WHERE user_id = $1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn register(&self, phone_number: &str) -> Result<User, StoreError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        Ok(sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (phone_number) VALUES ($1)
            ON CONFLICT (phone_number) DO UPDATE SET phone_number = EXCLUDED.phone_number
            RETURNING *
            "#,
        )
        .bind(phone_number)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name      = COALESCE($2, first_name),
                last_name       = COALESCE($3, last_name),
                birth_date      = COALESCE($4, birth_date),
                profile_picture = COALESCE($5, profile_picture)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(update.birth_date)
        .bind(&update.profile_picture)
        .fetch_optional(&self.pool)
        .await?)
    }
}
