//! Embedded store the test suite runs the workflows against.
//!
//! Row locks are per-key `tokio::sync::Mutex`es owned by the transaction.
//! Writes are staged inside the transaction and applied in one step at commit,
//! so no partially-applied unit is ever visible. The same constraints the SQL
//! schema enforces (balance within `0..=NUMERIC(12, 2)`, unique entitlement
//! pair, unique template name) are checked at commit.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::ledger::max_money;
use crate::models::template::{
    Entitlement, NewTemplate, Template, TemplateFilter, TemplatePatch,
};
use crate::models::user::{ProfileUpdate, User};
use crate::models::wallet::{ChargeFilter, ChargeStatus, WalletCharge};
use crate::store::{
    EntitlementLedger, LedgerStore, LedgerTx, Page, StoreError, TemplateCatalog, UserDirectory,
};

/// Points at which a `MemoryStore` can be told to fail, for rollback tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    AdjustBalance,
    SetChargeStatus,
    GrantEntitlement,
    Commit,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    charges: BTreeMap<i64, WalletCharge>,
    templates: BTreeMap<i64, Template>,
    entitlements: BTreeMap<i64, Entitlement>,
    next_user_id: i64,
    next_charge_id: i64,
    next_template_id: i64,
    next_entitlement_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl Tables {
    fn insert_user(&mut self, phone_number: &str, wallet_balance: Decimal) -> User {
        let id = next_id(&mut self.next_user_id);
        let user = User {
            id,
            phone_number: phone_number.to_string(),
            first_name: None,
            last_name: None,
            birth_date: None,
            profile_picture: None,
            is_verified: false,
            wallet_balance,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        user
    }

    fn has_entitlement(&self, user_id: i64, template_id: i64) -> bool {
        self.entitlements
            .values()
            .any(|e| e.user_id == user_id && e.template_id == template_id)
    }
}

/// Lazily-created mutex per key.
struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Copy> KeyedLocks<K> {
    fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(key).or_default())
        };
        lock.lock_owned().await
    }
}

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    user_locks: Arc<KeyedLocks<i64>>,
    charge_locks: Arc<KeyedLocks<i64>>,
    faults: Arc<RwLock<HashSet<FailPoint>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            user_locks: Arc::new(KeyedLocks::new()),
            charge_locks: Arc::new(KeyedLocks::new()),
            faults: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Inserts a user with the given starting balance. Seeding only.
    pub async fn insert_user(&self, phone_number: &str, wallet_balance: Decimal) -> User {
        self.tables
            .write()
            .await
            .insert_user(phone_number, wallet_balance)
    }

    pub async fn fail_at(&self, point: FailPoint) {
        self.faults.write().await.insert(point);
    }

    pub async fn clear_faults(&self) {
        self.faults.write().await.clear();
    }

    pub async fn entitlement_count(&self) -> usize {
        self.tables.read().await.entitlements.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn create_charge(
        &self,
        user_id: i64,
        amount: Decimal,
        receipt_ref: &str,
    ) -> Result<WalletCharge, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::Conflict(format!(
                "wallet charge references missing user {user_id}"
            )));
        }
        let id = next_id(&mut tables.next_charge_id);
        let charge = WalletCharge {
            id,
            user_id,
            amount,
            receipt_ref: receipt_ref.to_string(),
            status: ChargeStatus::Pending,
            created_at: Utc::now(),
        };
        tables.charges.insert(id, charge.clone());
        Ok(charge)
    }

    async fn get_charge(&self, charge_id: i64) -> Result<Option<WalletCharge>, StoreError> {
        Ok(self.tables.read().await.charges.get(&charge_id).cloned())
    }

    async fn list_charges(
        &self,
        filter: &ChargeFilter,
        page: Page,
    ) -> Result<Vec<WalletCharge>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .charges
            .values()
            .rev()
            .filter(|c| filter.user_id.map_or(true, |u| c.user_id == u))
            .filter(|c| filter.status.map_or(true, |s| c.status == s))
            .skip(page.skip.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn begin(&self) -> Result<Box<dyn LedgerTx>, StoreError> {
        Ok(Box::new(MemoryTx {
            store: self.clone(),
            user_guards: HashMap::new(),
            charge_guards: HashMap::new(),
            writes: Vec::new(),
        }))
    }
}

enum StagedWrite {
    Balance { user_id: i64, delta: Decimal },
    ChargeStatus { charge_id: i64, status: ChargeStatus },
    Grant { user_id: i64, template_id: i64 },
}

pub struct MemoryTx {
    store: MemoryStore,
    user_guards: HashMap<i64, OwnedMutexGuard<()>>,
    charge_guards: HashMap<i64, OwnedMutexGuard<()>>,
    writes: Vec<StagedWrite>,
}

impl MemoryTx {
    async fn check_fault(&self, point: FailPoint) -> Result<(), StoreError> {
        if self.store.faults.read().await.contains(&point) {
            return Err(StoreError::Unavailable(format!("injected fault at {point:?}")));
        }
        Ok(())
    }

    fn staged_delta(&self, user_id: i64) -> Decimal {
        self.writes
            .iter()
            .filter_map(|w| match w {
                StagedWrite::Balance { user_id: u, delta } if *u == user_id => Some(*delta),
                _ => None,
            })
            .sum()
    }

    fn staged_status(&self, charge_id: i64) -> Option<ChargeStatus> {
        self.writes.iter().rev().find_map(|w| match w {
            StagedWrite::ChargeStatus { charge_id: c, status } if *c == charge_id => Some(*status),
            _ => None,
        })
    }

    fn staged_grant(&self, user_id: i64, template_id: i64) -> bool {
        self.writes.iter().any(|w| {
            matches!(w, StagedWrite::Grant { user_id: u, template_id: t }
                if *u == user_id && *t == template_id)
        })
    }

    fn require_user_lock(&self, user_id: i64) -> Result<(), StoreError> {
        if !self.user_guards.contains_key(&user_id) {
            return Err(StoreError::Conflict(format!(
                "user {user_id} written without holding its row lock"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn lock_charge_for_update(
        &mut self,
        charge_id: i64,
    ) -> Result<Option<WalletCharge>, StoreError> {
        if !self.charge_guards.contains_key(&charge_id) {
            let guard = self.store.charge_locks.acquire(charge_id).await;
            self.charge_guards.insert(charge_id, guard);
        }
        let charge = self.store.tables.read().await.charges.get(&charge_id).cloned();
        Ok(charge.map(|mut c| {
            if let Some(status) = self.staged_status(charge_id) {
                c.status = status;
            }
            c
        }))
    }

    async fn lock_user_for_update(&mut self, user_id: i64) -> Result<Option<User>, StoreError> {
        if !self.user_guards.contains_key(&user_id) {
            let guard = self.store.user_locks.acquire(user_id).await;
            self.user_guards.insert(user_id, guard);
        }
        let user = self.store.tables.read().await.users.get(&user_id).cloned();
        Ok(user.map(|mut u| {
            u.wallet_balance += self.staged_delta(user_id);
            u
        }))
    }

    async fn adjust_balance(&mut self, user_id: i64, delta: Decimal) -> Result<(), StoreError> {
        self.check_fault(FailPoint::AdjustBalance).await?;
        self.require_user_lock(user_id)?;
        self.writes.push(StagedWrite::Balance { user_id, delta });
        Ok(())
    }

    async fn set_charge_status(
        &mut self,
        charge_id: i64,
        status: ChargeStatus,
    ) -> Result<(), StoreError> {
        self.check_fault(FailPoint::SetChargeStatus).await?;
        if !self.charge_guards.contains_key(&charge_id) {
            return Err(StoreError::Conflict(format!(
                "charge {charge_id} written without holding its row lock"
            )));
        }
        self.writes.push(StagedWrite::ChargeStatus { charge_id, status });
        Ok(())
    }

    async fn entitlement_exists(
        &mut self,
        user_id: i64,
        template_id: i64,
    ) -> Result<bool, StoreError> {
        if self.staged_grant(user_id, template_id) {
            return Ok(true);
        }
        Ok(self
            .store
            .tables
            .read()
            .await
            .has_entitlement(user_id, template_id))
    }

    async fn grant_entitlement(
        &mut self,
        user_id: i64,
        template_id: i64,
    ) -> Result<(), StoreError> {
        self.check_fault(FailPoint::GrantEntitlement).await?;
        self.require_user_lock(user_id)?;
        self.writes.push(StagedWrite::Grant {
            user_id,
            template_id,
        });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.check_fault(FailPoint::Commit).await?;
        let mut tables = self.store.tables.write().await;

        // Validate every staged write against a scratch copy before touching the tables.
        let mut balances: HashMap<i64, Decimal> = HashMap::new();
        let mut grants: HashSet<(i64, i64)> = HashSet::new();
        for write in &self.writes {
            match write {
                StagedWrite::Balance { user_id, delta } => {
                    let current = match balances.get(user_id) {
                        Some(b) => *b,
                        None => tables
                            .users
                            .get(user_id)
                            .map(|u| u.wallet_balance)
                            .ok_or_else(|| {
                                StoreError::Conflict(format!("user {user_id} no longer exists"))
                            })?,
                    };
                    let next = current + *delta;
                    if next < Decimal::ZERO {
                        return Err(StoreError::Conflict(format!(
                            "balance of user {user_id} would become negative"
                        )));
                    }
                    if next > max_money() {
                        return Err(StoreError::Conflict(format!(
                            "balance of user {user_id} would overflow NUMERIC(12, 2)"
                        )));
                    }
                    balances.insert(*user_id, next);
                }
                StagedWrite::ChargeStatus { charge_id, .. } => {
                    if !tables.charges.contains_key(charge_id) {
                        return Err(StoreError::Conflict(format!(
                            "charge {charge_id} no longer exists"
                        )));
                    }
                }
                StagedWrite::Grant {
                    user_id,
                    template_id,
                } => {
                    if tables.has_entitlement(*user_id, *template_id)
                        || !grants.insert((*user_id, *template_id))
                    {
                        return Err(StoreError::Conflict(format!(
                            "duplicate entitlement for user {user_id} and template {template_id}"
                        )));
                    }
                    if !tables.templates.contains_key(template_id) {
                        return Err(StoreError::Conflict(format!(
                            "template {template_id} no longer exists"
                        )));
                    }
                }
            }
        }

        for (user_id, balance) in balances {
            if let Some(user) = tables.users.get_mut(&user_id) {
                user.wallet_balance = balance;
            }
        }
        for write in &self.writes {
            match write {
                StagedWrite::Balance { .. } => {}
                StagedWrite::ChargeStatus { charge_id, status } => {
                    if let Some(charge) = tables.charges.get_mut(charge_id) {
                        charge.status = *status;
                    }
                }
                StagedWrite::Grant {
                    user_id,
                    template_id,
                } => {
                    let id = next_id(&mut tables.next_entitlement_id);
                    tables.entitlements.insert(
                        id,
                        Entitlement {
                            id,
                            user_id: *user_id,
                            template_id: *template_id,
                            created_at: Utc::now(),
                        },
                    );
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TemplateCatalog for MemoryStore {
    async fn get_template(&self, template_id: i64) -> Result<Option<Template>, StoreError> {
        Ok(self.tables.read().await.templates.get(&template_id).cloned())
    }

    async fn get_template_by_name(&self, name: &str) -> Result<Option<Template>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .templates
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn list_templates(
        &self,
        filter: &TemplateFilter,
        page: Page,
    ) -> Result<Vec<Template>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Template> = tables
            .templates
            .values()
            .filter(|t| !filter.enabled_only || t.is_enabled)
            .filter(|t| {
                filter
                    .category
                    .as_deref()
                    .map_or(true, |c| t.category.as_deref() == Some(c))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(rows
            .into_iter()
            .skip(page.skip.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .collect())
    }

    async fn create_template(&self, template: &NewTemplate) -> Result<Template, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.templates.values().any(|t| t.name == template.name) {
            return Err(StoreError::Duplicate(format!(
                "template name '{}' already exists",
                template.name
            )));
        }
        let id = next_id(&mut tables.next_template_id);
        let now = Utc::now();
        let row = Template {
            id,
            name: template.name.clone(),
            description: template.description.clone(),
            direction: template.direction.clone(),
            language: template.language.clone(),
            price: template.price,
            is_free: template.is_free,
            is_enabled: template.is_enabled,
            template_path: template.template_path.clone(),
            preview_path: template.preview_path.clone(),
            category: template.category.clone(),
            sort_order: template.sort_order,
            created_at: now,
            updated_at: now,
        };
        tables.templates.insert(id, row.clone());
        Ok(row)
    }

    async fn update_template(
        &self,
        template_id: i64,
        patch: &TemplatePatch,
    ) -> Result<Option<Template>, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(name) = &patch.name {
            if tables
                .templates
                .values()
                .any(|t| t.id != template_id && &t.name == name)
            {
                return Err(StoreError::Duplicate(format!(
                    "template name '{name}' already exists"
                )));
            }
        }
        let Some(row) = tables.templates.get_mut(&template_id) else {
            return Ok(None);
        };
        if let Some(v) = &patch.name {
            row.name = v.clone();
        }
        if let Some(v) = &patch.description {
            row.description = Some(v.clone());
        }
        if let Some(v) = &patch.direction {
            row.direction = v.clone();
        }
        if let Some(v) = &patch.language {
            row.language = v.clone();
        }
        if let Some(v) = patch.price {
            row.price = v;
        }
        if let Some(v) = patch.is_free {
            row.is_free = v;
        }
        if let Some(v) = patch.is_enabled {
            row.is_enabled = v;
        }
        if let Some(v) = &patch.template_path {
            row.template_path = v.clone();
        }
        if let Some(v) = &patch.preview_path {
            row.preview_path = Some(v.clone());
        }
        if let Some(v) = &patch.category {
            row.category = Some(v.clone());
        }
        if let Some(v) = patch.sort_order {
            row.sort_order = v;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete_template(&self, template_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let existed = tables.templates.remove(&template_id).is_some();
        if existed {
            tables.entitlements.retain(|_, e| e.template_id != template_id);
        }
        Ok(existed)
    }
}

#[async_trait]
impl EntitlementLedger for MemoryStore {
    async fn exists(&self, user_id: i64, template_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .has_entitlement(user_id, template_id))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<i64>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .entitlements
            .values()
            .rev()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.template_id)
            .collect())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn register(&self, phone_number: &str) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables
            .users
            .values()
            .find(|u| u.phone_number == phone_number)
        {
            return Ok(user.clone());
        }
        Ok(tables.insert_user(phone_number, Decimal::ZERO))
    }

    async fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(v) = &update.first_name {
            user.first_name = Some(v.clone());
        }
        if let Some(v) = &update.last_name {
            user.last_name = Some(v.clone());
        }
        if let Some(v) = update.birth_date {
            user.birth_date = Some(v);
        }
        if let Some(v) = &update.profile_picture {
            user.profile_picture = Some(v.clone());
        }
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal_macros::dec;

    use super::*;

    fn new_template(name: &str, sort_order: i32) -> NewTemplate {
        NewTemplate {
            name: name.to_string(),
            description: None,
            direction: "ltr".to_string(),
            language: "English".to_string(),
            price: dec!(10.00),
            is_free: false,
            is_enabled: true,
            template_path: format!("{name}.html"),
            preview_path: None,
            category: None,
            sort_order,
        }
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let store = MemoryStore::new();
        let user = store.insert_user("0912", dec!(10.00)).await;

        let mut tx = store.begin().await.unwrap();
        tx.lock_user_for_update(user.id).await.unwrap();
        tx.adjust_balance(user.id, dec!(5.00)).await.unwrap();
        drop(tx);

        let user = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.wallet_balance, dec!(10.00));
    }

    #[tokio::test]
    async fn test_locked_read_sees_staged_delta() {
        let store = MemoryStore::new();
        let user = store.insert_user("0912", dec!(10.00)).await;

        let mut tx = store.begin().await.unwrap();
        tx.lock_user_for_update(user.id).await.unwrap();
        tx.adjust_balance(user.id, dec!(-4.00)).await.unwrap();
        let locked = tx.lock_user_for_update(user.id).await.unwrap().unwrap();
        assert_eq!(locked.wallet_balance, dec!(6.00));
        tx.commit().await.unwrap();

        let user = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.wallet_balance, dec!(6.00));
    }

    #[tokio::test]
    async fn test_write_without_lock_is_rejected() {
        let store = MemoryStore::new();
        let user = store.insert_user("0912", dec!(10.00)).await;

        let mut tx = store.begin().await.unwrap();
        let err = tx.adjust_balance(user.id, dec!(1.00)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_commit_refuses_negative_balance() {
        let store = MemoryStore::new();
        let user = store.insert_user("0912", dec!(10.00)).await;

        let mut tx = store.begin().await.unwrap();
        tx.lock_user_for_update(user.id).await.unwrap();
        tx.adjust_balance(user.id, dec!(-10.01)).await.unwrap();
        assert!(matches!(tx.commit().await, Err(StoreError::Conflict(_))));

        let user = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.wallet_balance, dec!(10.00));
    }

    #[tokio::test]
    async fn test_commit_refuses_balance_past_column_limit() {
        let store = MemoryStore::new();
        let user = store.insert_user("0912", max_money()).await;

        let mut tx = store.begin().await.unwrap();
        tx.lock_user_for_update(user.id).await.unwrap();
        tx.adjust_balance(user.id, dec!(0.01)).await.unwrap();
        assert!(matches!(tx.commit().await, Err(StoreError::Conflict(_))));

        let user = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.wallet_balance, max_money());
    }

    #[tokio::test]
    async fn test_user_lock_blocks_second_transaction_until_release() {
        let store = MemoryStore::new();
        let user = store.insert_user("0912", dec!(10.00)).await;

        let mut first = store.begin().await.unwrap();
        first.lock_user_for_update(user.id).await.unwrap();

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut second = store.begin().await.unwrap();
                second
                    .lock_user_for_update(user.id)
                    .await
                    .unwrap()
                    .unwrap()
                    .wallet_balance
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        first.adjust_balance(user.id, dec!(2.50)).await.unwrap();
        first.commit().await.unwrap();

        assert_eq!(contender.await.unwrap(), dec!(12.50));
    }

    #[tokio::test]
    async fn test_list_charges_newest_first_with_filters() {
        let store = MemoryStore::new();
        let a = store.insert_user("0911", Decimal::ZERO).await;
        let b = store.insert_user("0922", Decimal::ZERO).await;
        for (user, amount) in [(a.id, dec!(1)), (b.id, dec!(2)), (a.id, dec!(3))] {
            store.create_charge(user, amount, "r").await.unwrap();
        }

        let all = store
            .list_charges(&ChargeFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(all.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        let mine = store
            .list_charges(
                &ChargeFilter {
                    user_id: Some(a.id),
                    status: None,
                },
                Page { skip: 1, limit: 10 },
            )
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].amount, dec!(1));
    }

    #[tokio::test]
    async fn test_templates_sorted_and_names_unique() {
        let store = MemoryStore::new();
        store.create_template(&new_template("Zeta", 0)).await.unwrap();
        store.create_template(&new_template("Alpha", 1)).await.unwrap();
        store.create_template(&new_template("Beta", 0)).await.unwrap();

        let names: Vec<String> = store
            .list_templates(&TemplateFilter::default(), Page::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Beta", "Zeta", "Alpha"]);

        let dup = store.create_template(&new_template("Beta", 3)).await;
        assert!(matches!(dup, Err(StoreError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_register_is_idempotent_per_phone() {
        let store = MemoryStore::new();
        let first = store.register("09120000000").await.unwrap();
        let again = store.register("09120000000").await.unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(first.wallet_balance, Decimal::ZERO);
    }
}
