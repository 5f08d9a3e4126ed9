//! Per-user shard store
//!
//! One document per user id (`<users_dir>/<id>.json`) holding that user's
//! accounts, transactions, saving goals and loans. Account and transaction
//! ids are global across all shards: the counters are seeded from the
//! largest id observed at open time and only move forward.
//!
//! Every read-modify-write of a shard runs under that shard's lock. Scans
//! that visit many shards lock each shard only while reading it, so writers
//! of other shards are never blocked.

use crate::banks::BankCatalog;
use crate::document;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Account, AccountWithBank, InsertAccount, InsertTransaction, Loan, SavingGoal, ShardData,
    Transaction,
};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

struct Counters {
    next_account_id: i64,
    next_transaction_id: i64,
}

/// Store of per-user shard documents
pub struct ShardStore {
    users_dir: PathBuf,
    counters: Mutex<Counters>,
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ShardStore {
    /// Open the shard store, scanning existing shards to seed the id
    /// counters past anything already on disk.
    pub fn open(users_dir: PathBuf) -> StoreResult<Self> {
        std::fs::create_dir_all(&users_dir)?;

        let store = Self {
            users_dir,
            counters: Mutex::new(Counters {
                next_account_id: 1,
                next_transaction_id: 1,
            }),
            locks: Mutex::new(HashMap::new()),
        };

        for user_id in store.user_ids() {
            if let Some(shard) = store.read_shard_logged(user_id) {
                store.observe_ids(&shard);
            }
        }

        Ok(store)
    }

    fn shard_path(&self, user_id: i64) -> PathBuf {
        self.users_dir.join(format!("{}.json", user_id))
    }

    fn shard_lock(&self, user_id: i64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.entry(user_id).or_default().clone()
    }

    /// Bump the id counters past every id present in a shard
    fn observe_ids(&self, shard: &ShardData) {
        let mut counters = self.counters.lock().unwrap();
        counters.next_account_id = counters.next_account_id.max(shard.max_account_id() + 1);
        counters.next_transaction_id = counters
            .next_transaction_id
            .max(shard.max_transaction_id() + 1);
    }

    fn take_account_id(&self) -> i64 {
        let mut counters = self.counters.lock().unwrap();
        let id = counters.next_account_id;
        counters.next_account_id += 1;
        id
    }

    fn take_transaction_id(&self) -> i64 {
        let mut counters = self.counters.lock().unwrap();
        let id = counters.next_transaction_id;
        counters.next_transaction_id += 1;
        id
    }

    /// User ids that currently have a shard file, in ascending order
    pub fn user_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        let entries = match std::fs::read_dir(&self.users_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("Cannot list shard directory {}: {}", self.users_dir.display(), e);
                return ids;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                if let Some(id) = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| stem.parse::<i64>().ok())
                {
                    ids.push(id);
                }
            }
        }
        ids.sort_unstable();
        ids
    }

    /// Whether a shard file exists for the user
    pub fn has_shard(&self, user_id: i64) -> bool {
        self.shard_path(user_id).exists()
    }

    /// Load a shard; `None` when no shard file exists. Never creates one.
    pub fn read_shard(&self, user_id: i64) -> StoreResult<Option<ShardData>> {
        let lock = self.shard_lock(user_id);
        let _guard = lock.lock().unwrap();
        document::read_document(&self.shard_path(user_id))
    }

    /// Shard read for listing paths: failures are logged and degrade to a
    /// missing shard instead of failing the caller.
    fn read_shard_logged(&self, user_id: i64) -> Option<ShardData> {
        match self.read_shard(user_id) {
            Ok(shard) => shard,
            Err(e) => {
                log::error!("Cannot read shard for user {}: {}", user_id, e);
                None
            }
        }
    }

    /// Create an empty shard for the user unless one already exists
    pub fn ensure_shard(&self, user_id: i64) -> StoreResult<()> {
        let lock = self.shard_lock(user_id);
        let _guard = lock.lock().unwrap();
        let path = self.shard_path(user_id);
        if !path.exists() {
            document::write_document(&path, &ShardData::default())?;
            log::debug!("Created empty shard for user {}", user_id);
        }
        Ok(())
    }

    /// Install a prepared shard document for a user who has none.
    /// Idempotent: an existing shard is never clobbered and `false` is
    /// reported. Installed ids are folded into the id counters.
    pub fn materialize(&self, user_id: i64, shard: ShardData) -> StoreResult<bool> {
        let lock = self.shard_lock(user_id);
        let _guard = lock.lock().unwrap();
        let path = self.shard_path(user_id);
        if path.exists() {
            return Ok(false);
        }
        document::write_document(&path, &shard)?;
        self.observe_ids(&shard);
        Ok(true)
    }

    /// Accounts of one user, joined with their bank catalog entries at
    /// read time. Empty when the user has no shard; never creates one.
    pub fn get_accounts(&self, user_id: i64, catalog: &BankCatalog) -> Vec<AccountWithBank> {
        let shard = match self.read_shard_logged(user_id) {
            Some(shard) => shard,
            None => return Vec::new(),
        };
        shard
            .accounts
            .into_iter()
            .map(|account| {
                let bank = catalog.get(account.bank_id);
                AccountWithBank { account, bank }
            })
            .collect()
    }

    /// Create an account inside its owner's shard. The shard must already
    /// exist (created at user creation or seed materialization).
    pub fn create_account(
        &self,
        insert: InsertAccount,
        catalog: &BankCatalog,
    ) -> StoreResult<AccountWithBank> {
        let user_id = insert.user_id;
        let lock = self.shard_lock(user_id);
        let _guard = lock.lock().unwrap();

        let path = self.shard_path(user_id);
        let mut shard: ShardData =
            document::read_document(&path)?.ok_or(StoreError::ShardMissing { user_id })?;

        let account = Account {
            id: self.take_account_id(),
            user_id,
            bank_id: insert.bank_id,
            account_number: insert.account_number,
            account_type: insert.account_type,
            balance: insert.balance.unwrap_or_else(|| "0".to_string()),
            is_linked: insert.is_linked.unwrap_or(false),
            loan_amount: insert.loan_amount,
            loan_paid: insert.loan_paid,
            created_at: Utc::now(),
        };

        shard.accounts.push(account.clone());
        document::write_document(&path, &shard)?;

        let bank = catalog.get(account.bank_id);
        Ok(AccountWithBank { account, bank })
    }

    /// Flip the linked flag of an account. The owning shard is found by
    /// scanning all shards; there is no account-id index at this volume.
    pub fn link_account(
        &self,
        id: i64,
        is_linked: bool,
        catalog: &BankCatalog,
    ) -> StoreResult<AccountWithBank> {
        for user_id in self.user_ids() {
            let lock = self.shard_lock(user_id);
            let _guard = lock.lock().unwrap();

            let path = self.shard_path(user_id);
            let mut shard = match document::read_document::<ShardData>(&path)? {
                Some(shard) => shard,
                None => continue,
            };

            if let Some(index) = shard.accounts.iter().position(|a| a.id == id) {
                shard.accounts[index].is_linked = is_linked;
                document::write_document(&path, &shard)?;
                let account = shard.accounts[index].clone();
                let bank = catalog.get(account.bank_id);
                return Ok(AccountWithBank { account, bank });
            }
        }

        Err(StoreError::AccountNotFound { id })
    }

    /// Transactions across all shards, optionally filtered to one account
    pub fn get_transactions(&self, account_id: Option<i64>) -> Vec<Transaction> {
        let mut all = Vec::new();
        for user_id in self.user_ids() {
            let shard = match self.read_shard_logged(user_id) {
                Some(shard) => shard,
                None => continue,
            };
            match account_id {
                Some(account_id) => all.extend(
                    shard
                        .transactions
                        .into_iter()
                        .filter(|t| t.account_id == account_id),
                ),
                None => all.extend(shard.transactions),
            }
        }
        all
    }

    /// Create a transaction in the shard that holds the referenced account.
    /// The record is written into exactly that shard, never duplicated.
    pub fn create_transaction(&self, insert: InsertTransaction) -> StoreResult<Transaction> {
        for user_id in self.user_ids() {
            let lock = self.shard_lock(user_id);
            let _guard = lock.lock().unwrap();

            let path = self.shard_path(user_id);
            let mut shard = match document::read_document::<ShardData>(&path)? {
                Some(shard) => shard,
                None => continue,
            };

            if shard.accounts.iter().any(|a| a.id == insert.account_id) {
                let transaction = Transaction {
                    id: self.take_transaction_id(),
                    account_id: insert.account_id,
                    amount: insert.amount,
                    kind: insert.kind,
                    category: insert.category,
                    description: insert.description,
                    date: Utc::now(),
                };
                shard.transactions.push(transaction.clone());
                document::write_document(&path, &shard)?;
                return Ok(transaction);
            }
        }

        Err(StoreError::AccountNotFound {
            id: insert.account_id,
        })
    }

    /// Saving goals of one user; empty when the user has no shard
    pub fn get_saving_goals(&self, user_id: i64) -> Vec<SavingGoal> {
        self.read_shard_logged(user_id)
            .map(|shard| shard.saving_goals)
            .unwrap_or_default()
    }

    /// Loans of one user; empty when the user has no shard
    pub fn get_loans(&self, user_id: i64) -> Vec<Loan> {
        self.read_shard_logged(user_id)
            .map(|shard| shard.loans)
            .unwrap_or_default()
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::models::TransactionKind;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> ShardStore {
        ShardStore::open(dir.path().join("users")).unwrap()
    }

    fn seeded_catalog(dir: &TempDir) -> BankCatalog {
        let catalog = BankCatalog::open(dir.path().join("banks.json")).unwrap();
        catalog.seed().unwrap();
        catalog
    }

    fn insert_account(user_id: i64, bank_id: i64) -> InsertAccount {
        InsertAccount {
            user_id,
            bank_id,
            account_number: "XXXX1234".to_string(),
            account_type: "savings".to_string(),
            balance: None,
            is_linked: None,
            loan_amount: None,
            loan_paid: None,
        }
    }

    fn insert_transaction(account_id: i64, amount: &str, kind: TransactionKind) -> InsertTransaction {
        InsertTransaction {
            account_id,
            amount: amount.to_string(),
            kind,
            category: Some("Food".to_string()),
            description: None,
        }
    }

    #[test]
    fn test_reads_on_missing_shard_are_empty_and_create_nothing() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let catalog = seeded_catalog(&dir);

        assert!(store.get_accounts(5, &catalog).is_empty());
        assert!(store.get_saving_goals(5).is_empty());
        assert!(store.get_loans(5).is_empty());
        // read paths never materialize a shard
        assert!(!store.has_shard(5));
    }

    #[test]
    fn test_create_account_requires_existing_shard() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let catalog = seeded_catalog(&dir);

        let err = store.create_account(insert_account(1, 1), &catalog).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ShardMissing);
    }

    #[test]
    fn test_create_account_defaults_and_bank_join() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let catalog = seeded_catalog(&dir);
        store.ensure_shard(1).unwrap();

        let created = store.create_account(insert_account(1, 3), &catalog).unwrap();
        assert_eq!(created.account.balance, "0");
        assert!(!created.account.is_linked);
        assert_eq!(created.bank.as_ref().unwrap().name, "Citi");

        let listed = store.get_accounts(1, &catalog);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].account.id, created.account.id);
        assert_eq!(listed[0].bank.as_ref().unwrap().id, 3);
    }

    #[test]
    fn test_unknown_bank_joins_as_none() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let catalog = seeded_catalog(&dir);
        store.ensure_shard(1).unwrap();

        let created = store.create_account(insert_account(1, 42), &catalog).unwrap();
        assert!(created.bank.is_none());
    }

    #[test]
    fn test_account_ids_unique_across_shards() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let catalog = seeded_catalog(&dir);
        store.ensure_shard(1).unwrap();
        store.ensure_shard(2).unwrap();

        let a = store.create_account(insert_account(1, 1), &catalog).unwrap();
        let b = store.create_account(insert_account(2, 1), &catalog).unwrap();
        assert_ne!(a.account.id, b.account.id);
    }

    #[test]
    fn test_counters_seeded_from_disk_on_reopen() {
        let dir = TempDir::new().unwrap();
        let catalog = seeded_catalog(&dir);
        {
            let store = open_store(&dir);
            store.ensure_shard(1).unwrap();
            let a = store.create_account(insert_account(1, 1), &catalog).unwrap();
            assert_eq!(a.account.id, 1);
        }

        // restart: ids keep moving forward, never reused
        let store = open_store(&dir);
        let b = store.create_account(insert_account(1, 1), &catalog).unwrap();
        assert_eq!(b.account.id, 2);
    }

    #[test]
    fn test_link_account_and_not_found() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let catalog = seeded_catalog(&dir);
        store.ensure_shard(1).unwrap();
        let created = store.create_account(insert_account(1, 1), &catalog).unwrap();

        let linked = store.link_account(created.account.id, true, &catalog).unwrap();
        assert!(linked.account.is_linked);

        let listed = store.get_accounts(1, &catalog);
        assert!(listed[0].account.is_linked);

        let err = store.link_account(999, true, &catalog).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AccountNotFound);
    }

    #[test]
    fn test_create_transaction_lands_in_owning_shard_once() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let catalog = seeded_catalog(&dir);
        store.ensure_shard(1).unwrap();
        store.ensure_shard(2).unwrap();
        let account = store.create_account(insert_account(2, 1), &catalog).unwrap();

        let txn = store
            .create_transaction(insert_transaction(account.account.id, "25.00", TransactionKind::Debit))
            .unwrap();

        let filtered = store.get_transactions(Some(account.account.id));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, txn.id);

        // unfiltered union sees it exactly once
        let all = store.get_transactions(None);
        assert_eq!(all.iter().filter(|t| t.id == txn.id).count(), 1);

        // it lives in the shard owning the account, not elsewhere
        let shard = store.read_shard(2).unwrap().unwrap();
        assert_eq!(shard.transactions.len(), 1);
        let other = store.read_shard(1).unwrap().unwrap();
        assert!(other.transactions.is_empty());
    }

    #[test]
    fn test_create_transaction_unknown_account_fails() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.ensure_shard(1).unwrap();

        let err = store
            .create_transaction(insert_transaction(77, "10", TransactionKind::Credit))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AccountNotFound);
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let mut shard = ShardData::default();
        shard.saving_goals.push(SavingGoal {
            id: 1,
            user_id: 4,
            target_amount: "1000".to_string(),
            current_amount: "250".to_string(),
            editable: true,
        });

        assert!(store.materialize(4, shard.clone()).unwrap());
        assert_eq!(store.get_saving_goals(4).len(), 1);

        // second materialization never clobbers live data
        let empty = ShardData::default();
        assert!(!store.materialize(4, empty).unwrap());
        assert_eq!(store.get_saving_goals(4).len(), 1);
    }

    #[test]
    fn test_materialize_bumps_id_counters() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let catalog = seeded_catalog(&dir);

        let mut shard = ShardData::default();
        shard.accounts.push(Account {
            id: 40,
            user_id: 1,
            bank_id: 1,
            account_number: "XXXX9999".to_string(),
            account_type: "savings".to_string(),
            balance: "100".to_string(),
            is_linked: true,
            loan_amount: None,
            loan_paid: None,
            created_at: Utc::now(),
        });
        store.materialize(1, shard).unwrap();

        store.ensure_shard(2).unwrap();
        let next = store.create_account(insert_account(2, 1), &catalog).unwrap();
        assert_eq!(next.account.id, 41);
    }
}
