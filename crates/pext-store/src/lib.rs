//! Core storage engine for pext
//!
//! An in-process store holding users, banks, linked accounts, transactions,
//! saving goals, loans and payment cards, persisted as sharded JSON
//! documents: one global user registry, one global card registry, one bank
//! catalog, and one shard document per user id. Every document is rewritten
//! in full on mutation, behind a per-document guard (registries) or a
//! per-shard guard (shards), with a temp-file-and-rename replace so a
//! partial write never becomes visible.

pub mod banks;
pub mod cards;
pub mod document;
pub mod error;
pub mod models;
pub mod shards;
pub mod users;

use pext_config::Config;

pub use banks::BankCatalog;
pub use cards::{CardActivity, CardRegistry};
pub use error::{ErrorCode, ErrorSeverity, StoreError, StoreResult};
pub use models::{
    Account, AccountWithBank, Bank, Card, InsertAccount, InsertCard, InsertTransaction,
    InsertUser, Loan, SavingGoal, ShardData, Transaction, TransactionKind, User, UserPatch,
};
pub use shards::ShardStore;
pub use users::UserRegistry;

/// Facade owning the four document stores
pub struct Store {
    banks: BankCatalog,
    users: UserRegistry,
    cards: CardRegistry,
    shards: ShardStore,
}

impl Store {
    /// Open every document store under the configured data directory
    pub fn open(config: &Config) -> StoreResult<Self> {
        let banks = BankCatalog::open(config.banks_path())?;
        let users = UserRegistry::open(config.registry_path(), config.defaults.currency.clone())?;
        let cards = CardRegistry::open(config.cards_path())?;
        let shards = ShardStore::open(config.users_dir())?;

        log::info!(
            "Store opened: {} users, {} banks, {} shards",
            users.len(),
            banks.list().len(),
            shards.user_ids().len()
        );

        Ok(Self {
            banks,
            users,
            cards,
            shards,
        })
    }

    pub fn banks(&self) -> &BankCatalog {
        &self.banks
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    pub fn cards(&self) -> &CardRegistry {
        &self.cards
    }

    pub fn shards(&self) -> &ShardStore {
        &self.shards
    }

    /// Create a user and their (empty) shard. Write paths for accounts and
    /// transactions require the shard to exist, so it is created here
    /// rather than lazily by reads.
    pub fn create_user(&self, insert: InsertUser) -> StoreResult<User> {
        let user = self.users.create(insert)?;
        self.shards.ensure_shard(user.id)?;
        Ok(user)
    }

    /// Card transactions with the recomputed due sum (see
    /// `CardRegistry::transactions_and_due`)
    pub fn card_transactions(&self, card_id: i64) -> CardActivity {
        self.cards.transactions_and_due(card_id, &self.shards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.path = dir.path().to_path_buf();
        config
    }

    #[test]
    fn test_create_user_materializes_empty_shard() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&test_config(&dir)).unwrap();
        store.banks().seed().unwrap();

        let insert = InsertUser {
            password: "secret".to_string(),
            full_name: "Jane Doe".to_string(),
            mobile: Some("5550001".to_string()),
            ..Default::default()
        };
        let user = store.create_user(insert).unwrap();

        assert!(store.shards().has_shard(user.id));
        // the shard is empty but write paths now work
        let account = store
            .shards()
            .create_account(
                InsertAccount {
                    user_id: user.id,
                    bank_id: 1,
                    account_number: "XXXX0001".to_string(),
                    account_type: "savings".to_string(),
                    balance: None,
                    is_linked: None,
                    loan_amount: None,
                    loan_paid: None,
                },
                store.banks(),
            )
            .unwrap();
        assert_eq!(account.account.user_id, user.id);
    }

    #[test]
    fn test_store_reopen_preserves_state() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let user_id;
        {
            let store = Store::open(&config).unwrap();
            store.banks().seed().unwrap();
            let user = store
                .create_user(InsertUser {
                    password: "secret".to_string(),
                    full_name: "Jane Doe".to_string(),
                    ..Default::default()
                })
                .unwrap();
            user_id = user.id;
        }

        let store = Store::open(&config).unwrap();
        assert!(store.users().get_by_id(user_id).is_some());
        assert!(store.banks().list().len() == 10);
        assert!(store.shards().has_shard(user_id));
    }
}
