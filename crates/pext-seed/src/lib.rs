//! Seed importer
//!
//! One-time migration step run at process start. Reads the bulk demo
//! dataset, populates the bank catalog and user registry, and fans each
//! user's transactional data out into their shard file. This crate is the
//! translation boundary between the dataset's snake_case external field
//! names and the internal camelCase model; nothing outside it ever sees
//! the external format.
//!
//! Failures here are logged and swallowed: an empty store is a valid
//! starting state, so the importer never aborts startup.

pub mod error;

use chrono::{DateTime, Utc};
use pext_store::{
    Account, Loan, SavingGoal, ShardData, Store, Transaction, TransactionKind, User,
};
use serde::Deserialize;
use std::io;
use std::path::Path;

pub use error::{SeedError, SeedResult};

// ==================== External Dataset Types ====================

/// The bulk seed document, snake_case as shipped
#[derive(Debug, Default, Deserialize)]
pub struct SeedDataset {
    #[serde(default)]
    pub banks: Vec<SeedBank>,
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
    #[serde(default)]
    pub transactions: Vec<SeedTransaction>,
    #[serde(default)]
    pub saving_goals: Vec<SeedGoal>,
    #[serde(default)]
    pub loans: Vec<SeedLoan>,
}

#[derive(Debug, Deserialize)]
pub struct SeedBank {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub user_id: i64,
    pub full_name: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedAccount {
    pub account_id: i64,
    pub user_id: i64,
    pub bank_id: i64,
    pub account_number: String,
    pub current_balance: f64,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedTransaction {
    pub transaction_id: i64,
    pub account_id: i64,
    pub amount: f64,
    pub transaction_type: TransactionKind,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedGoal {
    pub goal_id: i64,
    pub user_id: i64,
    pub target_amount: f64,
    pub current_amount: f64,
    #[serde(default)]
    pub editable: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeedLoan {
    pub loan_id: i64,
    pub user_id: i64,
    pub loan_type: String,
    pub total_amount: f64,
    pub emi_amount: f64,
    pub remaining_amount: f64,
}

// ==================== Translation ====================

/// Map a dataset category code to its display name
pub fn category_name(category_id: Option<i64>) -> &'static str {
    match category_id {
        Some(1) => "Food",
        Some(2) => "Shopping",
        Some(3) => "Travel",
        Some(4) => "Bills",
        Some(5) => "Transfer",
        Some(6) => "Entertainment",
        _ => "Others",
    }
}

/// RFC 3339 parse with a fallback to the import time; the dataset is demo
/// data and a bad timestamp should not sink the record
fn parse_timestamp(value: Option<&str>) -> DateTime<Utc> {
    match value {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| {
                log::warn!("Unparseable seed timestamp {:?}, using import time", s);
                Utc::now()
            }),
        None => Utc::now(),
    }
}

impl SeedDataset {
    /// Internal user records, ids preserved from the dataset
    pub fn users(&self) -> Vec<User> {
        self.users
            .iter()
            .map(|u| User {
                id: u.user_id,
                username: User::derive_username(&u.full_name, u.user_id),
                password: u.password.clone(),
                full_name: u.full_name.clone(),
                email: u.email.clone(),
                mobile: u.mobile_number.clone(),
                city: None,
                country: None,
                monthly_budget: None,
                currency: "USD".to_string(),
                app_pin: None,
                fingerprint_enabled: false,
                is_profile_complete: false,
                created_at: parse_timestamp(u.created_at.as_deref()),
            })
            .collect()
    }

    /// One user's slice of the dataset as a shard document: accounts by
    /// user id, transactions via those accounts, goals and loans by user
    /// id directly.
    pub fn shard_for(&self, user_id: i64) -> ShardData {
        let accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| Account {
                id: a.account_id,
                user_id: a.user_id,
                bank_id: a.bank_id,
                account_number: a.account_number.clone(),
                account_type: "savings".to_string(),
                balance: a.current_balance.to_string(),
                is_linked: true,
                loan_amount: None,
                loan_paid: None,
                created_at: parse_timestamp(a.created_at.as_deref()),
            })
            .collect();

        let account_ids: Vec<i64> = accounts.iter().map(|a| a.id).collect();
        let transactions: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| account_ids.contains(&t.account_id))
            .map(|t| Transaction {
                id: t.transaction_id,
                account_id: t.account_id,
                amount: t.amount.to_string(),
                kind: t.transaction_type,
                category: Some(category_name(t.category_id).to_string()),
                description: t.description.clone(),
                date: parse_timestamp(t.transaction_date.as_deref()),
            })
            .collect();

        let saving_goals: Vec<SavingGoal> = self
            .saving_goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .map(|g| SavingGoal {
                id: g.goal_id,
                user_id: g.user_id,
                target_amount: g.target_amount.to_string(),
                current_amount: g.current_amount.to_string(),
                editable: g.editable,
            })
            .collect();

        let loans: Vec<Loan> = self
            .loans
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| Loan {
                id: l.loan_id,
                user_id: l.user_id,
                loan_type: l.loan_type.clone(),
                total_amount: l.total_amount.to_string(),
                emi_amount: l.emi_amount.to_string(),
                remaining_amount: l.remaining_amount.to_string(),
            })
            .collect();

        ShardData {
            accounts,
            transactions,
            saving_goals,
            loans,
        }
    }
}

// ==================== Importer ====================

/// What the importer actually did, for the startup log
#[derive(Debug, Default, Clone, Copy)]
pub struct SeedReport {
    pub users_adopted: usize,
    pub shards_materialized: usize,
}

/// One-shot demo-data importer
pub struct SeedImporter;

impl SeedImporter {
    /// Read the dataset file. Missing file is `Ok(None)`.
    pub fn load(path: &Path) -> SeedResult<Option<SeedDataset>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let dataset = serde_json::from_str(&content).map_err(|e| SeedError::Malformed {
            message: e.to_string(),
        })?;
        Ok(Some(dataset))
    }

    /// Run the import: seed the bank catalog, bulk-load users into an
    /// empty registry, then materialize a shard for every registry user
    /// lacking one. Every step is non-fatal; whatever partial state was
    /// achieved stands.
    pub fn run(store: &Store, path: &Path) -> SeedReport {
        let mut report = SeedReport::default();

        if let Err(e) = store.banks().seed() {
            log::error!("Bank catalog seeding failed: {}", e);
        }

        let dataset = match Self::load(path) {
            Ok(Some(dataset)) => dataset,
            Ok(None) => {
                log::warn!("Seed dataset not found at {}, skipping import", path.display());
                return report;
            }
            Err(e) => {
                log::error!("Cannot load seed dataset {}: {}", path.display(), e);
                return report;
            }
        };

        if store.users().is_empty() {
            match store.users().adopt_seed_users(dataset.users()) {
                Ok(count) => {
                    report.users_adopted = count;
                    log::info!("Adopted {} seed users into the registry", count);
                }
                Err(e) => log::error!("Seed user adoption failed: {}", e),
            }
        } else {
            log::debug!("User registry already populated, skipping user adoption");
        }

        for user in store.users().list() {
            match store.shards().materialize(user.id, dataset.shard_for(user.id)) {
                Ok(true) => report.shards_materialized += 1,
                Ok(false) => {}
                Err(e) => log::error!("Shard materialization failed for user {}: {}", user.id, e),
            }
        }

        report
    }
}

// ==================== Tests ====================
