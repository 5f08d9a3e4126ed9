//! Persisted data models
//!
//! Everything here serializes in camelCase; that is the on-disk document
//! format. The bulk seed dataset uses snake_case field names and is
//! translated in the pext-seed crate before it reaches these types.
//! Monetary amounts are decimal strings; arithmetic goes through
//! `rust_decimal` (see `pext_utils::parse_amount`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==================== Users ====================

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Stored in cleartext, compared by exact equality. Carried over from
    /// the reference behavior; not a credential store.
    pub password: String,
    pub full_name: String,
    pub email: Option<String>,
    /// Unique across the registry when present
    pub mobile: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    /// Decimal string
    pub monthly_budget: Option<String>,
    pub currency: String,
    pub app_pin: Option<String>,
    pub fingerprint_enabled: bool,
    pub is_profile_complete: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Derive a username from a full name: whitespace runs become
    /// underscores, an empty name falls back to `user_<id>`.
    pub fn derive_username(full_name: &str, id: i64) -> String {
        let trimmed = full_name.trim();
        if trimmed.is_empty() {
            return format!("user_{}", id);
        }
        trimmed.split_whitespace().collect::<Vec<_>>().join("_")
    }

    /// Plain equality check; the caller owns the login semantics
    pub fn verify_password(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertUser {
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub monthly_budget: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub app_pin: Option<String>,
    #[serde(default)]
    pub fingerprint_enabled: Option<bool>,
    #[serde(default)]
    pub is_profile_complete: Option<bool>,
}

/// Partial update for a user; `None` fields are left untouched and the id
/// is never overwritten
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub monthly_budget: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub app_pin: Option<String>,
    #[serde(default)]
    pub fingerprint_enabled: Option<bool>,
    #[serde(default)]
    pub is_profile_complete: Option<bool>,
}

// ==================== Banks ====================

/// Bank catalog entry (read-only after seeding)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bank {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
}

// ==================== Accounts ====================

/// A linked bank account, stored inside its owner's shard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub bank_id: i64,
    pub account_number: String,
    /// Free-form: savings, current, loan
    #[serde(rename = "type")]
    pub account_type: String,
    /// Decimal string
    pub balance: String,
    pub is_linked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_paid: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAccount {
    pub user_id: i64,
    pub bank_id: i64,
    pub account_number: String,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub is_linked: Option<bool>,
    #[serde(default)]
    pub loan_amount: Option<String>,
    #[serde(default)]
    pub loan_paid: Option<String>,
}

/// Account joined with its bank catalog entry at read time.
/// The bank half is never persisted with the account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountWithBank {
    #[serde(flatten)]
    pub account: Account,
    pub bank: Option<Bank>,
}

// ==================== Transactions ====================

/// Transaction direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl std::str::FromStr for TransactionKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit" => Ok(TransactionKind::Credit),
            "debit" => Ok(TransactionKind::Debit),
            _ => Err(format!("Invalid transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Credit => write!(f, "credit"),
            TransactionKind::Debit => write!(f, "debit"),
        }
    }
}

/// A transaction, stored in the shard of the user owning the referenced
/// account. The date is set at creation and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    /// Decimal string
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

impl Transaction {
    pub fn is_debit(&self) -> bool {
        self.kind == TransactionKind::Debit
    }

    /// Numeric amount; unparseable strings count as zero
    pub fn amount_value(&self) -> Decimal {
        pext_utils::parse_amount(&self.amount)
    }
}

/// Input for creating a transaction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertTransaction {
    pub account_id: i64,
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// ==================== Saving Goals ====================

/// A saving goal, stored in its owner's shard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingGoal {
    pub id: i64,
    pub user_id: i64,
    /// Decimal string
    pub target_amount: String,
    /// Decimal string
    pub current_amount: String,
    pub editable: bool,
}

// ==================== Loans ====================

/// A loan, stored in its owner's shard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: i64,
    pub user_id: i64,
    pub loan_type: String,
    /// Decimal string
    pub total_amount: String,
    /// Decimal string
    pub emi_amount: String,
    /// Decimal string
    pub remaining_amount: String,
}

// ==================== Cards ====================

/// A payment card, stored in the global card registry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: i64,
    pub user_id: i64,
    pub contact_number: String,
    pub card_account_number: String,
    pub account_type: String,
    /// Decimal string
    pub initial_balance: String,
    pub created_at: DateTime<Utc>,
    /// Cached sum of debit transaction amounts for the owning user.
    /// Advisory only: recomputation on read always wins.
    #[serde(default = "zero_amount")]
    pub due_payments: String,
}

fn zero_amount() -> String {
    "0".to_string()
}

/// Input for creating a card
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertCard {
    pub user_id: i64,
    pub contact_number: String,
    pub card_account_number: String,
    pub account_type: String,
    pub initial_balance: String,
}

// ==================== Shards ====================

/// One user's persisted document: accounts, transactions, saving goals and
/// loans, all owned by the same user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardData {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub saving_goals: Vec<SavingGoal>,
    #[serde(default)]
    pub loans: Vec<Loan>,
}

impl ShardData {
    /// Largest account id present, 0 when empty
    pub fn max_account_id(&self) -> i64 {
        self.accounts.iter().map(|a| a.id).max().unwrap_or(0)
    }

    /// Largest transaction id present, 0 when empty
    pub fn max_transaction_id(&self) -> i64 {
        self.transactions.iter().map(|t| t.id).max().unwrap_or(0)
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_username() {
        assert_eq!(User::derive_username("Jane Doe", 3), "Jane_Doe");
        assert_eq!(User::derive_username("  Ana  Maria Silva ", 3), "Ana_Maria_Silva");
        assert_eq!(User::derive_username("", 7), "user_7");
        assert_eq!(User::derive_username("   ", 9), "user_9");
    }

    #[test]
    fn test_transaction_kind_roundtrip() {
        assert_eq!("debit".parse::<TransactionKind>().unwrap(), TransactionKind::Debit);
        assert_eq!(TransactionKind::Credit.to_string(), "credit");
        assert!("transfer".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_shard_serializes_camel_case() {
        let shard = ShardData::default();
        let json = serde_json::to_string(&shard).unwrap();
        assert!(json.contains("savingGoals"));
        assert!(json.contains("transactions"));
    }

    #[test]
    fn test_account_type_field_name() {
        let account = Account {
            id: 1,
            user_id: 1,
            bank_id: 2,
            account_number: "XXXX1234".to_string(),
            account_type: "savings".to_string(),
            balance: "0".to_string(),
            is_linked: false,
            loan_amount: None,
            loan_paid: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["type"], "savings");
        assert_eq!(json["userId"], 1);
        assert!(json.get("loanAmount").is_none());
    }
}
