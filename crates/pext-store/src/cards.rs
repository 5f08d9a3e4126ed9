//! Card registry
//!
//! Global collection of payment cards backed by one shared document, with
//! the same single-mutex rewrite discipline as the user registry. The one
//! boundary-crossing operation is `transactions_and_due`, which reads the
//! owning user's shard and refreshes the card's cached due sum as a side
//! effect; callers must not assume pure-read semantics from it.

use crate::document;
use crate::error::StoreResult;
use crate::models::{Card, InsertCard, Transaction};
use crate::shards::ShardStore;
use chrono::Utc;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Mutex;

struct RegistryInner {
    cards: Vec<Card>,
    next_id: i64,
}

/// A card's transactions with the freshly computed due sum
#[derive(Debug, Clone)]
pub struct CardActivity {
    pub transactions: Vec<Transaction>,
    pub due: Decimal,
}

impl CardActivity {
    fn empty() -> Self {
        Self {
            transactions: Vec::new(),
            due: Decimal::ZERO,
        }
    }
}

/// Document-backed card registry
pub struct CardRegistry {
    path: PathBuf,
    inner: Mutex<RegistryInner>,
}

impl CardRegistry {
    /// Open the registry, loading the persisted document if present
    pub fn open(path: PathBuf) -> StoreResult<Self> {
        let cards: Vec<Card> = document::read_document(&path)?.unwrap_or_default();
        let next_id = cards.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        Ok(Self {
            path,
            inner: Mutex::new(RegistryInner { cards, next_id }),
        })
    }

    /// Cards owned by one user
    pub fn list_by_user(&self, user_id: i64) -> Vec<Card> {
        let inner = self.inner.lock().unwrap();
        inner
            .cards
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Create a card and durably persist the registry before returning
    pub fn create(&self, insert: InsertCard) -> StoreResult<Card> {
        let mut inner = self.inner.lock().unwrap();

        let card = Card {
            id: inner.next_id,
            user_id: insert.user_id,
            contact_number: insert.contact_number,
            card_account_number: insert.card_account_number,
            account_type: insert.account_type,
            initial_balance: insert.initial_balance,
            created_at: Utc::now(),
            due_payments: "0".to_string(),
        };

        inner.cards.push(card.clone());
        if let Err(e) = document::write_document(&self.path, &inner.cards) {
            inner.cards.pop();
            return Err(e);
        }
        inner.next_id += 1;

        Ok(card)
    }

    /// Remove a card. Reports whether a record was actually removed; an
    /// unknown id is `false`, not an error.
    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap();

        let before = inner.cards.len();
        inner.cards.retain(|c| c.id != id);
        if inner.cards.len() == before {
            return Ok(false);
        }

        document::write_document(&self.path, &inner.cards)?;
        Ok(true)
    }

    /// Transactions of the card owner's accounts, plus the recomputed due
    /// sum (debit-typed amounts only). The fresh sum is persisted onto the
    /// card as a cache; the returned value always wins over whatever was
    /// stored before. An unknown card id degrades to an empty result.
    pub fn transactions_and_due(&self, card_id: i64, shards: &ShardStore) -> CardActivity {
        let user_id = {
            let inner = self.inner.lock().unwrap();
            match inner.cards.iter().find(|c| c.id == card_id) {
                Some(card) => card.user_id,
                None => return CardActivity::empty(),
            }
        };

        let shard = match shards.read_shard(user_id) {
            Ok(Some(shard)) => shard,
            Ok(None) => return CardActivity::empty(),
            Err(e) => {
                log::error!("Cannot read shard for card {} owner {}: {}", card_id, user_id, e);
                return CardActivity::empty();
            }
        };

        let account_ids: Vec<i64> = shard.accounts.iter().map(|a| a.id).collect();
        let transactions: Vec<Transaction> = shard
            .transactions
            .into_iter()
            .filter(|t| account_ids.contains(&t.account_id))
            .collect();

        let due: Decimal = transactions
            .iter()
            .filter(|t| t.is_debit())
            .map(|t| t.amount_value())
            .sum();

        // refresh the cached due figure; a failed cache write must not
        // fail the read
        let mut inner = self.inner.lock().unwrap();
        if let Some(card) = inner.cards.iter_mut().find(|c| c.id == card_id) {
            card.due_payments = due.to_string();
            if let Err(e) = document::write_document(&self.path, &inner.cards) {
                log::warn!("Cannot persist due payments for card {}: {}", card_id, e);
            }
        }

        CardActivity { transactions, due }
    }
}

// ==================== Tests ====================
