//! Bank catalog
//!
//! Static reference data, seeded once and immutable afterwards. The
//! catalog is kept in memory behind a read lock and persisted as its own
//! document so restarts keep the seeded ids.

use crate::document;
use crate::error::StoreResult;
use crate::models::Bank;
use std::path::PathBuf;
use std::sync::RwLock;

/// The fixed reference list; ids are assigned sequentially from 1 in this
/// order.
const REFERENCE_BANKS: [(&str, &str); 10] = [
    ("Chase", "Landmark"),
    ("Bank of America", "Building2"),
    ("Citi", "Globe"),
    ("Wells Fargo", "Briefcase"),
    ("Goldman Sachs", "TrendingUp"),
    ("HSBC", "Landmark"),
    ("Barclays", "Building"),
    ("Santander", "CreditCard"),
    ("US Bank", "Wallet"),
    ("PNC", "DollarSign"),
];

/// In-memory bank catalog backed by one document
pub struct BankCatalog {
    path: PathBuf,
    banks: RwLock<Vec<Bank>>,
}

impl BankCatalog {
    /// Open the catalog, loading the persisted document if present
    pub fn open(path: PathBuf) -> StoreResult<Self> {
        let banks: Vec<Bank> = document::read_document(&path)?.unwrap_or_default();
        Ok(Self {
            path,
            banks: RwLock::new(banks),
        })
    }

    /// Populate the catalog from the reference list. Idempotent: a second
    /// call with a non-empty catalog changes nothing and reports `false`.
    pub fn seed(&self) -> StoreResult<bool> {
        let mut banks = self.banks.write().unwrap();
        if !banks.is_empty() {
            return Ok(false);
        }

        let seeded: Vec<Bank> = REFERENCE_BANKS
            .iter()
            .enumerate()
            .map(|(index, (name, icon))| Bank {
                id: index as i64 + 1,
                name: name.to_string(),
                icon: Some(icon.to_string()),
            })
            .collect();

        document::write_document(&self.path, &seeded)?;
        *banks = seeded;
        log::info!("Bank catalog seeded with {} banks", banks.len());
        Ok(true)
    }

    /// All banks in seeding order
    pub fn list(&self) -> Vec<Bank> {
        self.banks.read().unwrap().clone()
    }

    /// Lookup by id
    pub fn get(&self, id: i64) -> Option<Bank> {
        self.banks.read().unwrap().iter().find(|b| b.id == id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.read().unwrap().is_empty()
    }
}
