//! User registry
//!
//! Global collection of user records backed by one shared document. One
//! mutex guards the in-memory collection and its full-file rewrite, so a
//! create or update is atomic with respect to other registry writers.

use crate::document;
use crate::error::{StoreError, StoreResult};
use crate::models::{InsertUser, User, UserPatch};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Mutex;

struct RegistryInner {
    users: Vec<User>,
    next_id: i64,
}

/// Document-backed user registry
pub struct UserRegistry {
    path: PathBuf,
    default_currency: String,
    inner: Mutex<RegistryInner>,
}

impl UserRegistry {
    /// Open the registry, loading the persisted document if present. The
    /// id counter starts past the largest id already on disk so restarts
    /// never reuse ids.
    pub fn open(path: PathBuf, default_currency: String) -> StoreResult<Self> {
        let users: Vec<User> = document::read_document(&path)?.unwrap_or_default();
        let next_id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        Ok(Self {
            path,
            default_currency,
            inner: Mutex::new(RegistryInner { users, next_id }),
        })
    }

    /// Lookup by id
    pub fn get_by_id(&self, id: i64) -> Option<User> {
        let inner = self.inner.lock().unwrap();
        inner.users.iter().find(|u| u.id == id).cloned()
    }

    /// Lookup by username
    pub fn get_by_username(&self, username: &str) -> Option<User> {
        let inner = self.inner.lock().unwrap();
        inner.users.iter().find(|u| u.username == username).cloned()
    }

    /// Lookup by mobile number
    pub fn get_by_mobile(&self, mobile: &str) -> Option<User> {
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .iter()
            .find(|u| u.mobile.as_deref() == Some(mobile))
            .cloned()
    }

    /// Snapshot of all users
    pub fn list(&self) -> Vec<User> {
        self.inner.lock().unwrap().users.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().users.is_empty()
    }

    /// Create a user and durably persist the registry before returning.
    ///
    /// Fails with `DuplicateMobile` when the mobile number is already
    /// registered; the registry is left unchanged on any failure.
    pub fn create(&self, insert: InsertUser) -> StoreResult<User> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(ref mobile) = insert.mobile {
            if inner.users.iter().any(|u| u.mobile.as_deref() == Some(mobile)) {
                return Err(StoreError::DuplicateMobile {
                    mobile: mobile.clone(),
                });
            }
        }

        let id = inner.next_id;
        let username = insert
            .username
            .unwrap_or_else(|| User::derive_username(&insert.full_name, id));

        let user = User {
            id,
            username,
            password: insert.password,
            full_name: insert.full_name,
            email: insert.email,
            mobile: insert.mobile,
            city: insert.city,
            country: insert.country,
            monthly_budget: insert.monthly_budget,
            currency: insert.currency.unwrap_or_else(|| self.default_currency.clone()),
            app_pin: insert.app_pin,
            fingerprint_enabled: insert.fingerprint_enabled.unwrap_or(false),
            is_profile_complete: insert.is_profile_complete.unwrap_or(false),
            created_at: Utc::now(),
        };

        inner.users.push(user.clone());
        if let Err(e) = document::write_document(&self.path, &inner.users) {
            inner.users.pop();
            return Err(e);
        }
        inner.next_id += 1;

        Ok(user)
    }

    /// Merge a partial update over an existing user and persist. The id is
    /// never overwritten.
    pub fn update(&self, id: i64, patch: UserPatch) -> StoreResult<User> {
        let mut inner = self.inner.lock().unwrap();

        let index = inner
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or(StoreError::UserNotFound { id })?;

        let previous = inner.users[index].clone();
        {
            let user = &mut inner.users[index];
            if let Some(password) = patch.password {
                user.password = password;
            }
            if let Some(full_name) = patch.full_name {
                user.full_name = full_name;
            }
            if let Some(username) = patch.username {
                user.username = username;
            }
            if let Some(email) = patch.email {
                user.email = Some(email);
            }
            if let Some(mobile) = patch.mobile {
                user.mobile = Some(mobile);
            }
            if let Some(city) = patch.city {
                user.city = Some(city);
            }
            if let Some(country) = patch.country {
                user.country = Some(country);
            }
            if let Some(monthly_budget) = patch.monthly_budget {
                user.monthly_budget = Some(monthly_budget);
            }
            if let Some(currency) = patch.currency {
                user.currency = currency;
            }
            if let Some(app_pin) = patch.app_pin {
                user.app_pin = Some(app_pin);
            }
            if let Some(fingerprint_enabled) = patch.fingerprint_enabled {
                user.fingerprint_enabled = fingerprint_enabled;
            }
            if let Some(is_profile_complete) = patch.is_profile_complete {
                user.is_profile_complete = is_profile_complete;
            }
        }

        if let Err(e) = document::write_document(&self.path, &inner.users) {
            inner.users[index] = previous;
            return Err(e);
        }

        Ok(inner.users[index].clone())
    }

    /// Install externally-assigned user records (the seed dataset keeps its
    /// own ids). Only applies to an empty registry; a non-empty registry is
    /// left untouched and 0 is reported.
    pub fn adopt_seed_users(&self, users: Vec<User>) -> StoreResult<usize> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.users.is_empty() {
            return Ok(0);
        }

        document::write_document(&self.path, &users)?;
        inner.next_id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let count = users.len();
        inner.users = users;

        Ok(count)
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::TempDir;

    fn registry(dir: &TempDir) -> UserRegistry {
        UserRegistry::open(dir.path().join("userData.json"), "USD".to_string()).unwrap()
    }

    fn insert(full_name: &str, mobile: Option<&str>) -> InsertUser {
        InsertUser {
            password: "secret".to_string(),
            full_name: full_name.to_string(),
            mobile: mobile.map(|m| m.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_applies_defaults() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        let user = registry.create(insert("Jane Doe", Some("5550001"))).unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.username, "Jane_Doe");
        assert_eq!(user.currency, "USD");
        assert!(!user.fingerprint_enabled);
        assert!(!user.is_profile_complete);
        assert!(user.monthly_budget.is_none());
    }

    #[test]
    fn test_duplicate_mobile_rejected_and_registry_unchanged() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        registry.create(insert("Jane Doe", Some("5550001"))).unwrap();
        let err = registry.create(insert("John Roe", Some("5550001"))).unwrap_err();

        assert_eq!(err.code(), ErrorCode::DuplicateMobile);
        assert_eq!(registry.len(), 1);
        assert!(registry.get_by_username("John_Roe").is_none());
    }

    #[test]
    fn test_users_without_mobile_never_collide() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        registry.create(insert("Jane Doe", None)).unwrap();
        assert!(registry.create(insert("John Roe", None)).is_ok());
    }

    #[test]
    fn test_lookups() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let user = registry.create(insert("Jane Doe", Some("5550001"))).unwrap();

        assert_eq!(registry.get_by_id(user.id).unwrap().id, user.id);
        assert_eq!(registry.get_by_username("Jane_Doe").unwrap().id, user.id);
        assert_eq!(registry.get_by_mobile("5550001").unwrap().id, user.id);
        assert!(registry.get_by_id(42).is_none());
        assert!(registry.get_by_mobile("000").is_none());
    }

    #[test]
    fn test_update_merges_and_preserves_id() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let user = registry.create(insert("Jane Doe", Some("5550001"))).unwrap();

        let patch = UserPatch {
            city: Some("Lisbon".to_string()),
            monthly_budget: Some("1500".to_string()),
            ..Default::default()
        };
        let updated = registry.update(user.id, patch).unwrap();

        assert_eq!(updated.id, user.id);
        assert_eq!(updated.city.as_deref(), Some("Lisbon"));
        assert_eq!(updated.monthly_budget.as_deref(), Some("1500"));
        // untouched fields survive
        assert_eq!(updated.mobile.as_deref(), Some("5550001"));
    }

    #[test]
    fn test_update_unknown_id_fails() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);
        let err = registry.update(99, UserPatch::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::UserNotFound);
    }

    #[test]
    fn test_registry_survives_reopen_without_reusing_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("userData.json");
        {
            let registry = UserRegistry::open(path.clone(), "USD".to_string()).unwrap();
            registry.create(insert("Jane Doe", Some("5550001"))).unwrap();
            registry.create(insert("John Roe", Some("5550002"))).unwrap();
        }

        let reopened = UserRegistry::open(path, "USD".to_string()).unwrap();
        assert_eq!(reopened.len(), 2);
        let third = reopened.create(insert("Ana Silva", Some("5550003"))).unwrap();
        assert_eq!(third.id, 3);
    }

    #[test]
    fn test_adopt_seed_users_only_when_empty() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        let seeded = vec![User {
            id: 7,
            username: "Demo_User".to_string(),
            password: "demo".to_string(),
            full_name: "Demo User".to_string(),
            email: None,
            mobile: Some("5559999".to_string()),
            city: None,
            country: None,
            monthly_budget: None,
            currency: "USD".to_string(),
            app_pin: None,
            fingerprint_enabled: false,
            is_profile_complete: false,
            created_at: Utc::now(),
        }];

        assert_eq!(registry.adopt_seed_users(seeded.clone()).unwrap(), 1);
        // id counter starts past the adopted ids
        let next = registry.create(insert("Jane Doe", Some("5550001"))).unwrap();
        assert_eq!(next.id, 8);
        // a second adoption is a no-op
        assert_eq!(registry.adopt_seed_users(seeded).unwrap(), 0);
        assert_eq!(registry.len(), 2);
    }
}
