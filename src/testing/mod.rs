//! Test doubles for the sharing core.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::sharing::store::{SharingStore, StoreError};
use crate::sharing::AccessGrant;

#[derive(Default, Clone)]
struct ProfileState {
    preferences: Value,
    shared_access_to: Option<Uuid>,
}

/// In-memory [`SharingStore`] with the same upsert/recovery semantics as the
/// Postgres implementation. `fail_next` arms a one-shot backend failure for
/// fail-closed tests.
#[derive(Default)]
pub struct MemorySharingStore {
    grants: Mutex<Vec<AccessGrant>>,
    profiles: Mutex<HashMap<Uuid, ProfileState>>,
    fail_message: Mutex<Option<String>>,
}

impl MemorySharingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next store call fail with `Unavailable`.
    pub fn fail_next(&self, message: &str) {
        *self.fail_message.lock().unwrap() = Some(message.to_string());
    }

    /// Seed a raw (possibly non-object) preference value, bypassing the
    /// typed write path, to exercise malformed-state recovery.
    pub fn seed_raw_preferences(&self, user_id: Uuid, raw: Value) {
        let mut profiles = self.profiles.lock().unwrap();
        profiles.entry(user_id).or_default().preferences = raw;
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        match self.fail_message.lock().unwrap().take() {
            Some(message) => Err(StoreError::Unavailable(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SharingStore for MemorySharingStore {
    async fn grants_for_owner(&self, owner_id: Uuid) -> Result<Vec<AccessGrant>, StoreError> {
        self.take_failure()?;
        let grants = self.grants.lock().unwrap();
        Ok(grants.iter().filter(|g| g.owner_id == owner_id).cloned().collect())
    }

    async fn upsert_grant(&self, grant: &AccessGrant) -> Result<AccessGrant, StoreError> {
        self.take_failure()?;
        let mut grants = self.grants.lock().unwrap();
        if let Some(existing) = grants
            .iter_mut()
            .find(|g| g.owner_id == grant.owner_id && g.email == grant.email)
        {
            existing.access_level = grant.access_level;
            existing.granted_at = grant.granted_at;
            return Ok(existing.clone());
        }
        grants.push(grant.clone());
        Ok(grant.clone())
    }

    async fn delete_grant(&self, owner_id: Uuid, email: &str) -> Result<Option<AccessGrant>, StoreError> {
        self.take_failure()?;
        let mut grants = self.grants.lock().unwrap();
        let position = grants.iter().position(|g| g.owner_id == owner_id && g.email == email);
        Ok(position.map(|i| grants.remove(i)))
    }

    async fn pending_grants_for_email(&self, email: &str) -> Result<Vec<AccessGrant>, StoreError> {
        self.take_failure()?;
        let grants = self.grants.lock().unwrap();
        Ok(grants
            .iter()
            .filter(|g| g.email == email && g.principal_id.is_none())
            .cloned()
            .collect())
    }

    async fn resolve_grant(&self, owner_id: Uuid, email: &str, principal_id: Uuid) -> Result<(), StoreError> {
        self.take_failure()?;
        let mut grants = self.grants.lock().unwrap();
        if let Some(grant) = grants
            .iter_mut()
            .find(|g| g.owner_id == owner_id && g.email == email && g.principal_id.is_none())
        {
            grant.principal_id = Some(principal_id);
        }
        Ok(())
    }

    async fn grant_for_principal(&self, owner_id: Uuid, principal_id: Uuid) -> Result<Option<AccessGrant>, StoreError> {
        self.take_failure()?;
        let grants = self.grants.lock().unwrap();
        Ok(grants
            .iter()
            .find(|g| g.owner_id == owner_id && g.principal_id == Some(principal_id))
            .cloned())
    }

    async fn email_has_any_grant(&self, email: &str) -> Result<bool, StoreError> {
        self.take_failure()?;
        let grants = self.grants.lock().unwrap();
        Ok(grants.iter().any(|g| g.email == email))
    }

    async fn set_delegation_pointer(&self, principal_id: Uuid, owner_id: Uuid) -> Result<(), StoreError> {
        self.take_failure()?;
        let mut profiles = self.profiles.lock().unwrap();
        profiles.entry(principal_id).or_default().shared_access_to = Some(owner_id);
        Ok(())
    }

    async fn clear_delegation_pointer(&self, principal_id: Uuid, owner_id: Uuid) -> Result<(), StoreError> {
        self.take_failure()?;
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(profile) = profiles.get_mut(&principal_id) {
            if profile.shared_access_to == Some(owner_id) {
                profile.shared_access_to = None;
            }
        }
        Ok(())
    }

    async fn delegation_pointer(&self, principal_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        self.take_failure()?;
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.get(&principal_id).and_then(|p| p.shared_access_to))
    }

    async fn profile_preferences(&self, user_id: Uuid) -> Result<Map<String, Value>, StoreError> {
        self.take_failure()?;
        let profiles = self.profiles.lock().unwrap();
        match profiles.get(&user_id).map(|p| p.preferences.clone()) {
            Some(Value::Object(map)) => Ok(map),
            // Malformed bag reads as empty, mirroring the Postgres store
            Some(_) | None => Ok(Map::new()),
        }
    }

    async fn put_profile_preferences(&self, user_id: Uuid, prefs: &Map<String, Value>) -> Result<(), StoreError> {
        self.take_failure()?;
        let mut profiles = self.profiles.lock().unwrap();
        profiles.entry(user_id).or_default().preferences = Value::Object(prefs.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn absent_profile_reads_as_empty_preferences() {
        let store = MemorySharingStore::new();
        let prefs = store.profile_preferences(Uuid::new_v4()).await.unwrap();
        assert!(prefs.is_empty());
    }

    #[tokio::test]
    async fn preferences_round_trip() {
        let store = MemorySharingStore::new();
        let user = Uuid::new_v4();

        let mut prefs = Map::new();
        prefs.insert("theme".to_string(), json!("dark"));
        store.put_profile_preferences(user, &prefs).await.unwrap();

        let read = store.profile_preferences(user).await.unwrap();
        assert_eq!(read.get("theme"), Some(&json!("dark")));
    }

    #[tokio::test]
    async fn malformed_preference_bag_reads_as_empty_not_error() {
        let store = MemorySharingStore::new();
        let user = Uuid::new_v4();

        store.seed_raw_preferences(user, json!("not an object"));
        let prefs = store.profile_preferences(user).await.unwrap();
        assert!(prefs.is_empty());
    }
}
