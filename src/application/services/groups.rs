//! Stored groups of users, used for permission checks

use std::sync::Arc;

use crate::application::errors::StorageError;
use crate::domain::entities::User;
use crate::infrastructure::storage::Storage;

/// Storage key prefix shared by every group
pub const GROUP_PREFIX: &str = "groups.";

/// A named set of lowercase emails stored under `groups.<name>`.
///
/// Changes are read-modify-write with no locking: two writers touching the
/// same group at once can lose an update.
#[derive(Clone)]
pub struct Group {
    name: String,
    storage: Arc<Storage>,
}

impl Group {
    pub fn new(name: impl Into<String>, storage: Arc<Storage>) -> Self {
        Self {
            name: name.into(),
            storage,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> String {
        format!("{}{}", GROUP_PREFIX, self.name)
    }

    /// Returns false if the user was already a member
    pub async fn add(&self, user: &User) -> Result<bool, StorageError> {
        let mut members = self.members().await?;
        let email = user.normalized_email();
        if members.contains(&email) {
            return Ok(false);
        }

        members.push(email);
        members.sort();
        self.storage.store(&self.key(), &members).await?;
        Ok(true)
    }

    /// Returns false if the user was not a member
    pub async fn remove(&self, user: &User) -> Result<bool, StorageError> {
        let mut members = self.members().await?;
        let email = user.normalized_email();
        if !members.contains(&email) {
            return Ok(false);
        }

        members.retain(|m| *m != email);
        self.storage.store(&self.key(), &members).await?;
        Ok(true)
    }

    /// Sorted, deduplicated member emails. Creates the group empty on first use.
    pub async fn members(&self) -> Result<Vec<String>, StorageError> {
        let key = self.key();
        if !self.storage.key_exists(&key).await? {
            self.storage.store(&key, &Vec::<String>::new()).await?;
        }

        let mut members: Vec<String> = self.storage.load(&key).await?.unwrap_or_default();
        members.sort();
        members.dedup();
        Ok(members)
    }

    pub async fn include(&self, user: &User) -> Result<bool, StorageError> {
        Ok(self.members().await?.contains(&user.normalized_email()))
    }

    /// Membership test that never writes; a missing group has no members
    pub async fn lookup(&self, user: &User) -> Result<bool, StorageError> {
        let members: Option<Vec<String>> = self.storage.load(&self.key()).await?;
        Ok(members.is_some_and(|members| members.contains(&user.normalized_email())))
    }
}

/// Entry point for looking up and enumerating groups
#[derive(Clone)]
pub struct GroupDirectory {
    storage: Arc<Storage>,
}

impl GroupDirectory {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn group(&self, name: &str) -> Group {
        Group::new(name, self.storage.clone())
    }

    /// Names of every stored group, sorted
    pub async fn names(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .storage
            .keys_with_prefix(GROUP_PREFIX)
            .await?
            .into_iter()
            .map(|key| key[GROUP_PREFIX.len()..].to_string())
            .collect())
    }

    /// Groups the user belongs to
    pub async fn memberships(&self, user: &User) -> Result<Vec<String>, StorageError> {
        let mut found = Vec::new();
        for name in self.names().await? {
            if self.group(&name).include(user).await? {
                found.push(name);
            }
        }
        Ok(found)
    }

    /// Delete groups with no members, returning their names
    pub async fn cleanup(&self) -> Result<Vec<String>, StorageError> {
        let mut removed = Vec::new();
        for name in self.names().await? {
            let group = self.group(&name);
            if group.members().await?.is_empty() {
                self.storage.delete(&group.key()).await?;
                removed.push(name);
            }
        }
        Ok(removed)
    }
}
