use async_trait::async_trait;

use crate::application::errors::StorageError;
use crate::application::services::GroupDirectory;
use crate::domain::entities::User;
use crate::domain::traits::Membership;

/// Membership backed by the configured admin allow-list and stored groups
#[derive(Clone)]
pub struct Permissions {
    admins: Vec<String>,
    groups: GroupDirectory,
}

impl Permissions {
    pub fn new<I, S>(admins: I, groups: GroupDirectory) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admins: admins
                .into_iter()
                .map(|email| email.as_ref().trim().to_lowercase())
                .filter(|email| !email.is_empty())
                .collect(),
            groups,
        }
    }

    pub fn admins(&self) -> &[String] {
        &self.admins
    }

    pub fn groups(&self) -> &GroupDirectory {
        &self.groups
    }
}

#[async_trait]
impl Membership for Permissions {
    fn is_global_admin(&self, user: &User) -> bool {
        self.admins.contains(&user.normalized_email())
    }

    async fn is_member(&self, group: &str, user: &User) -> Result<bool, StorageError> {
        self.groups.group(group).lookup(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::{EnvelopeCipher, MemoryStore, Storage};
    use std::sync::Arc;

    fn permissions(admins: &[&str]) -> Permissions {
        let storage = Storage::new(Arc::new(MemoryStore::new()), EnvelopeCipher::from_secret(Some("t")));
        Permissions::new(admins.iter().copied(), GroupDirectory::new(Arc::new(storage)))
    }

    #[tokio::test]
    async fn test_global_admin_is_case_insensitive() {
        let perms = permissions(&[" Root@Example.com ", ""]);
        assert_eq!(perms.admins(), ["root@example.com".to_string()]);
        assert!(perms.is_global_admin(&User::new("1", "ROOT@example.com")));
        assert!(!perms.is_global_admin(&User::new("2", "bob@example.com")));
    }

    #[tokio::test]
    async fn test_group_membership_reads_storage() {
        let perms = permissions(&[]);
        let bob = User::new("2", "bob@example.com");
        assert!(!perms.is_member("ops", &bob).await.unwrap());

        perms.groups().group("ops").add(&bob).await.unwrap();
        assert!(perms.is_member("ops", &bob).await.unwrap());
    }
}
