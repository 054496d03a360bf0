use async_trait::async_trait;
use crate::application::errors::StorageError;
use crate::domain::entities::User;

/// Answers the questions a condition asks when checking permissions
#[async_trait]
pub trait Membership: Send + Sync {
    /// Whether the user is on the configured global admin allow-list
    fn is_global_admin(&self, user: &User) -> bool;

    async fn is_member(&self, group: &str, user: &User) -> Result<bool, StorageError>;
}
