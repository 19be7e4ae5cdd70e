/// User service
///
/// Orchestrates the record store and avatar storage for each use case
use crate::{
    avatar::{filename_from_url, AvatarStore},
    error::{DirectoryError, DirectoryResult},
    metrics,
    user_store::{User, UserBackend, UserId, UserInput, UserPage},
};
use std::sync::Arc;

/// Result of the avatar cleanup that follows an upsert
#[derive(Debug)]
pub enum AvatarCleanup {
    /// The upsert carried no id or no avatar reference
    Skipped,
    /// Stale files were removed from the user's avatar directory
    Pruned { removed: usize },
    /// The record was saved but cleanup failed
    Failed(DirectoryError),
}

/// Outcome of an upsert
///
/// The record mutation and the avatar cleanup are reported separately so a
/// caller can tell a committed record with failed cleanup apart from a
/// failed mutation.
#[derive(Debug)]
pub struct UpsertOutcome {
    pub user: User,
    pub avatar_cleanup: AvatarCleanup,
}

impl UpsertOutcome {
    /// Collapse into the saved record, surfacing a cleanup failure as
    /// `DirectoryError::AvatarCleanup`
    pub fn into_result(self) -> DirectoryResult<User> {
        match self.avatar_cleanup {
            AvatarCleanup::Failed(e) => Err(DirectoryError::AvatarCleanup {
                user_id: self.user.id,
                reason: e.to_string(),
            }),
            _ => Ok(self.user),
        }
    }
}

/// User service
pub struct UserService {
    backend: Arc<dyn UserBackend>,
    avatars: AvatarStore,
}

impl UserService {
    /// Create a new user service
    pub fn new(backend: Arc<dyn UserBackend>, avatars: AvatarStore) -> Self {
        Self { backend, avatars }
    }

    /// Avatar storage used by this service
    pub fn avatars(&self) -> &AvatarStore {
        &self.avatars
    }

    /// List one page of users
    pub async fn get_users(&self, page_num: i64, page_size: i64) -> DirectoryResult<UserPage> {
        let result = self.backend.list_page(page_num, page_size).await;
        metrics::record_store_operation("list", result.is_ok());
        result
    }

    /// Get a user by id
    pub async fn get_user_by_id(&self, id: UserId) -> DirectoryResult<Option<User>> {
        let result = self.backend.get_by_id(id).await;
        metrics::record_store_operation("get", result.is_ok());
        result
    }

    /// Insert or replace a user, then prune stale avatar files
    ///
    /// Pruning only runs when the input carried an id and a non-empty avatar
    /// reference. Everything in the user's avatar directory except the
    /// referenced file is removed.
    pub async fn upsert_user(&self, input: UserInput) -> DirectoryResult<UpsertOutcome> {
        let keep = match (input.id, input.avatar_ref()) {
            (Some(_), Some(avatar)) => Some(filename_from_url(avatar).to_string()),
            _ => None,
        };

        let result = self.backend.upsert(input).await;
        metrics::record_store_operation("upsert", result.is_ok());
        let user = result?;

        let avatar_cleanup = match keep {
            None => AvatarCleanup::Skipped,
            Some(keep) => {
                let dir = self.avatars.user_dir(user.id);
                match self.avatars.prune_others(&dir, &keep).await {
                    Ok(removed) => {
                        metrics::record_avatars_pruned(removed);
                        AvatarCleanup::Pruned { removed }
                    }
                    Err(e) => {
                        tracing::warn!(user_id = user.id, error = %e, "user saved but avatar cleanup failed");
                        AvatarCleanup::Failed(e)
                    }
                }
            }
        };

        Ok(UpsertOutcome {
            user,
            avatar_cleanup,
        })
    }

    /// Delete a user
    ///
    /// Avatar files are left on disk.
    pub async fn delete_user(&self, id: UserId) -> DirectoryResult<()> {
        let result = self.backend.delete(id).await;
        metrics::record_store_operation("delete", result.is_ok());
        if !result? {
            tracing::debug!(user_id = id, "delete requested for unknown user");
        }
        Ok(())
    }

    /// Store an avatar for `user_id` and return its relative URL
    ///
    /// The record store is not touched; callers follow up with an upsert
    /// that sets `avatar` to the returned URL.
    pub async fn upload_avatar(
        &self,
        user_id: UserId,
        data: &[u8],
        original_filename: Option<&str>,
    ) -> DirectoryResult<String> {
        let result = self.avatars.store(user_id, data, original_filename).await;
        metrics::record_avatar_upload(result.as_ref().ok().map(|_| data.len()));
        result
    }
}
