/// Per-user upload gate
use crate::{
    error::{DirectoryError, DirectoryResult},
    user_store::UserId,
};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

/// Admits at most one in-flight avatar upload per user
///
/// Uploads for different users never wait on each other.
#[derive(Debug, Clone, Default)]
pub struct UploadGate {
    in_flight: Arc<Mutex<HashSet<UserId>>>,
}

/// Held for the duration of one upload; releases the user's slot on drop
#[derive(Debug)]
pub struct UploadPermit {
    user_id: UserId,
    in_flight: Arc<Mutex<HashSet<UserId>>>,
}

impl UploadGate {
    /// Create an empty gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the upload slot for `user_id`
    ///
    /// Fails with `Conflict` while another upload for the same user is running.
    pub fn try_acquire(&self, user_id: UserId) -> DirectoryResult<UploadPermit> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(user_id) {
            tracing::warn!(user_id, "rejected overlapping avatar upload");
            return Err(DirectoryError::Conflict(
                "Concurrent uploads not allowed".to_string(),
            ));
        }

        Ok(UploadPermit {
            user_id,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

}

impl Drop for UploadPermit {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_user_is_rejected_while_busy() {
        let gate = UploadGate::new();
        let permit = gate.try_acquire(1).unwrap();

        assert!(matches!(gate.try_acquire(1), Err(DirectoryError::Conflict(_))));

        drop(permit);
        assert!(gate.try_acquire(1).is_ok());
    }

    #[test]
    fn test_different_users_proceed_independently() {
        let gate = UploadGate::new();
        let _first = gate.try_acquire(1).unwrap();
        let _second = gate.try_acquire(2).unwrap();

        assert!(gate.try_acquire(1).is_err());
        assert!(gate.try_acquire(2).is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let gate = UploadGate::new();
        let other = gate.clone();
        let _permit = gate.try_acquire(5).unwrap();

        assert!(other.try_acquire(5).is_err());
    }
}
