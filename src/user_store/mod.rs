/// User Record Store
///
/// Owns the durable representation of every user record. The whole record
/// set is loaded for each operation and rewritten on each mutation.

pub mod json_file;
pub mod models;

pub use json_file::JsonFileBackend;
pub use models::*;

use crate::error::{DirectoryError, DirectoryResult};
use async_trait::async_trait;
use std::ops::Range;

/// User record backend trait
///
/// Implementations re-read their durable state on every call; nothing is
/// cached between operations.
#[async_trait]
pub trait UserBackend: Send + Sync {
    /// Load the full record set
    async fn list_all(&self) -> DirectoryResult<Vec<User>>;

    /// Insert or replace a record keyed by its identifier
    async fn upsert(&self, input: UserInput) -> DirectoryResult<User>;

    /// Remove a record; returns whether it existed
    async fn delete(&self, id: UserId) -> DirectoryResult<bool>;

    /// Find a record by scanning the full set
    async fn get_by_id(&self, id: UserId) -> DirectoryResult<Option<User>> {
        let users = self.list_all().await?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    /// Slice one 1-indexed page out of the full set
    async fn list_page(&self, page_num: i64, page_size: i64) -> DirectoryResult<UserPage> {
        let users = self.list_all().await?;
        let total_count = users.len();
        let bounds = page_bounds(page_num, page_size, total_count);
        Ok(UserPage {
            records: users[bounds].to_vec(),
            total_count,
        })
    }
}

/// Index range of a page over `len` records
///
/// Covers `[(page_num - 1) * page_size, (page_num - 1) * page_size + page_size)`
/// clamped into the set, so out-of-range pages come back empty or partial.
pub fn page_bounds(page_num: i64, page_size: i64, len: usize) -> Range<usize> {
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let start = page_num.saturating_sub(1).saturating_mul(page_size);
    let end = start.saturating_add(page_size);

    let start = start.clamp(0, len) as usize;
    let end = end.clamp(0, len) as usize;
    if end <= start {
        start..start
    } else {
        start..end
    }
}

/// Identifier for a new record
///
/// Equal to the record count while ids are dense; never reuses an id that
/// is still present after deletions. Fails once the largest id in use is
/// `UserId::MAX`.
pub fn next_id(users: &[User]) -> DirectoryResult<UserId> {
    let count = users.len() as UserId;
    match users.iter().map(|u| u.id).max() {
        None => Ok(count),
        Some(max_id) => max_id
            .checked_add(1)
            .map(|after_max| after_max.max(count))
            .ok_or_else(|| {
                DirectoryError::Conflict("No user identifiers left to assign".to_string())
            }),
    }
}

/// Apply an upsert to an in-memory record set
///
/// A matching `id` replaces that record in place; anything else is appended
/// under a freshly assigned identifier.
pub fn apply_upsert(users: &mut Vec<User>, input: UserInput) -> DirectoryResult<User> {
    let existing = input
        .id
        .and_then(|id| users.iter().position(|u| u.id == id));

    match existing {
        Some(position) => {
            let id = users[position].id;
            let user = input.into_user(id);
            users[position] = user.clone();
            Ok(user)
        }
        None => {
            let user = input.into_user(next_id(users)?);
            users.push(user.clone());
            Ok(user)
        }
    }
}

/// Remove the record with `id`; returns whether one was found
pub fn apply_delete(users: &mut Vec<User>, id: UserId) -> bool {
    match users.iter().position(|u| u.id == id) {
        Some(position) => {
            users.remove(position);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn user(id: UserId) -> User {
        User {
            id,
            name: format!("user-{}", id),
            email: None,
            avatar: None,
        }
    }

    fn input(name: &str) -> UserInput {
        UserInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_page_bounds_first_and_last_page() {
        assert_eq!(page_bounds(1, 10, 25), 0..10);
        assert_eq!(page_bounds(2, 10, 25), 10..20);
        assert_eq!(page_bounds(3, 10, 25), 20..25);
    }

    #[test]
    fn test_page_bounds_out_of_range() {
        assert!(page_bounds(4, 10, 25).is_empty());
        assert!(page_bounds(0, 10, 25).is_empty());
        assert!(page_bounds(-3, 10, 25).is_empty());
        assert!(page_bounds(1, 0, 25).is_empty());
        assert!(page_bounds(1, -5, 25).is_empty());
        assert!(page_bounds(1, 10, 0).is_empty());
    }

    #[test]
    fn test_page_bounds_does_not_overflow() {
        assert!(page_bounds(i64::MAX, i64::MAX, 5).is_empty());
        assert_eq!(page_bounds(1, i64::MAX, 5), 0..5);
    }

    #[test]
    fn test_sequential_assignment() {
        let mut users = Vec::new();
        for i in 0..5 {
            let stored = apply_upsert(&mut users, input(&format!("n{}", i))).unwrap();
            assert_eq!(stored.id, i);
        }
        let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_id_is_treated_as_new() {
        let mut users = vec![user(0), user(1)];
        let stored = apply_upsert(
            &mut users,
            UserInput {
                id: Some(42),
                name: "fresh".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(stored.id, 2);
        assert_eq!(users.len(), 3);
    }

    #[test]
    fn test_replace_keeps_position_and_count() {
        let mut users = vec![user(0), user(1), user(2)];
        let stored = apply_upsert(
            &mut users,
            UserInput {
                id: Some(1),
                name: "renamed".to_string(),
                email: Some("r@example.com".to_string()),
                avatar: None,
            },
        )
        .unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(users.len(), 3);
        assert_eq!(users[1].name, "renamed");
        assert_eq!(users[1].email.as_deref(), Some("r@example.com"));
    }

    #[test]
    fn test_delete_matches_id_not_position() {
        let mut users = vec![user(4), user(7), user(9)];
        assert!(apply_delete(&mut users, 9));
        assert!(!apply_delete(&mut users, 1));
        let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![4, 7]);
    }

    #[test]
    fn test_next_id_after_deletions_stays_unique() {
        let mut users = vec![user(0), user(1), user(2)];
        apply_delete(&mut users, 0);
        let stored = apply_upsert(&mut users, input("late")).unwrap();
        assert_eq!(stored.id, 3);

        let mut users = vec![user(5), user(1), user(6)];
        apply_delete(&mut users, 1);
        apply_upsert(&mut users, input("a")).unwrap();
        apply_upsert(&mut users, input("b")).unwrap();

        let ids: HashSet<UserId> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids.len(), users.len());
    }

    #[test]
    fn test_next_id_fails_when_identifiers_are_exhausted() {
        let mut users = vec![user(UserId::MAX)];

        assert!(matches!(next_id(&users), Err(DirectoryError::Conflict(_))));
        assert!(matches!(
            apply_upsert(&mut users, input("overflow")),
            Err(DirectoryError::Conflict(_))
        ));
        assert_eq!(users.len(), 1);

        // Replacing the existing record still works
        let replaced = apply_upsert(
            &mut users,
            UserInput {
                id: Some(UserId::MAX),
                name: "kept".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(replaced.id, UserId::MAX);
    }
}
