use std::collections::BTreeMap;

use axum::async_trait;
use tokio::sync::Mutex;

use super::{
    repo::{InsertError, UserRepo},
    repo_types::{NewUser, ProfileChanges, User},
};

#[derive(Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<i64, User>,
}

/// In-process store for tests and database-less runs.
/// Ids grow monotonically and are never handed out twice.
#[derive(Default)]
pub struct MemoryUserRepo {
    inner: Mutex<Inner>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.inner.lock().await.rows.get(&id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, InsertError> {
        let mut inner = self.inner.lock().await;
        if inner.rows.values().any(|u| u.email == user.email) {
            return Err(InsertError::DuplicateEmail);
        }
        inner.last_id += 1;
        let row = User {
            id: inner.last_id,
            email: user.email,
            name: user.name,
            hashed_password: user.hashed_password,
            bio: user.bio,
            avatar_url: user.avatar_url,
        };
        inner.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        id: i64,
        changes: ProfileChanges,
    ) -> anyhow::Result<Option<User>> {
        let mut inner = self.inner.lock().await;
        let Some(row) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.name = changes.name;
        row.bio = changes.bio;
        row.avatar_url = changes.avatar_url;
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.inner.lock().await.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            name: "A".into(),
            hashed_password: "hash".into(),
            bio: None,
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let repo = MemoryUserRepo::new();
        repo.insert(new_user("a@x.com")).await.unwrap();
        let err = repo.insert(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, InsertError::DuplicateEmail));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = MemoryUserRepo::new();
        let first = repo.insert(new_user("a@x.com")).await.unwrap();
        assert!(repo.delete(first.id).await.unwrap());
        let second = repo.insert(new_user("a@x.com")).await.unwrap();
        assert!(second.id > first.id);
        assert!(repo.find_by_id(first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_leaves_email_and_hash_alone() {
        let repo = MemoryUserRepo::new();
        let user = repo.insert(new_user("a@x.com")).await.unwrap();
        let updated = repo
            .update_profile(
                user.id,
                ProfileChanges {
                    name: "B".into(),
                    bio: Some("bio".into()),
                    avatar_url: Some("https://img/b.png".into()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.email, "a@x.com");
        assert_eq!(updated.hashed_password, "hash");
        assert_eq!(updated.name, "B");
        assert!(repo
            .update_profile(
                999,
                ProfileChanges {
                    name: "C".into(),
                    bio: None,
                    avatar_url: None
                }
            )
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn delete_unknown_id_is_false() {
        let repo = MemoryUserRepo::new();
        assert!(!repo.delete(42).await.unwrap());
    }
}
