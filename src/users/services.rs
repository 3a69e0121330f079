use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest, TokenResponse},
    repo::{InsertError, UserRepo},
    repo_types::{NewUser, ProfileChanges, User},
};
use crate::{
    auth::{hash_password, verify_password, JwtKeys},
    error::ServiceError,
};

pub async fn create_user(repo: &dyn UserRepo, req: RegisterRequest) -> Result<User, ServiceError> {
    if repo.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ServiceError::Conflict);
    }

    let hashed_password = hash_password(&req.password)?;
    let user = repo
        .insert(NewUser {
            email: req.email,
            name: req.name,
            hashed_password,
            bio: req.bio,
            avatar_url: req.avatar_url,
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration.
            InsertError::DuplicateEmail => ServiceError::Conflict,
            InsertError::Other(e) => ServiceError::Internal(e),
        })?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// `None` for an unknown email and for a wrong password alike.
pub async fn authenticate_user(
    repo: &dyn UserRepo,
    email: &str,
    password: &str,
) -> Result<Option<User>, ServiceError> {
    let Some(user) = repo.find_by_email(email).await? else {
        return Ok(None);
    };
    if !verify_password(password, &user.hashed_password)? {
        return Ok(None);
    }
    Ok(Some(user))
}

pub async fn login_user(
    repo: &dyn UserRepo,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<TokenResponse, ServiceError> {
    let Some(user) = authenticate_user(repo, &req.email, &req.password).await? else {
        warn!(email = %req.email, "login rejected");
        return Err(ServiceError::Unauthorized);
    };

    let access_token = keys.create_access_token(&user.email)?;
    info!(user_id = user.id, "user logged in");
    Ok(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    })
}

pub async fn get_user(repo: &dyn UserRepo, id: i64) -> Result<Option<User>, ServiceError> {
    Ok(repo.find_by_id(id).await?)
}

pub async fn update_user(
    repo: &dyn UserRepo,
    id: i64,
    changes: ProfileChanges,
) -> Result<Option<User>, ServiceError> {
    let user = repo.update_profile(id, changes).await?;
    if user.is_some() {
        info!(user_id = id, "profile updated");
    }
    Ok(user)
}

pub async fn delete_user(repo: &dyn UserRepo, id: i64) -> Result<bool, ServiceError> {
    let deleted = repo.delete(id).await?;
    if deleted {
        info!(user_id = id, "user deleted");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, users::memory::MemoryUserRepo};

    fn register(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            name: "A".into(),
            password: password.into(),
            bio: None,
            avatar_url: None,
        }
    }

    fn keys() -> JwtKeys {
        JwtKeys::from(&AppConfig::for_tests().jwt)
    }

    #[tokio::test]
    async fn create_user_stores_hash_not_plaintext() {
        let repo = MemoryUserRepo::new();
        let user = create_user(&repo, register("a@x.com", "p")).await.unwrap();
        assert_ne!(user.hashed_password, "p");
        assert!(verify_password("p", &user.hashed_password).unwrap());
    }

    #[tokio::test]
    async fn create_user_twice_conflicts() {
        let repo = MemoryUserRepo::new();
        create_user(&repo, register("a@x.com", "p")).await.unwrap();
        let err = create_user(&repo, register("a@x.com", "q")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict));
    }

    #[tokio::test]
    async fn authenticate_returns_none_for_both_failure_cases() {
        let repo = MemoryUserRepo::new();
        create_user(&repo, register("a@x.com", "right")).await.unwrap();
        assert!(authenticate_user(&repo, "a@x.com", "wrong").await.unwrap().is_none());
        assert!(authenticate_user(&repo, "b@x.com", "right").await.unwrap().is_none());
        assert!(authenticate_user(&repo, "a@x.com", "right").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn login_issues_token_keyed_on_email() {
        let repo = MemoryUserRepo::new();
        create_user(&repo, register("a@x.com", "right")).await.unwrap();
        let keys = keys();
        let res = login_user(
            &repo,
            &keys,
            LoginRequest {
                email: "a@x.com".into(),
                password: "right".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(res.token_type, "bearer");
        assert_eq!(keys.verify(&res.access_token).unwrap().sub, "a@x.com");

        let err = login_user(
            &repo,
            &keys,
            LoginRequest {
                email: "a@x.com".into(),
                password: "wrong".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
    }

    #[tokio::test]
    async fn missing_ids_are_absent() {
        let repo = MemoryUserRepo::new();
        assert!(get_user(&repo, 7).await.unwrap().is_none());
        assert!(!delete_user(&repo, 7).await.unwrap());
        let changes = ProfileChanges {
            name: "B".into(),
            bio: None,
            avatar_url: None,
        };
        assert!(update_user(&repo, 7, changes).await.unwrap().is_none());
    }
}
