use lazy_static::lazy_static;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{SignupForm, Upload},
        password::{hash_password, verify_password},
        repo_types::NewUser,
        sessions::{generate_session_token, hash_session_token},
        validation::{check_credentials_shape, validate_signup},
    },
    error::AppError,
    images::services::save_profile_picture,
    state::AppState,
};

/// Validate the form, store the optional picture, then insert the user.
/// A picture stored for a signup that does not go through is deleted again.
pub async fn register_user(
    st: &AppState,
    form: SignupForm,
    picture: Option<Upload>,
) -> Result<Uuid, AppError> {
    let valid = validate_signup(form)?;

    if st.users.find_by_username(&valid.username).await?.is_some() {
        warn!(username = %valid.username, "username already registered");
        return Err(AppError::DuplicateUsername);
    }

    let password_hash = hash_password(&valid.password)?;

    let profile_picture = match picture {
        Some(upload) => Some(save_profile_picture(st, upload).await?),
        None => None,
    };

    let new_user = NewUser {
        username: valid.username,
        password_hash,
        name: valid.name,
        age: valid.age,
        gender: valid.gender,
        dob: valid.dob,
        profile_picture: profile_picture.clone(),
    };

    match st.users.register(new_user).await {
        Ok(id) => {
            info!(user_id = %id, "user registered");
            Ok(id)
        }
        Err(e) => {
            if let Some(key) = profile_picture {
                if let Err(del) = st.storage.delete_object(&key).await {
                    warn!(error = %del, %key, "failed to remove orphaned picture");
                }
            }
            Err(e)
        }
    }
}

lazy_static! {
    /// Verified against when the username is unknown, so that path costs a
    /// full argon2 run like a wrong password does.
    static ref DUMMY_HASH: Option<String> = hash_password("no-such-user-password").ok();
}

/// Returns a fresh session token. Unknown usernames and wrong passwords both
/// end in [`AppError::InvalidCredentials`] after the same hashing work.
pub async fn login(st: &AppState, username: &str, password: &str) -> Result<String, AppError> {
    check_credentials_shape(username, password)?;

    let Some(user) = st.users.find_by_username(username).await? else {
        if let Some(dummy) = DUMMY_HASH.as_deref() {
            let _ = verify_password(password, dummy);
        }
        warn!(%username, "login unknown username");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = generate_session_token()?;
    st.sessions
        .insert(&hash_session_token(&token), user.id)
        .await?;

    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

pub async fn require_session(st: &AppState, token: &str) -> Result<Uuid, AppError> {
    match st.sessions.lookup(&hash_session_token(token)).await? {
        Some(user_id) => {
            debug!(%user_id, "session resolved");
            Ok(user_id)
        }
        None => Err(AppError::Unauthenticated),
    }
}

pub async fn logout(st: &AppState, token: &str) -> Result<(), AppError> {
    st.sessions.delete(&hash_session_token(token)).await?;
    Ok(())
}

#[cfg(test)]
mod auth_service_tests {
    use std::sync::Arc;
    use std::time::Instant;

    use bytes::Bytes;

    use super::*;
    use crate::auth::{repo::UserStore, repo_types::User};
    use crate::state::memory::MemoryStorage;

    fn form(username: &str, password: &str) -> SignupForm {
        SignupForm {
            username: username.into(),
            password: password.into(),
            name: "Test User".into(),
            age: "42".into(),
            gender: "other".into(),
            dob: "1982-11-30".into(),
        }
    }

    fn png(name: &str) -> Upload {
        Upload {
            filename: name.into(),
            body: Bytes::from_static(b"fake-png"),
        }
    }

    #[tokio::test]
    async fn duplicate_username_fails_second_time() {
        let st = AppState::fake();
        register_user(&st, form("carol", "pass1234"), None)
            .await
            .expect("first signup");
        let err = register_user(&st, form("carol", "different"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));
    }

    #[tokio::test]
    async fn login_succeeds_only_with_matching_password() {
        let st = AppState::fake();
        register_user(&st, form("dave", "s3cret"), None).await.unwrap();

        assert!(login(&st, "dave", "s3cret").await.is_ok());
        assert!(matches!(
            login(&st, "dave", "s3cre7").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&st, "nobody", "s3cret").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn session_lives_until_logout() {
        let st = AppState::fake();
        let id = register_user(&st, form("erin", "letmein"), None).await.unwrap();

        let token = login(&st, "erin", "letmein").await.unwrap();
        assert_eq!(require_session(&st, &token).await.unwrap(), id);
        assert_eq!(require_session(&st, &token).await.unwrap(), id);

        logout(&st, &token).await.unwrap();
        assert!(matches!(
            require_session(&st, &token).await,
            Err(AppError::Unauthenticated)
        ));
        // logging out twice is harmless
        logout(&st, &token).await.unwrap();
    }

    #[tokio::test]
    async fn each_login_gets_its_own_session() {
        let st = AppState::fake();
        let id = register_user(&st, form("frank", "hunter2x"), None).await.unwrap();

        let a = login(&st, "frank", "hunter2x").await.unwrap();
        let b = login(&st, "frank", "hunter2x").await.unwrap();
        assert_ne!(a, b);

        logout(&st, &a).await.unwrap();
        assert!(require_session(&st, &a).await.is_err());
        assert_eq!(require_session(&st, &b).await.unwrap(), id);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthenticated() {
        let st = AppState::fake();
        assert!(matches!(
            require_session(&st, "made-up").await,
            Err(AppError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn signup_with_picture_records_key() {
        let storage = Arc::new(MemoryStorage::default());
        let st = AppState::fake_with_storage(storage.clone());
        register_user(&st, form("grace", "hopper1"), Some(png("grace.JPEG")))
            .await
            .unwrap();

        let user = st.users.find_by_username("grace").await.unwrap().unwrap();
        let key = user.profile_picture.expect("picture key");
        assert!(key.ends_with(".jpeg"));
        assert_eq!(storage.keys().await, vec![key]);
    }

    #[tokio::test]
    async fn signup_with_disallowed_picture_creates_nothing() {
        let storage = Arc::new(MemoryStorage::default());
        let st = AppState::fake_with_storage(storage.clone());
        let err = register_user(&st, form("heidi", "pass1234"), Some(png("heidi.bmp")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(st.users.find_by_username("heidi").await.unwrap().is_none());
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn duplicate_signup_does_not_store_picture() {
        let storage = Arc::new(MemoryStorage::default());
        let st = AppState::fake_with_storage(storage.clone());
        register_user(&st, form("ivan", "pass1234"), None).await.unwrap();
        let err = register_user(&st, form("ivan", "pass1234"), Some(png("ivan.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));
        assert!(storage.is_empty().await);
    }

    /// Passes the username pre-check, then loses the insert as if another
    /// signup took the name in between.
    struct RacingUserStore;

    #[axum::async_trait]
    impl UserStore for RacingUserStore {
        async fn register(&self, _user: NewUser) -> Result<Uuid, AppError> {
            Err(AppError::DuplicateUsername)
        }
        async fn find_by_username(&self, _username: &str) -> anyhow::Result<Option<User>> {
            Ok(None)
        }
        async fn find_by_id(&self, _id: Uuid) -> anyhow::Result<Option<User>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn picture_removed_when_insert_loses_race() {
        let storage = Arc::new(MemoryStorage::default());
        let mut st = AppState::fake_with_storage(storage.clone());
        st.users = Arc::new(RacingUserStore);

        let err = register_user(&st, form("judy", "pass1234"), Some(png("judy.gif")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_username_costs_as_much_as_wrong_password() {
        let st = AppState::fake();
        register_user(&st, form("kate", "pass1234"), None).await.unwrap();

        // warm both paths, including the dummy hash initialization
        let _ = login(&st, "kate", "wrongpass").await;
        let _ = login(&st, "nobody", "wrongpass").await;

        let started = Instant::now();
        for _ in 0..3 {
            assert!(matches!(
                login(&st, "kate", "wrongpass").await,
                Err(AppError::InvalidCredentials)
            ));
        }
        let wrong_password = started.elapsed();

        let started = Instant::now();
        for _ in 0..3 {
            assert!(matches!(
                login(&st, "nobody", "wrongpass").await,
                Err(AppError::InvalidCredentials)
            ));
        }
        let unknown_user = started.elapsed();

        assert!(
            unknown_user * 5 >= wrong_password,
            "unknown user {unknown_user:?} vs wrong password {wrong_password:?}"
        );
    }

    #[tokio::test]
    async fn malformed_login_is_a_validation_error() {
        let st = AppState::fake();
        assert!(matches!(
            login(&st, "ab", "whatever").await,
            Err(AppError::Validation(_))
        ));
    }
}
