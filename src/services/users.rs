use crate::{
    cache::Cache,
    error::{Error, Result},
    models::users::{
        AuthResult, CreateUser, CreatedUser, LoginResult, LoginUser, NewUser, UpdateUser, User,
        UserChanges,
    },
    queries::Store,
    services::jwt::{strip_bearer, JwtKeys, LoginClaims},
    validation,
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Cache key of a user looked up by email
pub fn email_cache_key(email: &str) -> String {
    format!("user:email:{}", email.trim().to_lowercase())
}

/// Cache key of a user looked up by id
pub fn id_cache_key(id: &str) -> String {
    format!("user:id:{}", id)
}

/// Hashes a password with Argon2 and a fresh random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verifies a password against a password hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| Error::Internal(format!("Invalid password hash: {}", e)))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Creates a user with a hashed password
pub async fn create_user(store: &dyn Store, body: CreateUser) -> Result<CreatedUser> {
    validation::validate_create_user(&body)?;

    let new_user = NewUser {
        email: body.email.trim().to_string(),
        password_hash: hash_password(&body.password)?,
        name: body.name.trim().to_string(),
        phone: body.phone,
        address: body.address,
        deposit: body.deposit,
        user_type: body.user_type,
    };

    let user = store.create_user(new_user).await?;
    tracing::info!(user_id = %user.id, user_type = %user.user_type, "User created");

    Ok(CreatedUser { user_id: user.id })
}

/// Active, non-admin users
pub async fn get_all_users(store: &dyn Store) -> Result<Vec<User>> {
    store.list_users().await
}

pub async fn get_single_user(store: &dyn Store, id: &str) -> Result<User> {
    store
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| Error::NoUserFound(format!("No user found with id {}", id)))
}

/// Applies a partial update and drops any cached copy of the user.
///
/// A new password is hashed before it reaches the store.
pub async fn update_user(
    store: &dyn Store,
    cache: &Cache<User>,
    id: &str,
    body: UpdateUser,
) -> Result<User> {
    validation::validate_update_user(&body)?;
    let existing = get_single_user(store, id).await?;

    let password_hash = match body.password.as_deref() {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };
    let changes = UserChanges {
        email: body.email.map(|email| email.trim().to_string()),
        password_hash,
        name: body.name.map(|name| name.trim().to_string()),
        phone: body.phone,
        address: body.address,
        deposit: body.deposit,
        user_type: body.user_type,
        active: body.active,
    };

    let updated = store
        .update_user(id, changes)
        .await?
        .ok_or_else(|| Error::NoUserFound(format!("No user found with id {}", id)))?;

    forget_user(cache, &existing).await?;
    forget_user(cache, &updated).await?;

    Ok(updated)
}

/// Soft delete: the user is deactivated and disappears from listings.
pub async fn delete_user(store: &dyn Store, cache: &Cache<User>, id: &str) -> Result<()> {
    let changes = UserChanges {
        active: Some(false),
        ..UserChanges::default()
    };
    let user = store
        .update_user(id, changes)
        .await?
        .ok_or_else(|| Error::NoUserFound(format!("No user found with id {}", id)))?;

    forget_user(cache, &user).await?;
    tracing::info!(user_id = %user.id, "User deactivated");

    Ok(())
}

/// Verifies a bearer token issued by `login`
///
/// # Arguments
/// * `keys` - Verification keys
/// * `token` - The token, with or without a `Bearer ` prefix
///
/// # Returns
/// The user id in the token, or `Error::Unauthorized("Authentication Failed")`
pub fn auth(keys: &JwtKeys, token: Option<&str>) -> Result<AuthResult> {
    let unauthorized = || Error::Unauthorized("Authentication Failed".to_string());

    let token = token.and_then(strip_bearer).ok_or_else(unauthorized)?;
    let claims = keys
        .verify::<LoginClaims>(token)
        .valid()
        .ok_or_else(unauthorized)?;

    Ok(AuthResult { user_id: claims.sub })
}

/// Checks credentials and signs a login token.
///
/// Unknown email, inactive account and wrong password all produce the same
/// `Error::InvalidCredentials`.
pub async fn login(
    store: &dyn Store,
    cache: &Cache<User>,
    keys: &JwtKeys,
    body: LoginUser,
) -> Result<LoginResult> {
    let user = find_user_by_email_cached(store, cache, &body.email)
        .await?
        .filter(|user| user.active)
        .ok_or(Error::InvalidCredentials)?;

    if !verify_password(&body.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(Error::InvalidCredentials);
    }

    let (token, expire_at) = keys.sign_login_token(&user.id)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(LoginResult {
        user_id: user.id,
        token,
        expire_at,
    })
}

/// Credential check for session login. Returns the user when the password
/// matches, `None` otherwise.
pub async fn validate_password(
    store: &dyn Store,
    email: &str,
    password: &str,
) -> Result<Option<User>> {
    let Some(user) = store.get_user_by_email(email.trim()).await? else {
        return Ok(None);
    };
    if !user.active || !verify_password(password, &user.password_hash)? {
        return Ok(None);
    }

    Ok(Some(user))
}

/// Looks a user up by id through the login cache.
pub async fn find_user_by_id_cached(
    store: &dyn Store,
    cache: &Cache<User>,
    id: &str,
) -> Result<Option<User>> {
    if let Some(user) = cache.get(&id_cache_key(id)).await? {
        return Ok(Some(user));
    }

    let seen = cache.generation().await?;
    let user = store.get_user_by_id(id).await?;
    if let Some(user) = &user {
        remember_user(cache, user, seen).await?;
    }
    Ok(user)
}

async fn find_user_by_email_cached(
    store: &dyn Store,
    cache: &Cache<User>,
    email: &str,
) -> Result<Option<User>> {
    if let Some(user) = cache.get(&email_cache_key(email)).await? {
        return Ok(Some(user));
    }

    let seen = cache.generation().await?;
    let user = store.get_user_by_email(email.trim()).await?;
    if let Some(user) = &user {
        remember_user(cache, user, seen).await?;
    }
    Ok(user)
}

/// Caches a user read from the store, unless the cache was invalidated after
/// `seen` was taken. A read racing an update must not resurrect the old row.
async fn remember_user(cache: &Cache<User>, user: &User, seen: u64) -> Result<()> {
    let entries = vec![
        (email_cache_key(&user.email), user.clone()),
        (id_cache_key(&user.id), user.clone()),
    ];
    if !cache.set_if_generation(entries, seen).await? {
        tracing::debug!(user_id = %user.id, "Skipped caching user invalidated during lookup");
    }
    Ok(())
}

async fn forget_user(cache: &Cache<User>, user: &User) -> Result<()> {
    cache
        .invalidate(&[email_cache_key(&user.email), id_cache_key(&user.id)])
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::CacheConfig,
        models::{new_object_id, users::UserType},
        queries::{MemoryStore, UserStore},
        services::jwt::tests::test_keys,
    };

    fn create_body(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password: "correct-horse".to_string(),
            name: "Kate".to_string(),
            phone: None,
            address: None,
            deposit: None,
            user_type: UserType::Cleaner,
        }
    }

    fn login_body(email: &str, password: &str) -> LoginUser {
        LoginUser {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct-horse").unwrap();
        assert_ne!(hash, "correct-horse");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct-horse", &hash).unwrap());
        assert!(!verify_password("wrong-horse", &hash).unwrap());
        assert_ne!(hash, hash_password("correct-horse").unwrap());
    }

    #[tokio::test]
    async fn test_created_user_password_is_hashed() {
        let store = MemoryStore::new();
        let created = create_user(&store, create_body("kate@example.com")).await.unwrap();

        let user = store.get_user_by_id(&created.user_id).await.unwrap().unwrap();
        assert_ne!(user.password_hash, "correct-horse");
        assert!(verify_password("correct-horse", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_account_already_exists() {
        let store = MemoryStore::new();
        create_user(&store, create_body("kate@example.com")).await.unwrap();

        let err = create_user(&store, create_body("Kate@Example.com")).await.unwrap_err();
        assert!(matches!(err, Error::AccountAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_login_success_and_uniform_failures() {
        let store = MemoryStore::new();
        let cache = Cache::new_local(CacheConfig::default());
        let keys = test_keys();
        let created = create_user(&store, create_body("kate@example.com")).await.unwrap();

        let result = login(&store, &cache, &keys, login_body("kate@example.com", "correct-horse"))
            .await
            .unwrap();
        assert_eq!(result.user_id, created.user_id);
        assert_eq!(result.token.split('.').count(), 3);
        assert!(result.expire_at > chrono::Utc::now());

        let wrong_password = login(&store, &cache, &keys, login_body("kate@example.com", "nope-nope"))
            .await
            .unwrap_err();
        let unknown_email = login(&store, &cache, &keys, login_body("ghost@example.com", "correct-horse"))
            .await
            .unwrap_err();
        assert!(matches!(wrong_password, Error::InvalidCredentials));
        assert!(matches!(unknown_email, Error::InvalidCredentials));
        assert_eq!(
            wrong_password.to_response_body().error.message,
            unknown_email.to_response_body().error.message
        );
    }

    #[tokio::test]
    async fn test_password_change_invalidates_login_cache() {
        let store = MemoryStore::new();
        let cache = Cache::new_local(CacheConfig::default());
        let keys = test_keys();
        let created = create_user(&store, create_body("kate@example.com")).await.unwrap();

        // Warm the cache
        login(&store, &cache, &keys, login_body("kate@example.com", "correct-horse"))
            .await
            .unwrap();
        assert!(cache.get(&email_cache_key("kate@example.com")).await.unwrap().is_some());

        let update = UpdateUser {
            password: Some("battery-staple".to_string()),
            ..UpdateUser::default()
        };
        let updated = update_user(&store, &cache, &created.user_id, update).await.unwrap();
        assert!(!verify_password("correct-horse", &updated.password_hash).unwrap());
        assert!(cache.get(&email_cache_key("kate@example.com")).await.unwrap().is_none());

        let old = login(&store, &cache, &keys, login_body("kate@example.com", "correct-horse")).await;
        assert!(matches!(old, Err(Error::InvalidCredentials)));
        login(&store, &cache, &keys, login_body("kate@example.com", "battery-staple"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_lookup_racing_an_update_does_not_cache_stale_user() {
        let store = MemoryStore::new();
        let cache = Cache::new_local(CacheConfig::default());
        let keys = test_keys();
        let created = create_user(&store, create_body("kate@example.com")).await.unwrap();

        // A login lookup reads the row, then an update lands before it caches
        let seen = cache.generation().await.unwrap();
        let stale = store.get_user_by_email("kate@example.com").await.unwrap().unwrap();
        let update = UpdateUser {
            password: Some("battery-staple".to_string()),
            ..UpdateUser::default()
        };
        update_user(&store, &cache, &created.user_id, update).await.unwrap();
        remember_user(&cache, &stale, seen).await.unwrap();

        assert!(cache.get(&email_cache_key("kate@example.com")).await.unwrap().is_none());
        assert!(cache.get(&id_cache_key(&created.user_id)).await.unwrap().is_none());
        let old = login(&store, &cache, &keys, login_body("kate@example.com", "correct-horse")).await;
        assert!(matches!(old, Err(Error::InvalidCredentials)));
        login(&store, &cache, &keys, login_body("kate@example.com", "battery-staple"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_is_soft_and_blocks_login() {
        let store = MemoryStore::new();
        let cache = Cache::new_local(CacheConfig::default());
        let keys = test_keys();
        let created = create_user(&store, create_body("kate@example.com")).await.unwrap();

        delete_user(&store, &cache, &created.user_id).await.unwrap();

        assert!(get_all_users(&store).await.unwrap().is_empty());
        let user = get_single_user(&store, &created.user_id).await.unwrap();
        assert!(!user.active);

        let result = login(&store, &cache, &keys, login_body("kate@example.com", "correct-horse")).await;
        assert!(matches!(result, Err(Error::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_missing_user() {
        let store = MemoryStore::new();
        let cache = Cache::new_local(CacheConfig::default());
        let id = new_object_id();

        assert!(matches!(get_single_user(&store, &id).await, Err(Error::NoUserFound(_))));
        assert!(matches!(
            update_user(&store, &cache, &id, UpdateUser::default()).await,
            Err(Error::NoUserFound(_))
        ));
        assert!(matches!(delete_user(&store, &cache, &id).await, Err(Error::NoUserFound(_))));
    }

    #[test]
    fn test_auth() {
        let keys = test_keys();
        let (token, _) = keys.sign_login_token("65f1a2b3c4d5e6f7a8b9c0d1").unwrap();

        let bearer = format!("Bearer {}", token);
        assert_eq!(auth(&keys, Some(&bearer)).unwrap().user_id, "65f1a2b3c4d5e6f7a8b9c0d1");
        assert_eq!(auth(&keys, Some(&token)).unwrap().user_id, "65f1a2b3c4d5e6f7a8b9c0d1");

        let err = auth(&keys, Some("Bearer garbage")).unwrap_err();
        assert!(matches!(&err, Error::Unauthorized(msg) if msg == "Authentication Failed"));
        assert!(auth(&keys, None).is_err());
    }

    #[tokio::test]
    async fn test_validate_password() {
        let store = MemoryStore::new();
        create_user(&store, create_body("kate@example.com")).await.unwrap();

        let user = validate_password(&store, "kate@example.com", "correct-horse")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.email, "kate@example.com");
        assert!(validate_password(&store, "kate@example.com", "wrong-horse").await.unwrap().is_none());
        assert!(validate_password(&store, "ghost@example.com", "correct-horse").await.unwrap().is_none());
    }
}
