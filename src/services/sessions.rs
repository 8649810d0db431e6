use crate::{
    cache::Cache,
    error::Result,
    models::{
        sessions::{Session, SessionQuery, SessionTokens, SessionUpdate},
        users::User,
    },
    queries::Store,
    services::{
        jwt::{JwtKeys, SessionClaims},
        users::find_user_by_id_cached,
    },
};

/// Opens a new active session for a user.
pub async fn create_session(store: &dyn Store, user_id: &str, user_agent: &str) -> Result<Session> {
    let session = store.create_session(user_id, user_agent).await?;
    tracing::info!(session_id = %session.id, user_id = %user_id, "Session created");
    Ok(session)
}

/// Signs the access and refresh token pair for a freshly created session.
pub fn issue_tokens(keys: &JwtKeys, user: &User, session: &Session) -> Result<SessionTokens> {
    let access = SessionClaims::for_user(user, &session.id, keys.access_token_ttl());
    let refresh = SessionClaims::for_user(user, &session.id, keys.refresh_token_ttl());

    Ok(SessionTokens {
        access_token: Some(keys.sign(&access)?),
        refresh_token: Some(keys.sign(&refresh)?),
    })
}

pub async fn find_sessions(store: &dyn Store, query: SessionQuery) -> Result<Vec<Session>> {
    store.find_sessions(query).await
}

/// Returns how many sessions were updated.
pub async fn update_session(
    store: &dyn Store,
    query: SessionQuery,
    update: SessionUpdate,
) -> Result<u64> {
    let updated = store.update_sessions(query, update).await?;
    tracing::debug!(updated, "Sessions updated");
    Ok(updated)
}

/// Mints a new access token from a refresh token.
///
/// Returns `None` when the refresh token does not verify, names no session,
/// names a session that is missing or invalidated, or belongs to a user that
/// no longer exists.
pub async fn reissue_access_token(
    store: &dyn Store,
    cache: &Cache<User>,
    keys: &JwtKeys,
    refresh_token: &str,
) -> Result<Option<String>> {
    let Some(claims) = keys.verify::<SessionClaims>(refresh_token).valid() else {
        return Ok(None);
    };
    let Some(session_id) = claims.session else {
        return Ok(None);
    };

    let session = match store.get_session(&session_id).await? {
        Some(session) if session.valid => session,
        _ => return Ok(None),
    };

    let Some(user) = find_user_by_id_cached(store, cache, &session.user_id).await? else {
        return Ok(None);
    };
    if !user.active {
        return Ok(None);
    }

    let claims = SessionClaims::for_user(&user, &session.id, keys.access_token_ttl());
    let token = keys.sign(&claims)?;
    tracing::debug!(session_id = %session.id, "Access token reissued");

    Ok(Some(token))
}
