use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::AppError;
use super::routes::AppState;
use crate::TeamError;

/// Maps a bearer token to the id of the signed-in user.
///
/// Sessions belong to the host application; covenant only needs the actor id.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// `Ok(None)` for unknown or expired sessions.
    async fn resolve(&self, token: &str) -> Result<Option<i64>, TeamError>;
}

/// The user id behind the request's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedActor(pub i64);

impl AuthenticatedActor {
    pub fn id(&self) -> i64 {
        self.0
    }
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
}

impl<S, M, R> FromRequestParts<AppState<S, M, R>> for AuthenticatedActor
where
    S: Clone + Send + Sync + 'static,
    M: Clone + Send + Sync + 'static,
    R: SessionResolver + Clone + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, M, R>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            extract_bearer_token(&parts.headers).ok_or(AppError(TeamError::Unauthenticated))?;

        let actor_id = state
            .sessions
            .resolve(&token)
            .await
            .map_err(AppError)?
            .ok_or(AppError(TeamError::Unauthenticated))?;

        Ok(AuthenticatedActor(actor_id))
    }
}

#[cfg(any(test, feature = "mocks"))]
mod mock {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::SessionResolver;
    use crate::TeamError;

    /// In-memory token to user id map.
    #[derive(Debug, Clone, Default)]
    pub struct MockSessionResolver {
        sessions: Arc<Mutex<HashMap<String, i64>>>,
    }

    impl MockSessionResolver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_session(self, token: &str, user_id: i64) -> Self {
            self.insert(token, user_id);
            self
        }

        pub fn insert(&self, token: &str, user_id: i64) {
            if let Ok(mut sessions) = self.sessions.lock() {
                sessions.insert(token.to_owned(), user_id);
            }
        }
    }

    #[async_trait]
    impl SessionResolver for MockSessionResolver {
        async fn resolve(&self, token: &str) -> Result<Option<i64>, TeamError> {
            let sessions = self
                .sessions
                .lock()
                .map_err(|e| TeamError::Internal(e.to_string()))?;
            Ok(sessions.get(token).copied())
        }
    }
}

#[cfg(any(test, feature = "mocks"))]
pub use mock::MockSessionResolver;

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer session-1"));
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("session-1"));
    }

    #[tokio::test]
    async fn test_mock_resolver() {
        let resolver = MockSessionResolver::new().with_session("session-1", 4);

        assert_eq!(resolver.resolve("session-1").await.unwrap(), Some(4));
        assert_eq!(resolver.resolve("other").await.unwrap(), None);
    }
}
