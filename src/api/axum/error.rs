use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::TeamError;
use crate::api::ErrorResponse;

/// converts `TeamError` into appropriate HTTP responses
#[derive(Debug)]
pub struct AppError(pub TeamError);

impl From<TeamError> for AppError {
    fn from(err: TeamError) -> Self {
        Self(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TeamError::Validation(_) | TeamError::TokenInvalid => StatusCode::BAD_REQUEST,
            TeamError::Unauthenticated => StatusCode::UNAUTHORIZED,
            TeamError::Forbidden => StatusCode::FORBIDDEN,
            TeamError::TeamNotFound | TeamError::VerificationNotFound | TeamError::NotFound => {
                StatusCode::NOT_FOUND
            }
            TeamError::Conflict(_) | TeamError::UserAlreadyExists => StatusCode::CONFLICT,
            TeamError::DatabaseError(_) => StatusCode::SERVICE_UNAVAILABLE,
            TeamError::PasswordHashError | TeamError::Notification(_) | TeamError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError(TeamError::Forbidden).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError(TeamError::TeamNotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError(TeamError::VerificationNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError(TeamError::Conflict("taken".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError(TeamError::DatabaseError("timeout".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError(TeamError::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
