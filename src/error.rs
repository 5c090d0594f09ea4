use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not found")]
    NotFound,

    #[error("Already in this room")]
    AlreadyInThisRoom,

    #[error("Already in another room")]
    AlreadyInAnotherRoom,

    #[error("Not in room")]
    NotInRoom,

    #[error("Task must not be empty")]
    InvalidTask,

    #[error("Room name must not be empty")]
    InvalidName,

    #[error("Duration must be a positive number of minutes")]
    InvalidDuration,

    #[error("User already exists with this email")]
    EmailTaken,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Database error")]
    Database(#[from] mongodb::error::Error),

    #[error("Password hashing failed")]
    Hash(#[from] bcrypt::BcryptError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotAuthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::AlreadyInThisRoom
            | AppError::AlreadyInAnotherRoom
            | AppError::NotInRoom => StatusCode::CONFLICT,
            AppError::InvalidTask
            | AppError::InvalidName
            | AppError::InvalidDuration
            | AppError::EmailTaken => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Database(err) => tracing::error!("database error: {err}"),
            AppError::Hash(err) => tracing::error!("bcrypt error: {err}"),
            _ => {}
        }

        (
            self.status(),
            Json(json!({ "success": false, "message": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_conflicts_map_to_conflict_status() {
        assert_eq!(AppError::AlreadyInThisRoom.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::AlreadyInAnotherRoom.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotInRoom.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn auth_failures_are_unauthorized() {
        assert_eq!(AppError::NotAuthenticated.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn missing_room_is_not_found() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
    }
}
