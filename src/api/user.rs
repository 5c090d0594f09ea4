use axum::{
    routing::{get, post}, Router, extract::{Path, State}, response::{IntoResponse, Json},
};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::json;

use crate::{
    SharedState,
    db::connection::Database,
    error::AppError,
    rewards,
    utils::jwt::AuthUser,
};

#[derive(Debug, Deserialize)]
struct AvatarRequest {
    avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct NameRequest {
    name: String,
}

async fn get_profile(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let user_id = ObjectId::parse_str(&user_id).map_err(|_| AppError::NotFound)?;
    let user = Database::get_user_by_id(db, user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let level = if user.is_guest() {
        None
    } else {
        Some(rewards::level_for_xp(user.xp, state.config.xp_per_level))
    };

    Ok(Json(json!({
        "success": true,
        "profile": {
            "id": user_id.to_hex(),
            "name": user.name,
            "xp": user.xp,
            "level": level,
            "is_anonymous": user.is_guest(),
            "avatar_url": user.avatar_url,
        },
    })))
}

async fn update_avatar(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AvatarRequest>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    Database::set_avatar(db, user_id, &payload.avatar_url).await?;

    Ok(Json(json!({ "success": true, "message": "Avatar updated." })))
}

async fn update_name(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<NameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidName);
    }

    Database::set_name(db, user_id, name).await?;

    Ok(Json(json!({ "success": true, "message": "Name updated." })))
}

async fn get_welcome(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let seen = Database::get_preference(db, user_id)
        .await?
        .map(|p| p.has_seen_welcome)
        .unwrap_or(false);

    Ok(Json(json!({ "success": true, "has_seen_welcome": seen })))
}

async fn mark_welcome(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    Database::mark_welcome_seen(db, user_id).await?;

    Ok(Json(json!({ "success": true })))
}

pub fn user_router() -> Router<SharedState> {
    Router::new()
        .route("/profile/{user_id}", get(get_profile))
        .route("/avatar", post(update_avatar))
        .route("/name", post(update_name))
        .route("/welcome", get(get_welcome))
        .route("/welcome/seen", post(mark_welcome))
}
