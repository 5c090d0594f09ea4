use axum::{
    routing::{get, post}, Router, extract::State, response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::{
    SharedState,
    db::connection::Database,
    error::AppError,
    rewards,
    utils::jwt::AuthUser,
    ws,
};

#[derive(Debug, Deserialize)]
struct HeartbeatRequest {
    name: String,
}

async fn heartbeat(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<HeartbeatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let now_ms = Utc::now().timestamp_millis();
    Database::heartbeat(db, user_id, &payload.name, now_ms).await?;

    ws::broadcast(&state.ws_state, ws::PRESENCE_UPDATED).await;

    Ok(Json(json!({ "success": true })))
}

async fn online(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let now_ms = Utc::now().timestamp_millis();
    let window_ms = state.config.presence_window_ms;

    let users: Vec<_> = Database::list_online(db)
        .await?
        .into_iter()
        .filter(|u| u.is_fresh(now_ms, window_ms))
        .map(|u| {
            json!({
                "user_id": u.user_id.to_hex(),
                "name": u.name,
                "last_seen_ms": u.last_seen_ms,
            })
        })
        .collect();

    Ok(Json(json!({ "success": true, "online": users })))
}

// Same listing, joined with the user directory for XP, level and avatar.
async fn online_with_xp(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let now_ms = Utc::now().timestamp_millis();
    let window_ms = state.config.presence_window_ms;

    let fresh: Vec<_> = Database::list_online(db.clone())
        .await?
        .into_iter()
        .filter(|u| u.is_fresh(now_ms, window_ms))
        .collect();

    let mut users = Vec::with_capacity(fresh.len());
    for record in fresh {
        let user = Database::get_user_by_id(db.clone(), record.user_id).await?;

        let (xp, is_anonymous, avatar_url) = match &user {
            Some(user) => (user.xp, user.is_guest(), user.avatar_url.clone()),
            None => (0, true, None),
        };
        let level = if is_anonymous {
            None
        } else {
            Some(rewards::level_for_xp(xp, state.config.xp_per_level))
        };

        users.push(json!({
            "user_id": record.user_id.to_hex(),
            "name": record.name,
            "xp": xp,
            "level": level,
            "is_anonymous": is_anonymous,
            "avatar_url": avatar_url,
        }));
    }

    Ok(Json(json!({ "success": true, "online": users })))
}

pub fn presence_router() -> Router<SharedState> {
    Router::new()
        .route("/heartbeat", post(heartbeat))
        .route("/online", get(online))
        .route("/online/xp", get(online_with_xp))
}
