use axum::{
    routing::post, Router, extract::State, response::{IntoResponse, Json}, http::StatusCode,
};
use mongodb::bson::oid::ObjectId;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use tower_cookies::{Cookie, Cookies};

use crate::{
    SharedState,
    db::connection::Database,
    error::AppError,
    models::user_model::{Identity, LoginUser, RegisterUser, User},
    utils::{
        bcrypt::{hash_password, verify_password},
        jwt::{generate_access_token, generate_refresh_token, verify_refresh_token},
    },
};

const REFRESH_COOKIE: &str = "refresh_token";

fn refresh_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(REFRESH_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie
}

async fn register(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterUser>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    if Database::find_user_by_email(db.clone(), &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::EmailTaken);
    }

    let hashed_password = hash_password(&payload.password)?;

    let new_user = User {
        _id: Some(ObjectId::new()),
        name: payload.name.clone(),
        xp: 0,
        avatar_url: None,
        identity: Identity::Registered {
            email: payload.email.clone(),
            password: hashed_password,
        },
    };

    Database::create_user(db, &new_user).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "User registered successfully." })),
    ))
}

async fn login(
    State(state): State<SharedState>,
    cookies: Cookies,
    Json(payload): Json<LoginUser>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let user = Database::find_user_by_email(db, &payload.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let Identity::Registered { ref password, .. } = user.identity else {
        return Err(AppError::InvalidCredentials);
    };

    if let Ok(false) | Err(_) = verify_password(&payload.password, password) {
        return Err(AppError::InvalidCredentials);
    }

    let user_id = user._id.expect("User id not found in DB.").to_hex();
    let access_token = generate_access_token(&user_id, &user.name);
    cookies.add(refresh_cookie(generate_refresh_token(&user_id)));

    Ok(Json(json!({
        "success": true,
        "message": "User logged in successfully.",
        "access_token": access_token,
        "user": { "id": user_id, "name": user.name, "xp": user.xp, "is_anonymous": false },
    })))
}

// Ephemeral identity: can join rooms and show up in presence, never earns XP.
async fn guest(
    State(state): State<SharedState>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let name = format!("guest-{}", rand::thread_rng().gen_range(1000..9999));

    let new_user = User {
        _id: Some(ObjectId::new()),
        name: name.clone(),
        xp: 0,
        avatar_url: None,
        identity: Identity::Guest,
    };

    Database::create_user(db, &new_user).await?;

    let user_id = new_user._id.expect("User id not found in DB.").to_hex();
    let access_token = generate_access_token(&user_id, &name);
    cookies.add(refresh_cookie(generate_refresh_token(&user_id)));

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Signed in as guest.",
            "access_token": access_token,
            "user": { "id": user_id, "name": name, "xp": 0, "is_anonymous": true },
        })),
    ))
}

async fn refresh(
    State(state): State<SharedState>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let token = cookies
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AppError::NotAuthenticated)?;

    let claims = verify_refresh_token(&token).ok_or(AppError::NotAuthenticated)?;
    let user_id = ObjectId::parse_str(&claims.sub).map_err(|_| AppError::NotAuthenticated)?;

    let user = Database::get_user_by_id(db, user_id)
        .await?
        .ok_or(AppError::NotAuthenticated)?;

    let access_token = generate_access_token(&claims.sub, &user.name);

    Ok(Json(json!({ "success": true, "access_token": access_token })))
}

pub fn auth_router() -> Router<SharedState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/guest", post(guest))
        .route("/refresh", post(refresh))
}
