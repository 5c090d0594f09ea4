mod api;
mod config;
mod db;
mod error;
mod models;
mod rewards;
mod utils;
mod ws;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use dotenv::dotenv;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::{
    api::{auth::auth_router, presence::presence_router, room::room_router, user::user_router},
    config::Config,
    db::connection::Database,
    ws::AppState,
};

#[derive(Clone)]
pub struct SharedState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub ws_state: Arc<AppState>,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Arc::new(Config::load());

    let db = Arc::new(
        Database::init()
            .await
            .expect("❌ Failed to connect to MongoDB"),
    );
    db.ensure_indexes()
        .await
        .expect("❌ Failed to create indexes");

    let user_sockets = Arc::new(Mutex::new(HashMap::new()));
    let sockets = Arc::new(Mutex::new(HashMap::new()));

    let app_state = Arc::new(AppState {
        user_sockets,
        sockets,
    });

    let shared_state = SharedState {
        db: db.clone(),
        config: config.clone(),
        ws_state: app_state,
    };

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .allowed_origin
                .parse::<HeaderValue>()
                .expect("Invalid ALLOWED_ORIGIN"),
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let app = Router::new()
        .nest("/auth", auth_router())
        .nest("/room", room_router())
        .nest("/presence", presence_router())
        .nest("/user", user_router())
        .route("/ws", get(ws::handler))
        .layer(CookieManagerLayer::new())
        .layer(cors)
        .with_state(shared_state);

    let addr = format!("127.0.0.1:{}", config.port);
    info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
