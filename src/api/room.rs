use axum::{
    routing::{get, post}, Router, extract::State, response::{IntoResponse, Json}, http::StatusCode,
};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    SharedState,
    db::connection::Database,
    error::AppError,
    models::{
        participant_model::{MembershipConflict, Participant, membership_conflict},
        room_model::{Room, RoomStatus},
    },
    rewards,
    utils::jwt::AuthUser,
    ws,
};

#[derive(Debug, Deserialize)]
struct JoinRequest {
    room_id: String,
    task: String,
    mood: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeaveRequest {
    room_id: String,
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    room_id: String,
    now_playing: String,
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    name: String,
    duration: f64,
}

#[derive(Serialize)]
struct ParticipantView {
    id: String,
    user_id: String,
    task: String,
    mood: Option<String>,
    now_playing: Option<String>,
    joined_at_ms: i64,
}

#[derive(Serialize)]
struct RoomView {
    id: String,
    name: String,
    duration: f64,
    status: RoomStatus,
    perpetual: bool,
    started_at_ms: Option<i64>,
    participants: Vec<ParticipantView>,
}

impl RoomView {
    fn from_parts(room: Room, participants: Vec<Participant>) -> Option<Self> {
        let id = room._id?.to_hex();
        let participants = participants
            .into_iter()
            .filter_map(|p| {
                Some(ParticipantView {
                    id: p._id?.to_hex(),
                    user_id: p.user_id.to_hex(),
                    task: p.task,
                    mood: p.mood,
                    now_playing: p.now_playing,
                    joined_at_ms: p.joined_at_ms,
                })
            })
            .collect();

        Some(RoomView {
            id,
            name: room.name,
            duration: room.duration,
            status: room.status,
            perpetual: room.perpetual,
            started_at_ms: room.started_at_ms,
            participants,
        })
    }
}

fn parse_room_id(room_id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(room_id).map_err(|_| AppError::NotFound)
}

async fn list_rooms(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let rooms = Database::list_rooms(db.clone()).await?;

    // The participant set lives in its own collection; the join happens here.
    let mut views = Vec::with_capacity(rooms.len());
    for room in rooms {
        let Some(room_id) = room._id else { continue };
        let participants = Database::participants_in_room(db.clone(), room_id).await?;
        if let Some(view) = RoomView::from_parts(room, participants) {
            views.push(view);
        }
    }

    Ok(Json(json!({ "success": true, "rooms": views })))
}

async fn join_room(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<JoinRequest>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let task = payload.task.trim().to_string();
    if task.is_empty() {
        return Err(AppError::InvalidTask);
    }

    let room_id = parse_room_id(&payload.room_id)?;
    let room = Database::get_room(db.clone(), room_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let existing = Database::participant_for_user(db.clone(), user_id).await?;
    match membership_conflict(existing.as_ref(), room_id) {
        Some(MembershipConflict::SameRoom) => return Err(AppError::AlreadyInThisRoom),
        Some(MembershipConflict::OtherRoom) => return Err(AppError::AlreadyInAnotherRoom),
        None => {}
    }

    let now_ms = Utc::now().timestamp_millis();
    let participant = Participant {
        _id: Some(ObjectId::new()),
        user_id,
        room_id,
        task,
        mood: payload.mood,
        now_playing: None,
        joined_at_ms: now_ms,
    };

    if let Err(err) = Database::insert_participant(db.clone(), &participant).await {
        // Lost a race with a concurrent join by the same user; re-read to
        // report which room they ended up in.
        if matches!(err, AppError::AlreadyInAnotherRoom) {
            let existing = Database::participant_for_user(db.clone(), user_id).await?;
            return Err(match membership_conflict(existing.as_ref(), room_id) {
                Some(MembershipConflict::SameRoom) => AppError::AlreadyInThisRoom,
                _ => AppError::AlreadyInAnotherRoom,
            });
        }
        return Err(err);
    }

    if let Some(next) = room.status_on_first_join() {
        let flipped = Database::transition_room_status(
            db.clone(),
            room_id,
            RoomStatus::Waiting,
            next,
            Some(now_ms),
        )
        .await;

        if let Err(err) = flipped {
            // Withdraw the membership so the room never sits occupied but
            // still `waiting`.
            if let Some(participant_id) = participant._id {
                let _ = Database::remove_participant(db.clone(), participant_id).await;
            }
            return Err(AppError::Database(err));
        }
    }

    ws::broadcast(&state.ws_state, ws::ROOMS_UPDATED).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Joined room.",
            "participant_id": participant._id.map(|id| id.to_hex()),
        })),
    ))
}

async fn leave_room(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<LeaveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let room_id = parse_room_id(&payload.room_id)?;
    let room = Database::get_room(db.clone(), room_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let participant = Database::participant_for_user(db.clone(), user_id)
        .await?
        .filter(|p| p.room_id == room_id)
        .ok_or(AppError::NotInRoom)?;

    let user = Database::get_user_by_id(db.clone(), user_id)
        .await?
        .ok_or(AppError::NotAuthenticated)?;

    let now_ms = Utc::now().timestamp_millis();
    let elapsed = rewards::elapsed_minutes(participant.joined_at_ms, now_ms);
    let award = rewards::session_award(
        &user.identity,
        elapsed,
        room.duration,
        state.config.grace_minutes,
    );

    if award > 0 {
        Database::add_xp(db.clone(), user_id, award).await?;
    }

    let participant_id = participant._id.ok_or(AppError::NotInRoom)?;
    Database::remove_participant(db.clone(), participant_id).await?;

    if let Some(next) = room.status_on_last_leave() {
        let remaining = Database::count_participants(db.clone(), room_id).await?;
        if remaining == 0 {
            Database::transition_room_status(db.clone(), room_id, RoomStatus::Active, next, None)
                .await?;
        }
    }

    ws::broadcast(&state.ws_state, ws::ROOMS_UPDATED).await;

    Ok(Json(json!({
        "success": true,
        "message": "Left room.",
        "xp_awarded": award,
    })))
}

async fn update_participant(
    State(state): State<SharedState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let room_id = parse_room_id(&payload.room_id)?;
    Database::get_room(db.clone(), room_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let participant = Database::participant_for_user(db.clone(), user_id)
        .await?
        .filter(|p| p.room_id == room_id)
        .ok_or(AppError::NotInRoom)?;

    let participant_id = participant._id.ok_or(AppError::NotInRoom)?;
    Database::update_now_playing(db.clone(), participant_id, &payload.now_playing).await?;

    ws::broadcast(&state.ws_state, ws::ROOMS_UPDATED).await;

    Ok(Json(json!({ "success": true, "message": "Participant updated." })))
}

async fn create_room(
    State(state): State<SharedState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<CreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::InvalidName);
    }
    if !payload.duration.is_finite() || payload.duration <= 0.0 {
        return Err(AppError::InvalidDuration);
    }

    let room = Room {
        _id: Some(ObjectId::new()),
        name,
        duration: payload.duration,
        status: RoomStatus::Waiting,
        perpetual: false,
        started_at_ms: None,
    };

    Database::insert_room(db, &room).await?;

    ws::broadcast(&state.ws_state, ws::ROOMS_UPDATED).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Room created successfully",
            "room_id": room._id.map(|id| id.to_hex()),
        })),
    ))
}

async fn init_rooms(
    State(state): State<SharedState>,
    AuthUser(_user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.clone();

    Database::clear_rooms(db.clone()).await?;

    for preset in &state.config.presets {
        let room = Room {
            _id: Some(ObjectId::new()),
            name: preset.name.clone(),
            duration: preset.duration,
            status: RoomStatus::Active,
            perpetual: true,
            started_at_ms: None,
        };
        Database::insert_room(db.clone(), &room).await?;
    }

    ws::broadcast(&state.ws_state, ws::ROOMS_UPDATED).await;

    Ok(Json(json!({ "success": true, "message": "Preset rooms created." })))
}

pub fn room_router() -> Router<SharedState> {
    Router::new()
        .route("/list", get(list_rooms))
        .route("/join", post(join_room))
        .route("/leave", post(leave_room))
        .route("/update", post(update_participant))
        .route("/create", post(create_room))
        .route("/init", post(init_rooms))
}
