use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::SinkExt as FuturesSinkExt;
use futures_util::{
    StreamExt,
    stream::{SplitSink, SplitStream},
};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task;
use uuid::Uuid;

use crate::{SharedState, utils::jwt::verify_access_token};

pub const ROOMS_UPDATED: &str = "rooms-updated";
pub const PRESENCE_UPDATED: &str = "presence-updated";

#[derive(Clone)]
pub struct AppState {
    pub user_sockets: Arc<Mutex<HashMap<ObjectId, Uuid>>>,
    pub sockets: Arc<Mutex<HashMap<Uuid, Arc<Mutex<SplitSink<WebSocket, Message>>>>>>,
}

#[derive(Deserialize)]
struct SubscribeData {
    access_token: String,
}

#[derive(Serialize)]
struct UpdateMessage {
    message_type: String,
}

pub async fn handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (sender, receiver) = socket.split();
    let ws_state = state.ws_state.clone();

    let socket_id = Uuid::new_v4();

    {
        let mut sockets = ws_state.sockets.lock().await;
        sockets.insert(socket_id, Arc::new(Mutex::new(sender)));
    }

    task::spawn(listen(receiver, socket_id, ws_state));
}

// Clients send a single `subscribe` message with their access token, then
// receive update pokes and refetch over HTTP.
async fn listen(mut receiver: SplitStream<WebSocket>, socket_id: Uuid, ws_state: Arc<AppState>) {
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
                    if let Some(message_type) = json["type"].as_str() {
                        match message_type {
                            "subscribe" => {
                                let data: SubscribeData =
                                    match serde_json::from_value(json["data"].clone()) {
                                        Ok(d) => d,
                                        Err(_) => continue,
                                    };

                                let claim = match verify_access_token(&data.access_token) {
                                    Ok(claim) => claim,
                                    Err(_) => continue,
                                };

                                let oid: ObjectId = match ObjectId::parse_str(&claim.sub) {
                                    Ok(id) => id,
                                    Err(_) => continue,
                                };

                                let mut user_sockets = ws_state.user_sockets.lock().await;
                                user_sockets.insert(oid, socket_id);
                            }
                            _ => {}
                        }
                    }
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    ws_state.sockets.lock().await.remove(&socket_id);
    ws_state
        .user_sockets
        .lock()
        .await
        .retain(|_, sid| *sid != socket_id);
}

/// Best-effort push to every subscribed client.
pub async fn broadcast(ws_state: &AppState, event: &str) {
    let message = UpdateMessage {
        message_type: event.to_string(),
    };
    let message_text = serde_json::to_string(&message).unwrap();

    let subscriber_ids: Vec<Uuid> = {
        let user_sockets = ws_state.user_sockets.lock().await;
        user_sockets.values().cloned().collect()
    };

    for sender_id in subscriber_ids {
        let sender_arc = {
            let sockets = ws_state.sockets.lock().await;
            sockets.get(&sender_id).cloned()
        };

        if let Some(sender_arc) = sender_arc {
            let mut sender = sender_arc.lock().await;
            if let Err(err) = sender.send(Message::Text(message_text.clone().into())).await {
                tracing::warn!("failed to push {event} to socket {sender_id}: {err}");
            }
        }
    }
}
