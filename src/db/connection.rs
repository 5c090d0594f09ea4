use futures_util::TryStreamExt;
use mongodb::{
    Client, Collection, IndexModel,
    bson::{doc, oid::ObjectId},
    error::{ErrorKind, Result, WriteFailure},
    options::{IndexOptions, UpdateOptions},
};
use std::{env, sync::Arc};

use crate::{
    error::AppError,
    models::{
        participant_model::Participant,
        preference_model::UserPreference,
        presence_model::OnlineUser,
        room_model::{Room, RoomStatus},
        user_model::User,
    },
};

pub struct Database {
    pub user: Collection<User>,
    pub room: Collection<Room>,
    pub participant: Collection<Participant>,
    pub online: Collection<OnlineUser>,
    pub preference: Collection<UserPreference>,
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(&*err.kind, ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000)
}

impl Database {
    pub async fn init() -> Result<Self> {
        let db_url = env::var("MONGODB_URI").expect("❌ MONGODB_URI not found in .env");
        let client = Client::with_uri_str(&db_url).await?;

        let db_name = env::var("DB_NAME").unwrap_or_else(|_| "focus_rooms".to_string());
        let db = client.database(&db_name);

        let user: Collection<User> = db.collection("users");
        let room: Collection<Room> = db.collection("rooms");
        let participant: Collection<Participant> = db.collection("participants");
        let online: Collection<OnlineUser> = db.collection("online_users");
        let preference: Collection<UserPreference> = db.collection("user_preferences");

        Ok(Database {
            user,
            room,
            participant,
            online,
            preference,
        })
    }

    // The unique index on participants.user_id is what actually holds the
    // one-room-per-user invariant under concurrent joins; the handler-level
    // scan only picks the precise error message.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.participant
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1 })
                    .options(unique.clone())
                    .build(),
                None,
            )
            .await?;

        self.participant
            .create_index(IndexModel::builder().keys(doc! { "room_id": 1 }).build(), None)
            .await?;

        self.online
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1 })
                    .options(unique.clone())
                    .build(),
                None,
            )
            .await?;

        self.preference
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1 })
                    .options(unique)
                    .build(),
                None,
            )
            .await?;

        Ok(())
    }

    pub async fn get_user_by_id(
        db: Arc<Database>,
        user_id: ObjectId,
    ) -> mongodb::error::Result<Option<User>> {
        let filter = doc! {"_id": user_id};
        let user = db.user.find_one(filter, None).await?;

        Ok(user)
    }

    pub async fn find_user_by_email(
        db: Arc<Database>,
        email: &str,
    ) -> mongodb::error::Result<Option<User>> {
        let filter = doc! {"email": email};
        let user = db.user.find_one(filter, None).await?;

        Ok(user)
    }

    pub async fn create_user(db: Arc<Database>, user: &User) -> mongodb::error::Result<()> {
        db.user.insert_one(user, None).await?;
        Ok(())
    }

    pub async fn add_xp(
        db: Arc<Database>,
        user_id: ObjectId,
        amount: i64,
    ) -> mongodb::error::Result<()> {
        let filter = doc! {"_id": user_id};
        let update = doc! {"$inc": {"xp": amount}};

        db.user.update_one(filter, update, None).await?;
        Ok(())
    }

    pub async fn set_name(
        db: Arc<Database>,
        user_id: ObjectId,
        name: &str,
    ) -> mongodb::error::Result<()> {
        let filter = doc! {"_id": user_id};
        let update = doc! {"$set": {"name": name}};

        db.user.update_one(filter, update, None).await?;
        Ok(())
    }

    pub async fn set_avatar(
        db: Arc<Database>,
        user_id: ObjectId,
        avatar_url: &str,
    ) -> mongodb::error::Result<()> {
        let filter = doc! {"_id": user_id};
        let update = doc! {"$set": {"avatar_url": avatar_url}};

        db.user.update_one(filter, update, None).await?;
        Ok(())
    }

    pub async fn get_room(
        db: Arc<Database>,
        room_id: ObjectId,
    ) -> mongodb::error::Result<Option<Room>> {
        let filter = doc! {"_id": room_id};
        let room = db.room.find_one(filter, None).await?;

        Ok(room)
    }

    pub async fn list_rooms(db: Arc<Database>) -> mongodb::error::Result<Vec<Room>> {
        let rooms = db.room.find(doc! {}, None).await?.try_collect().await?;
        Ok(rooms)
    }

    pub async fn insert_room(db: Arc<Database>, room: &Room) -> mongodb::error::Result<()> {
        db.room.insert_one(room, None).await?;
        Ok(())
    }

    pub async fn clear_rooms(db: Arc<Database>) -> mongodb::error::Result<()> {
        db.room.delete_many(doc! {}, None).await?;
        db.participant.delete_many(doc! {}, None).await?;
        Ok(())
    }

    /// Conditional status flip. Returns false when the room was no longer in
    /// `from`, which concurrent joins/leaves make a normal outcome.
    pub async fn transition_room_status(
        db: Arc<Database>,
        room_id: ObjectId,
        from: RoomStatus,
        to: RoomStatus,
        started_at_ms: Option<i64>,
    ) -> mongodb::error::Result<bool> {
        let filter = doc! {"_id": room_id, "status": from.as_str()};

        let mut set = doc! {"status": to.as_str()};
        if let Some(ms) = started_at_ms {
            set.insert("started_at_ms", ms);
        }

        let result = db.room.update_one(filter, doc! {"$set": set}, None).await?;
        Ok(result.matched_count > 0)
    }

    pub async fn participants_in_room(
        db: Arc<Database>,
        room_id: ObjectId,
    ) -> mongodb::error::Result<Vec<Participant>> {
        let filter = doc! {"room_id": room_id};
        let participants = db.participant.find(filter, None).await?.try_collect().await?;

        Ok(participants)
    }

    pub async fn participant_for_user(
        db: Arc<Database>,
        user_id: ObjectId,
    ) -> mongodb::error::Result<Option<Participant>> {
        let filter = doc! {"user_id": user_id};
        let participant = db.participant.find_one(filter, None).await?;

        Ok(participant)
    }

    pub async fn count_participants(
        db: Arc<Database>,
        room_id: ObjectId,
    ) -> mongodb::error::Result<u64> {
        let filter = doc! {"room_id": room_id};
        let count = db.participant.count_documents(filter, None).await?;

        Ok(count)
    }

    /// A lost race against a concurrent join surfaces here as a duplicate
    /// key on user_id.
    pub async fn insert_participant(
        db: Arc<Database>,
        participant: &Participant,
    ) -> std::result::Result<(), AppError> {
        db.participant
            .insert_one(participant, None)
            .await
            .map_err(|err| {
                if is_duplicate_key(&err) {
                    AppError::AlreadyInAnotherRoom
                } else {
                    AppError::Database(err)
                }
            })?;

        Ok(())
    }

    pub async fn remove_participant(
        db: Arc<Database>,
        participant_id: ObjectId,
    ) -> mongodb::error::Result<()> {
        let filter = doc! {"_id": participant_id};
        db.participant.delete_one(filter, None).await?;
        Ok(())
    }

    pub async fn update_now_playing(
        db: Arc<Database>,
        participant_id: ObjectId,
        now_playing: &str,
    ) -> mongodb::error::Result<()> {
        let filter = doc! {"_id": participant_id};
        let update = doc! {"$set": {"now_playing": now_playing}};

        db.participant.update_one(filter, update, None).await?;
        Ok(())
    }

    /// Last write wins on the timestamp; the unique index keeps repeated
    /// heartbeats from ever creating a second record.
    pub async fn heartbeat(
        db: Arc<Database>,
        user_id: ObjectId,
        name: &str,
        now_ms: i64,
    ) -> mongodb::error::Result<()> {
        let filter = doc! {"user_id": user_id};
        let update = doc! {"$set": {"name": name, "last_seen_ms": now_ms}};
        let options = UpdateOptions::builder().upsert(true).build();

        db.online.update_one(filter, update, options).await?;
        Ok(())
    }

    pub async fn list_online(db: Arc<Database>) -> mongodb::error::Result<Vec<OnlineUser>> {
        let records = db.online.find(doc! {}, None).await?.try_collect().await?;
        Ok(records)
    }

    pub async fn get_preference(
        db: Arc<Database>,
        user_id: ObjectId,
    ) -> mongodb::error::Result<Option<UserPreference>> {
        let filter = doc! {"user_id": user_id};
        let preference = db.preference.find_one(filter, None).await?;

        Ok(preference)
    }

    pub async fn mark_welcome_seen(
        db: Arc<Database>,
        user_id: ObjectId,
    ) -> mongodb::error::Result<()> {
        let filter = doc! {"user_id": user_id};
        let update = doc! {"$set": {"has_seen_welcome": true}};
        let options = UpdateOptions::builder().upsert(true).build();

        db.preference.update_one(filter, update, options).await?;
        Ok(())
    }
}
