use mongodb::bson::oid::ObjectId;
use serde::{Serialize, Deserialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Participant {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub user_id: ObjectId,
    pub room_id: ObjectId,

    pub task: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub now_playing: Option<String>,

    pub joined_at_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipConflict {
    SameRoom,
    OtherRoom,
}

/// Classifies a user's existing membership against the room they want to
/// join. A user holds at most one participant record globally, so a single
/// lookup decides both conflict kinds.
pub fn membership_conflict(
    existing: Option<&Participant>,
    room_id: ObjectId,
) -> Option<MembershipConflict> {
    let existing = existing?;
    if existing.room_id == room_id {
        Some(MembershipConflict::SameRoom)
    } else {
        Some(MembershipConflict::OtherRoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(room_id: ObjectId) -> Participant {
        Participant {
            _id: Some(ObjectId::new()),
            user_id: ObjectId::new(),
            room_id,
            task: "write report".to_string(),
            mood: None,
            now_playing: None,
            joined_at_ms: 0,
        }
    }

    #[test]
    fn no_existing_record_means_no_conflict() {
        assert_eq!(membership_conflict(None, ObjectId::new()), None);
    }

    #[test]
    fn record_in_target_room_is_same_room_conflict() {
        let room_id = ObjectId::new();
        let p = participant(room_id);
        assert_eq!(
            membership_conflict(Some(&p), room_id),
            Some(MembershipConflict::SameRoom)
        );
    }

    #[test]
    fn record_in_any_other_room_is_other_room_conflict() {
        let p = participant(ObjectId::new());
        assert_eq!(
            membership_conflict(Some(&p), ObjectId::new()),
            Some(MembershipConflict::OtherRoom)
        );
    }
}
