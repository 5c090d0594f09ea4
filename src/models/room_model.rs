use mongodb::bson::oid::ObjectId;
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Active,
    Completed,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Active => "active",
            RoomStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Room {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub name: String,
    pub duration: f64,
    pub status: RoomStatus,

    // Preset rooms stay joinable forever and never reach `completed`.
    #[serde(default)]
    pub perpetual: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<i64>,
}

impl Room {
    /// Status the room moves to when its first participant arrives, if any.
    /// Only a `waiting` room starts.
    pub fn status_on_first_join(&self) -> Option<RoomStatus> {
        match self.status {
            RoomStatus::Waiting => Some(RoomStatus::Active),
            _ => None,
        }
    }

    /// Status the room moves to when its last participant leaves, if any.
    /// Perpetual rooms never complete.
    pub fn status_on_last_leave(&self) -> Option<RoomStatus> {
        match self.status {
            RoomStatus::Active if !self.perpetual => Some(RoomStatus::Completed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(status: RoomStatus, perpetual: bool) -> Room {
        Room {
            _id: None,
            name: "Focus Session".to_string(),
            duration: 25.0,
            status,
            perpetual,
            started_at_ms: None,
        }
    }

    #[test]
    fn waiting_room_activates_on_first_join() {
        assert_eq!(
            room(RoomStatus::Waiting, false).status_on_first_join(),
            Some(RoomStatus::Active)
        );
    }

    #[test]
    fn active_room_does_not_reactivate() {
        assert_eq!(room(RoomStatus::Active, false).status_on_first_join(), None);
        assert_eq!(room(RoomStatus::Active, true).status_on_first_join(), None);
    }

    #[test]
    fn completed_is_terminal() {
        assert_eq!(room(RoomStatus::Completed, false).status_on_first_join(), None);
        assert_eq!(room(RoomStatus::Completed, false).status_on_last_leave(), None);
    }

    #[test]
    fn active_room_completes_on_last_leave() {
        assert_eq!(
            room(RoomStatus::Active, false).status_on_last_leave(),
            Some(RoomStatus::Completed)
        );
    }

    #[test]
    fn perpetual_room_never_completes() {
        assert_eq!(room(RoomStatus::Active, true).status_on_last_leave(), None);
    }
}
