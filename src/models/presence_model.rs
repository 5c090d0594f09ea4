use mongodb::bson::oid::ObjectId;
use serde::{Serialize, Deserialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OnlineUser {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub user_id: ObjectId,
    pub name: String,
    pub last_seen_ms: i64,
}

impl OnlineUser {
    /// Stale records are filtered out of reads, never deleted.
    pub fn is_fresh(&self, now_ms: i64, window_ms: i64) -> bool {
        now_ms - self.last_seen_ms < window_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seen_at(last_seen_ms: i64) -> OnlineUser {
        OnlineUser {
            _id: None,
            user_id: ObjectId::new(),
            name: "ada".to_string(),
            last_seen_ms,
        }
    }

    #[test]
    fn record_inside_window_is_fresh() {
        assert!(seen_at(10_000).is_fresh(39_000, 30_000));
    }

    #[test]
    fn record_at_window_edge_is_stale() {
        assert!(!seen_at(10_000).is_fresh(40_000, 30_000));
        assert!(!seen_at(10_000).is_fresh(55_000, 30_000));
    }
}
