use mongodb::bson::oid::ObjectId;
use serde::{Serialize, Deserialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub name: String,

    #[serde(default)]
    pub xp: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(flatten)]
    pub identity: Identity,
}

// Stored with an explicit `kind` tag so reward eligibility dispatches on the
// variant, never on the presence of provider-specific fields.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Identity {
    Registered { email: String, password: String },
    Guest,
}

impl User {
    pub fn is_guest(&self) -> bool {
        matches!(self.identity, Identity::Guest)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}
