pub mod participant_model;
pub mod preference_model;
pub mod presence_model;
pub mod room_model;
pub mod user_model;
