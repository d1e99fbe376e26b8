use serde::{Deserialize, Serialize};

/// One scheduled session, reduced to the fields the bot renders and
/// compares. Derived equality over this projection is what drives change
/// detection, so any field edit upstream (room, teacher, time) counts as a
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    /// Epoch milliseconds, as delivered by the agenda API.
    pub start_date: i64,
    pub end_date: i64,
    pub teacher: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub modality: String,
    pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub campus: String,
}
