use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Course;

/// The single persisted record: what we last confidently posted.
///
/// Overwritten wholesale on every post-or-skip decision, never updated in
/// place. `message_id` is absent when the day had no relevant courses and
/// nothing was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleState {
    pub date: NaiveDate,
    pub courses: Vec<Course>,
    pub message_id: Option<u64>,
    pub channel_id: u64,
    #[serde(default)]
    pub lead_message_id: Option<u64>,
}
