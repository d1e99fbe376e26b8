use serde::Deserialize;

use crate::models::{Course, Room};

/// Placeholder the original portal UI shows for absent text fields.
const NA: &str = "N/A";

#[derive(Debug, Deserialize)]
pub struct AgendaResponse {
    #[serde(default)]
    pub result: Vec<RawCourse>,
}

/// One agenda entry as the Kordis API returns it. Every field is optional;
/// the API omits them freely.
#[derive(Debug, Deserialize)]
pub struct RawCourse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_date: Option<i64>,
    #[serde(default)]
    pub end_date: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub modality: Option<String>,
    #[serde(default)]
    pub discipline: Option<Discipline>,
    #[serde(default)]
    pub rooms: Option<Vec<RawRoom>>,
}

#[derive(Debug, Deserialize)]
pub struct Discipline {
    #[serde(default)]
    pub teacher: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawRoom {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub campus: Option<String>,
}

impl From<RawCourse> for Course {
    fn from(raw: RawCourse) -> Self {
        Course {
            name: raw.name.unwrap_or_else(|| NA.to_string()),
            start_date: raw.start_date.unwrap_or(0),
            end_date: raw.end_date.unwrap_or(0),
            teacher: raw.discipline.and_then(|d| d.teacher),
            kind: raw.kind.unwrap_or_else(|| NA.to_string()),
            modality: raw.modality.unwrap_or_else(|| NA.to_string()),
            rooms: raw
                .rooms
                .unwrap_or_default()
                .into_iter()
                .map(|room| Room {
                    name: room.name.unwrap_or_else(|| "?".to_string()),
                    campus: room.campus.unwrap_or_else(|| "?".to_string()),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_agenda_payload() {
        let body = r#"{
            "response_code": 200,
            "result": [
                {
                    "name": "Compilation",
                    "start_date": 1741589400000,
                    "end_date": 1741600200000,
                    "type": "Cours",
                    "modality": "Présentiel",
                    "discipline": { "teacher": "J. Dupont" },
                    "rooms": [ { "name": "A404", "campus": "Paris Main" } ]
                },
                { "name": "Trou", "type": "Libre" }
            ]
        }"#;

        let parsed: AgendaResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(parsed.result.len(), 2);

        let courses: Vec<Course> = parsed.result.into_iter().map(Course::from).collect();
        assert_eq!(courses[0].name, "Compilation");
        assert_eq!(courses[0].teacher.as_deref(), Some("J. Dupont"));
        assert_eq!(courses[0].rooms[0].campus, "Paris Main");

        // Omitted fields collapse to markers, not errors.
        assert_eq!(courses[1].teacher, None);
        assert_eq!(courses[1].modality, NA);
        assert!(courses[1].rooms.is_empty());
    }

    #[test]
    fn missing_result_is_empty() {
        let parsed: AgendaResponse =
            serde_json::from_str(r#"{ "response_code": 500 }"#).expect("parse");
        assert!(parsed.result.is_empty());
    }
}
