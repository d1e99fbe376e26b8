//! Schedule message presentation, independent of the Discord wire types.
//!
//! Every message the bot posts carries one of two exact markers: the embed
//! author tag on summaries, or the announcement prefix on plain-text leads.
//! The recovery cleanup matches on these markers, never on free text.

use chrono::NaiveDate;
use serenity::builder::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter};

use crate::discord::ChannelMessage;
use crate::filter::UNKNOWN_TEACHER;
use crate::models::Course;

/// Embed author tag on every schedule summary.
pub const EMBED_AUTHOR_TAG: &str = "MyGES Planning";
/// Exact prefix of every plain-text announcement the bot sends.
pub const ANNOUNCE_PREFIX: &str = "🔔";
/// MyGES brand red.
pub const EMBED_COLOR: u32 = 0xE0020B;

const AUTHOR_ICON_URL: &str = "https://www.myges.fr/assets/img/logo_myges.png";

pub fn lead_text() -> String {
    format!("{ANNOUNCE_PREFIX} **Rappel du planning de demain :**")
}

pub fn update_text() -> String {
    format!("{ANNOUNCE_PREFIX} **Mise à jour du planning d'aujourd'hui :** (changement détecté)")
}

/// True when a channel message is one of ours: sent by this bot and either
/// carrying the schedule embed or starting with the announcement prefix.
pub fn is_schedule_message(message: &ChannelMessage) -> bool {
    message.from_self
        && (message.embed_author.as_deref() == Some(EMBED_AUTHOR_TAG)
            || message.content.starts_with(ANNOUNCE_PREFIX))
}

/// Renderable day summary. Converted to a serenity `CreateEmbed` only at
/// the port boundary so the reconciler and tests stay off the wire types.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEmbed {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<(String, String)>,
    pub footer: Option<String>,
}

impl ScheduleEmbed {
    /// Build the summary for one day from its filtered course list.
    pub fn for_day(date: NaiveDate, courses: &[Course]) -> Self {
        let title = format!("📅  {}", date.format("%d/%m/%Y"));

        if courses.is_empty() {
            return Self {
                title,
                description: Some("🏖️ **Aucun cours prévu !** Profite de ta journée.".to_string()),
                fields: Vec::new(),
                footer: None,
            };
        }

        Self {
            title,
            description: None,
            fields: courses.iter().map(course_field).collect(),
            footer: Some(format!("Total: {} cours", courses.len())),
        }
    }

    pub fn to_create_embed(&self) -> CreateEmbed {
        let mut embed = CreateEmbed::new()
            .title(&self.title)
            .colour(EMBED_COLOR)
            .author(CreateEmbedAuthor::new(EMBED_AUTHOR_TAG).icon_url(AUTHOR_ICON_URL));
        if let Some(ref description) = self.description {
            embed = embed.description(description);
        }
        for (name, value) in &self.fields {
            embed = embed.field(name, value, false);
        }
        if let Some(ref footer) = self.footer {
            embed = embed.footer(CreateEmbedFooter::new(footer));
        }
        embed
    }
}

/// One embed field per course: Discord-native timestamps in the name, the
/// details as quoted lines in the value.
fn course_field(course: &Course) -> (String, String) {
    let name = format!(
        "⏰ <t:{}:t> - <t:{}:t>",
        course.start_date / 1000,
        course.end_date / 1000
    );

    let mut parts = vec![format!("> 📚 **{}**", course.name)];

    if let Some(teacher) = course.teacher.as_deref() {
        if !teacher.is_empty() && teacher != UNKNOWN_TEACHER {
            parts.push(format!("> 🧑‍🏫 *{teacher}*"));
        }
    }

    if !course.rooms.is_empty() {
        let rooms = course
            .rooms
            .iter()
            .map(|room| room.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let mut campuses: Vec<&str> = Vec::new();
        for room in &course.rooms {
            if !campuses.contains(&room.campus.as_str()) {
                campuses.push(room.campus.as_str());
            }
        }
        parts.push(format!("> 🏫 `{rooms}` ({})", campuses.join(", ")));
    } else if course.modality == "Distanciel" || course.name.to_uppercase().contains("E-LEARNING") {
        parts.push("> 🏠 *Distanciel / E-Learning*".to_string());
    }

    parts.push(format!("> 🏷️ {} • {}", course.kind, course.modality));

    // Empty quote lines between parts keep the block readable on Discord.
    (name, parts.join("\n> \n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Room;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date")
    }

    fn course(name: &str, start: i64, teacher: Option<&str>, rooms: Vec<Room>) -> Course {
        Course {
            name: name.to_string(),
            start_date: start,
            end_date: start + 3_600_000,
            teacher: teacher.map(str::to_string),
            kind: "Cours".to_string(),
            modality: "Présentiel".to_string(),
            rooms,
        }
    }

    #[test]
    fn empty_day_renders_description_only() {
        let embed = ScheduleEmbed::for_day(date(), &[]);
        assert_eq!(embed.title, "📅  10/03/2025");
        assert!(embed.description.is_some());
        assert!(embed.fields.is_empty());
        assert!(embed.footer.is_none());
    }

    #[test]
    fn one_field_per_course_with_total_footer() {
        let room = Room {
            name: "A404".to_string(),
            campus: "Paris Main".to_string(),
        };
        let courses = vec![
            course("Compilation", 1_741_589_400_000, Some("J. Dupont"), vec![room]),
            course("Réseaux", 1_741_600_200_000, Some("M. Durand"), Vec::new()),
        ];

        let embed = ScheduleEmbed::for_day(date(), &courses);
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.footer.as_deref(), Some("Total: 2 cours"));

        let (name, value) = &embed.fields[0];
        assert_eq!(name, "⏰ <t:1741589400:t> - <t:1741590300:t>");
        assert!(value.contains("**Compilation**"));
        assert!(value.contains("*J. Dupont*"));
        assert!(value.contains("`A404` (Paris Main)"));
    }

    #[test]
    fn remote_course_without_rooms_shows_remote_line() {
        let mut remote = course("Anglais E-LEARNING", 1_741_589_400_000, Some("T."), Vec::new());
        remote.modality = "Distanciel".to_string();

        let embed = ScheduleEmbed::for_day(date(), &[remote]);
        assert!(embed.fields[0].1.contains("Distanciel / E-Learning"));
    }

    #[test]
    fn recognizes_own_schedule_messages_only() {
        let summary = ChannelMessage {
            id: 1,
            from_self: true,
            content: String::new(),
            embed_author: Some(EMBED_AUTHOR_TAG.to_string()),
        };
        let lead = ChannelMessage {
            id: 2,
            from_self: true,
            content: lead_text(),
            embed_author: None,
        };
        let foreign_copy = ChannelMessage {
            id: 3,
            from_self: false,
            content: lead_text(),
            embed_author: Some(EMBED_AUTHOR_TAG.to_string()),
        };
        let chatter = ChannelMessage {
            id: 4,
            from_self: true,
            content: "unrelated bot reply".to_string(),
            embed_author: None,
        };

        assert!(is_schedule_message(&summary));
        assert!(is_schedule_message(&lead));
        assert!(!is_schedule_message(&foreign_copy));
        assert!(!is_schedule_message(&chatter));
    }
}
