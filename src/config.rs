use std::env;
use std::path::PathBuf;

use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::error::AppError;

/// Runtime configuration, read once at startup from the environment
/// (`.env` files supported via dotenvy).
#[derive(Clone, Debug)]
pub struct BotConfig {
    pub myges_email: String,
    pub myges_password: String,
    pub discord_token: String,
    pub channel_id: u64,
    pub timezone: Tz,
    /// Local wall-clock times at which the reconciler ticks.
    pub tick_times: Vec<NaiveTime>,
    /// Boundary between the morning (check today) and evening (post
    /// tomorrow) windows.
    pub evening_from: NaiveTime,
    pub state_file: PathBuf,
    pub keyword_today: String,
    pub keyword_tomorrow: String,
}

impl BotConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let myges_email = require("MYGES_EMAIL")?;
        let myges_password = require("MYGES_PASSWORD")?;
        let discord_token = require("DISCORD_TOKEN")?;
        let channel_id = require("DISCORD_CHANNEL_ID")?
            .parse::<u64>()
            .map_err(|_| {
                AppError::Config("DISCORD_CHANNEL_ID must be a numeric channel id".to_string())
            })?;

        let timezone = env::var("SCHEDULE_TIMEZONE")
            .unwrap_or_else(|_| "Europe/Paris".to_string())
            .parse::<Tz>()
            .map_err(|e| AppError::Config(format!("SCHEDULE_TIMEZONE: {e}")))?;

        let tick_times = parse_times(
            &env::var("SCHEDULE_TICK_TIMES").unwrap_or_else(|_| "06:00,15:53,18:00".to_string()),
        )?;

        let evening_from =
            parse_time(&env::var("SCHEDULE_EVENING_FROM").unwrap_or_else(|_| "15:00".to_string()))?;

        let state_file = env::var("STATE_FILE")
            .unwrap_or_else(|_| "schedule_state.json".to_string())
            .into();

        let keyword_today =
            env::var("AGENDA_KEYWORD_TODAY").unwrap_or_else(|_| "today".to_string());
        let keyword_tomorrow =
            env::var("AGENDA_KEYWORD_TOMORROW").unwrap_or_else(|_| "demain".to_string());

        Ok(Self {
            myges_email,
            myges_password,
            discord_token,
            channel_id,
            timezone,
            tick_times,
            evening_from,
            state_file,
            keyword_today,
            keyword_tomorrow,
        })
    }
}

fn require(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::Config(format!("{key} is not set")))
}

fn parse_time(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| AppError::Config(format!("invalid time of day {value:?} (expected HH:MM)")))
}

fn parse_times(value: &str) -> Result<Vec<NaiveTime>, AppError> {
    let times = value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_time)
        .collect::<Result<Vec<_>, _>>()?;

    if times.is_empty() {
        return Err(AppError::Config(
            "SCHEDULE_TICK_TIMES must list at least one HH:MM time".to_string(),
        ));
    }
    Ok(times)
}
