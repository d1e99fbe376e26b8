use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::discord::embed::{self, ScheduleEmbed};
use crate::discord::{ChannelPort, OutboundMessage};
use crate::error::AppError;
use crate::filter::{canonical_order, filter_courses};
use crate::models::{Course, ScheduleState};
use crate::myges::{AgendaClient, day_span_millis};
use crate::state_store::StateStore;

/// How far back the recovery scan looks for stray schedule messages.
const HISTORY_SCAN_LIMIT: u8 = 20;

/// Which half of the day a tick falls in, and therefore which date it
/// targets and whether it may create a fresh post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Reconciliation-only check of today's already-posted schedule.
    Morning,
    /// Fresh posting cycle for tomorrow.
    Evening,
}

impl Window {
    pub fn classify(time: NaiveTime, evening_from: NaiveTime) -> Self {
        if time >= evening_from {
            Window::Evening
        } else {
            Window::Morning
        }
    }
}

/// What a tick did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Morning tick with no stored baseline for the target date.
    NoBaseline,
    /// Evening tick posted a fresh schedule.
    Posted,
    /// Morning tick found the stored schedule still accurate.
    Unchanged,
    /// Morning tick replaced a stale schedule message.
    Reposted,
    /// The target day has no relevant courses; recorded without posting.
    SkippedEmpty,
}

/// Decides, once per scheduled tick, whether to post, leave alone, or
/// delete-and-repost the schedule message, using the persisted state record
/// as the baseline. The record is a cache of what was last confidently
/// posted: when it is lost, the history scan rebuilds the cleanup set from
/// live channel content.
pub struct Reconciler {
    agenda: Arc<dyn AgendaClient>,
    channel: Arc<dyn ChannelPort>,
    store: Arc<dyn StateStore>,
    channel_id: u64,
    timezone: Tz,
    evening_from: NaiveTime,
}

impl Reconciler {
    pub fn new(
        agenda: Arc<dyn AgendaClient>,
        channel: Arc<dyn ChannelPort>,
        store: Arc<dyn StateStore>,
        channel_id: u64,
        timezone: Tz,
        evening_from: NaiveTime,
    ) -> Self {
        Self {
            agenda,
            channel,
            store,
            channel_id,
            timezone,
            evening_from,
        }
    }

    pub async fn tick(&self, now: DateTime<Tz>) -> Result<TickOutcome, AppError> {
        let window = Window::classify(now.time(), self.evening_from);
        let target = match window {
            Window::Evening => now.date_naive() + Days::new(1),
            Window::Morning => now.date_naive(),
        };

        // Fetch before touching anything: a failed fetch aborts the tick
        // with no deletes and no state change, and the next tick retries.
        let current = self.fetch_relevant(target).await?;

        match window {
            Window::Evening => self.evening_cycle(target, current).await,
            Window::Morning => self.morning_cycle(target, current).await,
        }
    }

    async fn fetch_relevant(&self, date: NaiveDate) -> Result<Vec<Course>, AppError> {
        let (start, end) = day_span_millis(date, self.timezone)
            .ok_or_else(|| AppError::Malformed(format!("no valid local day span for {date}")))?;
        let raw = self.agenda.fetch_agenda(start, end).await?;
        Ok(canonical_order(filter_courses(raw)))
    }

    /// Evening: unconditionally a fresh posting cycle for tomorrow.
    async fn evening_cycle(
        &self,
        target: NaiveDate,
        current: Vec<Course>,
    ) -> Result<TickOutcome, AppError> {
        // State does not survive host redeploys, so sweep the channel by
        // content first, then drop whatever the record still points at.
        self.cleanup_history().await;
        self.delete_stored_messages().await;

        if current.is_empty() {
            info!(%target, "No relevant courses, recording the skip");
            self.store.save(&self.empty_state(target)).await?;
            return Ok(TickOutcome::SkippedEmpty);
        }

        let lead_message_id = self
            .send_best_effort(OutboundMessage {
                content: Some(embed::lead_text()),
                embed: None,
            })
            .await;

        let message_id = self
            .channel
            .send(OutboundMessage {
                content: None,
                embed: Some(ScheduleEmbed::for_day(target, &current)),
            })
            .await?;

        self.store
            .save(&ScheduleState {
                date: target,
                courses: current,
                message_id: Some(message_id),
                channel_id: self.channel_id,
                lead_message_id,
            })
            .await?;

        info!(%target, message_id, "Posted schedule");
        Ok(TickOutcome::Posted)
    }

    /// Morning: reconciliation only. Never creates a post where none
    /// existed, so a lost record cannot trigger spurious announcements.
    async fn morning_cycle(
        &self,
        target: NaiveDate,
        current: Vec<Course>,
    ) -> Result<TickOutcome, AppError> {
        let state = match self.store.load().await? {
            Some(state) if state.date == target => state,
            _ => {
                info!(%target, "No stored baseline for today, skipping update check");
                return Ok(TickOutcome::NoBaseline);
            }
        };

        if state.courses == current {
            info!(%target, "Schedule unchanged");
            return Ok(TickOutcome::Unchanged);
        }

        info!(%target, "Schedule changed, replacing posted summary");

        // Confirm-then-delete on the recorded id, then the content sweep for
        // anything the record does not account for.
        if let Some(id) = state.message_id {
            match self.channel.fetch(id).await {
                Ok(Some(_)) => {
                    if let Err(e) = self.channel.delete(id).await {
                        warn!(message_id = id, "Failed to delete outdated summary: {e}");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(message_id = id, "Could not check outdated summary: {e}"),
            }
        }
        if let Some(id) = state.lead_message_id {
            if let Err(e) = self.channel.delete(id).await {
                warn!(message_id = id, "Failed to delete outdated announcement: {e}");
            }
        }
        self.cleanup_history().await;

        if current.is_empty() {
            info!(%target, "Courses cleared, nothing left to announce");
            self.store.save(&self.empty_state(target)).await?;
            return Ok(TickOutcome::SkippedEmpty);
        }

        let message_id = self
            .channel
            .send(OutboundMessage {
                content: Some(embed::update_text()),
                embed: Some(ScheduleEmbed::for_day(target, &current)),
            })
            .await?;

        self.store
            .save(&ScheduleState {
                date: target,
                courses: current,
                message_id: Some(message_id),
                channel_id: self.channel_id,
                lead_message_id: None,
            })
            .await?;

        Ok(TickOutcome::Reposted)
    }

    /// Id-based fast path: drop the previously recorded message(s),
    /// tolerating both missing state and already-deleted ids.
    async fn delete_stored_messages(&self) {
        let state = match self.store.load().await {
            Ok(Some(state)) => state,
            Ok(None) => return,
            Err(e) => {
                warn!("Could not load stored state for cleanup: {e}");
                return;
            }
        };

        for id in [state.message_id, state.lead_message_id].into_iter().flatten() {
            if let Err(e) = self.channel.delete(id).await {
                warn!(message_id = id, "Failed to delete stored message: {e}");
            }
        }
    }

    /// Content-based fallback: scan recent history and delete anything that
    /// is recognizably a schedule announcement. Failures only log: a
    /// missed cleanup costs a duplicate message, not a lost post.
    async fn cleanup_history(&self) {
        let messages = match self.channel.recent_messages(HISTORY_SCAN_LIMIT).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!("History scan failed: {e}");
                return;
            }
        };

        for message in messages.iter().filter(|m| embed::is_schedule_message(m)) {
            match self.channel.delete(message.id).await {
                Ok(()) => info!(message_id = message.id, "Deleted stale schedule message"),
                Err(e) => warn!(message_id = message.id, "Failed to delete stale message: {e}"),
            }
        }
    }

    async fn send_best_effort(&self, message: OutboundMessage) -> Option<u64> {
        match self.channel.send(message).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Best-effort send failed: {e}");
                None
            }
        }
    }

    fn empty_state(&self, date: NaiveDate) -> ScheduleState {
        ScheduleState {
            date,
            courses: Vec::new(),
            message_id: None,
            channel_id: self.channel_id,
            lead_message_id: None,
        }
    }
}
