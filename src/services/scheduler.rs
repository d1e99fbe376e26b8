use std::sync::Arc;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::services::reconciler::Reconciler;

/// Drives the reconciler at fixed local wall-clock times.
///
/// Ticks never overlap: each tick body is awaited before the next sleep
/// begins, and a failed tick only logs; the next scheduled time retries.
pub struct TickScheduler {
    reconciler: Arc<Reconciler>,
    timezone: Tz,
    tick_times: Vec<NaiveTime>,
}

impl TickScheduler {
    pub fn new(reconciler: Arc<Reconciler>, timezone: Tz, tick_times: Vec<NaiveTime>) -> Self {
        Self {
            reconciler,
            timezone,
            tick_times,
        }
    }

    pub async fn start(self) {
        info!(
            timezone = %self.timezone,
            "Starting schedule ticker ({} daily ticks)",
            self.tick_times.len()
        );

        loop {
            let now = Utc::now().with_timezone(&self.timezone);
            let Some(next) = next_tick(now, &self.tick_times) else {
                warn!("No tick times configured, scheduler idle");
                return;
            };

            let wait = (next - now).to_std().unwrap_or_default();
            info!("Next tick at {next}");
            tokio::time::sleep(wait).await;

            let now = Utc::now().with_timezone(&self.timezone);
            match self.reconciler.tick(now).await {
                Ok(outcome) => info!(?outcome, "Tick completed"),
                Err(e) => {
                    warn!("Tick failed: {e}");
                    // The loop survives every failure; the next tick retries.
                }
            }
        }
    }
}

/// Earliest configured wall-clock time strictly after `now`, today or
/// tomorrow. Times that fall into a DST gap are skipped for that day.
pub fn next_tick(now: DateTime<Tz>, times: &[NaiveTime]) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let mut candidates = Vec::new();

    for day_offset in 0..2 {
        let date = now.date_naive() + Days::new(day_offset);
        for &time in times {
            if let Some(at) = tz.from_local_datetime(&date.and_time(time)).earliest() {
                if at > now {
                    candidates.push(at);
                }
            }
        }
    }

    candidates.into_iter().min()
}
