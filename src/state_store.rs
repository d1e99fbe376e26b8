use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::error::AppError;
use crate::models::ScheduleState;

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Returns `Ok(None)` when no state has been persisted yet.
    async fn load(&self) -> Result<Option<ScheduleState>, AppError>;

    /// Replaces the stored record wholesale; durable before returning.
    async fn save(&self, state: &ScheduleState) -> Result<(), AppError>;
}

/// Single-slot JSON file store.
///
/// `save` writes a sibling temp file, fsyncs it and renames it over the
/// target, so a crash mid-save never leaves a partial record visible to
/// `load`.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os = self.path.clone().into_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<Option<ScheduleState>, AppError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::State(e)),
        };

        match serde_json::from_slice::<ScheduleState>(&bytes) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                // Corrupt state is recoverable: the reconciler falls back to
                // the history-scan cleanup path.
                warn!(
                    "Discarding unreadable state file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, state: &ScheduleState) -> Result<(), AppError> {
        let bytes = serde_json::to_vec(state)
            .map_err(|e| AppError::Malformed(format!("state serialization failed: {e}")))?;

        let tmp = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// In-memory slot, used by tests in place of the file store.
#[derive(Default)]
pub struct MemoryStateStore {
    slot: tokio::sync::Mutex<Option<ScheduleState>>,
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<ScheduleState>, AppError> {
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, state: &ScheduleState) -> Result<(), AppError> {
        *self.slot.lock().await = Some(state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn scratch_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("myges-bot-{}-{}.json", name, std::process::id()));
        path
    }

    fn sample_state() -> ScheduleState {
        ScheduleState {
            date: NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date"),
            courses: Vec::new(),
            message_id: Some(1111),
            channel_id: 2222,
            lead_message_id: None,
        }
    }

    #[tokio::test]
    async fn missing_file_loads_as_absent() {
        let store = FileStateStore::new(scratch_path("missing"));
        assert_eq!(store.load().await.expect("load"), None);
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let path = scratch_path("roundtrip");
        let store = FileStateStore::new(path.clone());
        let state = sample_state();

        store.save(&state).await.expect("save");
        assert_eq!(store.load().await.expect("load"), Some(state));

        tokio::fs::remove_file(path).await.expect("cleanup");
    }

    #[tokio::test]
    async fn save_replaces_previous_record() {
        let path = scratch_path("replace");
        let store = FileStateStore::new(path.clone());

        let first = sample_state();
        store.save(&first).await.expect("save");

        let mut second = sample_state();
        second.message_id = None;
        second.date = NaiveDate::from_ymd_opt(2025, 3, 11).expect("valid date");
        store.save(&second).await.expect("save");

        assert_eq!(store.load().await.expect("load"), Some(second));

        tokio::fs::remove_file(path).await.expect("cleanup");
    }

    #[tokio::test]
    async fn corrupt_file_loads_as_absent() {
        let path = scratch_path("corrupt");
        tokio::fs::write(&path, b"{ not json").await.expect("write");

        let store = FileStateStore::new(path.clone());
        assert_eq!(store.load().await.expect("load"), None);

        tokio::fs::remove_file(path).await.expect("cleanup");
    }
}
