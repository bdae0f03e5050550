use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use repairdesk_client::AggregatePayload;

use crate::error::DashboardError;

/// Fixed key the last committed payload is stored under.
pub const CACHE_KEY: &str = "dashboardData";

/// Last-known-good payload shown before the first fetch completes.
///
/// Every committed payload overwrites the previous one. There is no expiry.
pub trait PayloadStore: Send + Sync {
    fn load(&self) -> Result<Option<AggregatePayload>, DashboardError>;

    fn save(&self, payload: &AggregatePayload) -> Result<(), DashboardError>;
}

/// Stores the payload as `<dir>/dashboardData.json`.
#[derive(Debug, Clone)]
pub struct FilePayloadStore {
    path: PathBuf,
}

impl FilePayloadStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(format!("{CACHE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> DashboardError {
        DashboardError::CacheIo {
            path: self.path.clone(),
            source,
        }
    }
}

impl PayloadStore for FilePayloadStore {
    fn load(&self) -> Result<Option<AggregatePayload>, DashboardError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, payload: &AggregatePayload) -> Result<(), DashboardError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }

        // Write then rename so a crash never leaves a truncated cache behind.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(payload)?).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

/// In-process store for callers that do not want anything on disk.
#[derive(Debug, Default)]
pub struct MemoryPayloadStore {
    slot: Mutex<Option<AggregatePayload>>,
}

impl MemoryPayloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: AggregatePayload) -> Self {
        Self {
            slot: Mutex::new(Some(payload)),
        }
    }
}

impl PayloadStore for MemoryPayloadStore {
    fn load(&self) -> Result<Option<AggregatePayload>, DashboardError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, payload: &AggregatePayload) -> Result<(), DashboardError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(payload.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use repairdesk_client::TopCustomers;

    use super::*;

    fn sample() -> AggregatePayload {
        let mut payload = AggregatePayload::fallback();
        payload.customer.number_of_customers = 7;
        payload.customer.top_customers =
            TopCustomers::from_iter([("Zed Electricals".to_string(), 3), ("Abe".to_string(), 9)]);
        payload
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePayloadStore::new(dir.path().join("state"));
        assert!(store.load().unwrap().is_none());

        store.save(&sample()).unwrap();
        assert!(store.path().ends_with("dashboardData.json"));
        assert_eq!(store.load().unwrap(), Some(sample()));
    }

    #[test]
    fn test_file_store_overwrites_unconditionally() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePayloadStore::new(dir.path());

        store.save(&sample()).unwrap();
        store.save(&AggregatePayload::fallback()).unwrap();
        assert_eq!(store.load().unwrap(), Some(AggregatePayload::fallback()));
    }

    #[test]
    fn test_corrupt_cache_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePayloadStore::new(dir.path());
        std::fs::write(store.path(), b"[1, 2").unwrap();

        assert!(matches!(store.load(), Err(DashboardError::CacheFormat(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryPayloadStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
    }
}
