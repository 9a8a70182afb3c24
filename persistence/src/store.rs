//! `FileStore`: one JSON file per entity, write-temp-then-rename for
//! atomicity, grounded directly in the template's
//! `PersistenceManager::save_profile` pattern and extended to one
//! subdirectory per table plus cascade delete.

use std::path::{Path, PathBuf};

use adaptive_run_core::error::Result;
use adaptive_run_core::traits::PersistenceStore;
use adaptive_run_core::types::{RunEvent, Session, StateSnapshot, TelemetryPoint, TrainingPlan, TrainingSession};
use async_trait::async_trait;
use uuid::Uuid;

use crate::migrations;

pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        for sub in ["sessions", "telemetry", "events", "snapshots", "training_plans", "training_sessions"] {
            std::fs::create_dir_all(data_dir.join(sub))?;
        }
        migrations::ensure_schema_version(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// Default on-disk location: `<data dir>/adaptive-run`.
    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("adaptive-run"))
    }

    fn path_for(&self, table: &str, id: Uuid) -> PathBuf {
        self.data_dir.join(table).join(format!("{id}.json"))
    }

    fn write_atomic<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let contents = serde_json::to_string_pretty(value)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents)?;
        std::fs::rename(tmp_path, path)?;
        Ok(())
    }

    fn read_optional<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_list<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        Ok(self.read_optional(path)?.unwrap_or_default())
    }

    fn append<T: serde::Serialize + serde::de::DeserializeOwned>(
        &self,
        path: &Path,
        new_items: &[T],
    ) -> Result<()>
    where
        T: Clone,
    {
        let mut existing: Vec<T> = self.read_list(path)?;
        existing.extend_from_slice(new_items);
        self.write_atomic(path, &existing)
    }
}

#[async_trait]
impl PersistenceStore for FileStore {
    async fn save_session(&self, session: &Session) -> Result<()> {
        self.write_atomic(&self.path_for("sessions", session.id), session)
    }

    async fn load_session(&self, id: Uuid) -> Result<Option<Session>> {
        self.read_optional(&self.path_for("sessions", id))
    }

    async fn delete_session(&self, id: Uuid) -> Result<()> {
        for table in ["sessions", "telemetry", "events", "snapshots"] {
            let path = self.path_for(table, id);
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    async fn session_exists(&self, id: Uuid) -> Result<bool> {
        Ok(self.path_for("sessions", id).exists())
    }

    async fn append_telemetry(&self, session_id: Uuid, points: &[TelemetryPoint]) -> Result<()> {
        self.append(&self.path_for("telemetry", session_id), points)
    }

    async fn append_events(&self, session_id: Uuid, events: &[RunEvent]) -> Result<()> {
        self.append(&self.path_for("events", session_id), events)
    }

    async fn append_snapshots(&self, session_id: Uuid, snapshots: &[StateSnapshot]) -> Result<()> {
        self.append(&self.path_for("snapshots", session_id), snapshots)
    }

    async fn load_training_plan(&self, id: Uuid) -> Result<Option<TrainingPlan>> {
        self.read_optional(&self.path_for("training_plans", id))
    }

    async fn load_training_session(&self, id: Uuid) -> Result<Option<TrainingSession>> {
        self.read_optional(&self.path_for("training_sessions", id))
    }

    async fn save_training_session(&self, session: &TrainingSession) -> Result<()> {
        self.write_atomic(&self.path_for("training_sessions", session.id), session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn store() -> (FileStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("adaptive-run-store-test-{}", Uuid::new_v4()));
        (FileStore::new(&dir).unwrap(), dir)
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (store, dir) = store();
        let session = Session::new(Uuid::new_v4(), Utc::now());
        store.save_session(&session).await.unwrap();
        let loaded = store.load_session(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, session.id);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn missing_session_returns_none() {
        let (store, dir) = store();
        assert!(store.load_session(Uuid::new_v4()).await.unwrap().is_none());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn delete_cascades_telemetry_events_snapshots() {
        let (store, dir) = store();
        let id = Uuid::new_v4();
        let session = Session::new(id, Utc::now());
        store.save_session(&session).await.unwrap();
        store
            .append_telemetry(
                id,
                &[TelemetryPoint {
                    timestamp: Utc::now(),
                    heart_rate_bpm: None,
                    pace_seconds_per_mile: None,
                    distance_miles: 0.0,
                    cadence_spm: None,
                    grade_percent: None,
                    kcal_per_min: None,
                    hr_zone: None,
                    fuel_remaining_grams: None,
                }],
            )
            .await
            .unwrap();

        store.delete_session(id).await.unwrap();
        assert!(!store.session_exists(id).await.unwrap());
        assert!(!dir.join("telemetry").join(format!("{id}.json")).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn append_accumulates_across_calls() {
        let (store, dir) = store();
        let id = Uuid::new_v4();
        let point = TelemetryPoint {
            timestamp: Utc::now(),
            heart_rate_bpm: Some(140.0),
            pace_seconds_per_mile: None,
            distance_miles: 0.1,
            cadence_spm: None,
            grade_percent: None,
            kcal_per_min: None,
            hr_zone: None,
            fuel_remaining_grams: None,
        };
        store.append_telemetry(id, &[point]).await.unwrap();
        store.append_telemetry(id, &[point]).await.unwrap();
        let raw = std::fs::read_to_string(dir.join("telemetry").join(format!("{id}.json"))).unwrap();
        let points: Vec<TelemetryPoint> = serde_json::from_str(&raw).unwrap();
        assert_eq!(points.len(), 2);
        let _ = std::fs::remove_dir_all(dir);
    }
}
