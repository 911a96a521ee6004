//! Test harness for isolated test execution.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use vistoria::db::{checklist_repo, file_repo, inspection_repo};
use vistoria::model::{ConditionStatus, InspectionKind, NewChecklistEntry, NewFileRecord, NewInspection};
use vistoria::processing::{Collaborators, JobRunner, ProcessingContext, ProcessingSettings};
use vistoria::worker::{BatchDispatcher, JobStatusView};
use vistoria::Database;

/// Isolated environment: an upload directory and a database file, both
/// removed when the harness is dropped.
pub struct TestHarness {
    temp_dir: TempDir,
    pub upload_dir: PathBuf,
    pub db_path: PathBuf,
    pub db: Database,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let upload_dir = temp_dir.path().join("uploads");
        std::fs::create_dir_all(&upload_dir).expect("Failed to create upload dir");
        let db_path = temp_dir.path().join("data").join("vistoria.db");
        let db = Database::open(&db_path).expect("Failed to open database");

        Self {
            temp_dir,
            upload_dir,
            db_path,
            db,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes an upload under the upload directory and returns its path.
    pub fn write_upload(&self, filename: &str, content: &[u8]) -> String {
        let path = self.upload_dir.join(filename);
        std::fs::write(&path, content).expect("Failed to write upload");
        path.to_string_lossy().to_string()
    }

    /// Path inside the upload directory that does not exist on disk.
    pub fn absent_upload(&self, filename: &str) -> String {
        self.upload_dir
            .join(filename)
            .to_string_lossy()
            .to_string()
    }

    pub fn inspection(&self, kind: InspectionKind) -> i64 {
        inspection_repo::insert(&self.db, &NewInspection::new("Rua das Flores, 10", kind))
            .expect("Failed to insert inspection")
    }

    pub fn entry(&self, inspection_id: i64, room: &str, item: &str, status: ConditionStatus) -> i64 {
        checklist_repo::insert(&self.db, inspection_id, &NewChecklistEntry::new(room, item, status))
            .expect("Failed to insert checklist entry")
    }

    pub fn register(&self, inspection_id: i64, path: &str) -> i64 {
        file_repo::register_upload(&self.db, &NewFileRecord::from_path(inspection_id, Path::new(path)))
            .expect("Failed to register upload")
    }

    pub fn register_linked(&self, inspection_id: i64, path: &str, entry_id: i64) -> i64 {
        file_repo::register_upload(
            &self.db,
            &NewFileRecord::from_path(inspection_id, Path::new(path)).linked_to(entry_id),
        )
        .expect("Failed to register upload")
    }

    pub fn context(&self, collaborators: Collaborators) -> ProcessingContext {
        ProcessingContext::new(self.db.clone(), collaborators, ProcessingSettings::default())
    }

    pub fn dispatcher(&self, collaborators: Collaborators, workers: usize) -> BatchDispatcher {
        let runner = JobRunner::new(Arc::new(self.context(collaborators)));
        BatchDispatcher::start(runner, workers, None).expect("Failed to start dispatcher")
    }
}

/// Polls a job until it leaves `pending`, failing the test after 10 seconds.
pub fn wait_finished(dispatcher: &BatchDispatcher, handle: &str) -> JobStatusView {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let view = dispatcher.job_status(handle).expect("Failed to read job status");
        if view.status != "pending" {
            return view;
        }
        assert!(Instant::now() < deadline, "job {} did not finish", handle);
        std::thread::sleep(Duration::from_millis(20));
    }
}
