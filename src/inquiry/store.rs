use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use super::form::{FormType, Inquiry};

/// Name of the single slot holding every persisted submission.
pub const STORAGE_KEY: &str = "formSubmissions";

/// An accepted inquiry. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SubmissionRecord", try_from = "SubmissionRecord")]
pub struct Submission {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub inquiry: Inquiry,
}

impl Submission {
    pub fn form_type(&self) -> FormType {
        self.inquiry.form_type()
    }
}

/// On-disk shape: `{"id", "timestamp", "formType", "data"}`.
#[derive(Serialize, Deserialize)]
struct SubmissionRecord {
    id: String,
    timestamp: String,
    #[serde(rename = "formType")]
    form_type: FormType,
    data: serde_json::Value,
}

impl From<Submission> for SubmissionRecord {
    fn from(s: Submission) -> Self {
        SubmissionRecord {
            timestamp: s.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            form_type: s.inquiry.form_type(),
            data: s.inquiry.data().unwrap_or_default(),
            id: s.id,
        }
    }
}

impl TryFrom<SubmissionRecord> for Submission {
    type Error = String;

    fn try_from(r: SubmissionRecord) -> Result<Self, Self::Error> {
        let timestamp = DateTime::parse_from_rfc3339(&r.timestamp)
            .map_err(|e| format!("Invalid timestamp '{}': {e}", r.timestamp))?
            .with_timezone(&Utc);
        let inquiry = Inquiry::from_data(r.form_type, r.data)
            .map_err(|e| format!("Invalid {} data: {e}", r.form_type))?;
        Ok(Submission {
            id: r.id,
            timestamp,
            inquiry,
        })
    }
}

#[derive(Debug)]
pub enum PersistenceError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
    Unavailable(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Io(err) => write!(f, "Storage I/O failed: {err}"),
            PersistenceError::Serialize(err) => write!(f, "Serialization failed: {err}"),
            PersistenceError::Unavailable(msg) => write!(f, "Storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io(err)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialize(err)
    }
}

/// Durable home of the submission sequence.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Read the persisted sequence. A corrupt value is discarded and read as empty.
    async fn load(&self) -> Vec<Submission>;

    /// Persist one more submission after everything already stored.
    async fn append(&self, submission: Submission) -> Result<Submission, PersistenceError>;
}

/// Stores the sequence as a JSON array in `<data_dir>/formSubmissions.json`.
pub struct FileStore {
    path: PathBuf,
    write_lock: AsyncMutex<()>,
}

impl FileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{STORAGE_KEY}.json")),
            write_lock: AsyncMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A value that does not deserialize is removed and read as empty. Read
    /// failures are returned so nothing gets written over unread history.
    async fn read_or_discard(&self) -> std::io::Result<Vec<Submission>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        match serde_json::from_slice(&raw) {
            Ok(submissions) => Ok(submissions),
            Err(e) => {
                tracing::warn!("Error loading submissions, discarding stored value: {e}");
                if let Err(e) = tokio::fs::remove_file(&self.path).await {
                    tracing::warn!("Failed to remove {}: {e}", self.path.display());
                }
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl SubmissionStore for FileStore {
    async fn load(&self) -> Vec<Submission> {
        let _guard = self.write_lock.lock().await;
        self.read_or_discard().await.unwrap_or_else(|e| {
            tracing::warn!("Could not read {}: {e}", self.path.display());
            Vec::new()
        })
    }

    async fn append(&self, submission: Submission) -> Result<Submission, PersistenceError> {
        let _guard = self.write_lock.lock().await;

        let mut persisted = self.read_or_discard().await?;
        let submission = place_after(submission, &persisted);
        persisted.push(submission.clone());
        let body = serde_json::to_vec(&persisted)?;

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(submission)
    }
}

fn latest_id(submissions: &[Submission]) -> Option<i64> {
    submissions
        .iter()
        .filter_map(|s| s.id.parse::<i64>().ok())
        .max()
}

/// Renumber `submission` past every id already in `existing`. Another visitor
/// may have stored one in the same millisecond.
fn place_after(mut submission: Submission, existing: &[Submission]) -> Submission {
    if let (Ok(id), Some(max)) = (submission.id.parse::<i64>(), latest_id(existing)) {
        if id <= max {
            submission.id = (max + 1).to_string();
        }
    }
    submission
}

/// In-memory store for tests and for running without a data directory.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Submission>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_submissions(submissions: Vec<Submission>) -> Self {
        Self {
            records: Mutex::new(submissions),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every following `append` fail, as a full or missing storage would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<Submission> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn load(&self) -> Vec<Submission> {
        self.snapshot()
    }

    async fn append(&self, submission: Submission) -> Result<Submission, PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("quota exceeded".into()));
        }
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let submission = place_after(submission, &records);
        records.push(submission.clone());
        Ok(submission)
    }
}

/// A view's own copy of the submission sequence, loaded once when it opens.
///
/// Appends land here first and are then written through to the store. A
/// failed write leaves the optimistic entry in place, so this copy may run
/// ahead of what is persisted.
pub struct SubmissionLog {
    store: Arc<dyn SubmissionStore>,
    entries: Vec<Submission>,
}

impl SubmissionLog {
    pub async fn load(store: Arc<dyn SubmissionStore>) -> Self {
        let entries = store.load().await;
        Self { store, entries }
    }

    pub async fn add(&mut self, inquiry: Inquiry) -> Result<Submission, PersistenceError> {
        let submission = self.mint(inquiry);
        self.entries.push(submission.clone());
        let stored = self.store.append(submission).await?;
        // The store may have renumbered it.
        if let Some(last) = self.entries.last_mut() {
            *last = stored.clone();
        }
        Ok(stored)
    }

    pub fn entries(&self) -> &[Submission] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn mint(&self, inquiry: Inquiry) -> Submission {
        let now = Utc::now().timestamp_millis();
        // Ids are epoch millis, bumped past the latest so they stay strictly increasing.
        let id = match latest_id(&self.entries) {
            Some(max) if now <= max => max + 1,
            _ => now,
        };

        Submission {
            id: id.to_string(),
            timestamp: DateTime::from_timestamp_millis(now).unwrap_or_else(Utc::now),
            inquiry,
        }
    }
}
