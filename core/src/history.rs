//! Scan history persistence.
//!
//! The engine only depends on the [`ScanHistoryStore`] contract; the JSON
//! file layout below is one implementation of it, not part of the engine's
//! surface.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use lanscope_common::ScanError;
use lanscope_common::session::{ScanSession, SessionId, SessionSummary};

/// Persistence contract for finished sessions.
#[async_trait]
pub trait ScanHistoryStore: Send + Sync {
    /// Stores a session, returning the id it was stored under. Ids clash
    /// across scheduler runs; a colliding record from a different run is
    /// stored under a fresh id instead of overwriting.
    async fn save(&self, session: &ScanSession) -> Result<SessionId, ScanError>;

    /// Summaries, newest first.
    async fn list(&self) -> Result<Vec<SessionSummary>, ScanError>;

    async fn load(&self, id: SessionId) -> Result<ScanSession, ScanError>;

    async fn delete(&self, id: SessionId) -> Result<(), ScanError>;
}

fn store_record(all: &mut Vec<ScanSession>, session: &ScanSession) -> SessionId {
    let mut record = session.clone();

    if let Some(pos) = all.iter().position(|s| s.id == record.id) {
        if all[pos].started_at == record.started_at {
            // Same run saving again (e.g. after cancellation): update in place.
            all[pos] = record;
            return session.id;
        }
        let next = all.iter().map(|s| s.id.0).max().unwrap_or(0) + 1;
        record.id = SessionId(next);
    }

    // Newest first.
    all.insert(0, record);
    all[0].id
}

/// One JSON document holding every stored session.
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_all(&self) -> Result<Vec<ScanSession>, ScanError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| ScanError::History(format!("corrupt history file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, sessions: &[ScanSession]) -> Result<(), ScanError> {
        let json = serde_json::to_vec_pretty(sessions)
            .map_err(|e| ScanError::History(format!("cannot encode history: {e}")))?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl ScanHistoryStore for JsonHistoryStore {
    async fn save(&self, session: &ScanSession) -> Result<SessionId, ScanError> {
        let mut all = self.read_all().await?;
        let id = store_record(&mut all, session);
        self.write_all(&all).await?;
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, ScanError> {
        Ok(self.read_all().await?.iter().map(|s| s.summary()).collect())
    }

    async fn load(&self, id: SessionId) -> Result<ScanSession, ScanError> {
        self.read_all()
            .await?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or(ScanError::SessionNotFound(id))
    }

    async fn delete(&self, id: SessionId) -> Result<(), ScanError> {
        let mut all = self.read_all().await?;
        let before = all.len();
        all.retain(|s| s.id != id);
        if all.len() == before {
            return Err(ScanError::SessionNotFound(id));
        }
        self.write_all(&all).await
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryHistoryStore {
    sessions: Mutex<Vec<ScanSession>>,
}

#[async_trait]
impl ScanHistoryStore for MemoryHistoryStore {
    async fn save(&self, session: &ScanSession) -> Result<SessionId, ScanError> {
        let mut all = self.sessions.lock().await;
        Ok(store_record(&mut all, session))
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, ScanError> {
        Ok(self
            .sessions
            .lock()
            .await
            .iter()
            .map(|s| s.summary())
            .collect())
    }

    async fn load(&self, id: SessionId) -> Result<ScanSession, ScanError> {
        self.sessions
            .lock()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(ScanError::SessionNotFound(id))
    }

    async fn delete(&self, id: SessionId) -> Result<(), ScanError> {
        let mut all = self.sessions.lock().await;
        let before = all.len();
        all.retain(|s| s.id != id);
        if all.len() == before {
            return Err(ScanError::SessionNotFound(id));
        }
        Ok(())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
