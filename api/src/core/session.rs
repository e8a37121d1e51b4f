//! Per-browser session state.
//!
//! A session owns the transcript, the last accepted upload and the query
//! engine built for it. Sessions are keyed by the `X-Session-Id` header and
//! live in memory; a session idle for longer than the store's TTL is dropped
//! the next time a session is created.

use std::{
    collections::HashMap,
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use contextor::QueryEngine;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Header carrying the session id in both directions.
pub const SESSION_HEADER: &str = "x-session-id";

/// Idle time after which a session may be evicted.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Model choices of one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub chat_model: String,
    pub temperature: f32,
    pub embed_model: String,
}

/// When an upload replaces the current index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReindexPolicy {
    /// Re-index only when the file name differs from the last upload.
    #[default]
    FileName,
    /// Re-index when the file name or the content hash differs.
    ContentHash,
}

impl FromStr for ReindexPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filename" | "file_name" | "name" => Ok(Self::FileName),
            "content" | "content_hash" | "hash" => Ok(Self::ContentHash),
            other => Err(format!("unknown reindex policy `{other}` (expected filename|content)")),
        }
    }
}

impl fmt::Display for ReindexPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileName => f.write_str("filename"),
            Self::ContentHash => f.write_str("content"),
        }
    }
}

/// The last upload that produced the current engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedFile {
    pub name: String,
    pub fingerprint: String,
}

#[derive(Debug)]
pub struct Session {
    settings: ModelSettings,
    last_file: Option<IndexedFile>,
    transcript: Vec<ChatTurn>,
    engine: Option<QueryEngine>,
}

impl Session {
    pub fn new(settings: ModelSettings) -> Self {
        Self {
            settings,
            last_file: None,
            transcript: Vec::new(),
            engine: None,
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ModelSettings) {
        self.settings = settings;
    }

    pub fn last_file(&self) -> Option<&IndexedFile> {
        self.last_file.as_ref()
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn engine(&self) -> Option<&QueryEngine> {
        self.engine.as_ref()
    }

    /// Whether an upload named `name` with content `fingerprint` must be indexed.
    pub fn needs_reindex(&self, name: &str, fingerprint: &str, policy: ReindexPolicy) -> bool {
        match (&self.last_file, policy) {
            (None, _) => true,
            (Some(last), ReindexPolicy::FileName) => last.name != name,
            (Some(last), ReindexPolicy::ContentHash) => {
                last.name != name || last.fingerprint != fingerprint
            }
        }
    }

    /// Records a successfully indexed upload and its engine.
    pub fn accept_upload(&mut self, file: IndexedFile, engine: QueryEngine) {
        debug!(file = %file.name, "session index replaced");
        self.last_file = Some(file);
        self.engine = Some(engine);
    }

    /// Swaps the engine while keeping the last upload.
    pub fn replace_engine(&mut self, engine: QueryEngine) {
        self.engine = Some(engine);
    }

    /// Drops the index; the next upload re-indexes whatever its name.
    pub fn invalidate_index(&mut self) {
        self.last_file = None;
        self.engine = None;
    }

    pub fn push_turn(&mut self, role: Role, content: impl Into<String>) {
        self.transcript.push(ChatTurn {
            role,
            content: content.into(),
        });
    }

    /// Empties the transcript. The index and last upload stay.
    pub fn clear_chat(&mut self) {
        self.transcript.clear();
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

#[derive(Debug)]
struct Slot {
    session: SharedSession,
    /// Milliseconds since the store's epoch.
    last_seen: AtomicU64,
}

impl Slot {
    fn touch(&self, now_ms: u64) -> SharedSession {
        self.last_seen.store(now_ms, Ordering::Relaxed);
        self.session.clone()
    }
}

/// In-memory map of session id to session, with idle eviction.
#[derive(Debug)]
pub struct SessionStore {
    defaults: ModelSettings,
    idle_ttl: Duration,
    epoch: Instant,
    sessions: RwLock<HashMap<String, Slot>>,
}

impl SessionStore {
    pub fn new(defaults: ModelSettings, idle_ttl: Duration) -> Self {
        Self {
            defaults,
            idle_ttl,
            epoch: Instant::now(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn defaults(&self) -> &ModelSettings {
        &self.defaults
    }

    /// Returns the session for `id`, creating it on first use.
    ///
    /// Creating a session first evicts every session idle for longer than
    /// the TTL, so the map only grows with recently active clients.
    pub async fn get_or_create(&self, id: &str) -> SharedSession {
        let now = self.now_ms();
        if let Some(slot) = self.sessions.read().await.get(id) {
            return slot.touch(now);
        }

        let mut w = self.sessions.write().await;
        if let Some(slot) = w.get(id) {
            return slot.touch(now);
        }
        self.evict_idle(&mut w, now);

        debug!(session = %id, live = w.len(), "session created");
        let session = Arc::new(Mutex::new(Session::new(self.defaults.clone())));
        w.insert(
            id.to_string(),
            Slot {
                session: session.clone(),
                last_seen: AtomicU64::new(now),
            },
        );
        session
    }

    /// Existing session for `id`; never creates one.
    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        let now = self.now_ms();
        self.sessions.read().await.get(id).map(|slot| slot.touch(now))
    }

    /// A fresh session with default settings that is not stored.
    pub fn detached(&self) -> SharedSession {
        Arc::new(Mutex::new(Session::new(self.defaults.clone())))
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn evict_idle(&self, sessions: &mut HashMap<String, Slot>, now_ms: u64) {
        let ttl_ms = u64::try_from(self.idle_ttl.as_millis()).unwrap_or(u64::MAX);
        sessions.retain(|id, slot| {
            let idle = now_ms.saturating_sub(slot.last_seen.load(Ordering::Relaxed));
            let keep = idle <= ttl_ms;
            if !keep {
                debug!(session = %id, idle_ms = idle, "idle session evicted");
            }
            keep
        });
    }
}
