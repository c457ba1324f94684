use super::{StoredMessage, Thread, ThreadStore, ThreadSummary, DEFAULT_THREAD_TITLE};
use crate::error::SyncError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Index entry: thread metadata without the message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    id: String,
    title: String,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    deleted_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ThreadIndex {
    threads: Vec<IndexEntry>,
}

/// File-backed thread store: one JSON document per thread plus an index of
/// metadata, all under a base directory. Writes go through a temp file and
/// rename, and a process-wide mutex serializes mutations.
pub struct FileThreadStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileThreadStore {
    /// Store under the default data directory (`<config_dir>/syncai/threads`).
    pub fn new() -> Result<Self, SyncError> {
        let base = dirs::config_dir()
            .ok_or_else(|| SyncError::Storage("could not determine config directory".into()))?
            .join("syncai")
            .join("threads");
        Self::with_dir(base)
    }

    /// Store under a custom directory. Used by tests.
    pub fn with_dir(base_dir: PathBuf) -> Result<Self, SyncError> {
        fs::create_dir_all(&base_dir)
            .map_err(|e| SyncError::Storage(format!("failed to create thread directory: {e}")))?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn index_path(&self) -> PathBuf {
        self.base_dir.join("index.json")
    }

    fn thread_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{id}.json"))
    }

    fn load_index(&self) -> Result<ThreadIndex, SyncError> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(ThreadIndex::default());
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| SyncError::Storage(format!("failed to read index: {e}")))?;
        serde_json::from_str(&contents)
            .map_err(|e| SyncError::Storage(format!("failed to parse index: {e}")))
    }

    fn save_index(&self, index: &ThreadIndex) -> Result<(), SyncError> {
        let contents = serde_json::to_string_pretty(index)
            .map_err(|e| SyncError::Storage(format!("failed to serialize index: {e}")))?;
        self.write_atomic(&self.index_path(), &contents)
    }

    fn load_thread(&self, id: &str) -> Result<Option<Thread>, SyncError> {
        let path = self.thread_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| SyncError::Storage(format!("failed to read thread {id}: {e}")))?;
        let thread = serde_json::from_str(&contents)
            .map_err(|e| SyncError::Storage(format!("failed to parse thread {id}: {e}")))?;
        Ok(Some(thread))
    }

    fn save_thread(&self, thread: &Thread) -> Result<(), SyncError> {
        let contents = serde_json::to_string_pretty(thread)
            .map_err(|e| SyncError::Storage(format!("failed to serialize thread: {e}")))?;
        self.write_atomic(&self.thread_path(&thread.id), &contents)
    }

    fn write_atomic(&self, path: &PathBuf, contents: &str) -> Result<(), SyncError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .map_err(|e| SyncError::Storage(format!("failed to write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, path)
            .map_err(|e| SyncError::Storage(format!("failed to rename {}: {e}", path.display())))
    }

    fn update_entry<F>(&self, id: &str, mutate: F) -> Result<(), SyncError>
    where
        F: FnOnce(&mut IndexEntry),
    {
        let mut index = self.load_index()?;
        let entry = index
            .threads
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| SyncError::Storage(format!("thread not found in index: {id}")))?;
        mutate(entry);
        let snapshot = entry.clone();
        index
            .threads
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.save_index(&index)?;

        // Keep the per-thread document in step with its index entry.
        if let Some(mut thread) = self.load_thread(id)? {
            thread.title = snapshot.title;
            thread.updated_at = snapshot.updated_at;
            thread.deleted = snapshot.deleted;
            thread.deleted_at = snapshot.deleted_at;
            self.save_thread(&thread)?;
        }
        Ok(())
    }

    fn now() -> String {
        Utc::now().to_rfc3339()
    }
}

impl ThreadStore for FileThreadStore {
    fn create(&self) -> Result<Thread, SyncError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let now = Self::now();
        let thread = Thread {
            id: format!("thread-{}", uuid::Uuid::new_v4()),
            title: DEFAULT_THREAD_TITLE.to_string(),
            created_at: now.clone(),
            updated_at: now.clone(),
            deleted: false,
            deleted_at: None,
            messages: Vec::new(),
        };
        self.save_thread(&thread)?;

        let mut index = self.load_index()?;
        index.threads.insert(
            0,
            IndexEntry {
                id: thread.id.clone(),
                title: thread.title.clone(),
                created_at: now.clone(),
                updated_at: now,
                deleted: false,
                deleted_at: None,
            },
        );
        self.save_index(&index)?;
        Ok(thread)
    }

    fn get(&self, id: &str) -> Result<Option<Thread>, SyncError> {
        match self.load_thread(id)? {
            Some(t) if !t.deleted => Ok(Some(t)),
            _ => Ok(None),
        }
    }

    fn list_active(&self) -> Result<Vec<ThreadSummary>, SyncError> {
        let mut entries = self.load_index()?.threads;
        entries.retain(|t| !t.deleted);
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries
            .into_iter()
            .map(|t| ThreadSummary {
                id: t.id,
                title: t.title,
                updated_at: t.updated_at,
            })
            .collect())
    }

    fn soft_delete(&self, id: &str) -> Result<(), SyncError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let now = Self::now();
        self.update_entry(id, |entry| {
            entry.deleted = true;
            entry.deleted_at = Some(now.clone());
        })
    }

    fn append_message_pair(
        &self,
        thread_id: &str,
        user: StoredMessage,
        assistant: StoredMessage,
    ) -> Result<(), SyncError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut thread = self
            .load_thread(thread_id)?
            .ok_or_else(|| SyncError::Storage(format!("thread not found: {thread_id}")))?;

        let now = Self::now();
        thread.messages.push(user);
        thread.messages.push(assistant);
        thread.updated_at = now.clone();
        // Single rename makes the pair visible together or not at all.
        self.save_thread(&thread)?;

        self.update_entry(thread_id, |entry| {
            entry.updated_at = now.clone();
        })
    }

    fn update_title(&self, thread_id: &str, title: &str) -> Result<(), SyncError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.update_entry(thread_id, |entry| {
            entry.title = title.to_string();
        })
    }

    fn touch_updated_at(&self, thread_id: &str) -> Result<(), SyncError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let now = Self::now();
        self.update_entry(thread_id, |entry| {
            entry.updated_at = now.clone();
        })
    }
}
