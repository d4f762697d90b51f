//! The session store.
//!
//! Directory-scoped persistence: one directory per session under the data
//! dir, with the full session record rewritten atomically (write-to-temp
//! then rename) after every mutation. `get` transparently rehydrates from
//! disk after a restart or eviction. Different sessions never contend on a
//! shared lock beyond the brief cache-map access; serializing mutations to
//! the *same* session id is the caller's responsibility.

use chrono::{Duration, Utc};
use mp_core::{
    checksum_bytes, AnalysisParameters, FileCategory, FileEntry, Session, SessionDirs,
    SessionStatus,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{StoreError, StoreResult};

/// Filter for `list`
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Only sessions with this status
    pub status: Option<SessionStatus>,
    /// Only sessions whose name contains this substring
    pub name_contains: Option<String>,
}

/// Durable, directory-scoped session store with an evictable cache
pub struct SessionStore {
    data_dir: PathBuf,
    cache: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    /// Open (or create) a store rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|e| StoreError::IoWithPath {
            path: data_dir.display().to_string(),
            source: e,
        })?;
        Ok(Self {
            data_dir,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Root directory holding all session directories
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolved directory paths for a session id
    pub fn dirs(&self, id: &str) -> SessionDirs {
        SessionDirs::new(&self.data_dir, id)
    }

    /// Create a new session: directory scaffold plus initial metadata
    pub fn create(&self, name: &str, parameters: AnalysisParameters) -> StoreResult<Session> {
        let session = Session::new(name, parameters);
        let dirs = self.dirs(&session.id);
        dirs.create_all()?;
        self.persist(&session)?;
        self.cache_put(&session);
        log::info!("created session {} ('{}')", session.id, session.name);
        Ok(session)
    }

    /// Fetch a session, rehydrating from disk on cache miss
    pub fn get(&self, id: &str) -> StoreResult<Session> {
        if let Some(session) = self.cache.lock().expect("session cache poisoned").get(id) {
            return Ok(session.clone());
        }
        let session = self.load_from_disk(id)?;
        self.cache_put(&session);
        Ok(session)
    }

    /// Persist a mutated session.
    ///
    /// Refreshes `updated_at`, rewrites the metadata file, and refreshes the
    /// cache. Fails with `UpdateMissing` if the session's directory is gone;
    /// an update must never silently recreate a deleted session.
    pub fn update(&self, session: &mut Session) -> StoreResult<()> {
        let dirs = self.dirs(&session.id);
        if !dirs.root().is_dir() {
            return Err(StoreError::UpdateMissing {
                id: session.id.clone(),
            });
        }
        session.touch();
        self.persist(session)?;
        self.cache_put(session);
        Ok(())
    }

    /// List sessions, tolerating partially-written or orphaned directories
    pub fn list(&self, filter: &ListFilter) -> StoreResult<Vec<Session>> {
        let mut sessions = Vec::new();
        let entries = fs::read_dir(&self.data_dir).map_err(|e| StoreError::IoWithPath {
            path: self.data_dir.display().to_string(),
            source: e,
        })?;

        for entry in entries {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            match self.load_from_disk(&id) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    // A broken entry must not fail the whole listing
                    log::warn!("skipping unreadable session directory '{}': {}", id, e);
                }
            }
        }

        if let Some(status) = filter.status {
            sessions.retain(|s| s.status == status);
        }
        if let Some(needle) = &filter.name_contains {
            sessions.retain(|s| s.name.contains(needle.as_str()));
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    /// Delete a session and its entire directory
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        let dirs = self.dirs(id);
        if !dirs.root().is_dir() {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        fs::remove_dir_all(dirs.root()).map_err(|e| StoreError::IoWithPath {
            path: dirs.root().display().to_string(),
            source: e,
        })?;
        self.cache.lock().expect("session cache poisoned").remove(id);
        log::info!("deleted session {}", id);
        Ok(())
    }

    /// Write bytes into a session's category subdirectory and record the
    /// file in the audit trail (uploads and outputs only), persisting the
    /// session before returning.
    pub fn save_file(
        &self,
        session: &mut Session,
        name: &str,
        bytes: &[u8],
        category: FileCategory,
    ) -> StoreResult<PathBuf> {
        validate_file_name(name)?;
        let dirs = self.dirs(&session.id);
        let dir = dirs.subdir(category);
        fs::create_dir_all(&dir)?;
        let path = dir.join(name);
        fs::write(&path, bytes).map_err(|e| StoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        self.audit(session, name, category, Some(checksum_bytes(bytes)));
        self.update(session)?;
        Ok(path)
    }

    /// Record an already-written file (e.g. a runtime artifact) in the
    /// audit trail. The file must exist in its category subdirectory.
    pub fn add_file(
        &self,
        session: &mut Session,
        name: &str,
        category: FileCategory,
    ) -> StoreResult<PathBuf> {
        validate_file_name(name)?;
        let path = self.dirs(&session.id).subdir(category).join(name);
        let bytes = fs::read(&path).map_err(|e| StoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        self.audit(session, name, category, Some(checksum_bytes(&bytes)));
        self.update(session)?;
        Ok(path)
    }

    /// Drop a session from the cache. The next `get` reads from disk.
    pub fn evict(&self, id: &str) {
        self.cache.lock().expect("session cache poisoned").remove(id);
    }

    /// Remove sessions inactive beyond `retention` and not `active`.
    ///
    /// Returns the ids that were (or with `dry_run` would be) removed.
    pub fn cleanup(&self, retention: Duration, dry_run: bool) -> StoreResult<Vec<String>> {
        let cutoff = Utc::now() - retention;
        let mut removed = Vec::new();

        for session in self.list(&ListFilter::default())? {
            if session.status == SessionStatus::Active {
                continue;
            }
            if session.updated_at >= cutoff {
                continue;
            }
            if !dry_run {
                self.delete(&session.id)?;
            }
            removed.push(session.id);
        }

        Ok(removed)
    }

    fn audit(
        &self,
        session: &mut Session,
        name: &str,
        category: FileCategory,
        checksum: Option<String>,
    ) {
        let entry = FileEntry {
            name: name.to_string(),
            category,
            checksum,
            added_at: Utc::now(),
        };
        match category {
            FileCategory::Input => session.record_uploaded(entry),
            FileCategory::Output => session.record_generated(entry),
            // Working files and logs are not part of the audit trail
            FileCategory::Processing | FileCategory::Logs => {}
        }
    }

    fn load_from_disk(&self, id: &str) -> StoreResult<Session> {
        let path = self.dirs(id).metadata_path();
        if !path.exists() {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        let content = fs::read_to_string(&path).map_err(|e| StoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            id: id.to_string(),
            message: e.to_string(),
        })
    }

    /// Atomic full rewrite of the session metadata (temp + rename), so a
    /// crash mid-write never leaves a partially-written record visible.
    fn persist(&self, session: &Session) -> StoreResult<()> {
        let path = self.dirs(&session.id).metadata_path();
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&temp_path, json).map_err(|e| StoreError::IoWithPath {
            path: temp_path.display().to_string(),
            source: e,
        })?;
        fs::rename(&temp_path, &path).map_err(|e| StoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }

    fn cache_put(&self, session: &Session) {
        self.cache
            .lock()
            .expect("session cache poisoned")
            .insert(session.id.clone(), session.clone());
    }
}

fn validate_file_name(name: &str) -> StoreResult<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
    {
        return Err(StoreError::InvalidFileName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
