use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::series_scanner::is_recognized;

/// One upload: a unique id and the directory holding its files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSession {
    pub id: Uuid,
    pub directory: PathBuf,
    pub created_at: SystemTime,
}

/// Owns the session directories below the upload root.
///
/// Mutations of one session (storing files, destroying it) are serialized
/// through a lock per session id; distinct sessions never wait on each other.
pub struct UploadSessionStore {
    root: PathBuf,
    max_file_bytes: u64,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl UploadSessionStore {
    /// Open the store, creating the upload root if needed
    pub fn new(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.upload_root)?;
        Ok(Self {
            root: config.upload_root.clone(),
            max_file_bytes: config.max_file_bytes,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a fresh id and create its empty directory
    pub fn create_session(&self) -> Result<UploadSession> {
        let id = Uuid::new_v4();
        let directory = self.root.join(id.to_string());
        fs::create_dir(&directory)?;
        self.session_lock(id);

        info!("Created session folder: {}", directory.display());
        Ok(UploadSession {
            id,
            directory,
            created_at: SystemTime::now(),
        })
    }

    /// Store one uploaded file in the session.
    ///
    /// Files without the `.dcm` extension are skipped and yield `Ok(None)`.
    /// Directory parts of `name` are flattened into the stored file name.
    pub fn accept_file(
        &self,
        session: &UploadSession,
        name: &str,
        bytes: &[u8],
    ) -> Result<Option<PathBuf>> {
        if !is_recognized(name) {
            debug!("Skipping unrecognized file: {name}");
            return Ok(None);
        }
        let file_name = stored_file_name(name)
            .ok_or_else(|| Error::Session(format!("unusable file name `{name}`")))?;
        if bytes.len() as u64 > self.max_file_bytes {
            return Err(Error::Session(format!(
                "{name} is {} bytes, limit is {}",
                bytes.len(),
                self.max_file_bytes
            )));
        }

        let not_found = || Error::NotFound(format!("session {}", session.id));
        let lock = self.live_session_lock(session).ok_or_else(not_found)?;
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if !session.directory.is_dir() {
            return Err(not_found());
        }

        let path = session.directory.join(file_name);
        fs::write(&path, bytes)?;
        info!("Saved DICOM file: {}", path.display());
        Ok(Some(path))
    }

    /// Store every recognized file of a batch, in submission order
    pub fn accept_batch<N, B>(
        &self,
        session: &UploadSession,
        files: impl IntoIterator<Item = (N, B)>,
    ) -> Result<Vec<PathBuf>>
    where
        N: AsRef<str>,
        B: AsRef<[u8]>,
    {
        let mut stored = Vec::new();
        for (name, bytes) in files {
            if let Some(path) = self.accept_file(session, name.as_ref(), bytes.as_ref())? {
                stored.push(path);
            }
        }
        Ok(stored)
    }

    /// Remove a session directory and everything in it.
    ///
    /// Returns `true` if this call removed the directory and `false` if it was
    /// already gone, so concurrent destroys of one id see exactly one `true`.
    pub fn destroy_session(&self, id: &str) -> Result<bool> {
        let id = parse_session_id(id)?;
        let directory = self.root.join(id.to_string());

        let lock = self.session_lock(id);
        let removed = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            match fs::remove_dir_all(&directory) {
                Ok(()) => {
                    info!("Cleaned up folder: {}", directory.display());
                    true
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!("Folder already removed: {}", directory.display());
                    false
                }
                Err(err) => return Err(err.into()),
            }
        };

        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        Ok(removed)
    }

    /// Best-effort removal of a previous session before a new upload
    pub fn replace_if_present(&self, old_id: &str) {
        if let Err(err) = self.destroy_session(old_id) {
            warn!("Error cleaning up previous upload {old_id}: {err}");
        }
    }

    /// Look up a live session by id
    pub fn session(&self, id: &str) -> Result<UploadSession> {
        let id = parse_session_id(id)?;
        let directory = self.root.join(id.to_string());
        let metadata = match fs::metadata(&directory) {
            Ok(metadata) if metadata.is_dir() => metadata,
            Ok(_) => return Err(Error::Session(format!("{} is not a directory", directory.display()))),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("session {id}")));
            }
            Err(err) => return Err(err.into()),
        };
        let created_at = metadata.created().or_else(|_| metadata.modified())?;

        Ok(UploadSession {
            id,
            directory,
            created_at,
        })
    }

    /// Resolve `path` to a file stored inside some session of this store
    pub fn resolve_stored_file(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let not_found = || Error::NotFound(format!("File not found: {}", path.display()));
        let resolved = path.canonicalize().map_err(|_| not_found())?;
        let root = self.root.canonicalize()?;
        if resolved.starts_with(&root) && resolved.is_file() {
            Ok(resolved)
        } else {
            Err(not_found())
        }
    }

    /// Lock of a session whose directory still exists.
    ///
    /// A destroyed session gets no new entry, so late writers cannot grow the map.
    fn live_session_lock(&self, session: &UploadSession) -> Option<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = locks.get(&session.id) {
            return Some(Arc::clone(lock));
        }
        if !session.directory.is_dir() {
            return None;
        }
        Some(Arc::clone(locks.entry(session.id).or_default()))
    }

    fn session_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .clone()
    }
}

fn parse_session_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| Error::Session(format!("malformed session id `{id}`")))
}

/// Flatten the normal components of an uploaded name into one file name
fn stored_file_name(name: &str) -> Option<String> {
    let normalized = name.replace('\\', "/");
    let parts: Vec<_> = Path::new(&normalized)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("_"))
    }
}
