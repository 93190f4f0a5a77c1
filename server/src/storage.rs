use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

/// File extensions accepted for poster uploads.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Default poster size cap: 4 MiB.
pub const DEFAULT_MAX_POSTER_BYTES: u64 = 4 * 1024 * 1024;

/// Why a poster upload was refused.
#[derive(Debug)]
pub enum StorageError {
    /// The filename extension is not on the image allow-list.
    UnsupportedType(String),
    /// The payload exceeds the configured size cap.
    TooLarge { size: u64, limit: u64 },
    Io(std::io::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::UnsupportedType(ext) => {
                write!(f, "unsupported poster type '.{ext}' (allowed: png, jpg, jpeg, gif)")
            }
            StorageError::TooLarge { size, limit } => {
                write!(f, "poster is {size} bytes, over the {limit} byte limit")
            }
            StorageError::Io(e) => write!(f, "poster storage failed: {e}"),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// On-disk store for uploaded poster images.
///
/// Files are validated (extension allow-list, size cap) before anything is
/// written, renamed to a collision-proof name, and served back by reference.
#[derive(Clone)]
pub struct PosterStore {
    root: PathBuf,
    max_bytes: u64,
}

impl PosterStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: u64) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, max_bytes })
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Store uploaded bytes under a sanitized, collision-proof name derived
    /// from the suggested filename. Rejects disallowed extensions and
    /// oversized payloads before any write happens.
    pub fn save(&self, suggested_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let extension = permitted_extension(suggested_name)?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(StorageError::TooLarge {
                size: bytes.len() as u64,
                limit: self.max_bytes,
            });
        }

        let stem = sanitize_stem(suggested_name);
        let unique = Uuid::new_v4().simple().to_string();
        let filename = format!("{stem}-{}.{extension}", &unique[..8]);

        std::fs::write(self.root.join(&filename), bytes)?;
        Ok(filename)
    }

    /// Remove a stored poster by reference. Best-effort: a missing file or an
    /// unremovable one is logged and reported as false, never an error.
    pub fn delete(&self, filename: &str) -> bool {
        // A stored reference is a bare filename; anything with a path
        // separator never came from this store.
        if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
            warn!(filename, "refusing to delete suspicious poster reference");
            return false;
        }
        match std::fs::remove_file(self.root.join(filename)) {
            Ok(()) => true,
            Err(e) => {
                warn!(filename, error = %e, "could not remove poster file");
                false
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Check an uploaded filename against the image allow-list, returning the
/// lowercased extension.
fn permitted_extension(filename: &str) -> Result<String, StorageError> {
    let extension = filename
        .rsplit('.')
        .next()
        .filter(|_| filename.contains('.'))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(StorageError::UnsupportedType(extension))
    }
}

/// Strip everything but alphanumerics from the filename stem, keeping names
/// flat and shell-safe. Empty stems fall back to "poster".
fn sanitize_stem(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let stem = base.rsplit_once('.').map(|(s, _)| s).unwrap_or(base);
    let cleaned: String = stem.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if cleaned.is_empty() {
        "poster".to_string()
    } else {
        cleaned
    }
}
