//! Credentials file load and save
//!
//! The credentials file is plain TOML. Confidentiality relies on file
//! permissions: [`ConfigFileStore::save`] always leaves the file readable
//! and writable by the owner only. Writes overwrite in place; concurrent
//! writers race and the last one wins.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::paths::CredentialPaths;

use super::document::ConfigDocument;

/// Permission mode applied to the credentials file
pub const SECURE_FILE_MODE: u32 = 0o600;

/// Permission mode applied to a newly created credentials directory
pub const SECURE_DIR_MODE: u32 = 0o700;

/// Loads and saves the per-user credentials document
#[derive(Debug, Clone)]
pub struct ConfigFileStore {
    path: PathBuf,
}

impl ConfigFileStore {
    /// Creates a store for an explicit file path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store for the standard credentials file under `paths`
    #[must_use]
    pub fn from_paths(paths: &CredentialPaths) -> Self {
        Self::new(paths.credentials_file())
    }

    /// Path of the credentials file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the credentials file exists
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the credentials document
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the file does not exist,
    /// `ConfigError::Io` if it cannot be read, and `ConfigError::Malformed`
    /// if it is not a valid credentials document. Partial parses are not
    /// accepted.
    pub fn load(&self) -> ConfigResult<ConfigDocument> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::Missing(self.path.clone())
            } else {
                ConfigError::Io {
                    path: self.path.clone(),
                    source: e,
                }
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Malformed {
            path: self.path.clone(),
            reason: e.message().to_string(),
        })
    }

    /// Loads the credentials document, treating a missing file as empty
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(&self) -> ConfigResult<ConfigDocument> {
        match self.load() {
            Err(ConfigError::Missing(_)) => Ok(ConfigDocument::default()),
            other => other,
        }
    }

    /// Saves the full document, replacing any existing content
    ///
    /// Creates the parent directory if needed. On Unix the file mode is set
    /// to `0600` whether or not the file already existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized or the file
    /// cannot be written.
    pub fn save(&self, document: &ConfigDocument) -> ConfigResult<()> {
        let content = toml::to_string_pretty(document)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                Self::create_dir(parent)?;
            }
        }

        let mut file = Self::open_for_write(&self.path).map_err(|e| self.io_error(e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(SECURE_FILE_MODE))
                .map_err(|e| self.io_error(e))?;
        }

        debug!(path = %self.path.display(), "Saved credentials file");
        Ok(())
    }

    /// Permission bits of the credentials file
    ///
    /// Returns `Ok(None)` on platforms without Unix permission bits.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    pub fn permission_mode(&self) -> ConfigResult<Option<u32>> {
        let metadata = fs::metadata(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::Missing(self.path.clone())
            } else {
                self.io_error(e)
            }
        })?;
        Ok(file_mode(&metadata))
    }

    fn create_dir(dir: &Path) -> ConfigResult<()> {
        fs::create_dir_all(dir).map_err(|e| ConfigError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dir, fs::Permissions::from_mode(SECURE_DIR_MODE)).map_err(
                |e| ConfigError::Io {
                    path: dir.to_path_buf(),
                    source: e,
                },
            )?;
        }
        Ok(())
    }

    fn open_for_write(path: &Path) -> std::io::Result<fs::File> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(SECURE_FILE_MODE);
        }

        options.open(path)
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Permission bits (`mode & 0o777`) of a file, on Unix
#[must_use]
pub fn file_mode(metadata: &fs::Metadata) -> Option<u32> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(metadata.permissions().mode() & 0o777)
    }

    #[cfg(not(unix))]
    {
        let _ = metadata;
        None
    }
}
