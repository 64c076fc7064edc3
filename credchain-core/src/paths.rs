//! Filesystem locations derived from a single home directory
//!
//! Every path the resolver and diagnostics touch is computed from one
//! injected home directory, so tests can run against a temporary root.

use std::path::{Path, PathBuf};

/// Directory under the home directory holding the credentials file
pub const CONFIG_DIR_NAME: &str = ".credchain";

/// File name of the credentials document
pub const CREDENTIALS_FILE: &str = "credentials.toml";

/// Conventional private key names under `~/.ssh`, in scan order
pub const DEFAULT_KEY_NAMES: [&str; 3] = ["id_rsa", "id_ed25519", "id_ecdsa"];

/// Paths used for credential lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPaths {
    home: PathBuf,
}

impl CredentialPaths {
    /// Creates paths rooted at the current user's home directory
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn from_home_dir() -> Option<Self> {
        dirs::home_dir().map(Self::with_home)
    }

    /// Creates paths rooted at a custom home directory
    ///
    /// This is useful for testing or non-standard layouts.
    #[must_use]
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// The home directory all other paths derive from
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `<home>/.credchain`
    #[must_use]
    pub fn config_dir(&self) -> PathBuf {
        self.home.join(CONFIG_DIR_NAME)
    }

    /// `<home>/.credchain/credentials.toml`
    #[must_use]
    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir().join(CREDENTIALS_FILE)
    }

    /// `<home>/.ssh`
    #[must_use]
    pub fn ssh_dir(&self) -> PathBuf {
        self.home.join(".ssh")
    }

    /// Default private key paths (RSA, Ed25519, ECDSA) in scan order
    #[must_use]
    pub fn default_key_paths(&self) -> Vec<PathBuf> {
        let ssh_dir = self.ssh_dir();
        DEFAULT_KEY_NAMES
            .iter()
            .map(|name| ssh_dir.join(name))
            .collect()
    }

    /// Expands a leading `~` against the configured home directory
    #[must_use]
    pub fn expand(&self, raw: &str) -> PathBuf {
        let home = self.home.to_string_lossy().into_owned();
        let expanded = shellexpand::tilde_with_context(raw.trim(), || Some(home.as_str()));
        PathBuf::from(expanded.as_ref())
    }
}
