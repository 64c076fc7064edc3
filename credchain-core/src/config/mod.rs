//! Credentials file management for `credchain`
//!
//! This module provides the `ConfigFileStore` for loading and saving the
//! per-user credentials document in TOML format.

mod document;
mod store;

pub use document::{AccessTokenSection, ConfigDocument, ServiceApiSection, SshKeySection};
pub use store::{file_mode, ConfigFileStore, SECURE_DIR_MODE, SECURE_FILE_MODE};
