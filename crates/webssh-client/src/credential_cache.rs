//! Opt-in local credential store.
//!
//! Keeps one credential in plain text next to an `enabled` flag so the
//! connection form can be prefilled. This is a convenience for trusted
//! machines and is not secret storage. The server never sees it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::form::ConnectForm;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("credential cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential cache is corrupt: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct CacheFile {
    credential: String,
    enabled: bool,
}

pub struct CredentialCache {
    path: PathBuf,
    credential: String,
    enabled: bool,
}

/// `<config dir>/webssh/credential.json`.
pub fn default_cache_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("webssh").join("credential.json"))
}

impl CredentialCache {
    /// Load the cache at `path`. A missing file is an empty, disabled cache.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let file = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str::<CacheFile>(&content)?
        } else {
            CacheFile::default()
        };

        Ok(Self {
            path,
            credential: file.credential,
            enabled: file.enabled,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// The credential to prefill, if the cache is on and holds one.
    pub fn autofill(&self) -> Option<&str> {
        (self.enabled && !self.credential.is_empty()).then_some(self.credential.as_str())
    }

    /// Bring `form` in line with the cache: prefill when enabled, clear the
    /// credential when disabled.
    pub fn apply_to(&self, form: &mut ConnectForm) {
        if let Some(credential) = self.autofill() {
            form.credential = credential.to_string();
        } else if !self.enabled {
            form.credential.clear();
        }
    }

    /// Store a new credential and enabled flag, then apply to `form`.
    pub fn save_credential(
        &mut self,
        credential: impl Into<String>,
        enabled: bool,
        form: &mut ConnectForm,
    ) -> Result<(), CacheError> {
        self.credential = credential.into();
        self.enabled = enabled;
        self.save()?;
        self.apply_to(form);
        Ok(())
    }

    /// Turn the cache on or off and persist the flag.
    pub fn set_enabled(&mut self, enabled: bool, form: &mut ConnectForm) -> Result<(), CacheError> {
        self.enabled = enabled;
        self.save()?;
        self.apply_to(form);
        Ok(())
    }

    pub fn save(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = CacheFile {
            credential: self.credential.clone(),
            enabled: self.enabled,
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        restrict_permissions(&self.path);

        if self.enabled && !self.credential.is_empty() {
            warn!(path = %self.path.display(), "Credential cache stores the credential in plain text");
        }
        info!(path = %self.path.display(), enabled = self.enabled, "Credential cache saved");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        warn!(path = %path.display(), error = %e, "Failed to restrict credential cache permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
