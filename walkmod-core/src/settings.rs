//! Clap-free settings for the edit and inspect pipelines.

use camino::Utf8PathBuf;
use walkmod_types::DocumentFormat;

pub const DEFAULT_BACKUP_SUFFIX: &str = ".walkmod.bak";

/// Settings for the edit pipeline.
#[derive(Debug, Clone)]
pub struct EditSettings {
    /// Directory holding the configuration document.
    pub project_dir: Utf8PathBuf,
    /// Detected from the files present when unset.
    pub format: Option<DocumentFormat>,
    pub recursive: bool,
    pub dry_run: bool,

    // Backups
    pub backup_enabled: bool,
    pub backup_suffix: String,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            project_dir: Utf8PathBuf::from("."),
            format: None,
            recursive: false,
            dry_run: false,
            backup_enabled: false,
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }
}

impl EditSettings {
    /// Suffix handed to the document store, if backups are on.
    pub fn effective_backup_suffix(&self) -> Option<String> {
        self.backup_enabled.then(|| self.backup_suffix.clone())
    }
}

/// Settings for the inspect pipeline.
#[derive(Debug, Clone)]
pub struct InspectSettings {
    pub project_dir: Utf8PathBuf,
    pub format: Option<DocumentFormat>,
    /// Also load every module document.
    pub recursive: bool,
    /// Fail instead of reporting an empty configuration.
    pub error_if_missing: bool,
}

impl Default for InspectSettings {
    fn default() -> Self {
        Self {
            project_dir: Utf8PathBuf::from("."),
            format: None,
            recursive: false,
            error_if_missing: true,
        }
    }
}
