//! Configuration management for docextract using the prefer crate.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::deploy::DeployConfig;
use crate::models::{FormError, FormRegistry};
use crate::ocr::{OcrConfig, TesseractBackend};
use crate::repository::DbContext;
use crate::storage::DocumentStore;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "docextract.db";

/// Default storage subdirectory name (mirror of `s3://bucket/key` objects).
const STORAGE_SUBDIR: &str = "storage";

/// Default forms subdirectory name.
const FORMS_SUBDIR: &str = "forms";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Set via DATABASE_URL env var or config.
    pub database_url: Option<String>,
    /// Root of the local document mirror.
    pub storage_dir: PathBuf,
    /// Directory of form definitions.
    pub forms_dir: PathBuf,
    pub ocr: OcrConfig,
    pub deploy: DeployConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Data dir -> Home dir -> Current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docextract");
        Self::with_data_dir(data_dir)
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            storage_dir: data_dir.join(STORAGE_SUBDIR),
            forms_dir: data_dir.join(FORMS_SUBDIR),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            ocr: OcrConfig::default(),
            deploy: DeployConfig::default(),
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        match self.database_url {
            Some(ref url) => url.clone(),
            None => format!("sqlite:{}", self.database_path().display()),
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (label, dir) in [
            ("data_dir", &self.data_dir),
            ("storage_dir", &self.storage_dir),
            ("forms_dir", &self.forms_dir),
        ] {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("Failed to create {} '{}': {}", label, dir.display(), e),
                )
            })?;
        }
        Ok(())
    }

    /// Create a database context for these settings.
    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }

    pub fn document_store(&self) -> DocumentStore {
        DocumentStore::new(&self.storage_dir)
    }

    pub fn load_forms(&self) -> Result<FormRegistry, FormError> {
        FormRegistry::load_dir(&self.forms_dir)
    }

    pub fn ocr_backend(&self) -> TesseractBackend {
        TesseractBackend::with_config(self.document_store(), self.ocr.clone())
    }
}

/// Configuration file contents.
///
/// Relative paths are resolved against the config file's directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename inside the data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forms_dir: Option<String>,
    pub ocr: OcrConfig,
    pub deploy: DeployConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer for discovery.
    /// Finds docextract config files in the standard locations.
    pub async fn load() -> Self {
        match prefer::load("docextract").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("{}", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// The format is picked by extension (TOML, YAML, otherwise JSON).
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the config file, if loaded from one.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Apply configuration to settings, resolving relative paths against `base_dir`.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            *settings = Settings {
                ocr: settings.ocr.clone(),
                deploy: settings.deploy.clone(),
                database_url: settings.database_url.clone(),
                ..Settings::with_data_dir(resolve_path(data_dir, base_dir))
            };
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref url) = self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(ref storage_dir) = self.storage_dir {
            settings.storage_dir = resolve_path(storage_dir, base_dir);
        }
        if let Some(ref forms_dir) = self.forms_dir {
            settings.forms_dir = resolve_path(forms_dir, base_dir);
        }

        settings.ocr = self.ocr.clone();
        settings.deploy = DeployConfig {
            backend_dir: base_dir.join(&self.deploy.backend_dir),
            ui_dir: base_dir.join(&self.deploy.ui_dir),
            iac_dir: base_dir.join(&self.deploy.iac_dir),
            ..self.deploy.clone()
        };
    }
}

/// Resolve a path that may be relative or start with `~`.
pub fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
    let expanded = match path_str.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path_str)),
        None => PathBuf::from(path_str),
    };

    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory or database file (--target flag).
    pub target: Option<PathBuf>,
}

/// A `--target` resolved to a data directory and database filename.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub data_dir: PathBuf,
    pub database_filename: String,
}

impl ResolvedTarget {
    /// A `.db`/`.sqlite`/`.sqlite3` path or an existing file is a database
    /// file; anything else is a data directory.
    pub fn from_path(path: &Path) -> Self {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(path)
        };

        let is_db_file = path
            .extension()
            .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3")
            || path.is_file();

        if is_db_file {
            Self {
                database_filename: path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(DEFAULT_DATABASE_FILENAME)
                    .to_string(),
                data_dir: path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
            }
        } else {
            Self {
                data_dir: path,
                database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            }
        }
    }
}

fn database_url_from_env() -> Option<String> {
    std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty())
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), String> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let settings = resolve_settings(
        &config,
        options.target.as_deref(),
        database_url_from_env(),
    );
    Ok((settings, config))
}

/// Build settings from a config, a `--target` override and a `DATABASE_URL`
/// override, in increasing precedence.
pub fn resolve_settings(
    config: &Config,
    target: Option<&Path>,
    database_url: Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(target) = target {
        let resolved = ResolvedTarget::from_path(target);
        let explicit_storage = config.storage_dir.is_some();
        let explicit_forms = config.forms_dir.is_some();
        if !explicit_storage {
            settings.storage_dir = resolved.data_dir.join(STORAGE_SUBDIR);
        }
        if !explicit_forms {
            settings.forms_dir = resolved.data_dir.join(FORMS_SUBDIR);
        }
        settings.data_dir = resolved.data_dir;
        settings.database_filename = resolved.database_filename;
    }

    // DATABASE_URL environment variable takes highest precedence
    if let Some(url) = database_url {
        tracing::debug!("Using DATABASE_URL from environment: {}", url);
        settings.database_url = Some(url);
    }

    settings
}
