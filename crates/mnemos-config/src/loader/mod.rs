//! Config file discovery and merging.
//!
//! A config is assembled from up to three kinds of JSON5 files, merged in
//! this order with later files winning key by key:
//!
//! 1. the user file, `~/.mnemos/mnemos.json5`
//! 2. the nearest `mnemos.json5` at or above the working directory
//! 3. override files named explicitly by the caller

mod merge;
mod schema;


use crate::{ConfigError, MnemosConfig};
use directories::UserDirs;
use log::{debug, info};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "mnemos.json5";
const HOME_DIR: &str = ".mnemos";

/// Where a merged config file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    User,
    Workspace,
    Override,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigOrigin::User => "user",
            ConfigOrigin::Workspace => "workspace",
            ConfigOrigin::Override => "override",
        })
    }
}

/// A file that contributed to a loaded config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub origin: ConfigOrigin,
    pub path: PathBuf,
}

impl ConfigFile {
    fn label(&self) -> String {
        format!("{}({})", self.origin, self.path.display())
    }
}

/// Effective config and the files merged into it, lowest precedence first.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: MnemosConfig,
    pub files: Vec<ConfigFile>,
}

/// Where to look for config files.
#[derive(Debug, Clone)]
pub struct ConfigSearch {
    /// User-wide file; skipped when absent on disk.
    pub user_file: Option<PathBuf>,
    /// Directory the workspace file search starts from.
    pub cwd: PathBuf,
    /// Files that must exist, merged last in order.
    pub overrides: Vec<PathBuf>,
}

impl ConfigSearch {
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            user_file: home_dir().map(|home| home.join(CONFIG_FILE)),
            cwd: cwd.as_ref().to_path_buf(),
            overrides: Vec::new(),
        }
    }

    /// Ignore the user file, e.g. for hermetic runs.
    pub fn without_user_file(mut self) -> Self {
        self.user_file = None;
        self
    }

    pub fn with_override(mut self, path: impl AsRef<Path>) -> Self {
        self.overrides.push(path.as_ref().to_path_buf());
        self
    }

    fn workspace_file(&self) -> Option<PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|path| path.is_file())
    }

    fn files(&self) -> Vec<ConfigFile> {
        let mut files = Vec::new();
        if let Some(path) = self.user_file.as_ref().filter(|path| path.is_file()) {
            files.push(ConfigFile {
                origin: ConfigOrigin::User,
                path: path.clone(),
            });
        }
        if let Some(path) = self.workspace_file() {
            files.push(ConfigFile {
                origin: ConfigOrigin::Workspace,
                path,
            });
        }
        files.extend(self.overrides.iter().map(|path| ConfigFile {
            origin: ConfigOrigin::Override,
            path: path.clone(),
        }));
        files
    }
}

impl MnemosConfig {
    /// Load a single file, without any merging.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config (path={})", path.display());
        from_value(read_json5(path)?, "config")
    }

    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from string (len={})", contents.len());
        from_value(json5::from_str(contents)?, "config")
    }

    /// Merge the user file and the workspace file found from `cwd`.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LoadedConfig, ConfigError> {
        Self::load_with(&ConfigSearch::new(cwd))
    }

    pub fn load_with(search: &ConfigSearch) -> Result<LoadedConfig, ConfigError> {
        let files = search.files();
        let mut merged = Value::Object(Map::new());
        for file in &files {
            debug!(
                "merging config file (origin={}, path={})",
                file.origin,
                file.path.display()
            );
            let value = read_json5(&file.path)?;
            schema::check_shape(&value, &file.label())?;
            merge::merge_values(&mut merged, value);
        }
        let config = from_value(merged, "effective")?;
        info!("config loaded (files={})", files.len());
        Ok(LoadedConfig { config, files })
    }

    /// Value checks that the shape check cannot express.
    ///
    /// A zero `memory.message_window` passes; the summary extractor reports
    /// it when it runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".to_string()));
        }
        let workers = &self.extractors.workers;
        if workers.max_concurrent == 0 || workers.queue_capacity == 0 {
            return Err(ConfigError::Invalid(format!(
                "extractors.workers needs max_concurrent and queue_capacity above zero \
                 (max_concurrent={}, queue_capacity={})",
                workers.max_concurrent, workers.queue_capacity
            )));
        }
        Ok(())
    }

    /// Root directory of the file memory store, `~/.mnemos/memory` unless set.
    pub fn store_path(&self) -> Option<PathBuf> {
        match &self.memory.store.path {
            Some(path) => Some(PathBuf::from(path)),
            None => home_dir().map(|home| home.join("memory")),
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| dirs.home_dir().join(HOME_DIR))
}

fn read_json5(path: &Path) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(json5::from_str(&contents)?)
}

fn from_value(value: Value, label: &str) -> Result<MnemosConfig, ConfigError> {
    schema::check_shape(&value, label)?;
    let config: MnemosConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
