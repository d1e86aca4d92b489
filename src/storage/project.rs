//! Project management
//!
//! Handles project initialization and hands out store sessions.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::{ClientStore, Config};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not in a lanes project. Run 'lanes init' first.")]
    NotInProject,
}

/// A lanes project
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(".lanes").is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let lanes_dir = root.join(".lanes");

        fs::create_dir_all(&lanes_dir).with_context(|| {
            format!("Failed to create .lanes directory: {}", lanes_dir.display())
        })?;

        let config_path = lanes_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# lanes configuration

# Lane new clients are added to (backlog, in-progress, complete)
default_status = "backlog"

[board]
show_description = false
column_width = 28
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = lanes_dir.join(".gitignore");
        if !gitignore_path.exists() {
            let gitignore = r#"# SQLite write-ahead log files
lanes.db-wal
lanes.db-shm
"#;
            fs::write(&gitignore_path, gitignore).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        let project = Self::open(root)?;

        // Create the database eagerly so schema errors surface at init time
        project.store()?;

        Ok(project)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .lanes directory path
    pub fn lanes_dir(&self) -> PathBuf {
        self.root.join(".lanes")
    }

    /// Returns the database path
    pub fn db_path(&self) -> PathBuf {
        self.lanes_dir().join("lanes.db")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Opens a new store session for this project
    pub fn store(&self) -> Result<ClientStore> {
        ClientStore::open(&self.db_path())
    }
}
