use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Fixed project layout the patcher operates in. The root defaults to the
/// parent of the directory holding the executable; the uSync label source
/// and the migrations destination hang off it at fixed relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn from_executable() -> Result<Self> {
        let executable =
            std::env::current_exe().context("failed resolving executable location")?;
        let root = executable
            .parent()
            .and_then(Path::parent)
            .context("executable location has no parent directory")?
            .to_path_buf();
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn default_archive_path(&self) -> PathBuf {
        self.root.join("package.zip")
    }

    pub fn label_source_path(&self) -> PathBuf {
        self.root
            .join("template")
            .join("Clean.Blog")
            .join("uSync")
            .join("v17")
            .join("DataTypes")
            .join("BlockListMainContent.config")
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.root.join("template").join("Clean").join("Migrations")
    }

    pub fn deployed_archive_path(&self) -> PathBuf {
        self.migrations_dir().join("package.zip")
    }
}
