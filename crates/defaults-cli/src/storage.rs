use std::path::PathBuf;

use color_eyre::Result;
use defaults::StoreHandle;
use defaults_storage::FileStore;
use dirs::data_dir;
use tracing::debug;

use crate::config::Config;

/// Resolve the default directory holding suite files.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("typed-defaults"))
}

/// Suite directory, honouring the config override.
pub fn data_root(config: &Config) -> Result<PathBuf> {
    match &config.data_dir {
        Some(root) => Ok(root.clone()),
        None => default_data_dir(),
    }
}

/// Open a file-backed suite under the configured data directory.
pub fn open_suite(config: &Config, suite: &str) -> Result<StoreHandle> {
    let root = data_root(config)?;
    debug!(?root, suite, "opening suite");
    Ok(StoreHandle::new(suite, FileStore::new(root, suite)))
}
