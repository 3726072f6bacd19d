pub mod config;
pub mod interactive;
pub mod watched;

use crate::output::Output;
use color_eyre::Result;
use popcorn_config::PathManager;
use popcorn_core::{FileKeyValueStore, WatchedStore};

/// Open the watched list under the data directory, reporting a recovered
/// corrupt payload to the user.
pub(crate) fn open_watched_store(paths: &PathManager, output: &Output) -> Result<WatchedStore<FileKeyValueStore>> {
    paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;

    let store = WatchedStore::open(FileKeyValueStore::new(paths.data_dir()));
    if let Some(diagnostic) = store.startup_diagnostic() {
        output.warn(diagnostic);
    }
    Ok(store)
}

/// One decimal place, the way ratings are shown everywhere
pub(crate) fn format_average(value: f64) -> String {
    format!("{:.1}", value)
}
