use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Where the filesystem object store keeps its buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub root: PathBuf,
}

impl StoreConfig {
    pub fn trace_loaded(&self) {
        info!(root = %self.root.display(), "Loaded StoreConfig");
        debug!(?self, "StoreConfig loaded (full debug)");
    }
}
