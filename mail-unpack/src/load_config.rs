/// `load_config` module: loads the YAML config file and applies environment overrides.
///
/// This is the only place where user-supplied YAML is parsed and mapped onto
/// the core's typed configuration.
///
/// # Environment
/// - `MAIL_UNPACK_STORE_ROOT`: when set and non-empty, replaces `store.root`.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use mail_unpack_core::config::StoreConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Environment variable overriding the store root from the config file.
pub const STORE_ROOT_ENV: &str = "MAIL_UNPACK_STORE_ROOT";

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub store: StoreConfig,
}

/// Loads a YAML config file and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Ok(root) = std::env::var(STORE_ROOT_ENV) {
        if !root.is_empty() {
            info!(root = %root, "Store root overridden from environment");
            config.store.root = PathBuf::from(root);
        }
    }

    config.store.trace_loaded();
    Ok(config)
}
