//! `load_config` module: turns an optional YAML file plus command-line flags into a [`HarvestConfig`].
//!
//! The file is untrusted input; this is the only place it is parsed. Every
//! key is optional in the file, and an explicit flag always wins over the
//! file value.
//!
//! # Errors
//! All errors in this module use `anyhow::Error` for context-rich diagnostics,
//! and are surfaced at the CLI boundary.
//!
//! Accepted keys: `org`, `base_dir`, `org_dir`, `reference_file`, `docs_dir`,
//! `api_url`, `request_timeout_secs`.

use anyhow::Result;
use repo_harvester_core::config::HarvestConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Config file contents, every key optional.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub org: Option<String>,
    pub base_dir: Option<PathBuf>,
    pub org_dir: Option<PathBuf>,
    pub reference_file: Option<PathBuf>,
    pub docs_dir: Option<PathBuf>,
    pub api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub org: Option<String>,
    pub base_dir: Option<PathBuf>,
    pub org_dir: Option<PathBuf>,
    pub reference_file: Option<PathBuf>,
    pub docs_dir: Option<PathBuf>,
    pub api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Loads a YAML config file into a [`ConfigFile`].
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
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

    // An empty file deserialises to `null`; treat it as "no keys set".
    if config_content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Merge file values and flags into the run configuration. `org` must come from one of them.
pub fn resolve(file: ConfigFile, flags: Overrides) -> Result<HarvestConfig> {
    let Some(org) = flags.org.or(file.org).filter(|o| !o.trim().is_empty()) else {
        anyhow::bail!("No organization given: pass --org or set `org` in the config file");
    };

    let mut config = HarvestConfig::new(org);
    config.base_dir = flags.base_dir.or(file.base_dir);
    config.org_dir = flags.org_dir.or(file.org_dir);
    config.reference_file = flags.reference_file.or(file.reference_file);
    if let Some(docs_dir) = flags.docs_dir.or(file.docs_dir) {
        config.docs_dir = docs_dir;
    }
    if let Some(api_url) = flags.api_url.or(file.api_url) {
        config.api_url = api_url;
    }
    if let Some(secs) = flags.request_timeout_secs.or(file.request_timeout_secs) {
        config.request_timeout_secs = secs;
    }

    info!(org = %config.org, "Configuration resolved");
    Ok(config)
}
