use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_DOCS_DIR: &str = "docs";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Everything one harvesting run needs to know, passed explicitly into the entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Organization whose catalog is listed.
    pub org: String,
    /// Staging root under the working directory. Defaults to the organization name.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Subdirectory of `base_dir` that receives the clones. Defaults to the organization name.
    #[serde(default)]
    pub org_dir: Option<PathBuf>,
    /// Optional batch input of repository references; bypasses the catalog.
    #[serde(default)]
    pub reference_file: Option<PathBuf>,
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DOCS_DIR)
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl HarvestConfig {
    pub fn new(org: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            base_dir: None,
            org_dir: None,
            reference_file: None,
            docs_dir: default_docs_dir(),
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.org))
    }

    pub fn org_dir(&self) -> PathBuf {
        self.org_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.org))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn trace_loaded(&self) {
        info!(
            org = %self.org,
            base_dir = %self.base_dir().display(),
            org_dir = %self.org_dir().display(),
            reference_file = ?self.reference_file,
            "Loaded HarvestConfig"
        );
        debug!(?self, "HarvestConfig loaded (full debug)");
    }
}
