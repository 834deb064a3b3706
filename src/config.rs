use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::drill::CompareMode;
use crate::extract::Curation;
use crate::judge::DEFAULT_RUN_URL;
use crate::notes::DEFAULT_NOTES_URL;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub notes_url: String,
    pub run_url: String,
    pub min_snippet_len: usize,
    pub max_snippet_len: usize,
    pub max_snippets: usize,
    pub compare_mode: CompareMode,
    pub auto_advance_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_url: DEFAULT_NOTES_URL.to_string(),
            run_url: DEFAULT_RUN_URL.to_string(),
            min_snippet_len: 60,
            max_snippet_len: 2500,
            max_snippets: 100,
            compare_mode: CompareMode::Strict,
            auto_advance_secs: 3.0,
        }
    }
}

impl Config {
    pub fn curation(&self) -> Curation {
        Curation {
            min_len: self.min_snippet_len,
            max_len: self.max_snippet_len,
            max_count: self.max_snippets,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "jtype") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("jtype_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
